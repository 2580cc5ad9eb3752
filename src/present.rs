//! Presentation mapper: which items are on the current page, how a page
//! slot maps back to an absolute queue index, and the pure layout math
//! (equal-share slots, best-fit scaling inside a slot).

use crate::engine::Cursor;
use crate::queue::{Queue, QueueItem};

/// The presented slice: each on-page item paired with its absolute index,
/// so per-slot actions can target the right queue entry.
pub fn slice<'a>(cursor: &Cursor, queue: &'a Queue) -> Vec<(usize, &'a QueueItem)> {
    let len = queue.len();
    if cursor.position >= len {
        // Exhausted (or empty queue) — nothing to present.
        return Vec::new();
    }
    let end = (cursor.position + cursor.page_size).min(len);
    (cursor.position..end).map(|i| (i, queue.get(i))).collect()
}

/// Map a page slot (0-indexed) back to its absolute queue index.
/// A slot outside the page, or one that had no item this frame, is a
/// caller bug.
pub fn resolve_slot(cursor: &Cursor, len: usize, slot: usize) -> usize {
    if slot >= cursor.page_size {
        panic!(
            "slot {} out of page bounds (page size {})",
            slot, cursor.page_size
        );
    }
    let index = cursor.position + slot;
    if index >= len {
        panic!("slot {} has no item (index {} >= len {})", slot, index, len);
    }
    index
}

// ── Layout math ─────────────────────────────────────────────────────────

/// How content is scaled into a container.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FitMode {
    /// Fit fully inside the container, never cropping.
    Contain,
    /// Stretch across the container, cropping the overflow.
    Cover,
}

/// Result of fitting content into a container: the scaled size plus the
/// draw offset. The offset centers horizontally when the content is
/// narrower than the container, and goes negative (symmetric clamp) on any
/// axis where the scaled content overflows it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Fit {
    pub width: u32,
    pub height: u32,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// Best-fit scale of `content` into `container`, aspect ratio preserved,
/// dimensions rounded to nearest.
pub fn best_fit(content: (u32, u32), container: (u32, u32), mode: FitMode) -> Fit {
    let (cw, ch) = content;
    if cw == 0 || ch == 0 {
        return Fit {
            width: 0,
            height: 0,
            offset_x: 0,
            offset_y: 0,
        };
    }

    let rx = container.0 as f64 / cw as f64;
    let ry = container.1 as f64 / ch as f64;
    let ratio = match mode {
        FitMode::Contain => rx.min(ry),
        FitMode::Cover => rx.max(ry),
    };

    let width = (cw as f64 * ratio).round() as u32;
    let height = (ch as f64 * ratio).round() as u32;

    let offset_x = if width > container.0 {
        -(((width - container.0) as f64 / 2.0).round() as i32)
    } else {
        ((container.0 - width) / 2) as i32
    };
    let offset_y = if height > container.1 {
        -(((height - container.1) as f64 / 2.0).round() as i32)
    } else {
        0
    };

    Fit {
        width,
        height,
        offset_x,
        offset_y,
    }
}

/// One slot's horizontal strip of the page.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SlotBox {
    pub x: u32,
    pub width: u32,
    pub height: u32,
}

/// Split a page container into `slots` equal-width strips. Width shares use
/// floor division; remainder pixels trail unused — visual equality beats
/// exact pixel accounting.
pub fn page_layout(container: (u32, u32), slots: usize) -> Vec<SlotBox> {
    if slots == 0 {
        return Vec::new();
    }
    let share = container.0 / slots as u32;
    (0..slots as u32)
        .map(|i| SlotBox {
            x: i * share,
            width: share,
            height: container.1,
        })
        .collect()
}
