//! Window/buffer scheduler: decides, as the cursor moves, which images must
//! be decoded and held in memory and which must be released.
//!
//! The resident target is the presented slice plus `preload_radius` items
//! on either side, clipped to the sequence. `resync` diffs that against
//! what is resident: missing slice items decode synchronously (they are
//! about to draw), missing radius items go to the background preloader when
//! one is configured, and everything outside the window is evicted after
//! the loads — including in-flight decodes, which are discarded. Loads and
//! evictions in one pass are set-complements, so no id is ever evicted and
//! reloaded in the same resync.

use std::collections::HashSet;
use std::ops::Range;

use crate::engine::Cursor;
use crate::preload::Preloader;
use crate::queue::{ItemId, Queue};
use crate::texture::TextureCache;

/// The half-open index range that should be resident for `cursor`.
/// Empty at exhaustion (`position == len`).
pub fn window(cursor: &Cursor, len: usize) -> Range<usize> {
    if cursor.position >= len {
        return 0..0;
    }
    let lo = cursor.position.saturating_sub(cursor.preload_radius);
    let hi = (cursor.position + cursor.page_size + cursor.preload_radius).min(len);
    lo..hi
}

/// Bring the cache in line with the window for `cursor`.
pub fn resync(
    queue: &Queue,
    cursor: &Cursor,
    cache: &mut TextureCache,
    preloader: Option<&Preloader>,
) {
    let target = window(cursor, queue.len());
    let slice_end = (cursor.position + cursor.page_size).min(queue.len());
    let target_ids: HashSet<ItemId> = target.clone().map(|i| queue.get(i).id).collect();

    // Install decodes that finished since the last pass; results that fell
    // out of the window in the meantime are dropped.
    if let Some(p) = preloader {
        for r in p.drain_ready() {
            if target_ids.contains(&r.id) {
                cache.install(r.id, r.image, r.placeholder);
            }
        }
    }

    // Loads: the presented slice decodes now, the radius warms in the
    // background (or also now, when no preloader is configured).
    for i in target.clone() {
        let item = queue.get(i);
        if cache.is_resident(item.id) {
            continue;
        }
        let on_page = i >= cursor.position && i < slice_end;
        match preloader {
            Some(p) if !on_page => p.schedule(item.id, item.source_path.clone()),
            Some(p) => {
                if p.is_pending(item.id) {
                    // Already decoding; it lands on a later pump.
                } else {
                    cache.ensure_loaded(item);
                }
            }
            None => cache.ensure_loaded(item),
        }
    }

    // Evictions last, so a surface reading mid-resync never sees a hole
    // inside the window.
    for id in cache.resident_ids() {
        if !target_ids.contains(&id) {
            cache.evict(id);
        }
    }
    if let Some(p) = preloader {
        for id in p.pending_ids() {
            if !target_ids.contains(&id) {
                p.discard(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::MAX_TEXTURE_SIZE;
    use std::path::PathBuf;
    use std::time::Duration;

    // Nonexistent sources decode to the placeholder, which keeps these
    // tests free of fixture files — residency bookkeeping is what matters.
    fn queue_of(n: usize) -> Queue {
        let mut q = Queue::new();
        q.append_all((0..n).map(|i| {
            (
                PathBuf::from(format!("/nowhere/{}.jpg", i)),
                format!("{}.jpg", i),
            )
        }));
        q
    }

    fn cursor(position: usize, page_size: usize, preload_radius: usize) -> Cursor {
        Cursor {
            position,
            page_size,
            step_size: 1,
            preload_radius,
        }
    }

    fn resident_indices(queue: &Queue, cache: &TextureCache) -> Vec<usize> {
        let mut out: Vec<usize> = (0..queue.len())
            .filter(|&i| cache.is_resident(queue.get(i).id))
            .collect();
        out.sort_unstable();
        out
    }

    // ── window ──────────────────────────────────────────────────────────

    #[test]
    fn window_at_start_clips_backward() {
        assert_eq!(window(&cursor(0, 1, 2), 10), 0..3);
    }

    #[test]
    fn window_mid_sequence() {
        assert_eq!(window(&cursor(3, 1, 2), 10), 1..6);
    }

    #[test]
    fn window_clips_forward() {
        assert_eq!(window(&cursor(8, 1, 3), 10), 5..10);
    }

    #[test]
    fn window_zero_radius_is_the_page() {
        assert_eq!(window(&cursor(4, 2, 0), 10), 4..6);
    }

    #[test]
    fn window_page_clipped_at_end() {
        assert_eq!(window(&cursor(9, 3, 0), 10), 9..10);
    }

    #[test]
    fn window_empty_at_exhaustion() {
        assert!(window(&cursor(10, 1, 2), 10).is_empty());
    }

    #[test]
    fn window_empty_sequence() {
        assert!(window(&cursor(0, 1, 2), 0).is_empty());
    }

    // ── resync (synchronous) ────────────────────────────────────────────

    #[test]
    fn resync_makes_window_resident_exactly() {
        let q = queue_of(10);
        let mut cache = TextureCache::new(MAX_TEXTURE_SIZE);
        let c = cursor(3, 1, 2);
        resync(&q, &c, &mut cache, None);
        assert_eq!(resident_indices(&q, &cache), vec![1, 2, 3, 4, 5]);
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn resync_start_scenario() {
        let q = queue_of(10);
        let mut cache = TextureCache::new(MAX_TEXTURE_SIZE);
        resync(&q, &cursor(0, 1, 2), &mut cache, None);
        assert_eq!(resident_indices(&q, &cache), vec![0, 1, 2]);
    }

    #[test]
    fn resync_is_idempotent() {
        let q = queue_of(10);
        let mut cache = TextureCache::new(MAX_TEXTURE_SIZE);
        let c = cursor(3, 2, 1);
        resync(&q, &c, &mut cache, None);
        let before = resident_indices(&q, &cache);
        resync(&q, &c, &mut cache, None);
        assert_eq!(resident_indices(&q, &cache), before);
        assert_eq!(cache.len(), before.len());
    }

    #[test]
    fn resync_slides_forward_and_evicts_behind() {
        let q = queue_of(10);
        let mut cache = TextureCache::new(MAX_TEXTURE_SIZE);
        let mut c = cursor(0, 1, 2);
        resync(&q, &c, &mut cache, None);

        for _ in 0..3 {
            c.position += 1;
            resync(&q, &c, &mut cache, None);
        }
        assert_eq!(resident_indices(&q, &cache), vec![1, 2, 3, 4, 5]);
        assert!(!cache.is_resident(q.get(0).id));
    }

    #[test]
    fn resync_advance_then_retreat_restores_set() {
        let q = queue_of(10);
        let mut cache = TextureCache::new(MAX_TEXTURE_SIZE);
        let mut c = cursor(4, 1, 2);
        resync(&q, &c, &mut cache, None);
        let before = resident_indices(&q, &cache);

        c.position += 1;
        resync(&q, &c, &mut cache, None);
        c.position -= 1;
        resync(&q, &c, &mut cache, None);
        assert_eq!(resident_indices(&q, &cache), before);
    }

    #[test]
    fn resync_zero_radius_keeps_only_the_page() {
        let q = queue_of(10);
        let mut cache = TextureCache::new(MAX_TEXTURE_SIZE);
        resync(&q, &cursor(4, 2, 0), &mut cache, None);
        assert_eq!(resident_indices(&q, &cache), vec![4, 5]);
    }

    #[test]
    fn resync_at_exhaustion_evicts_everything() {
        let q = queue_of(5);
        let mut cache = TextureCache::new(MAX_TEXTURE_SIZE);
        let mut c = cursor(3, 1, 2);
        resync(&q, &c, &mut cache, None);
        assert!(cache.len() > 0);

        c.position = 5;
        resync(&q, &c, &mut cache, None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn resync_radius_shrink_converges_next_pass() {
        let q = queue_of(10);
        let mut cache = TextureCache::new(MAX_TEXTURE_SIZE);
        let mut c = cursor(5, 1, 3);
        resync(&q, &c, &mut cache, None);
        assert_eq!(resident_indices(&q, &cache), vec![2, 3, 4, 5, 6, 7, 8]);

        c.preload_radius = 1;
        resync(&q, &c, &mut cache, None);
        assert_eq!(resident_indices(&q, &cache), vec![4, 5, 6]);
    }

    // ── resync (background) ─────────────────────────────────────────────

    #[test]
    fn resync_background_converges_to_window() {
        let q = queue_of(10);
        let mut cache = TextureCache::new(MAX_TEXTURE_SIZE);
        let p = Preloader::new(MAX_TEXTURE_SIZE);
        let c = cursor(3, 1, 2);

        // The page loads synchronously on the first pass; radius items
        // arrive as their workers finish and a later pass pumps them in.
        resync(&q, &c, &mut cache, Some(&p));
        assert!(cache.is_resident(q.get(3).id));

        let want = vec![1, 2, 3, 4, 5];
        for _ in 0..500 {
            resync(&q, &c, &mut cache, Some(&p));
            if resident_indices(&q, &cache) == want {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("window never became resident: {:?}", resident_indices(&q, &cache));
    }

    #[test]
    fn resync_background_discards_out_of_window_decodes() {
        let q = queue_of(20);
        let mut cache = TextureCache::new(MAX_TEXTURE_SIZE);
        let p = Preloader::new(MAX_TEXTURE_SIZE);

        let mut c = cursor(0, 1, 4);
        resync(&q, &c, &mut cache, Some(&p));

        // Jump far away before the radius decodes land: everything
        // scheduled around position 0 must be discarded, not installed.
        c.position = 15;
        resync(&q, &c, &mut cache, Some(&p));
        for id in p.pending_ids() {
            let idx = (0..q.len()).find(|&i| q.get(i).id == id).unwrap();
            assert!(window(&c, q.len()).contains(&idx));
        }

        std::thread::sleep(Duration::from_millis(50));
        resync(&q, &c, &mut cache, Some(&p));
        let resident = resident_indices(&q, &cache);
        for i in resident {
            assert!(window(&c, q.len()).contains(&i), "index {} outside window", i);
        }
    }
}
