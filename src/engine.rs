//! Navigation/outcome state machine: owns the queue, the cursor and the
//! cache, and drives the scheduler and mapper on every move.
//!
//! Phases: Idle (queue not started) → Active → Exhausted (position ran off
//! the end; terminal for the round, revived by `replace_queue` + `start`).
//! Moving while Idle or Exhausted is a caller bug and panics — a correct
//! integration never lets that reach the user.

use anyhow::Result;

use crate::config::SwipeConfig;
use crate::debug::dbg_log;
use crate::outcome::Outcome;
use crate::preload::Preloader;
use crate::present;
use crate::queue::{Queue, QueueItem};
use crate::sink::OutputSink;
use crate::texture::TextureCache;
use crate::window;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    Active,
    Exhausted,
}

/// Where we are in the queue and how we move through it.
/// `position == queue.len()` signals exhaustion (no current item).
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    pub position: usize,
    pub page_size: usize,
    pub step_size: usize,
    pub preload_radius: usize,
}

pub struct Engine {
    queue: Queue,
    cache: TextureCache,
    preloader: Option<Preloader>,
    cursor: Cursor,
    phase: Phase,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl Engine {
    pub fn new(cfg: &SwipeConfig) -> Self {
        assert!(cfg.page_size >= 1, "page_size must be at least 1");
        assert!(cfg.step_size >= 1, "step_size must be at least 1");
        Engine {
            queue: Queue::new(),
            cache: TextureCache::new(cfg.max_texture),
            preloader: cfg
                .background_decode
                .then(|| Preloader::new(cfg.max_texture)),
            cursor: Cursor {
                position: 0,
                page_size: cfg.page_size,
                step_size: cfg.step_size,
                preload_radius: cfg.preload_radius,
            },
            phase: Phase::Idle,
            on_complete: None,
        }
    }

    /// Called when the queue round completes (transition to Exhausted).
    pub fn set_on_complete(&mut self, f: Box<dyn FnMut()>) {
        self.on_complete = Some(f);
    }

    // ── Queue management ────────────────────────────────────────────────

    /// Append `(source_path, label)` entries. A streaming enqueue while
    /// Active extends the window on the spot.
    pub fn append_items(
        &mut self,
        entries: impl IntoIterator<Item = (std::path::PathBuf, String)>,
    ) {
        self.queue.append_all(entries);
        if self.phase == Phase::Active {
            self.resync();
        }
    }

    /// Replace the whole queue. Every old id — and with it every cache
    /// entry and in-flight decode — is invalidated; the engine returns to
    /// Idle awaiting `start`.
    pub fn replace_queue(
        &mut self,
        entries: impl IntoIterator<Item = (std::path::PathBuf, String)>,
    ) {
        self.queue.replace(entries);
        self.cache.clear();
        if let Some(p) = &self.preloader {
            p.discard_all();
        }
        self.cursor.position = 0;
        self.phase = Phase::Idle;
        dbg_log!("engine: queue replaced ({} items)", self.queue.len());
    }

    // ── Navigation ──────────────────────────────────────────────────────

    /// Begin the round at position 0. An empty queue exhausts immediately.
    pub fn start(&mut self) {
        if self.phase != Phase::Idle {
            panic!("start() while {:?}; replace the queue first", self.phase);
        }
        self.cursor.position = 0;
        self.phase = Phase::Active;
        if self.queue.is_empty() {
            self.exhaust();
        } else {
            self.resync();
        }
    }

    /// Move forward one step. Transitions to Exhausted — and fires the
    /// completion callback — when the step would run past the end.
    pub fn advance(&mut self) {
        if self.phase != Phase::Active {
            panic!("advance() while {:?}", self.phase);
        }
        let next = self.cursor.position + self.cursor.step_size;
        if next >= self.queue.len() {
            self.exhaust();
        } else {
            self.cursor.position = next;
            self.resync();
        }
    }

    /// Move back one step. No-op at the start boundary.
    pub fn retreat(&mut self) {
        if self.phase != Phase::Active {
            panic!("retreat() while {:?}", self.phase);
        }
        if self.cursor.position < self.cursor.step_size {
            return;
        }
        self.cursor.position -= self.cursor.step_size;
        self.resync();
    }

    fn exhaust(&mut self) {
        self.cursor.position = self.queue.len();
        self.phase = Phase::Exhausted;
        self.resync(); // empty window: everything is evicted
        if let Some(f) = &mut self.on_complete {
            f();
        }
    }

    fn resync(&mut self) {
        window::resync(
            &self.queue,
            &self.cursor,
            &mut self.cache,
            self.preloader.as_ref(),
        );
    }

    /// Install background decodes that finished since the last turn. Call
    /// once per driver turn; a no-op outside Active.
    pub fn pump(&mut self) {
        if self.phase == Phase::Active {
            self.resync();
        }
    }

    // ── Presentation ────────────────────────────────────────────────────

    /// The current page as `(absolute_index, item)` pairs. Empty unless
    /// Active.
    pub fn current_slice(&self) -> Vec<(usize, &QueueItem)> {
        if self.phase != Phase::Active {
            return Vec::new();
        }
        present::slice(&self.cursor, &self.queue)
    }

    /// Absolute queue index behind a page slot.
    pub fn resolve_slot(&self, slot: usize) -> usize {
        if self.phase != Phase::Active {
            panic!("resolve_slot() while {:?}", self.phase);
        }
        present::resolve_slot(&self.cursor, self.queue.len(), slot)
    }

    // ── Outcomes ────────────────────────────────────────────────────────

    /// Dispatch `outcome` on the item behind `slot`, then advance. The slot
    /// is resolved to its absolute index before anything mutates, so the
    /// acted-on item is fixed even when the page moves afterwards. A failed
    /// outcome (e.g. the sink) leaves the cursor untouched and surfaces the
    /// error.
    pub fn act(&mut self, slot: usize, outcome: &Outcome, sink: &OutputSink) -> Result<()> {
        let index = self.resolve_slot(slot);
        let item = self.queue.get(index);
        match outcome {
            Outcome::Reject => {}
            Outcome::Accept(category) => {
                sink.save(&item.source_path, category)?;
            }
            Outcome::Custom(handler) => {
                handler(index, item)?;
            }
        }
        self.advance();
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }
}
