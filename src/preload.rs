//! Background image preloader: decodes look-ahead/behind images on worker
//! threads so the presented slice rarely pays decode latency.
//!
//! Flow:
//!   1. `Preloader::schedule(id, path)` → spawns thread → decodes to RGBA
//!   2. `Engine::pump` → `drain_ready` → `TextureCache::install`
//!   3. evicting a pending id → `discard` → a late decode result is dropped
//!
//! Workers only do CPU work (decode + downscale); installs happen on the
//! driver thread. An id stays pending from `schedule` until its result is
//! drained or discarded, so a second `schedule` never re-decodes.
//!
//! Lock order is pending → ready everywhere; never the reverse.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::debug::dbg_log;
use crate::queue::ItemId;
use crate::texture::DecodedImage;

/// A finished background decode. `placeholder` marks decode failures that
/// were substituted with the built-in stand-in.
pub struct ReadyImage {
    pub id: ItemId,
    pub image: DecodedImage,
    pub placeholder: bool,
}

pub struct Preloader {
    ceiling: (u32, u32),
    /// Ids currently being decoded or decoded-but-not-drained.
    pending: Arc<Mutex<HashSet<ItemId>>>,
    /// Decoded images waiting to be installed. Value is (image, placeholder).
    ready: Arc<Mutex<HashMap<ItemId, (DecodedImage, bool)>>>,
}

impl Preloader {
    pub fn new(ceiling: (u32, u32)) -> Self {
        Preloader {
            ceiling,
            pending: Arc::new(Mutex::new(HashSet::new())),
            ready: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether `id` is being decoded or has a result waiting.
    pub fn is_pending(&self, id: ItemId) -> bool {
        self.pending.lock().unwrap().contains(&id)
    }

    /// Whether a decode result for `id` is waiting to be drained.
    pub fn is_ready(&self, id: ItemId) -> bool {
        self.ready.lock().unwrap().contains_key(&id)
    }

    /// Schedule a background decode. No-op if `id` is already pending.
    pub fn schedule(&self, id: ItemId, path: PathBuf) {
        {
            let mut pending = self.pending.lock().unwrap();
            if !pending.insert(id) {
                return;
            }
        }
        dbg_log!("preload: schedule {:?} {}", id, path.display());

        let pending = self.pending.clone();
        let ready = self.ready.clone();
        let ceiling = self.ceiling;

        thread::spawn(move || {
            let (image, placeholder) = match DecodedImage::load(&path, ceiling) {
                Some(img) => (img, false),
                None => {
                    eprintln!("decode failed: {}", path.display());
                    (DecodedImage::placeholder(), true)
                }
            };

            // Publish only if the id wasn't discarded while we decoded.
            let pending = pending.lock().unwrap();
            if pending.contains(&id) {
                ready.lock().unwrap().insert(id, (image, placeholder));
            }
        });
    }

    /// Forget about `id`: remove it from the pending set and drop any
    /// waiting result. A worker still decoding it will notice and drop its
    /// result instead of publishing.
    pub fn discard(&self, id: ItemId) {
        let removed = self.pending.lock().unwrap().remove(&id);
        self.ready.lock().unwrap().remove(&id);
        if removed {
            dbg_log!("preload: discard {:?}", id);
        }
    }

    /// Drop every pending decode and waiting result. Used when the queue is
    /// replaced wholesale.
    pub fn discard_all(&self) {
        self.pending.lock().unwrap().clear();
        self.ready.lock().unwrap().clear();
    }

    /// Ids currently pending (in flight or waiting to be drained).
    pub fn pending_ids(&self) -> Vec<ItemId> {
        self.pending.lock().unwrap().iter().copied().collect()
    }

    /// Take every finished decode. Drained ids leave the pending set.
    pub fn drain_ready(&self) -> Vec<ReadyImage> {
        let mut pending = self.pending.lock().unwrap();
        let mut ready = self.ready.lock().unwrap();
        let drained: Vec<ReadyImage> = ready
            .drain()
            .map(|(id, (image, placeholder))| ReadyImage {
                id,
                image,
                placeholder,
            })
            .collect();
        for r in &drained {
            pending.remove(&r.id);
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Queue;
    use std::path::Path;
    use std::time::Duration;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    fn some_id(n: usize) -> ItemId {
        let mut q = Queue::new();
        let mut id = q.append(PathBuf::from("/x"), "x".into());
        for _ in 0..n {
            id = q.append(PathBuf::from("/x"), "x".into());
        }
        id
    }

    /// Poll until `id` has a ready result (decode threads are real).
    fn wait_ready(p: &Preloader, id: ItemId) {
        for _ in 0..500 {
            if p.is_ready(id) {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("decode of {:?} never became ready", id);
    }

    #[test]
    fn schedule_decodes_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 6, 4);
        let id = some_id(0);

        let p = Preloader::new((100, 100));
        p.schedule(id, path);
        assert!(p.is_pending(id));
        wait_ready(&p, id);

        let drained = p.drain_ready();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].id, id);
        assert!(!drained[0].placeholder);
        assert_eq!((drained[0].image.width, drained[0].image.height), (6, 4));
        assert!(!p.is_pending(id));
    }

    #[test]
    fn failed_decode_publishes_placeholder() {
        let id = some_id(1);
        let p = Preloader::new((100, 100));
        p.schedule(id, PathBuf::from("/nonexistent/missing.jpg"));
        wait_ready(&p, id);

        let drained = p.drain_ready();
        assert_eq!(drained.len(), 1);
        assert!(drained[0].placeholder);
    }

    #[test]
    fn double_schedule_yields_one_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 4, 4);
        let id = some_id(2);

        let p = Preloader::new((100, 100));
        p.schedule(id, path.clone());
        p.schedule(id, path);
        wait_ready(&p, id);
        thread::sleep(Duration::from_millis(10));

        assert_eq!(p.drain_ready().len(), 1);
        assert!(p.drain_ready().is_empty());
    }

    #[test]
    fn discard_drops_result_in_any_interleaving() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 4, 4);
        let id = some_id(3);

        let p = Preloader::new((100, 100));
        p.schedule(id, path);
        p.discard(id);
        assert!(!p.is_pending(id));

        // Whether the worker was mid-decode or already done, nothing may
        // surface after the discard.
        thread::sleep(Duration::from_millis(50));
        assert!(p.drain_ready().is_empty());
        assert!(!p.is_ready(id));
    }

    #[test]
    fn discard_after_ready_drops_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 4, 4);
        let id = some_id(4);

        let p = Preloader::new((100, 100));
        p.schedule(id, path);
        wait_ready(&p, id);
        p.discard(id);
        assert!(p.drain_ready().is_empty());
    }

    #[test]
    fn discard_all_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let a = some_id(5);
        let b = some_id(6);
        let p = Preloader::new((100, 100));
        p.schedule(a, write_png(dir.path(), "a.png", 4, 4));
        p.schedule(b, write_png(dir.path(), "b.png", 4, 4));
        p.discard_all();
        assert!(!p.is_pending(a));
        assert!(!p.is_pending(b));
        thread::sleep(Duration::from_millis(50));
        assert!(p.drain_ready().is_empty());
    }
}
