//! Decoded-asset cache: id-keyed RGBA pixel buffers with a resolution
//! ceiling applied at decode time.
//!
//! Flow:
//!   1. `DecodedImage::load(path)` → decode → downscale to fit the ceiling
//!   2. `TextureCache::ensure_loaded(item)` → decode now, placeholder on failure
//!   3. `window::resync` decides what stays resident; `evict` frees the pixels
//!
//! The ceiling bounds memory per entry independent of source image size;
//! images already inside it are stored as-is (never upscaled).

use std::collections::HashMap;
use std::path::Path;

use image::imageops::FilterType;

use crate::debug::dbg_log;
use crate::queue::{ItemId, QueueItem};

/// Default per-image resolution ceiling.
pub const MAX_TEXTURE_SIZE: (u32, u32) = (1080, 1080);

/// Decoded image: raw RGBA pixels plus intrinsic (post-ceiling) dimensions.
pub struct DecodedImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    /// Decode an image file to RGBA, downscaled to fit `ceiling` with
    /// aspect ratio preserved. Returns None on read or decode failure.
    pub fn load(path: &Path, ceiling: (u32, u32)) -> Option<Self> {
        let img = image::open(path).ok()?;
        let img = if img.width() > ceiling.0 || img.height() > ceiling.1 {
            img.resize(ceiling.0, ceiling.1, FilterType::Lanczos3)
        } else {
            img
        };
        let (width, height) = (img.width(), img.height());
        let rgba = img.into_rgba8().into_raw();
        Some(DecodedImage {
            rgba,
            width,
            height,
        })
    }

    /// Built-in stand-in for sources that cannot be decoded: a dark
    /// checkerboard, generated rather than shipped as an asset.
    pub fn placeholder() -> Self {
        const SIZE: u32 = 96;
        const CELL: u32 = 12;
        let mut rgba = Vec::with_capacity((SIZE * SIZE * 4) as usize);
        for y in 0..SIZE {
            for x in 0..SIZE {
                if ((x / CELL) + (y / CELL)) % 2 == 0 {
                    rgba.extend_from_slice(&[24, 24, 24, 255]);
                } else {
                    rgba.extend_from_slice(&[128, 32, 128, 255]);
                }
            }
        }
        DecodedImage {
            rgba,
            width: SIZE,
            height: SIZE,
        }
    }
}

struct Entry {
    rgba: Vec<u8>,
    width: u32,
    height: u32,
    placeholder: bool,
}

/// Id-keyed cache of decoded images. Eviction is driven by the window
/// scheduler, not by recency — the cache itself only does bookkeeping.
pub struct TextureCache {
    ceiling: (u32, u32),
    entries: HashMap<ItemId, Entry>,
}

impl TextureCache {
    pub fn new(ceiling: (u32, u32)) -> Self {
        TextureCache {
            ceiling,
            entries: HashMap::new(),
        }
    }

    /// Decode `item` now if it is not already resident. A source that
    /// cannot be read or decoded gets the placeholder instead — recoverable,
    /// never fatal.
    pub fn ensure_loaded(&mut self, item: &QueueItem) {
        if self.entries.contains_key(&item.id) {
            return;
        }
        match DecodedImage::load(&item.source_path, self.ceiling) {
            Some(img) => self.install(item.id, img, false),
            None => {
                eprintln!("decode failed: {}", item.source_path.display());
                self.install(item.id, DecodedImage::placeholder(), true);
            }
        }
    }

    /// Install an already-decoded image (e.g. from the background
    /// preloader). No-op if the id is already resident.
    pub fn install(&mut self, id: ItemId, img: DecodedImage, placeholder: bool) {
        if self.entries.contains_key(&id) {
            return;
        }
        dbg_log!("cache: install {:?} ({}x{})", id, img.width, img.height);
        self.entries.insert(
            id,
            Entry {
                rgba: img.rgba,
                width: img.width,
                height: img.height,
                placeholder,
            },
        );
    }

    /// Release the pixels for `id`. No-op (returns false) if not resident.
    pub fn evict(&mut self, id: ItemId) -> bool {
        let evicted = self.entries.remove(&id).is_some();
        if evicted {
            dbg_log!("cache: evict {:?}", id);
        }
        evicted
    }

    pub fn is_resident(&self, id: ItemId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Intrinsic dimensions of a resident entry. Callers must ensure
    /// residency first.
    pub fn dimensions_of(&self, id: ItemId) -> (u32, u32) {
        match self.entries.get(&id) {
            Some(e) => (e.width, e.height),
            None => panic!("texture {:?} not resident", id),
        }
    }

    /// Pixel buffer of a resident entry, for the display surface to upload.
    pub fn pixels_of(&self, id: ItemId) -> &[u8] {
        match self.entries.get(&id) {
            Some(e) => &e.rgba,
            None => panic!("texture {:?} not resident", id),
        }
    }

    /// Whether a resident entry is the decode-failure placeholder.
    pub fn is_placeholder(&self, id: ItemId) -> bool {
        self.entries.get(&id).map(|e| e.placeholder).unwrap_or(false)
    }

    pub fn resident_ids(&self) -> Vec<ItemId> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop every entry. Used when the queue is replaced wholesale.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
