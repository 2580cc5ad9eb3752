//! Item registry: the ordered queue of images to step through.
//!
//! Ids are issued by the registry and are unique for its whole lifetime.
//! `replace` hands out fresh ids for the new round, so anything still
//! holding an old id (cache entries, in-flight decodes) can never collide
//! with the new sequence.

use std::path::PathBuf;

/// Opaque stable identifier for a queue item.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ItemId(u64);

/// One entry in the queue: where the image lives and what to call it.
#[derive(Clone, Debug)]
pub struct QueueItem {
    pub id: ItemId,
    pub source_path: PathBuf,
    pub label: String,
}

/// Ordered, index-addressable sequence of queue items.
pub struct Queue {
    items: Vec<QueueItem>,
    next_id: u64,
}

impl Queue {
    pub fn new() -> Self {
        Queue {
            items: Vec::new(),
            next_id: 0,
        }
    }

    fn issue_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a single item. Returns the id issued for it.
    pub fn append(&mut self, source_path: PathBuf, label: String) -> ItemId {
        let id = self.issue_id();
        self.items.push(QueueItem {
            id,
            source_path,
            label,
        });
        id
    }

    /// Append a batch of `(source_path, label)` entries in order.
    pub fn append_all(&mut self, entries: impl IntoIterator<Item = (PathBuf, String)>) {
        for (source_path, label) in entries {
            self.append(source_path, label);
        }
    }

    /// Replace the whole sequence. Every previously issued id is invalid
    /// afterwards; callers must reset their cursor and drop cached assets.
    pub fn replace(&mut self, entries: impl IntoIterator<Item = (PathBuf, String)>) {
        self.items.clear();
        self.append_all(entries);
    }

    /// Item at `index`. Out of range is a caller bug, not a runtime state.
    pub fn get(&self, index: usize) -> &QueueItem {
        match self.items.get(index) {
            Some(item) => item,
            None => panic!("queue index {} out of range (len {})", index, self.items.len()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }
}
