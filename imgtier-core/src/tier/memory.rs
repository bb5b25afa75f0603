use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};

use super::discardable::{Discardable, DiscardableContent};
use crate::{codec::CachedImage, key::CacheKey, units::ByteSize};

/// A memory-tier entry.
pub type DiscardableImage = DiscardableContent<CachedImage>;

/// Outcome of one reclamation pass over the memory tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Entries whose payload this pass dropped.
    pub discarded: usize,
    /// Live entries kept because a reader had them checked out.
    pub retained_in_use: usize,
    /// Entries that were already discarded before the pass.
    pub already_discarded: usize,
}

/// Concurrent key → discardable image map.
///
/// Any entry's payload may be dropped by [`MemoryTier::discard_unused`] at
/// any time. Presence of a key says nothing about presence of its image;
/// readers go through [`DiscardableContent::access`].
#[derive(Debug, Default)]
pub struct MemoryTier {
    entries: DashMap<CacheKey, Arc<DiscardableImage>>,
}

impl MemoryTier {
    /// Empty tier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace unconditionally.
    pub fn put(&self, key: CacheKey, content: Arc<DiscardableImage>) {
        self.entries.insert(key, content);
    }

    /// Wrap `image` in fresh discardable content and insert it.
    pub fn put_image(&self, key: CacheKey, image: CachedImage) {
        self.put(key, Arc::new(DiscardableContent::new(image)));
    }

    /// Insert `image` unless a live entry is already mapped.
    ///
    /// Used when copying a lower-tier hit upward: a value stored by a `set`
    /// that raced the slower lookup must win over the copy. Returns whether
    /// the image was inserted.
    pub fn promote(&self, key: CacheKey, image: CachedImage) -> bool {
        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(DiscardableContent::new(image)));
                true
            }
            Entry::Occupied(mut slot) if slot.get().is_discarded() => {
                slot.insert(Arc::new(DiscardableContent::new(image)));
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// The mapped entry, live or discarded.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<DiscardableImage>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Unmap `key`. Missing keys are ignored.
    pub fn remove(&self, key: &CacheKey) {
        self.entries.remove(key);
    }

    /// Remove `key` only if it still maps to `stale`.
    ///
    /// A reader that found a dead entry uses this so it never evicts a fresh
    /// value a concurrent writer stored in the meantime.
    pub fn remove_if_same(&self, key: &CacheKey, stale: &Arc<DiscardableImage>) -> bool {
        self.entries
            .remove_if(key, |_, current| Arc::ptr_eq(current, stale))
            .is_some()
    }

    /// Whether `key` is mapped, live or not.
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of mapped keys, dead entries included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No keys mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unmap every key.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Decoded bytes held by live entries.
    pub fn resident_bytes(&self) -> ByteSize {
        self.entries
            .iter()
            .filter_map(|entry| entry.value().with_payload(CachedImage::decoded_size))
            .sum()
    }

    /// Reclamation path: offer every entry for discard.
    ///
    /// Entries stay mapped; readers evict dead ones lazily.
    pub fn discard_unused(&self) -> PurgeReport {
        let contents: Vec<Arc<DiscardableImage>> = self
            .entries
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut report = PurgeReport::default();
        for content in contents {
            if content.is_discarded() {
                report.already_discarded += 1;
                continue;
            }
            content.discard_if_possible();
            if content.is_discarded() {
                report.discarded += 1;
            } else {
                report.retained_in_use += 1;
            }
        }
        report
    }
}
