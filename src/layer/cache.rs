//! Decoded layer cache.
//!
//! Decoding a layer means inflating every tile and compositing a canvas, so
//! decoded layers are kept in an LRU cache keyed by layer id.
//!
//! # Size-Based Eviction
//!
//! The cache tracks the total canvas bytes it holds and evicts
//! least-recently-used layers when the capacity is exceeded. A layer larger
//! than the whole capacity is evicted right away.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use crate::raster::DecodedLayer;

/// Default cache capacity: 512MB of canvas data
pub const DEFAULT_LAYER_CACHE_CAPACITY: usize = 512 * 1024 * 1024;

/// Default maximum number of entries
const DEFAULT_MAX_ENTRIES: usize = 256;

struct Inner {
    layers: LruCache<Arc<str>, Arc<DecodedLayer>>,
    current_size: usize,
}

/// LRU cache of decoded layers with size-based capacity.
///
/// # Thread Safety
///
/// The cache is `Send + Sync`; layers are shared as `Arc<DecodedLayer>`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use kra_raster::layer::LayerCache;
/// use kra_raster::raster::{decode_layer, DecodeOptions};
///
/// let stream = b"TILEWIDTH 1\nTILEHEIGHT 1\nPIXELSIZE 1\nDATA 0\n".to_vec();
/// let layer = decode_layer(stream, &DecodeOptions::default()).unwrap();
///
/// let cache = LayerCache::new();
/// cache.put("c5a9e0b2", Arc::new(layer));
/// assert!(cache.contains("c5a9e0b2"));
/// ```
pub struct LayerCache {
    inner: Mutex<Inner>,
    max_size: usize,
}

impl LayerCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LAYER_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `max_size` bytes of canvas data.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Create a cache bounded both in bytes and in entries.
    ///
    /// A `max_entries` of zero is treated as one.
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        let entries = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                layers: LruCache::new(entries),
                current_size: 0,
            }),
            max_size,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a layer, marking it as recently used.
    pub fn get(&self, id: &str) -> Option<Arc<DecodedLayer>> {
        self.lock().layers.get(id).cloned()
    }

    /// Check for a layer without touching the LRU order.
    pub fn contains(&self, id: &str) -> bool {
        self.lock().layers.contains(id)
    }

    /// Store a layer, replacing any previous entry with the same id.
    ///
    /// Least-recently-used layers are evicted until the cache is within
    /// capacity.
    pub fn put(&self, id: impl Into<Arc<str>>, layer: Arc<DecodedLayer>) {
        let size = layer.byte_size();
        let mut guard = self.lock();
        let inner = &mut *guard;

        // The entry-count bound can evict on its own; keep the size in step
        if let Some((_, old)) = inner.layers.push(id.into(), layer) {
            inner.current_size = inner.current_size.saturating_sub(old.byte_size());
        }
        inner.current_size += size;

        while inner.current_size > self.max_size {
            match inner.layers.pop_lru() {
                Some((_, evicted)) => {
                    inner.current_size = inner.current_size.saturating_sub(evicted.byte_size());
                }
                None => break,
            }
        }
    }

    /// Remove a layer, returning it if it was cached.
    pub fn remove(&self, id: &str) -> Option<Arc<DecodedLayer>> {
        let mut inner = self.lock();
        let layer = inner.layers.pop(id)?;
        inner.current_size = inner.current_size.saturating_sub(layer.byte_size());
        Some(layer)
    }

    /// Drop every cached layer.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.layers.clear();
        inner.current_size = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().layers.is_empty()
    }

    /// Total canvas bytes currently cached.
    pub fn size(&self) -> usize {
        self.lock().current_size
    }

    /// Maximum capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl Default for LayerCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
