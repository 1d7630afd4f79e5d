//! Layer Service for decoding layers out of an archive.
//!
//! The LayerService is the main entry point for layer requests. It
//! orchestrates:
//! - Cache lookups
//! - Entry access via an [`EntrySource`]
//! - Tile stream decoding
//! - Result caching
//! - Image export
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        LayerService                             │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    get_layer()                          │    │
//! │  │  1. Check cache       3. Decode tile stream             │    │
//! │  │  2. Open entry        4. Cache & return                 │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌────────────┐      ┌──────────────┐    ┌──────────────────┐ │
//! │    │ LayerCache │      │ EntrySource  │    │  ImageExporter   │ │
//! │    └────────────┘      └──────────────┘    └──────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::container::{EntrySource, LayerRef};
use crate::error::LayerError;
use crate::export::{ImageExporter, OutputFormat};
use crate::raster::{decode_layer, summarize, DecodeOptions, DecodedLayer, StreamSummary};

use super::cache::LayerCache;

// =============================================================================
// Layer Response
// =============================================================================

/// A decoded layer as returned by the service.
#[derive(Debug, Clone)]
pub struct LayerResponse {
    /// The decoded layer, shared with the cache
    pub layer: Arc<DecodedLayer>,

    /// Whether this layer was served from cache
    pub cache_hit: bool,
}

// =============================================================================
// Layer Service
// =============================================================================

/// Service for decoding and caching layers.
///
/// # Type Parameters
///
/// * `S` - The entry source (e.g. a [`KraArchive`](crate::container::KraArchive))
///
/// # Example
///
/// ```no_run
/// use kra_raster::container::{KraArchive, LayerRef};
/// use kra_raster::export::OutputFormat;
/// use kra_raster::layer::LayerService;
///
/// let archive = KraArchive::open("drawing.kra")?;
/// let service = LayerService::new(archive);
///
/// let layer = LayerRef::new("Unnamed", "layer2", "2f1e1a8c-uuid");
/// let bmp = service.export(&layer, OutputFormat::Bmp)?;
/// std::fs::write("layer2.bmp", bmp)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct LayerService<S: EntrySource> {
    /// Where tile streams come from
    source: Arc<S>,

    /// Cache of decoded layers
    cache: LayerCache,

    /// Options applied to every decode
    options: DecodeOptions,

    /// Encoder for exported images
    exporter: ImageExporter,
}

impl<S: EntrySource> LayerService<S> {
    /// Create a service with default decode options and cache settings.
    pub fn new(source: S) -> Self {
        Self::with_shared_source(Arc::new(source))
    }

    /// Create a service over a shared source.
    pub fn with_shared_source(source: Arc<S>) -> Self {
        Self {
            source,
            cache: LayerCache::new(),
            options: DecodeOptions::default(),
            exporter: ImageExporter::new(),
        }
    }

    /// Replace the decode options.
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the cache with one of `capacity` bytes.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = LayerCache::with_capacity(capacity);
        self
    }

    /// Replace the image exporter.
    pub fn with_exporter(mut self, exporter: ImageExporter) -> Self {
        self.exporter = exporter;
        self
    }

    /// Get a decoded layer, using the cache when available.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The layer's entry cannot be found or read
    /// - The tile stream is malformed
    /// - A tile fails to decompress or place under the configured policies
    pub fn get_layer(&self, layer: &LayerRef) -> Result<LayerResponse, LayerError> {
        if let Some(cached) = self.cache.get(&layer.id) {
            debug!(layer = %layer, "Layer cache hit");
            return Ok(LayerResponse {
                layer: cached,
                cache_hit: true,
            });
        }

        let decoded = Arc::new(self.decode_uncached(layer)?);
        self.cache.put(layer.id.clone(), decoded.clone());

        Ok(LayerResponse {
            layer: decoded,
            cache_hit: false,
        })
    }

    /// Decode a layer without touching the cache.
    pub fn decode_uncached(&self, layer: &LayerRef) -> Result<DecodedLayer, LayerError> {
        let data = self.source.open_entry(&layer.raster_path())?;
        debug!(layer = %layer, bytes = data.len(), "Decoding layer");
        decode_layer(data, &self.options)
    }

    /// Summarize a layer's tile stream without decompressing it.
    pub fn inspect(&self, layer: &LayerRef) -> Result<StreamSummary, LayerError> {
        let data = self.source.open_entry(&layer.raster_path())?;
        Ok(summarize(data)?)
    }

    /// Decode a layer (cached) and encode it as `format`.
    pub fn export(&self, layer: &LayerRef, format: OutputFormat) -> Result<Vec<u8>, LayerError> {
        let response = self.get_layer(layer)?;
        Ok(self.exporter.encode(&response.layer.canvas, format)?)
    }

    /// Get a reference to the cache.
    pub fn cache(&self) -> &LayerCache {
        &self.cache
    }

    /// Get a reference to the entry source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Decode options in effect.
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }
}
