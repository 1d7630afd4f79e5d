//! # kra-raster
//!
//! A decoder for the paint layers stored inside Krita `.kra` documents.
//!
//! Each paint layer is saved as a tiled raster stream: a short text header
//! followed by tiles that are planar, optionally LZF-compressed and placed on
//! a grid of pixel coordinates. This library reassembles a stream into one
//! interleaved pixel buffer and writes it as BMP, PNG or JPEG.
//!
//! ## Features
//!
//! - **Stream parsing**: header and tile records over zero-copy [`bytes::Bytes`]
//! - **Hardened LZF**: corrupt back-references are errors, never panics
//! - **Explicit policies**: fail-fast or best-effort placement, abort or blank
//!   on corrupt tiles
//! - **Parallel decoding**: tiles expanded on the rayon pool, output identical
//!   to the sequential path
//! - **Layer caching**: decoded canvases kept in a size-bounded LRU
//!
//! ## Architecture
//!
//! - [`io`] - Byte cursor shared by the parsers
//! - [`mod@format`] - Header, tile record and LZF decoding
//! - [`raster`] - Tile expansion, compositing and the full layer pipeline
//! - [`export`] - BMP writer and PNG/JPEG encoding
//! - [`container`] - Zip archive access and layer references
//! - [`layer`] - Cached layer service
//! - [`config`] - CLI configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use kra_raster::{KraArchive, LayerRef, LayerService, OutputFormat};
//!
//! let archive = KraArchive::open("drawing.kra")?;
//! let project = archive.resolve_project(None)?;
//! let service = LayerService::new(archive);
//!
//! let layer = LayerRef::from_path(project, "layer2");
//! let png = service.export(&layer, OutputFormat::Png)?;
//! std::fs::write("layer2.png", png)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod export;
pub mod format;
pub mod io;
pub mod layer;
pub mod raster;

// Re-export commonly used types
pub use config::{Cli, Command, ExtractConfig, InspectConfig, LayerSelection, ListConfig};
pub use container::{EntrySource, KraArchive, LayerRef};
pub use error::{
    CompositionWarning, ContainerError, DecompressionError, EncodeError, FormatError, LayerError,
};
pub use export::{encode_bmp, ImageExporter, OutputFormat};
pub use format::{CompressionMethod, RasterStreamHeader, TileRecord};
pub use io::ByteStream;
pub use layer::{LayerCache, LayerResponse, LayerService};
pub use raster::{
    composite, decode_layer, summarize, BoundingBox, CanvasBuffer, Compositor, CorruptTilePolicy,
    DecodeOptions, DecodedLayer, DecodedTile, PlacementPolicy, StreamSummary,
};
