//! Project archive access.
//!
//! A `.kra` file is a zip archive. Each paint layer's pixels live in a tile
//! stream entry named `{project}/layers/{filename}`:
//!
//! ```text
//! file.kra
//! ├── mimetype               "application/x-krita"
//! ├── maindoc.xml            layer tree (not parsed here)
//! ├── preview.png
//! ├── mergedimage.png
//! └── {project}/
//!     └── layers/
//!         ├── layer2          tile stream
//!         ├── layer2.icc      sidecars, skipped by the layer listing
//!         └── layer3
//! ```
//!
//! # Components
//!
//! - [`EntrySource`]: anything that can hand out entry bytes by path
//! - [`KraArchive`]: the zip-backed source
//! - [`LayerRef`]: identifies one layer's tile stream

mod archive;
mod layer_ref;

use bytes::Bytes;

use crate::error::ContainerError;

pub use archive::{KraArchive, KRITA_MIMETYPE, MERGED_IMAGE_ENTRY, MIMETYPE_ENTRY, PREVIEW_ENTRY};
pub use layer_ref::LayerRef;

/// Source of archive entries.
///
/// This abstraction lets the layer service decode from a zip file, an
/// in-memory map, or anything else that can resolve an entry path.
pub trait EntrySource: Send + Sync {
    /// Read the full contents of the entry at `path`.
    ///
    /// # Errors
    /// `EntryNotFound` if no such entry exists, `Read` if it cannot be read.
    fn open_entry(&self, path: &str) -> Result<Bytes, ContainerError>;
}
