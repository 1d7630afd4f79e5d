//! Zip-backed project archive.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::ContainerError;

use super::layer_ref::LayerRef;
use super::EntrySource;

/// Entry holding the archive's mimetype.
pub const MIMETYPE_ENTRY: &str = "mimetype";

/// Expected contents of the mimetype entry.
pub const KRITA_MIMETYPE: &str = "application/x-krita";

/// Thumbnail rendered by the application on save.
pub const PREVIEW_ENTRY: &str = "preview.png";

/// Full-size flattened image rendered by the application on save.
pub const MERGED_IMAGE_ENTRY: &str = "mergedimage.png";

/// A `.kra` project archive.
///
/// Reading an entry needs mutable access to the zip reader, so it sits
/// behind a mutex. Entries are read whole into [`Bytes`].
///
/// # Example
///
/// ```no_run
/// use kra_raster::container::{EntrySource, KraArchive};
///
/// let archive = KraArchive::open("drawing.kra")?;
/// for layer in archive.layer_entries() {
///     let stream = archive.open_entry(&layer.raster_path())?;
///     println!("{}: {} bytes", layer, stream.len());
/// }
/// # Ok::<(), kra_raster::error::ContainerError>(())
/// ```
pub struct KraArchive<R> {
    zip: Mutex<ZipArchive<R>>,
    names: Vec<String>,
}

impl KraArchive<File> {
    /// Open an archive on disk.
    ///
    /// # Errors
    /// `InvalidArchive` if the file cannot be opened or is not a zip.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ContainerError::InvalidArchive(format!("{}: {}", path.display(), e)))?;
        Self::from_reader(file)
    }
}

impl KraArchive<Cursor<Bytes>> {
    /// Open an archive held in memory.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self, ContainerError> {
        Self::from_reader(Cursor::new(data.into()))
    }
}

impl<R: Read + Seek> KraArchive<R> {
    /// Open an archive from any seekable reader.
    ///
    /// # Errors
    /// `InvalidArchive` if the central directory cannot be read.
    pub fn from_reader(reader: R) -> Result<Self, ContainerError> {
        let zip = ZipArchive::new(reader).map_err(|e| ContainerError::InvalidArchive(e.to_string()))?;
        let names: Vec<String> = zip.file_names().map(str::to_string).collect();

        debug!(entries = names.len(), "Opened archive");

        Ok(Self {
            zip: Mutex::new(zip),
            names,
        })
    }

    /// Names of every entry, in central directory order.
    pub fn entry_names(&self) -> &[String] {
        &self.names
    }

    /// Whether an entry exists.
    pub fn contains(&self, path: &str) -> bool {
        self.names.iter().any(|name| name == path)
    }

    /// Read one entry.
    ///
    /// # Errors
    /// `EntryNotFound` if the entry does not exist, `Read` if decompressing it
    /// fails.
    pub fn read_entry(&self, path: &str) -> Result<Bytes, ContainerError> {
        let mut zip = self.zip.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entry = zip.by_name(path).map_err(|e| match e {
            ZipError::FileNotFound => ContainerError::EntryNotFound(path.to_string()),
            other => ContainerError::Read {
                path: path.to_string(),
                message: other.to_string(),
            },
        })?;

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut data)
            .map_err(|e| ContainerError::Read {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        debug!(path, bytes = data.len(), "Read archive entry");
        Ok(Bytes::from(data))
    }

    /// Check the `mimetype` entry.
    ///
    /// Returns `false` when the entry is missing or holds anything other than
    /// `application/x-krita`.
    ///
    /// # Errors
    /// `Read` if the entry exists but cannot be read.
    pub fn is_mimetype_valid(&self) -> Result<bool, ContainerError> {
        match self.read_entry(MIMETYPE_ENTRY) {
            Ok(data) => Ok(std::str::from_utf8(&data).map(str::trim) == Ok(KRITA_MIMETYPE)),
            Err(ContainerError::EntryNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Every tile stream entry, in central directory order.
    pub fn layer_entries(&self) -> Vec<LayerRef> {
        self.names
            .iter()
            .filter_map(|name| LayerRef::parse_path(name))
            .collect()
    }

    /// Pick the project directory to read layers from.
    ///
    /// An explicit name is returned as-is. Otherwise the archive must hold
    /// exactly one project with a `layers/` directory.
    ///
    /// # Errors
    /// `AmbiguousProject` if there is no such project or more than one.
    pub fn resolve_project(&self, explicit: Option<&str>) -> Result<String, ContainerError> {
        if let Some(name) = explicit {
            return Ok(name.to_string());
        }

        let projects: BTreeSet<String> = self
            .layer_entries()
            .into_iter()
            .map(|layer| layer.project_name)
            .collect();

        let mut iter = projects.iter();
        match (iter.next(), iter.next()) {
            (Some(only), None) => Ok(only.clone()),
            (None, _) => Err(ContainerError::AmbiguousProject(
                "archive has no layers directory".to_string(),
            )),
            (Some(_), Some(_)) => Err(ContainerError::AmbiguousProject(format!(
                "archive holds several projects ({}), pick one explicitly",
                projects.iter().cloned().collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    /// The embedded thumbnail.
    pub fn preview_png(&self) -> Result<Bytes, ContainerError> {
        self.read_entry(PREVIEW_ENTRY)
    }

    /// The embedded flattened image.
    pub fn merged_image_png(&self) -> Result<Bytes, ContainerError> {
        self.read_entry(MERGED_IMAGE_ENTRY)
    }
}

impl<R: Read + Seek + Send> EntrySource for KraArchive<R> {
    fn open_entry(&self, path: &str) -> Result<Bytes, ContainerError> {
        self.read_entry(path)
    }
}
