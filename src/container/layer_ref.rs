use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Name of the directory holding layer tile streams inside a project.
pub(crate) const LAYERS_DIR: &str = "layers";

/// Identifies one layer's tile stream inside an archive.
///
/// The project name and filename come from the layer tree in `maindoc.xml`;
/// `id` is the layer's UUID there and keys the decode cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayerRef {
    pub project_name: String,
    pub filename: String,
    pub id: Arc<str>,
}

impl LayerRef {
    pub fn new(
        project_name: impl Into<String>,
        filename: impl Into<String>,
        id: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            filename: filename.into(),
            id: id.into(),
        }
    }

    /// Reference a layer found by path, using the entry path as its id.
    pub fn from_path(project_name: impl Into<String>, filename: impl Into<String>) -> Self {
        let project_name = project_name.into();
        let filename = filename.into();
        let id = raster_path(&project_name, &filename);
        Self::new(project_name, filename, id)
    }

    /// Entry path of the tile stream: `{project}/layers/{filename}`.
    pub fn raster_path(&self) -> String {
        raster_path(&self.project_name, &self.filename)
    }

    /// Split an entry path into a reference, if it names a tile stream.
    ///
    /// Only direct children of a `layers/` directory without an extension
    /// qualify; `.icc`, `.defaultpixel` and mask sidecars do not.
    pub fn parse_path(path: &str) -> Option<Self> {
        let mut parts = path.split('/');
        let project = parts.next()?;
        let dir = parts.next()?;
        let filename = parts.next()?;

        if parts.next().is_some() || dir != LAYERS_DIR {
            return None;
        }
        if project.is_empty() || filename.is_empty() || filename.contains('.') {
            return None;
        }

        Some(Self::from_path(project, filename))
    }
}

impl fmt::Display for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.project_name, LAYERS_DIR, self.filename)
    }
}

fn raster_path(project_name: &str, filename: &str) -> String {
    format!("{}/{}/{}", project_name, LAYERS_DIR, filename)
}
