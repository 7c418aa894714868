use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::NoteError;

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "svg", "ico", "tif", "tiff", "avif",
];

/// Process-local handle to an attached image, in the shape of a browser
/// object URL. Only meaningful while the process that minted it is alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageUrl(String);

impl ImageUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file the user picked but has not attached to a note yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSelection {
    path: PathBuf,
}

impl ImageSelection {
    /// Accepts only existing files with an image extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, NoteError> {
        let path = path.into();
        if !has_image_extension(&path) {
            return Err(NoteError::NotAnImage(path));
        }
        if !path.is_file() {
            return Err(NoteError::ImageMissing(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Mints image handles. Handles are never revoked; they live as long as the
/// registry does.
#[derive(Debug, Default)]
pub struct ImageRegistry {
    handles: HashMap<ImageUrl, PathBuf>,
}

impl ImageRegistry {
    pub fn create_url(&mut self, selection: &ImageSelection) -> ImageUrl {
        let url = ImageUrl(format!("blob:fleeting/{}", Uuid::new_v4()));
        tracing::debug!(%url, path = %selection.path().display(), "minted image handle");
        self.handles.insert(url.clone(), selection.path().to_path_buf());
        url
    }

    pub fn resolve(&self, url: &ImageUrl) -> Option<&Path> {
        self.handles.get(url).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
