// -- submodules
mod loader;
mod source_utils;

pub use loader::SourceLoader;
pub use source_utils::encode_png;

// -- external imports
use image::DynamicImage;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SourceMeta {
    /// Current frame index (0-based).
    pub frame_idx: usize,
    /// Total frames (1 for single images).
    pub total_frames: usize,
    /// Source path if available.
    pub source_path: Option<PathBuf>,
}

impl SourceMeta {
    pub fn frame_name(&self) -> String {
        match &self.source_path {
            Some(p) => p
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned(),
            None => format!("frame_{}", self.frame_idx),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum Source {
    /// Nothing configured
    #[default]
    None,

    /// Path to a single image file
    ImagePath(PathBuf),

    /// Path to directory containing multiple images
    Directory(PathBuf),

    /// List of image paths
    ImagePathVec(Vec<PathBuf>),

    /// Image data in memory, uploaded as PNG
    Image(DynamicImage),
}

impl Source {
    pub fn is_batch(&self) -> bool {
        matches!(self, Source::Directory(_) | Source::ImagePathVec(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Source::None)
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        if path.as_os_str().is_empty() {
            Source::None
        } else if path.is_dir() {
            Source::Directory(path)
        } else {
            Source::ImagePath(path)
        }
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Source::from(PathBuf::from(path))
    }
}

impl From<String> for Source {
    fn from(path: String) -> Self {
        Source::from(PathBuf::from(path))
    }
}

impl From<Vec<PathBuf>> for Source {
    fn from(paths: Vec<PathBuf>) -> Self {
        Source::ImagePathVec(paths)
    }
}

impl From<DynamicImage> for Source {
    fn from(image: DynamicImage) -> Self {
        Source::Image(image)
    }
}

/// Custom deserializer for Source from toml
/// Only supports path-based variants (ImagePath, Directory, ImagePathVec)
pub fn deserialize_source<'de, D>(deserializer: D) -> Result<Source, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PathOrVec {
        Path(PathBuf),
        Vec(Vec<PathBuf>),
    }

    match PathOrVec::deserialize(deserializer)? {
        PathOrVec::Path(path) => Ok(path.into()),
        PathOrVec::Vec(paths) => Ok(paths.into()),
    }
}
