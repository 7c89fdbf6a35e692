use image::DynamicImage;
use std::iter::ExactSizeIterator;
use std::path::PathBuf;

use crate::error::{AppError, Result};

use super::source_utils::{collect_images_from_dir, encode_png};
use super::{Source, SourceMeta};

#[derive(Debug, Clone)]
enum FrameData {
    Path(PathBuf),
    Image(DynamicImage),
}

/// Lazily yields the upload payload of every frame in a [`Source`].
///
/// Payload errors are handed to the caller together with the frame meta, so a batch can
/// skip a bad frame while a single image still fails loudly.
#[derive(Debug)]
pub struct SourceLoader {
    current_idx: usize,
    frames: Vec<FrameData>,
    len: usize,
}

impl SourceLoader {
    pub fn new(source: &Source) -> Result<Self> {
        let frames = match source {
            Source::None => vec![],
            Source::ImagePath(path) => vec![FrameData::Path(path.clone())],
            Source::Directory(dir_path) => collect_images_from_dir(dir_path)?
                .into_iter()
                .map(FrameData::Path)
                .collect(),
            Source::ImagePathVec(paths) => paths.iter().cloned().map(FrameData::Path).collect(),
            Source::Image(img) => vec![FrameData::Image(img.clone())],
        };
        let len = frames.len();

        Ok(Self {
            current_idx: 0,
            frames,
            len,
        })
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Iterator for SourceLoader {
    type Item = (Result<Vec<u8>>, SourceMeta);

    /// Read (or encode) the next frame's bytes
    fn next(&mut self) -> Option<Self::Item> {
        if self.current_idx >= self.len {
            return None;
        }

        let (payload, source_path) = match &self.frames[self.current_idx] {
            FrameData::Path(p) => (std::fs::read(p).map_err(AppError::from), Some(p.clone())),
            FrameData::Image(img) => (encode_png(img), None),
        };

        let meta = SourceMeta {
            frame_idx: self.current_idx,
            total_frames: self.len,
            source_path,
        };

        self.current_idx += 1;
        Some((payload, meta))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.current_idx;
        (remaining, Some(remaining))
    }
}

/// Implement ExactSizeIterator (to use indicatif's ProgressIterator)
impl ExactSizeIterator for SourceLoader {}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_loader_reads_directory_in_order() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("2.jpg"), b"second").unwrap();
        fs::write(temp_dir.path().join("1.jpg"), b"first").unwrap();
        fs::write(temp_dir.path().join("labels.txt"), b"ignored").unwrap();

        let loader = SourceLoader::new(&Source::Directory(temp_dir.path().to_path_buf())).unwrap();
        assert_eq!(loader.len(), 2);

        let frames: Vec<_> = loader.collect();
        assert_eq!(frames[0].0.as_ref().unwrap(), b"first");
        assert_eq!(frames[1].0.as_ref().unwrap(), b"second");
        assert_eq!(frames[1].1.frame_idx, 1);
        assert_eq!(frames[1].1.total_frames, 2);
        assert_eq!(frames[1].1.frame_name(), "2.jpg");
    }

    #[test]
    fn test_loader_reports_missing_file_per_frame() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("present.jpg");
        fs::write(&present, b"ok").unwrap();
        let missing = temp_dir.path().join("missing.jpg");

        let mut loader = SourceLoader::new(&Source::ImagePathVec(vec![missing, present])).unwrap();

        let (payload, meta) = loader.next().unwrap();
        assert!(matches!(payload, Err(AppError::Io(_))));
        assert_eq!(meta.frame_name(), "missing.jpg");

        let (payload, _) = loader.next().unwrap();
        assert_eq!(payload.unwrap(), b"ok");
        assert!(loader.next().is_none());
    }

    #[test]
    fn test_loader_encodes_in_memory_image() {
        let source = Source::Image(DynamicImage::ImageRgb8(RgbImage::new(4, 4)));
        let mut loader = SourceLoader::new(&source).unwrap();

        let (payload, meta) = loader.next().unwrap();
        assert!(payload.unwrap().starts_with(b"\x89PNG"));
        assert!(meta.source_path.is_none());
    }

    #[test]
    fn test_loader_empty_source() {
        let loader = SourceLoader::new(&Source::None).unwrap();
        assert!(loader.is_empty());
    }
}
