use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use std::path::PathBuf;

use crate::error::Result;

pub fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(
            ext.as_str(),
            "jpg" | "jpeg" | "png" | "bmp" | "gif" | "webp" | "tiff" | "tif"
        )
    })
}

/// Image files directly inside `dir`, sorted by path
pub fn collect_images_from_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut image_paths = vec![];
    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.is_file() && is_image_file(&path) {
            image_paths.push(path);
        }
    }
    image_paths.sort();
    Ok(image_paths)
}

/// Encode an in-memory image as PNG bytes for upload
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
