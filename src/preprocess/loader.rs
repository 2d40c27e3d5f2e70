//! Image file loading and batch planning

use crate::error::{AppError, ErrorContext, Result};
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};

/// Decode an image file
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    image::open(path)
        .map_err(AppError::from)
        .with_context(|| format!("Failed to load image {}", path.display()))
}

/// Files in `dir` whose extension is a supported image format, sorted by path
pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir)
        .map_err(AppError::from)
        .with_context(|| format!("Failed to read input directory {}", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && ImageFormat::from_path(&path).is_ok() {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Partition the images of `dir` into consecutive batches of `batch_size`.
///
/// Every batch is full except possibly the last one. An empty directory
/// yields no batches.
pub fn generate_batches<P: AsRef<Path>>(dir: P, batch_size: usize) -> Result<Vec<Vec<PathBuf>>> {
    if batch_size == 0 {
        return Err(AppError::validation("Batch size must be greater than 0"));
    }
    let images = list_images(dir)?;
    Ok(images.chunks(batch_size).map(|chunk| chunk.to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_images(dir: &Path, count: usize) {
        for i in 0..count {
            let img = RgbImage::from_pixel(4, 4, Rgb([i as u8, 0, 0]));
            img.save(dir.join(format!("img_{:02}.png", i))).unwrap();
        }
    }

    #[test]
    fn test_generate_batches_with_remainder() {
        let dir = TempDir::new().unwrap();
        write_images(dir.path(), 10);

        let batches = generate_batches(dir.path(), 4).unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert!(batches[0][0].ends_with("img_00.png"));
        assert!(batches[2][1].ends_with("img_09.png"));
    }

    #[test]
    fn test_generate_batches_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(generate_batches(dir.path(), 3).unwrap().is_empty());
    }

    #[test]
    fn test_list_images_skips_other_files() {
        let dir = TempDir::new().unwrap();
        write_images(dir.path(), 2);
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        assert_eq!(list_images(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let err = generate_batches("/definitely/not/here", 2).unwrap_err();
        assert_eq!(err.category(), "IO");
        assert!(generate_batches(".", 0).is_err());
    }

    #[test]
    fn test_load_image_errors() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("broken.jpg");
        std::fs::write(&bogus, b"not really a jpeg").unwrap();

        assert!(load_image(&bogus).is_err());
        assert!(load_image(dir.path().join("missing.jpg")).is_err());
    }
}
