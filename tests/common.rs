use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Encode a small gradient image as a baseline JPEG.
pub fn test_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut bytes), 95)
        .encode_image(&img)
        .unwrap();
    bytes
}

pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, test_jpeg_bytes(width, height)).unwrap();
}

/// Input tree with a top-level image, a nested image and a non-image file:
///
///   a.jpg
///   notes.txt
///   sub/b.jpg
pub fn create_input_tree(root: &Path) -> (PathBuf, PathBuf) {
    let a = root.join("a.jpg");
    write_test_jpeg(&a, 32, 24);
    std::fs::write(root.join("notes.txt"), b"not an image").unwrap();

    let sub = root.join("sub");
    std::fs::create_dir(&sub).unwrap();
    let b = sub.join("b.jpg");
    write_test_jpeg(&b, 16, 16);

    (a, b)
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}
