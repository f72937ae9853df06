use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::canvas::{PixelBuffer, check_dimensions};
use crate::error::{EditorError, Result};

/// Suffix appended to the file stem of exported cut-outs.
pub const EXPORT_SUFFIX: &str = "-no-bg";

/// Input extensions accepted by batch mode (lowercase).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode any supported format into an RGBA buffer. Empty, corrupt or
/// zero-sized input is an [`EditorError::Input`].
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer> {
    if bytes.is_empty() {
        return Err(EditorError::Input("empty image data".into()));
    }
    let img = image::load_from_memory(bytes)
        .map_err(|e| EditorError::Input(format!("cannot decode image: {}", e)))?;
    check_dimensions(img.width(), img.height())?;
    PixelBuffer::from_rgba_image(&img.to_rgba8())
}

pub fn load_image_file(path: &Path) -> Result<PixelBuffer> {
    let bytes = std::fs::read(path)?;
    decode_image(&bytes)
}

/// Lossless RGBA PNG. Alpha is stored exactly.
pub fn encode_png(buf: &PixelBuffer) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(buf.memory_bytes() / 2);
    PngEncoder::new(&mut out)
        .write_image(buf.as_raw(), buf.width(), buf.height(), ColorType::Rgba8)
        .map_err(|e| EditorError::Export(e.to_string()))?;
    Ok(out)
}

/// Encode and write a PNG to `path`.
pub fn write_png(buf: &PixelBuffer, path: &Path) -> Result<()> {
    let bytes = encode_png(buf)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// `photo.jpg` → `photo-no-bg.png`.
pub fn output_file_name(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    format!("{}{}.png", stem, EXPORT_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trip_preserves_alpha_exactly() {
        let mut buf = PixelBuffer::new(3, 2);
        buf.put_pixel(0, 0, [255, 0, 0, 1]);
        buf.put_pixel(2, 1, [9, 8, 7, 254]);
        let bytes = encode_png(&buf).unwrap();
        assert_eq!(decode_image(&bytes).unwrap(), buf);
    }

    #[test]
    fn garbage_and_empty_input_are_rejected() {
        assert!(matches!(decode_image(&[]), Err(EditorError::Input(_))));
        assert!(matches!(decode_image(b"not an image"), Err(EditorError::Input(_))));
    }

    #[test]
    fn export_names() {
        assert_eq!(output_file_name("photo.jpg"), "photo-no-bg.png");
        assert_eq!(output_file_name("/tmp/a.b.webp"), "a.b-no-bg.png");
        assert_eq!(output_file_name(""), "image-no-bg.png");
    }

    #[test]
    fn write_png_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        write_png(&PixelBuffer::new_filled(4, 4, [1, 2, 3, 4]), &path).unwrap();
        let back = load_image_file(&path).unwrap();
        assert_eq!(back.get_pixel(3, 3), [1, 2, 3, 4]);
    }

    #[test]
    fn extension_filter() {
        assert!(is_supported_extension(Path::new("a/B.JPG")));
        assert!(!is_supported_extension(Path::new("notes.txt")));
        assert!(!is_supported_extension(Path::new("noext")));
    }
}
