use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use image::RgbImage;
use tracing::info;

use tintype_core::raster::RasterBuffer;

/// Encode a finished strip as PNG bytes (lossless, full quality).
pub fn encode_png(buf: &RasterBuffer) -> Result<Vec<u8>> {
    let img = RgbImage::from_raw(buf.width, buf.height, buf.data.clone())
        .context("failed to create image from buffer")?;
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .context("encode strip as PNG")?;
    Ok(bytes)
}

/// Write a finished strip to disk as PNG.
pub fn save_png(buf: &RasterBuffer, path: &Path) -> Result<()> {
    let bytes = encode_png(buf)?;
    std::fs::write(path, &bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), size = bytes.len(), "strip saved");
    Ok(())
}

/// Timestamp-based output name, unique enough for a booth that produces
/// at most one strip per session.
pub fn timestamp_file_name(prefix: &str) -> String {
    format!("{prefix}-{}.png", Local::now().format("%Y%m%d-%H%M%S"))
}

/// Polaroid date stamp in the classic `DD MM 'YY` form.
pub fn date_stamp() -> String {
    Local::now().format("%d %m '%y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::load_frame;

    #[test]
    fn png_roundtrip_is_lossless() {
        let mut buf = RasterBuffer::new(10, 6);
        for y in 0..6 {
            for x in 0..10 {
                buf.put_pixel(x, y, [x as u8 * 20, y as u8 * 40, 128]);
            }
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strip.png");
        save_png(&buf, &path).unwrap();

        let back = load_frame(&path).unwrap();
        assert_eq!(back, buf);
    }

    #[test]
    fn encode_produces_png_magic() {
        let buf = RasterBuffer::solid(4, 4, [1, 2, 3]);
        let bytes = encode_png(&buf).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn timestamp_name_shape() {
        let name = timestamp_file_name("strip");
        assert!(name.starts_with("strip-"));
        assert!(name.ends_with(".png"));
        // strip- + 8 date digits + - + 6 time digits + .png
        assert_eq!(name.len(), "strip-".len() + 15 + ".png".len());
    }

    #[test]
    fn date_stamp_shape() {
        let stamp = date_stamp();
        assert_eq!(stamp.len(), 9, "DD MM 'YY: {stamp}");
        assert_eq!(&stamp[6..7], "'");
    }
}
