use std::path::{Path, PathBuf};

use tracing::{info, warn};

use tintype_core::raster::RasterBuffer;

/// Upload-path failures. Reported per file; the strip pipeline keeps
/// going as long as at least one frame loads.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unsupported image format: {path}")]
    UnsupportedFormat { path: PathBuf },
    #[error("corrupt or unreadable image: {path}")]
    CorruptFile {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    /// Reserved for device adapters that wrap slow hardware reads.
    #[error("timed out reading: {path}")]
    Timeout { path: PathBuf },
    #[error("no usable frames: every upload failed to load")]
    NoUsableFrames,
}

fn is_supported_extension(ext: &str) -> bool {
    matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png")
}

/// Decode one uploaded image into an RGB raster buffer.
pub fn load_frame(path: &Path) -> Result<RasterBuffer, LoadError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !is_supported_extension(ext) {
        return Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let img = image::open(path).map_err(|err| LoadError::CorruptFile {
        path: path.to_path_buf(),
        source: err.into(),
    })?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    RasterBuffer::from_data(width, height, rgb.into_raw()).map_err(|err| LoadError::CorruptFile {
        path: path.to_path_buf(),
        source: err,
    })
}

/// Decode an in-memory upload (format sniffed from the bytes).
pub fn load_frame_bytes(bytes: &[u8]) -> Result<RasterBuffer, LoadError> {
    let placeholder = PathBuf::from("<memory>");
    let img = image::load_from_memory(bytes).map_err(|err| match err {
        image::ImageError::Unsupported(_) => LoadError::UnsupportedFormat {
            path: placeholder.clone(),
        },
        other => LoadError::CorruptFile {
            path: placeholder.clone(),
            source: other.into(),
        },
    })?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    RasterBuffer::from_data(width, height, rgb.into_raw()).map_err(|err| LoadError::CorruptFile {
        path: placeholder,
        source: err,
    })
}

/// Load the uploads for one strip, tolerating partial failure.
///
/// Files that fail to load are logged and skipped; the last good frame is
/// duplicated to pad the sequence up to `count`. Extra frames beyond
/// `count` are dropped. Fails only when nothing loads at all.
pub fn load_strip_frames(paths: &[PathBuf], count: usize) -> Result<Vec<RasterBuffer>, LoadError> {
    let mut frames: Vec<RasterBuffer> = Vec::with_capacity(count);
    let mut failures = 0usize;

    for path in paths {
        match load_frame(path) {
            Ok(frame) => frames.push(frame),
            Err(err) => {
                warn!(?path, %err, "skipping upload");
                failures += 1;
            }
        }
    }

    if frames.is_empty() {
        return Err(LoadError::NoUsableFrames);
    }

    while frames.len() < count {
        let last = frames[frames.len() - 1].clone();
        frames.push(last);
    }
    frames.truncate(count);

    info!(
        loaded = paths.len() - failures,
        failures,
        padded_to = count,
        "uploads ready"
    );
    Ok(frames)
}
