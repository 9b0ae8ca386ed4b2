use std::path::PathBuf;

use tracing::warn;

use tintype_core::raster::RasterBuffer;
use tintype_session::{FrameSource, SessionError};

use crate::load::load_frame;

/// Frame source backed by preloaded images, standing in for a live
/// camera. Frames cycle so a session can capture more photos than there
/// are files, and each capture is mirrored like a real preview feed.
#[derive(Debug)]
pub struct FileFrameSource {
    frames: Vec<RasterBuffer>,
    next: usize,
}

impl FileFrameSource {
    pub fn new(frames: Vec<RasterBuffer>) -> Result<Self, SessionError> {
        if frames.is_empty() {
            return Err(SessionError::DeviceUnavailable);
        }
        Ok(Self { frames, next: 0 })
    }

    /// Load every readable file; unreadable ones are skipped with a
    /// warning. No readable file at all means no device.
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self, SessionError> {
        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            match load_frame(path) {
                Ok(frame) => frames.push(frame),
                Err(err) => warn!(?path, %err, "skipping source file"),
            }
        }
        Self::new(frames)
    }
}

impl FrameSource for FileFrameSource {
    fn capture_frame(&mut self) -> anyhow::Result<RasterBuffer> {
        let mut frame = self.frames[self.next].clone();
        self.next = (self.next + 1) % self.frames.len();
        frame.mirror_horizontal();
        Ok(frame)
    }
}
