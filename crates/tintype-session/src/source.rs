use tintype_core::raster::RasterBuffer;

/// Supplies one raw frame per capture, mirrored horizontally like a
/// selfie preview. Synchronous from the session's point of view; an
/// adapter may block on hardware internally.
///
/// The contract is succeed-or-error: a source must never hand back a
/// malformed buffer, and an error aborts the whole session.
pub trait FrameSource {
    fn capture_frame(&mut self) -> anyhow::Result<RasterBuffer>;
}

/// Fixed-color source for tests and dry runs.
pub struct SolidFrameSource {
    pub width: u32,
    pub height: u32,
    pub rgb: [u8; 3],
}

impl FrameSource for SolidFrameSource {
    fn capture_frame(&mut self) -> anyhow::Result<RasterBuffer> {
        Ok(RasterBuffer::solid(self.width, self.height, self.rgb))
    }
}

/// Source that fails after a set number of frames, for abort-path tests.
pub struct FailingFrameSource {
    pub succeed_first: usize,
    captured: usize,
}

impl FailingFrameSource {
    pub fn new(succeed_first: usize) -> Self {
        Self {
            succeed_first,
            captured: 0,
        }
    }
}

impl FrameSource for FailingFrameSource {
    fn capture_frame(&mut self) -> anyhow::Result<RasterBuffer> {
        if self.captured < self.succeed_first {
            self.captured += 1;
            Ok(RasterBuffer::solid(8, 8, [128, 128, 128]))
        } else {
            anyhow::bail!("frame grab failed")
        }
    }
}
