/// 8-bit interleaved RGB raster buffer.
///
/// All pixel data is stored as RGBRGBRGB... in display-referred sRGB.
/// Buffers move between pipeline stages by value; no stage keeps a
/// reference to a buffer after handing it forward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuffer {
    pub width: u32,
    pub height: u32,
    /// Flat pixel data: [R, G, B, R, G, B, ...].
    pub data: Vec<u8>,
}

impl RasterBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 3) as usize],
        }
    }

    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> anyhow::Result<Self> {
        let expected = (width * height * 3) as usize;
        anyhow::ensure!(
            data.len() == expected,
            "expected {expected} bytes for {width}x{height} RGB, got {}",
            data.len()
        );
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Uniform fill constructor, mostly useful for tests and backgrounds.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Read one pixel. Callers must stay in bounds; stages iterate over
    /// their own dimensions so this is an internal precondition.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y * self.width + x) * 3) as usize;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let idx = ((y * self.width + x) * 3) as usize;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    /// In-place horizontal flip. Camera frames arrive mirrored so the
    /// preview matches what the subject sees.
    pub fn mirror_horizontal(&mut self) {
        let w = self.width as usize;
        for y in 0..self.height as usize {
            let row = &mut self.data[y * w * 3..(y + 1) * w * 3];
            for x in 0..w / 2 {
                let left = x * 3;
                let right = (w - 1 - x) * 3;
                for c in 0..3 {
                    row.swap(left + c, right + c);
                }
            }
        }
    }

}
