use anyhow::Result;
use rand::rngs::StdRng;

use crate::pipeline::stage::{PipelineStage, RenderParams};
use crate::raster::RasterBuffer;

/// Center-crop to the target aspect ratio, then bilinear-resample to the
/// exact target dimensions.
pub struct CropResize;

impl PipelineStage for CropResize {
    fn name(&self) -> &str {
        "crop_resize"
    }

    fn process(
        &self,
        input: RasterBuffer,
        params: &RenderParams,
        _rng: &mut StdRng,
    ) -> Result<RasterBuffer> {
        crop_and_resize(input, params.photo_width, params.photo_height)
    }
}

/// Largest centered rectangle of `src` matching the target aspect ratio,
/// resampled to exactly `target_w` x `target_h`. A wider source is cropped
/// horizontally, a taller one vertically; an exact aspect match crops
/// nothing. Deterministic for a given source and target size.
pub fn crop_and_resize(src: RasterBuffer, target_w: u32, target_h: u32) -> Result<RasterBuffer> {
    anyhow::ensure!(target_w > 0 && target_h > 0, "target dimensions must be nonzero");
    anyhow::ensure!(
        src.width > 0 && src.height > 0,
        "source buffer must be nonzero"
    );

    let (crop_w, crop_h) = if src.width as u64 * target_h as u64 > src.height as u64 * target_w as u64
    {
        // Source is wider than the target aspect: trim the sides.
        let w = (src.height as u64 * target_w as u64 / target_h as u64).max(1) as u32;
        (w.min(src.width), src.height)
    } else {
        let h = (src.width as u64 * target_h as u64 / target_w as u64).max(1) as u32;
        (src.width, h.min(src.height))
    };
    let crop_x = (src.width - crop_w) / 2;
    let crop_y = (src.height - crop_h) / 2;

    if crop_w == target_w && crop_h == target_h {
        // No resample needed: copy rows straight out of the crop window so
        // a same-size crop is a bitwise identity.
        let mut data = Vec::with_capacity((target_w * target_h * 3) as usize);
        for row in crop_y..crop_y + crop_h {
            let start = ((row * src.width + crop_x) * 3) as usize;
            data.extend_from_slice(&src.data[start..start + (crop_w * 3) as usize]);
        }
        return RasterBuffer::from_data(target_w, target_h, data);
    }

    let scale_x = crop_w as f64 / target_w as f64;
    let scale_y = crop_h as f64 / target_h as f64;
    let mut data = Vec::with_capacity((target_w * target_h * 3) as usize);

    for dst_y in 0..target_h {
        let sy = ((dst_y as f64 + 0.5) * scale_y - 0.5).clamp(0.0, (crop_h - 1) as f64);
        let y0 = sy.floor() as u32;
        let y1 = (y0 + 1).min(crop_h - 1);
        let fy = sy - y0 as f64;

        for dst_x in 0..target_w {
            let sx = ((dst_x as f64 + 0.5) * scale_x - 0.5).clamp(0.0, (crop_w - 1) as f64);
            let x0 = sx.floor() as u32;
            let x1 = (x0 + 1).min(crop_w - 1);
            let fx = sx - x0 as f64;

            let p00 = src.pixel(crop_x + x0, crop_y + y0);
            let p10 = src.pixel(crop_x + x1, crop_y + y0);
            let p01 = src.pixel(crop_x + x0, crop_y + y1);
            let p11 = src.pixel(crop_x + x1, crop_y + y1);

            for c in 0..3 {
                let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
                let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
                let v = top * (1.0 - fy) + bottom * fy;
                data.push((v + 0.5).clamp(0.0, 255.0) as u8);
            }
        }
    }

    RasterBuffer::from_data(target_w, target_h, data)
}
