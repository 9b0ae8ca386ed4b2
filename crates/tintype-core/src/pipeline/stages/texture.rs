use anyhow::Result;
use rand::Rng;
use rand::rngs::StdRng;

use crate::filter::OverlayPlan;
use crate::pipeline::stage::{PipelineStage, RenderParams};
use crate::raster::RasterBuffer;

/// Procedural film-texture layers: light leaks, grain, dust/scratches and
/// a vignette, composited back-to-front in that fixed order so later
/// layers sit visually on top.
pub struct TextureOverlay;

impl PipelineStage for TextureOverlay {
    fn name(&self) -> &str {
        "texture"
    }

    fn process(
        &self,
        input: RasterBuffer,
        params: &RenderParams,
        rng: &mut StdRng,
    ) -> Result<RasterBuffer> {
        let plan = params.filter.overlay_plan();
        Ok(apply_overlays(
            input,
            &plan,
            params.intensity,
            params.grain,
            rng,
        ))
    }
}

pub fn apply_overlays(
    mut buf: RasterBuffer,
    plan: &OverlayPlan,
    intensity: f64,
    grain_strength: f64,
    rng: &mut StdRng,
) -> RasterBuffer {
    let intensity = intensity.clamp(0.0, 1.0);
    if buf.pixel_count() == 0 {
        return buf;
    }

    if plan.light_leak * intensity > 0.0 {
        apply_light_leaks(&mut buf, plan.light_leak * intensity);
    }
    if plan.grain * grain_strength > 0.0 {
        apply_grain(&mut buf, plan.grain * grain_strength, rng);
    }
    if plan.dust * intensity > 0.0 {
        apply_dust(&mut buf, plan.dust * intensity, rng);
    }
    if plan.vignette * intensity > 0.0 {
        apply_vignette(&mut buf, plan.vignette * intensity);
    }
    buf
}

/// Warm radial gradients anchored near corners/edges, screen-blended so
/// they only ever brighten.
fn apply_light_leaks(buf: &mut RasterBuffer, strength: f64) {
    // Anchor positions are fractions of the frame; colors are a design
    // choice, what matters is the warm cast and the opacity scaling.
    const LEAKS: [(f64, f64, [f64; 3]); 3] = [
        (1.0, 0.0, [255.0, 160.0, 90.0]),
        (0.0, 1.0, [255.0, 120.0, 60.0]),
        (1.0, 0.55, [255.0, 200.0, 120.0]),
    ];

    let w = buf.width as f64;
    let h = buf.height as f64;
    let radius = 0.55 * w.min(h);

    for y in 0..buf.height {
        for x in 0..buf.width {
            let mut pixel = buf.pixel(x, y);
            for (ax, ay, leak) in LEAKS {
                let dx = x as f64 - ax * (w - 1.0);
                let dy = y as f64 - ay * (h - 1.0);
                let d = (dx * dx + dy * dy).sqrt();
                let alpha = (1.0 - d / radius).max(0.0) * strength;
                if alpha <= 0.0 {
                    continue;
                }
                for c in 0..3 {
                    let src = pixel[c] as f64;
                    let screened = 255.0 - (255.0 - src) * (255.0 - leak[c] * alpha) / 255.0;
                    pixel[c] = screened.clamp(0.0, 255.0) as u8;
                }
            }
            buf.put_pixel(x, y, pixel);
        }
    }
}

/// Monochromatic additive noise: one offset per pixel, applied to all
/// three channels so the grain reads as silver rather than confetti.
fn apply_grain(buf: &mut RasterBuffer, amplitude: f64, rng: &mut StdRng) {
    let amp = amplitude * 255.0;
    for pixel in buf.data.chunks_exact_mut(3) {
        let offset = rng.gen_range(-1.0..=1.0) * amp;
        for c in pixel.iter_mut() {
            *c = (*c as f64 + offset).clamp(0.0, 255.0) as u8;
        }
    }
}

/// Short scratch segments and small dust discs, alternating light/dark,
/// counts proportional to image area.
fn apply_dust(buf: &mut RasterBuffer, strength: f64, rng: &mut StdRng) {
    let area = buf.pixel_count();
    let scratches = (area / 30_000).max(2);
    let specks = (area / 12_000).max(4);
    let delta = 70.0 * strength;

    for i in 0..scratches {
        let x0 = rng.gen_range(0..buf.width) as f64;
        let y0 = rng.gen_range(0..buf.height) as f64;
        let len = rng.gen_range(8..=28);
        // Scratches run roughly vertically, like film transport marks.
        let angle = -std::f64::consts::FRAC_PI_2 + rng.gen_range(-0.35..=0.35);
        let signed = if i % 2 == 0 { delta } else { -delta };
        let (dy, dx) = angle.sin_cos();
        for t in 0..len {
            let px = x0 + dx * t as f64;
            let py = y0 + dy * t as f64;
            if px >= 0.0 && py >= 0.0 && (px as u32) < buf.width && (py as u32) < buf.height {
                add_to_pixel(buf, px as u32, py as u32, signed);
            }
        }
    }

    for i in 0..specks {
        let cx = rng.gen_range(0..buf.width) as i64;
        let cy = rng.gen_range(0..buf.height) as i64;
        let radius = rng.gen_range(1..=2) as i64;
        let signed = if i % 2 == 0 { delta * 0.8 } else { -delta * 0.8 };
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let px = cx + dx;
                let py = cy + dy;
                if px >= 0 && py >= 0 && (px as u32) < buf.width && (py as u32) < buf.height {
                    add_to_pixel(buf, px as u32, py as u32, signed);
                }
            }
        }
    }
}

fn add_to_pixel(buf: &mut RasterBuffer, x: u32, y: u32, delta: f64) {
    let mut pixel = buf.pixel(x, y);
    for c in pixel.iter_mut() {
        *c = (*c as f64 + delta).clamp(0.0, 255.0) as u8;
    }
    buf.put_pixel(x, y, pixel);
}

/// Radial darkening: fully transparent inside 0.3x the short dimension,
/// full opacity from 0.8x outward, multiply-blended.
fn apply_vignette(buf: &mut RasterBuffer, strength: f64) {
    let cx = (buf.width as f64 - 1.0) / 2.0;
    let cy = (buf.height as f64 - 1.0) / 2.0;
    let short = buf.width.min(buf.height) as f64;
    let inner = 0.3 * short;
    let outer = 0.8 * short;

    for y in 0..buf.height {
        for x in 0..buf.width {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            let t = ((d - inner) / (outer - inner)).clamp(0.0, 1.0);
            let alpha = t * strength;
            if alpha <= 0.0 {
                continue;
            }
            let mut pixel = buf.pixel(x, y);
            for c in pixel.iter_mut() {
                *c = (*c as f64 * (1.0 - alpha)).clamp(0.0, 255.0) as u8;
            }
            buf.put_pixel(x, y, pixel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn mid_gray(w: u32, h: u32) -> RasterBuffer {
        RasterBuffer::solid(w, h, [128, 128, 128])
    }

    #[test]
    fn empty_plan_is_identity() {
        let buf = mid_gray(32, 32);
        let expected = buf.clone();
        let out = apply_overlays(buf, &OverlayPlan::NONE, 1.0, 1.0, &mut rng());
        assert_eq!(out, expected);
    }

    #[test]
    fn zero_intensity_disables_everything_but_grain() {
        // Grain scales with its own knob; setting both to 0 is a no-op.
        let plan = Filter::Vintage.overlay_plan();
        let buf = mid_gray(32, 32);
        let expected = buf.clone();
        let out = apply_overlays(buf, &plan, 0.0, 0.0, &mut rng());
        assert_eq!(out, expected);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let plan = Filter::Vintage.overlay_plan();
        let buf = mid_gray(48, 40);
        let a = apply_overlays(buf.clone(), &plan, 0.8, 0.5, &mut rng());
        let b = apply_overlays(buf, &plan, 0.8, 0.5, &mut rng());
        assert_eq!(a, b);
    }

    #[test]
    fn vignette_darkens_corners_not_center() {
        let mut buf = mid_gray(100, 100);
        apply_vignette(&mut buf, 0.7);
        assert_eq!(buf.pixel(50, 50), [128, 128, 128], "center inside 0.3r");
        let corner = buf.pixel(0, 0);
        assert!(corner[0] < 128, "corner should darken, got {}", corner[0]);
    }

    #[test]
    fn vignette_strength_scales_darkening() {
        let mut weak = mid_gray(100, 100);
        let mut strong = mid_gray(100, 100);
        apply_vignette(&mut weak, 0.2);
        apply_vignette(&mut strong, 0.9);
        assert!(strong.pixel(0, 0)[0] < weak.pixel(0, 0)[0]);
    }

    #[test]
    fn light_leaks_only_brighten() {
        let before = mid_gray(64, 64);
        let mut after = before.clone();
        apply_light_leaks(&mut after, 0.6);
        for (a, b) in after.data.iter().zip(before.data.iter()) {
            assert!(a >= b, "screen blend must not darken: {a} < {b}");
        }
        assert_ne!(after, before, "some pixels should have brightened");
    }

    #[test]
    fn light_leak_is_warm_at_anchor() {
        let mut buf = RasterBuffer::solid(64, 64, [40, 40, 40]);
        apply_light_leaks(&mut buf, 0.8);
        let [r, g, b] = buf.pixel(63, 0); // top-right anchor
        assert!(r > g && g >= b, "leak should be warm: {r},{g},{b}");
    }

    #[test]
    fn grain_respects_amplitude_bound() {
        const AMPLITUDE: f64 = 0.1;
        let mut buf = mid_gray(32, 32);
        apply_grain(&mut buf, AMPLITUDE, &mut rng());
        let bound = (AMPLITUDE * 255.0).ceil() as i32 + 1;
        for &v in &buf.data {
            assert!(
                (v as i32 - 128).abs() <= bound,
                "grain exceeded amplitude: {v}"
            );
        }
    }

    #[test]
    fn grain_is_monochromatic() {
        let mut buf = mid_gray(16, 16);
        apply_grain(&mut buf, 0.2, &mut rng());
        for pixel in buf.data.chunks_exact(3) {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
        }
    }

    #[test]
    fn grain_changes_pixels() {
        let before = mid_gray(32, 32);
        let mut after = before.clone();
        apply_grain(&mut after, 0.15, &mut rng());
        assert_ne!(after, before);
    }

    #[test]
    fn dust_touches_a_bounded_region() {
        let before = mid_gray(200, 200);
        let mut after = before.clone();
        apply_dust(&mut after, 0.5, &mut rng());
        let changed = after
            .data
            .iter()
            .zip(before.data.iter())
            .filter(|(a, b)| a != b)
            .count();
        assert!(changed > 0, "dust should mark some pixels");
        assert!(
            changed < before.data.len() / 10,
            "dust should stay sparse, changed {changed}"
        );
    }

    #[test]
    fn bw_plan_applies_no_leak_or_dust() {
        // Compare a bw render against grain+vignette alone: identical
        // when driven by the same seed.
        let plan = Filter::Bw.overlay_plan();
        let buf = mid_gray(64, 64);
        let full = apply_overlays(buf.clone(), &plan, 1.0, 0.5, &mut rng());

        let mut manual = buf;
        let mut r = rng();
        apply_grain(&mut manual, plan.grain * 0.5, &mut r);
        apply_vignette(&mut manual, plan.vignette);
        assert_eq!(full, manual);
    }

    #[test]
    fn vintage_plan_contributes_leak_and_dust() {
        let bw = Filter::Bw.overlay_plan();
        let vintage = Filter::Vintage.overlay_plan();
        assert_eq!(bw.light_leak, 0.0);
        assert_eq!(bw.dust, 0.0);
        assert!(vintage.light_leak > 0.0);
        assert!(vintage.dust > 0.0);

        // The leak layer visibly brightens the vintage top-right corner.
        let buf = RasterBuffer::solid(64, 64, [50, 50, 50]);
        let out = apply_overlays(buf.clone(), &vintage, 1.0, 0.0, &mut rng());
        assert!(out.pixel(63, 0)[0] > buf.pixel(63, 0)[0]);
    }
}
