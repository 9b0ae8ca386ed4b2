use anyhow::Result;
use rand::rngs::StdRng;

use crate::color;
use crate::filter::{Filter, FilterTemplate};
use crate::pipeline::stage::{PipelineStage, RenderParams};
use crate::raster::RasterBuffer;

/// Per-pixel color grading for the active filter.
pub struct ColorGrade;

impl PipelineStage for ColorGrade {
    fn name(&self) -> &str {
        "grade"
    }

    fn process(
        &self,
        input: RasterBuffer,
        params: &RenderParams,
        _rng: &mut StdRng,
    ) -> Result<RasterBuffer> {
        Ok(match params.filter {
            Filter::Color => input,
            Filter::Bw => apply_grayscale(input),
            other => match other.template() {
                Some(template) => apply_filter(input, template, params.intensity),
                None => input,
            },
        })
    }
}

/// Blend a factor toward its identity value: intensity 0 leaves the image
/// untouched, intensity 1 applies the template knob verbatim.
fn blend_factor(knob: f64, intensity: f64) -> f64 {
    knob * intensity + (1.0 - intensity)
}

/// Apply one grading template at the given intensity.
///
/// Stage order is fixed; each stage consumes the previous one's output:
/// sepia blend, brightness, contrast, saturation, hue rotation.
pub fn apply_filter(mut input: RasterBuffer, template: &FilterTemplate, intensity: f64) -> RasterBuffer {
    let intensity = intensity.clamp(0.0, 1.0);
    if intensity == 0.0 {
        return input;
    }

    let sepia = template.sepia * intensity;
    let brightness = blend_factor(template.brightness, intensity);
    let contrast = blend_factor(template.contrast, intensity);
    let saturate = blend_factor(template.saturate, intensity);
    let hue_deg = template.hue_rotate_deg * intensity;
    let hue_matrix = (hue_deg != 0.0).then(|| color::hue_rotate_matrix(hue_deg));

    for pixel in input.data.chunks_exact_mut(3) {
        let mut r = pixel[0] as f64;
        let mut g = pixel[1] as f64;
        let mut b = pixel[2] as f64;

        if sepia > 0.0 {
            let y = color::luminance(r, g, b);
            let [tr, tg, tb] = color::sepia_target(y);
            r += (tr - r) * sepia;
            g += (tg - g) * sepia;
            b += (tb - b) * sepia;
        }

        if brightness != 1.0 {
            r = (r * brightness).min(255.0);
            g = (g * brightness).min(255.0);
            b = (b * brightness).min(255.0);
        }

        if contrast != 1.0 {
            r = (((r / 255.0 - 0.5) * contrast + 0.5) * 255.0).clamp(0.0, 255.0);
            g = (((g / 255.0 - 0.5) * contrast + 0.5) * 255.0).clamp(0.0, 255.0);
            b = (((b / 255.0 - 0.5) * contrast + 0.5) * 255.0).clamp(0.0, 255.0);
        }

        if saturate != 1.0 {
            // Luminance of the *current* pixel, after brightness/contrast.
            let y = color::luminance(r, g, b);
            r = (y + (r - y) * saturate).clamp(0.0, 255.0);
            g = (y + (g - y) * saturate).clamp(0.0, 255.0);
            b = (y + (b - y) * saturate).clamp(0.0, 255.0);
        }

        if let Some(m) = &hue_matrix {
            let [nr, ng, nb] = color::apply_matrix(m, r, g, b);
            r = nr.clamp(0.0, 255.0);
            g = ng.clamp(0.0, 255.0);
            b = nb.clamp(0.0, 255.0);
        }

        pixel[0] = (r + 0.5) as u8;
        pixel[1] = (g + 0.5) as u8;
        pixel[2] = (b + 0.5) as u8;
    }

    input
}

/// Luminance conversion followed by a fixed 1.1x contrast boost. The bw
/// look has no intensity knob.
pub fn apply_grayscale(mut input: RasterBuffer) -> RasterBuffer {
    const BW_CONTRAST: f64 = 1.1;
    for pixel in input.data.chunks_exact_mut(3) {
        let y = color::luminance(pixel[0] as f64, pixel[1] as f64, pixel[2] as f64);
        let v = (((y / 255.0 - 0.5) * BW_CONTRAST + 0.5) * 255.0).clamp(0.0, 255.0);
        let v = (v + 0.5) as u8;
        pixel[0] = v;
        pixel[1] = v;
        pixel[2] = v;
    }
    input
}
