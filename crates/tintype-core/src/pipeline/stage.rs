use anyhow::Result;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::raster::RasterBuffer;

/// Everything a render needs, carried explicitly instead of living in
/// ambient state. One value per render; never mutated mid-render.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RenderParams {
    pub filter: Filter,
    /// Blend between the untouched image (0.0) and the full template (1.0).
    pub intensity: f64,
    /// Opacity of the synthetic grain layer, independent of intensity.
    pub grain: f64,
    /// Per-photo output dimensions inside the strip.
    pub photo_width: u32,
    pub photo_height: u32,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            filter: Filter::Color,
            intensity: 1.0,
            grain: 0.5,
            photo_width: 300,
            photo_height: 225,
        }
    }
}

/// A single step in the per-photo processing chain.
///
/// Stages consume their input and return a new (or reused) buffer, so a
/// buffer only ever has one owner. The RNG is only touched by stages that
/// synthesize texture; passing it explicitly keeps renders reproducible
/// under a fixed seed.
pub trait PipelineStage: Send + Sync {
    fn name(&self) -> &str;
    fn process(
        &self,
        input: RasterBuffer,
        params: &RenderParams,
        rng: &mut StdRng,
    ) -> Result<RasterBuffer>;
}
