use serde::{Deserialize, Serialize};

/// Stylistic look applied to every photo in a strip.
///
/// Resolved once when the user picks a filter; the per-pixel loops only
/// ever see the resolved template and overlay plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Identity: no grading, no overlays.
    Color,
    /// Pure grayscale with a fixed contrast boost. No intensity knob.
    Bw,
    Vintage,
    Retro,
    Polaroid,
    FadedFilm,
}

/// Color-grading coefficients for one named look.
///
/// Knobs an original template leaves out sit at their identity values
/// (sepia 0, contrast/brightness/saturate 1, hue 0), which is equivalent
/// under intensity blending.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterTemplate {
    pub sepia: f64,
    pub contrast: f64,
    pub brightness: f64,
    pub saturate: f64,
    pub hue_rotate_deg: f64,
}

impl Default for FilterTemplate {
    fn default() -> Self {
        Self {
            sepia: 0.0,
            contrast: 1.0,
            brightness: 1.0,
            saturate: 1.0,
            hue_rotate_deg: 0.0,
        }
    }
}

pub const VINTAGE: FilterTemplate = FilterTemplate {
    sepia: 0.35,
    contrast: 0.90,
    brightness: 0.95,
    saturate: 0.70,
    hue_rotate_deg: -4.0,
};

pub const RETRO: FilterTemplate = FilterTemplate {
    sepia: 0.18,
    contrast: 1.25,
    brightness: 0.90,
    saturate: 1.40,
    hue_rotate_deg: 10.0,
};

pub const POLAROID: FilterTemplate = FilterTemplate {
    sepia: 0.10,
    contrast: 0.85,
    brightness: 1.10,
    saturate: 0.90,
    hue_rotate_deg: -6.0,
};

pub const FADED_FILM: FilterTemplate = FilterTemplate {
    sepia: 0.20,
    contrast: 0.80,
    brightness: 1.10,
    saturate: 0.60,
    hue_rotate_deg: 0.0,
};

/// Base strengths for the synthetic texture layers of one filter.
///
/// A zero entry means the layer is skipped entirely for that filter.
/// Grain is a base noise amplitude (fraction of full scale); the other
/// three are opacity ceilings, scaled at render time by the intensity
/// knob (grain by the grain knob instead).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayPlan {
    pub grain: f64,
    pub vignette: f64,
    pub light_leak: f64,
    pub dust: f64,
}

impl OverlayPlan {
    pub const NONE: OverlayPlan = OverlayPlan {
        grain: 0.0,
        vignette: 0.0,
        light_leak: 0.0,
        dust: 0.0,
    };
}

impl Filter {
    pub fn from_name(name: &str) -> Option<Filter> {
        match name {
            "color" | "none" => Some(Filter::Color),
            "bw" => Some(Filter::Bw),
            "vintage" => Some(Filter::Vintage),
            "retro" => Some(Filter::Retro),
            "polaroid" => Some(Filter::Polaroid),
            "fadedfilm" => Some(Filter::FadedFilm),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Filter::Color => "color",
            Filter::Bw => "bw",
            Filter::Vintage => "vintage",
            Filter::Retro => "retro",
            Filter::Polaroid => "polaroid",
            Filter::FadedFilm => "fadedfilm",
        }
    }

    /// Grading template, or None for the non-template looks (color, bw).
    pub fn template(&self) -> Option<&'static FilterTemplate> {
        match self {
            Filter::Color | Filter::Bw => None,
            Filter::Vintage => Some(&VINTAGE),
            Filter::Retro => Some(&RETRO),
            Filter::Polaroid => Some(&POLAROID),
            Filter::FadedFilm => Some(&FADED_FILM),
        }
    }

    /// The canonical filter -> texture-layer strength table.
    pub fn overlay_plan(&self) -> OverlayPlan {
        match self {
            Filter::Color => OverlayPlan::NONE,
            Filter::Bw => OverlayPlan {
                grain: 0.08,
                vignette: 0.50,
                light_leak: 0.0,
                dust: 0.0,
            },
            Filter::Vintage => OverlayPlan {
                grain: 0.18,
                vignette: 0.70,
                light_leak: 0.60,
                dust: 0.30,
            },
            Filter::Retro => OverlayPlan {
                grain: 0.16,
                vignette: 0.60,
                light_leak: 0.50,
                dust: 0.25,
            },
            Filter::Polaroid => OverlayPlan {
                grain: 0.10,
                vignette: 0.50,
                light_leak: 0.30,
                dust: 0.0,
            },
            Filter::FadedFilm => OverlayPlan {
                grain: 0.14,
                vignette: 0.60,
                light_leak: 0.40,
                dust: 0.20,
            },
        }
    }

    pub const ALL: [Filter; 6] = [
        Filter::Color,
        Filter::Bw,
        Filter::Vintage,
        Filter::Retro,
        Filter::Polaroid,
        Filter::FadedFilm,
    ];
}
