mod crop_resize;
mod grade;
mod texture;

pub use crop_resize::{CropResize, crop_and_resize};
pub use grade::{ColorGrade, apply_filter, apply_grayscale};
pub use texture::{TextureOverlay, apply_overlays};
