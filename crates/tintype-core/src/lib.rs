//! Core photobooth rendering: raster buffers, filter templates, the
//! per-photo processing pipeline and the strip compositor. Pure CPU,
//! no I/O, no clocks.

pub mod color;
pub mod filter;
pub mod pipeline;
pub mod raster;
pub mod strip;
