//! Pixel buffers for the mosaic reader.
//!
//! A [`PixelBuffer`] is an [`image::DynamicImage`]; this crate adds the [`PixelType`]
//! vocabulary and the trait extensions the reader composes results with.

mod pixel_type;
pub use pixel_type::*;

mod traits;
pub use traits::*;

pub mod helper;
pub use helper::{load_image, probe_image, save_image};

/// An owned, typed pixel buffer.
pub type PixelBuffer = image::DynamicImage;
