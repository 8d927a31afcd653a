//! Trait extensions for [`PixelBuffer`](crate::PixelBuffer).
//!
//! - [`PixelBufferTraitInfo`]: pixel type and content introspection.
//! - [`PixelBufferTraitOperation`]: allocation, conversion, sampling and blitting.

mod info;
mod operation;

pub use info::*;
pub use operation::*;
#[cfg(any(test, feature = "test"))]
pub use test::*;
