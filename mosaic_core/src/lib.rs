//! Core types of the mosaic workspace: pixel rectangles, subsamplings, affine transforms
//! and the [`Tile`] descriptor, plus the error kinds shared by all crates.

mod error;
pub use error::*;

pub mod types;
pub use types::*;
