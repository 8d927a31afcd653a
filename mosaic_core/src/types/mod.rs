//! Geometry and tile types shared by the index and the reader.

mod affine;
pub use affine::*;

mod pixel_rect;
pub use pixel_rect::*;

mod region_calculator;
pub use region_calculator::*;

mod subsampling;
pub use subsampling::*;

mod tile;
pub use tile::*;

mod tile_input;
pub use tile_input::*;
