//! Spatial indexes over the tiles of a raster mosaic.
//!
//! A [`TileManager`] answers which tiles deliver a region at a subsampling. Two
//! implementations exist: [`OverviewGroupManager`] for mosaics made of footprints with
//! their overviews, and the general [`TileTree`]. [`TileManagerFactory`] picks one.

mod factory;
pub use factory::*;

mod manager;
pub use manager::{ManagerKind, TileManager, TileSizeCount};

mod overlaps;
pub use overlaps::*;

mod overview;
pub use overview::*;

mod tree;
pub use tree::*;
