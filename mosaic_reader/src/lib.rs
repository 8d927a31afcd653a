//! Mosaic reader: turns a tile index into pixels.
//!
//! The crate connects a [`TileManager`](mosaic_index::TileManager) to the codecs that decode
//! individual tile inputs:
//! - a [`ProviderRegistry`] maps provider ids to [`CodecProvider`]s,
//! - a [`ResourcePool`] keeps opened [`CodecHandle`]s between reads,
//! - [`MosaicImageReader`] plans the sub-reads of a request, delegates to a single tile's
//!   codec when it can and composes the result otherwise,
//! - tile sets are stored as YAML descriptors ([`TileSetDescriptor`]).
//!
//! # Quick start
//! ```rust
//! use mosaic_core::{PixelRect, Subsampling, Tile, TileInput};
//! use mosaic_image::{PixelBuffer, PixelBufferTraitOperation, PixelType};
//! use mosaic_index::TileManagerFactory;
//! use mosaic_reader::*;
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Two tiles side by side, decoded from memory
//!     let memory = Arc::new(MemoryProvider::new());
//!     let mut tiles = Vec::new();
//!     for (i, name) in ["left", "right"].into_iter().enumerate() {
//!         memory.insert(name, PixelBuffer::new_blank(64, 64, PixelType::Rgb8));
//!         let region = PixelRect::new(i as i64 * 64, 0, 64, 64)?;
//!         let input = TileInput::Named(name.to_string());
//!         tiles.push(Arc::new(Tile::new("memory", input, 0, region, Subsampling::ONE)));
//!     }
//!
//!     let reader = MosaicImageReader::builder(TileManagerFactory::create(tiles)?)
//!         .customize_registry(move |registry| registry.register(memory))
//!         .build()?;
//!
//!     // Read the whole mosaic at half resolution
//!     let mut param = ReadParam::new(PixelRect::new(0, 0, 128, 64)?, Subsampling::square(2)?);
//!     let result = reader.read(&mut param)?;
//!     let image = result.image.expect("a non-empty read always has an image");
//!     assert_eq!((image.width(), image.height()), (64, 32));
//!     Ok(())
//! }
//! ```

mod codec;
pub use codec::*;

mod config;
pub use config::*;

mod descriptor;
pub use descriptor::*;

mod pool;
pub use pool::*;

mod reader;
pub use reader::*;

mod registry;
pub use registry::*;
