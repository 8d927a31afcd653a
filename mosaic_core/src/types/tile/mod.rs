//! `Tile` describes one fragment of a mosaic: which codec provider reads it, where its
//! pixels come from, which part of the mosaic it covers and at which resolution.
//!
//! Tiles have two phases:
//! - an [`UnresolvedTile`] is built while a mosaic is being described and may still lack
//!   its region or subsampling (for example until a [`RegionCalculator`](crate::RegionCalculator)
//!   has placed it on the mosaic grid);
//! - [`UnresolvedTile::resolve`] consumes the builder and returns a [`Tile`], which is
//!   immutable and meant to be shared as `Arc<Tile>` across any number of concurrent queries.
//!
//! Because a `Tile` only exists once resolved, its geometry accessors cannot fail.

mod unresolved;

pub use unresolved::UnresolvedTile;

use super::{AffineTransform, PixelRect, Subsampling, SubsamplingFloor, TileInput};
use std::{
	cmp::Ordering,
	fmt,
	hash::{Hash, Hasher},
	sync::Arc,
};

/// A resolved, immutable tile descriptor.
///
/// # Examples
/// ```
/// use mosaic_core::{PixelRect, Subsampling, Tile, TileInput};
///
/// let tile = Tile::new(
/// 	"image",
/// 	TileInput::parse("overview.png"),
/// 	0,
/// 	PixelRect::new(0, 0, 500, 500).unwrap(),
/// 	Subsampling::new(2, 2).unwrap(),
/// );
/// assert_eq!(tile.absolute_region(), PixelRect::new(0, 0, 1000, 1000).unwrap());
/// ```
#[derive(Clone)]
pub struct Tile {
	provider: Arc<str>,
	input: TileInput,
	index: u32,
	region: PixelRect,
	subsampling: Subsampling,
	grid_to_world: Option<AffineTransform>,
}

impl Tile {
	/// Creates a tile whose geometry is fully known.
	///
	/// `region` is expressed in the tile's own (subsampled) pixel grid.
	pub fn new(provider: &str, input: TileInput, index: u32, region: PixelRect, subsampling: Subsampling) -> Tile {
		Tile {
			provider: Arc::from(provider),
			input,
			index,
			region,
			subsampling,
			grid_to_world: None,
		}
	}

	pub(crate) fn from_parts(
		provider: Arc<str>,
		input: TileInput,
		index: u32,
		region: PixelRect,
		subsampling: Subsampling,
		grid_to_world: Option<AffineTransform>,
	) -> Tile {
		Tile {
			provider,
			input,
			index,
			region,
			subsampling,
			grid_to_world,
		}
	}

	/// Identifier of the codec provider that decodes this tile.
	pub fn provider(&self) -> &str {
		&self.provider
	}

	pub fn input(&self) -> &TileInput {
		&self.input
	}

	/// Image index inside the input, for formats storing several images per file.
	pub fn index(&self) -> u32 {
		self.index
	}

	/// The region in the tile's own pixel grid.
	pub fn region(&self) -> PixelRect {
		self.region
	}

	/// The region in the finest grid of the mosaic: [`region`](Self::region) scaled by the subsampling.
	pub fn absolute_region(&self) -> PixelRect {
		self.region.scaled(self.subsampling)
	}

	pub fn subsampling(&self) -> Subsampling {
		self.subsampling
	}

	/// The transform from this tile's pixel grid to world coordinates, if known.
	pub fn grid_to_world(&self) -> Option<&AffineTransform> {
		self.grid_to_world.as_ref()
	}

	/// Width and height of the tile image in its own pixels.
	pub fn size(&self) -> (u32, u32) {
		self.region.size_u32()
	}

	/// The coarsest subsampling not above `target` that this tile can deliver exactly.
	///
	/// Returns [`SubsamplingFloor::Unchanged`] when `target` is a multiple of the tile's
	/// subsampling, [`SubsamplingFloor::Changed`] with the rounded-down value otherwise, and
	/// [`SubsamplingFloor::None`] when the tile is coarser than `target` on some axis.
	pub fn subsampling_floor(&self, target: Subsampling) -> SubsamplingFloor {
		self.subsampling.floor_for(target)
	}

	/// `true` if the tile can deliver `target` without changing it.
	pub fn serves(&self, target: Subsampling) -> bool {
		self.subsampling_floor(target).is_unchanged()
	}
}

impl PartialEq for Tile {
	fn eq(&self, other: &Self) -> bool {
		self.index == other.index
			&& self.subsampling == other.subsampling
			&& self.region == other.region
			&& self.input == other.input
			&& self.provider == other.provider
	}
}

impl Eq for Tile {}

impl Hash for Tile {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.provider.hash(state);
		self.input.hash(state);
		self.index.hash(state);
		self.region.hash(state);
		self.subsampling.hash(state);
	}
}

/// Orders tiles for read locality: tiles of the same input are adjacent, then sorted by
/// image index, subsampling (y before x) and position. The order carries no geometric meaning.
impl Ord for Tile {
	fn cmp(&self, other: &Self) -> Ordering {
		let a = self.absolute_region();
		let b = other.absolute_region();
		self
			.input
			.cmp(&other.input)
			.then(self.index.cmp(&other.index))
			.then(self.subsampling.y.cmp(&other.subsampling.y))
			.then(self.subsampling.x.cmp(&other.subsampling.x))
			.then(a.y.cmp(&b.y))
			.then(a.x.cmp(&b.x))
			.then(a.height.cmp(&b.height))
			.then(a.width.cmp(&b.width))
			.then(self.provider.cmp(&other.provider))
	}
}

impl PartialOrd for Tile {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl fmt::Display for Tile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}:{}[{}] {}@{}",
			self.provider,
			self.input,
			self.index,
			self.absolute_region(),
			self.subsampling
		)
	}
}

impl fmt::Debug for Tile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Tile")
			.field("provider", &self.provider)
			.field("input", &self.input)
			.field("index", &self.index)
			.field("region", &self.region)
			.field("subsampling", &self.subsampling)
			.finish()
	}
}
