//! The query contract every tile collection implements, plus the state both managers share.

use anyhow::Result;
use mosaic_core::{AffineTransform, MosaicError, PixelRect, Subsampling, Tile};
use parking_lot::Mutex;
use std::{
	collections::{BTreeMap, BTreeSet},
	fmt::Debug,
	sync::Arc,
};

/// Which implementation answers the queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerKind {
	Tree,
	OverviewGroups,
}

/// How many tiles share one image size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSizeCount {
	pub width: u32,
	pub height: u32,
	pub count: usize,
}

/// A collection of tiles that can answer "which tiles give me region R at subsampling S".
///
/// # Query semantics
///
/// A tile *serves* a subsampling `S` when `S` is a multiple of the tile's own subsampling.
/// For every location of `region`, [`query`](Self::query) picks the coarsest tile that
/// serves `S`. Locations where no tile serves `S` are gaps, unless `allow_change` is set:
/// then `S` is lowered to the best subsampling those tiles can deliver and the selection
/// starts over, until every location either has a serving tile or cannot be served at all.
/// The effective `S` is written back, and every returned tile serves it.
///
/// The result has passed [`remove_overlaps`](crate::remove_overlaps) and is sorted by
/// [`Tile`]'s read-locality order.
pub trait TileManager: Debug + Send + Sync {
	/// All tiles, in no particular order.
	fn tiles(&self) -> &[Arc<Tile>];

	/// Union of all absolute tile regions.
	fn region(&self) -> PixelRect;

	/// Transform from the finest mosaic grid to world coordinates, if known.
	fn grid_to_world(&self) -> Option<AffineTransform>;

	fn query(&self, region: &PixelRect, subsampling: &mut Subsampling, allow_change: bool) -> Vec<Arc<Tile>>;

	/// `true` if some tile intersecting `region` can deliver `subsampling` or a finer
	/// divisor of it, i.e. exactly when `query(region, subsampling, true)` is not empty.
	fn intersects(&self, region: &PixelRect, subsampling: Subsampling) -> bool;

	/// Identifiers of all codec providers used by the tiles.
	fn providers(&self) -> Arc<BTreeSet<String>>;

	/// Image sizes of the tiles, most frequent first.
	fn tile_sizes(&self) -> Arc<Vec<TileSizeCount>>;

	fn kind(&self) -> ManagerKind;
}

/// Tile list, extent and lazily computed summaries.
#[derive(Debug)]
pub(crate) struct ManagerBase {
	pub tiles: Vec<Arc<Tile>>,
	pub region: PixelRect,
	pub grid_to_world: Option<AffineTransform>,
	providers: Mutex<Option<Arc<BTreeSet<String>>>>,
	tile_sizes: Mutex<Option<Arc<Vec<TileSizeCount>>>>,
}

impl ManagerBase {
	pub fn new(tiles: Vec<Arc<Tile>>) -> Result<Self> {
		if tiles.is_empty() {
			return Err(MosaicError::InvalidLayout("a tile manager needs at least one tile".to_string()).into());
		}
		let region = tiles
			.iter()
			.fold(PixelRect::empty(), |union, tile| union.union(&tile.absolute_region()));
		Ok(ManagerBase {
			tiles,
			region,
			grid_to_world: None,
			providers: Mutex::new(None),
			tile_sizes: Mutex::new(None),
		})
	}

	pub fn providers(&self) -> Arc<BTreeSet<String>> {
		self
			.providers
			.lock()
			.get_or_insert_with(|| Arc::new(self.tiles.iter().map(|t| t.provider().to_string()).collect()))
			.clone()
	}

	pub fn tile_sizes(&self) -> Arc<Vec<TileSizeCount>> {
		self
			.tile_sizes
			.lock()
			.get_or_insert_with(|| {
				let mut counts: BTreeMap<(u32, u32), usize> = BTreeMap::new();
				for tile in &self.tiles {
					*counts.entry(tile.size()).or_default() += 1;
				}
				let mut sizes: Vec<TileSizeCount> = counts
					.into_iter()
					.map(|((width, height), count)| TileSizeCount { width, height, count })
					.collect();
				sizes.sort_by(|a, b| b.count.cmp(&a.count));
				Arc::new(sizes)
			})
			.clone()
	}
}

/// Keeps the candidate with the larger area; the first one wins ties.
pub(crate) fn better_change(current: Option<Subsampling>, candidate: Subsampling) -> Option<Subsampling> {
	match current {
		Some(best) if best.area() >= candidate.area() => Some(best),
		_ => Some(candidate),
	}
}
