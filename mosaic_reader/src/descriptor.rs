//! The persisted list of tiles making up a mosaic.
//!
//! A descriptor is a YAML file, by convention named [`DESCRIPTOR_FILE_NAME`], stored next
//! to the tile files:
//!
//! ```yaml
//! tiles:
//!   - provider: image
//!     input: base/0_0.png
//!     region: [0, 0, 1000, 1000]
//!     subsampling: [1, 1]
//!   - provider: image
//!     input: overviews/0_0.png
//!     region: [0, 0, 500, 500]
//!     subsampling: [2, 2]
//! ```
//!
//! Records either carry their region (in the tile's own subsampled grid) or a
//! `grid_to_world` transform, in which case the tile sizes are read through the codecs and
//! a [`RegionCalculator`] places them. Relative file inputs are resolved against the
//! descriptor's directory.

use crate::ProviderRegistry;
use anyhow::{Result, bail};
use log::debug;
use mosaic_core::{AffineTransform, PixelRect, RegionCalculator, Subsampling, Tile, TileInput, UnresolvedTile};
use mosaic_derive::context;
use mosaic_index::{TileManager, TileManagerFactory};
use serde::{Deserialize, Serialize};
use std::{
	fs::File,
	io::{BufReader, BufWriter},
	path::{Path, PathBuf},
	sync::Arc,
};

pub const DESCRIPTOR_FILE_NAME: &str = "TileManager.yaml";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TileSetDescriptor {
	pub tiles: Vec<TileRecord>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TileRecord {
	pub provider: String,
	/// File path, URL or `name:<key>`.
	pub input: String,
	#[serde(default, skip_serializing_if = "is_zero")]
	pub index: u32,
	/// `[x, y, width, height]` in the tile's own grid.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub region: Option<[i64; 4]>,
	/// `[x, y]`, `[1, 1]` if missing.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subsampling: Option<[u16; 2]>,
	/// `[scale_x, shear_y, shear_x, scale_y, translate_x, translate_y]` of the tile's image grid.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub grid_to_world: Option<[f64; 6]>,
}

fn is_zero(value: &u32) -> bool {
	*value == 0
}

/// Tiles loaded from a descriptor.
#[derive(Debug)]
pub struct TileSet {
	pub tiles: Vec<Arc<Tile>>,
	/// Transform from the finest mosaic grid to world coordinates, if any record had one.
	pub grid_to_world: Option<AffineTransform>,
}

impl TileRecord {
	fn from_tile(tile: &Tile) -> Self {
		let region = tile.region();
		let subsampling = tile.subsampling();
		TileRecord {
			provider: tile.provider().to_string(),
			input: tile.input().to_string(),
			index: tile.index(),
			region: Some([region.x, region.y, region.width, region.height]),
			subsampling: Some([subsampling.x, subsampling.y]),
			grid_to_world: tile.grid_to_world().map(|t| {
				[t.scale_x, t.shear_y, t.shear_x, t.scale_y, t.translate_x, t.translate_y]
			}),
		}
	}

	fn transform(&self) -> Option<AffineTransform> {
		self.grid_to_world.map(|[a, b, c, d, e, f]| AffineTransform::new(a, b, c, d, e, f))
	}

	fn unresolved(&self, base: &Path) -> UnresolvedTile {
		let input = TileInput::parse(&self.input).resolved_against(base);
		let tile = UnresolvedTile::new(&self.provider, input, self.index);
		match self.transform() {
			Some(transform) => tile.with_grid_to_world(transform),
			None => tile,
		}
	}
}

impl TileSetDescriptor {
	pub fn from_tiles(tiles: &[Arc<Tile>]) -> Self {
		TileSetDescriptor {
			tiles: tiles.iter().map(|tile| TileRecord::from_tile(tile)).collect(),
		}
	}

	/// Reads a descriptor. `path` may also be the directory containing [`DESCRIPTOR_FILE_NAME`].
	#[context("Failed to read tile set descriptor {:?}", path)]
	pub fn load(path: &Path) -> Result<Self> {
		let file = File::open(descriptor_path(path))?;
		Ok(serde_yaml_ng::from_reader(BufReader::new(file))?)
	}

	/// Writes the descriptor. File inputs below the descriptor's directory are stored relative to it.
	#[context("Failed to write tile set descriptor {:?}", path)]
	pub fn save(&self, path: &Path) -> Result<()> {
		let path = descriptor_path(path);
		let base = path.parent().unwrap_or(Path::new(""));
		let mut relative = self.clone();
		for record in &mut relative.tiles {
			if let TileInput::Path(input) = TileInput::parse(&record.input)
				&& let Ok(stripped) = input.strip_prefix(base)
			{
				record.input = stripped.to_string_lossy().into_owned();
			}
		}
		serde_yaml_ng::to_writer(BufWriter::new(File::create(&path)?), &relative)?;
		Ok(())
	}

	/// Turns the records into tiles.
	///
	/// # Errors
	///
	/// Fails with [`MosaicError::UnknownProvider`](mosaic_core::MosaicError::UnknownProvider)
	/// for unregistered provider ids, and if records with and without region are mixed.
	pub fn resolve(&self, base: &Path, registry: &ProviderRegistry) -> Result<TileSet> {
		for record in &self.tiles {
			registry.get(&record.provider)?;
		}
		let placed = self.tiles.iter().filter(|r| r.region.is_some()).count();
		if placed == self.tiles.len() {
			self.resolve_placed(base)
		} else if placed == 0 {
			self.resolve_by_transform(base, registry)
		} else {
			bail!("{placed} of {} tile records have a region, either all or none must", self.tiles.len())
		}
	}

	fn resolve_placed(&self, base: &Path) -> Result<TileSet> {
		let mut tiles = Vec::with_capacity(self.tiles.len());
		let mut grid_to_world = None;
		for record in &self.tiles {
			let [x, y, width, height] = record.region.unwrap_or_default();
			let [sx, sy] = record.subsampling.unwrap_or([1, 1]);
			let subsampling = Subsampling::new(sx, sy)?;
			let region = PixelRect::new(x, y, width, height)?;
			let tile = record.unresolved(base).with_region(region).with_subsampling(subsampling).resolve()?;
			if grid_to_world.is_none()
				&& let Some(transform) = tile.grid_to_world()
			{
				grid_to_world = Some(mosaic_grid_to_world(transform, region, subsampling));
			}
			tiles.push(Arc::new(tile));
		}
		debug!("{} placed tiles", tiles.len());
		Ok(TileSet { tiles, grid_to_world })
	}

	fn resolve_by_transform(&self, base: &Path, registry: &ProviderRegistry) -> Result<TileSet> {
		let mut calculator = RegionCalculator::new();
		for record in &self.tiles {
			let tile = record.unresolved(base);
			let (width, height) = registry
				.get(&record.provider)?
				.open(tile.input())?
				.image_size(record.index)?;
			calculator.add(tile.with_size(width, height))?;
		}
		let mosaic = calculator.resolve()?;
		debug!("{} tiles placed by transform", mosaic.tiles.len());
		Ok(TileSet {
			tiles: mosaic.tiles.into_iter().map(Arc::new).collect(),
			grid_to_world: Some(mosaic.grid_to_world),
		})
	}
}

/// The transform of the finest mosaic grid, given the transform of one tile's image grid.
fn mosaic_grid_to_world(tile: &AffineTransform, region: PixelRect, subsampling: Subsampling) -> AffineTransform {
	tile
		.concatenate(&AffineTransform::scale_translate(1.0, 1.0, -region.x as f64, -region.y as f64))
		.subsampled(1.0 / f64::from(subsampling.x), 1.0 / f64::from(subsampling.y))
}

fn descriptor_path(path: &Path) -> PathBuf {
	if path.is_dir() {
		path.join(DESCRIPTOR_FILE_NAME)
	} else {
		path.to_path_buf()
	}
}

/// Loads the tiles of the descriptor at `path`.
pub fn load_tiles(path: &Path, registry: &ProviderRegistry) -> Result<Vec<Arc<Tile>>> {
	Ok(load_tile_set(path, registry)?.tiles)
}

#[context("Failed to load tiles from {:?}", path)]
pub fn load_tile_set(path: &Path, registry: &ProviderRegistry) -> Result<TileSet> {
	let path = descriptor_path(path);
	let base = path.parent().unwrap_or(Path::new(""));
	TileSetDescriptor::load(&path)?.resolve(base, registry)
}

/// Loads a descriptor and builds the matching tile manager.
pub fn open_manager(path: &Path, registry: &ProviderRegistry) -> Result<Box<dyn TileManager>> {
	let set = load_tile_set(path, registry)?;
	TileManagerFactory::create_with_grid(set.tiles, set.grid_to_world)
}
