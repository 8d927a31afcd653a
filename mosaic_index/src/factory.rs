//! Chooses the tile manager for a set of tiles.

use crate::{OverviewGroupManager, TileManager, TileTree};
use anyhow::Result;
use log::debug;
use mosaic_core::{AffineTransform, MosaicError, Tile};
use std::sync::Arc;

pub struct TileManagerFactory;

impl TileManagerFactory {
	/// Builds an [`OverviewGroupManager`] if the tiles have that shape, a [`TileTree`] otherwise.
	pub fn create(tiles: Vec<Arc<Tile>>) -> Result<Box<dyn TileManager>> {
		Self::create_with_grid(tiles, None)
	}

	/// Like [`create`](Self::create), attaching `grid_to_world` to the result.
	pub fn create_with_grid(tiles: Vec<Arc<Tile>>, grid_to_world: Option<AffineTransform>) -> Result<Box<dyn TileManager>> {
		match Self::create_overview(tiles.clone(), grid_to_world) {
			Ok(manager) => {
				debug!("using overview groups for {} tiles", tiles.len());
				Ok(manager)
			}
			Err(err) if matches!(MosaicError::find(&err), Some(MosaicError::InvalidLayout(_))) && !tiles.is_empty() => {
				debug!("falling back to a tile tree: {err}");
				Self::create_tree(tiles, grid_to_world)
			}
			Err(err) => Err(err),
		}
	}

	pub fn create_tree(tiles: Vec<Arc<Tile>>, grid_to_world: Option<AffineTransform>) -> Result<Box<dyn TileManager>> {
		let mut tree = TileTree::new(tiles)?;
		if let Some(transform) = grid_to_world {
			tree = tree.with_grid_to_world(transform);
		}
		Ok(Box::new(tree))
	}

	pub fn create_overview(
		tiles: Vec<Arc<Tile>>,
		grid_to_world: Option<AffineTransform>,
	) -> Result<Box<dyn TileManager>> {
		let mut manager = OverviewGroupManager::new(tiles)?;
		if let Some(transform) = grid_to_world {
			manager = manager.with_grid_to_world(transform);
		}
		Ok(Box::new(manager))
	}
}
