//! The general tile manager: a bounds tree over tiles of any layout.
//!
//! Nodes live in an arena (`Vec<GridNode>`) and refer to each other by index. Each node
//! knows the range of subsamplings below it, so a query skips subtrees that are out of
//! the region or can only offer subsamplings coarser than requested.

mod build;
mod node;
mod query;
#[cfg(test)]
mod tests;

pub use node::{GridNode, NodeId};

use crate::{
	ManagerKind, TileManager, TileSizeCount,
	manager::ManagerBase,
	remove_overlaps,
};
use anyhow::Result;
use log::{debug, trace};
use mosaic_core::{AffineTransform, PixelRect, Subsampling, Tile};
use query::Search;
use std::{collections::BTreeSet, sync::Arc};

#[derive(Debug)]
pub struct TileTree {
	base: ManagerBase,
	nodes: Vec<GridNode>,
}

impl TileTree {
	/// Builds the tree. Fails only for an empty tile list.
	pub fn new(tiles: Vec<Arc<Tile>>) -> Result<Self> {
		let base = ManagerBase::new(tiles)?;
		let nodes = build::build(&base.tiles, base.region);
		debug!("tile tree with {} nodes over {} tiles", nodes.len(), base.tiles.len());
		Ok(TileTree { base, nodes })
	}

	pub fn with_grid_to_world(mut self, transform: AffineTransform) -> Self {
		self.base.grid_to_world = Some(transform);
		self
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of edges on the longest path from the root.
	pub fn depth(&self) -> usize {
		fn depth_of(nodes: &[GridNode], id: usize) -> usize {
			nodes[id]
				.children
				.iter()
				.map(|&child| 1 + depth_of(nodes, child))
				.max()
				.unwrap_or(0)
		}
		depth_of(&self.nodes, build::ROOT)
	}

	pub fn root(&self) -> &GridNode {
		&self.nodes[build::ROOT]
	}

	pub fn node(&self, id: usize) -> Option<&GridNode> {
		self.nodes.get(id)
	}
}

impl TileManager for TileTree {
	fn tiles(&self) -> &[Arc<Tile>] {
		&self.base.tiles
	}

	fn region(&self) -> PixelRect {
		self.base.region
	}

	fn grid_to_world(&self) -> Option<AffineTransform> {
		self.base.grid_to_world
	}

	fn query(&self, region: &PixelRect, subsampling: &mut Subsampling, allow_change: bool) -> Vec<Arc<Tile>> {
		loop {
			let search = Search::run(self, *region, *subsampling);
			if allow_change && let Some(floor) = search.change {
				trace!("no tile serves {subsampling} everywhere in {region}, retrying with {floor}");
				*subsampling = floor;
				continue;
			}
			let selected = search.selected.iter().map(|&i| self.base.tiles[i].clone()).collect();
			let mut tiles = remove_overlaps(selected, region);
			tiles.sort();
			debug!("{} tiles for {region} at {subsampling}", tiles.len());
			return tiles;
		}
	}

	fn intersects(&self, region: &PixelRect, subsampling: Subsampling) -> bool {
		query::any_reachable(self, build::ROOT, region, subsampling)
	}

	fn providers(&self) -> Arc<BTreeSet<String>> {
		self.base.providers()
	}

	fn tile_sizes(&self) -> Arc<Vec<TileSizeCount>> {
		self.base.tile_sizes()
	}

	fn kind(&self) -> ManagerKind {
		ManagerKind::Tree
	}
}
