use super::{TileTree, build::ROOT, node::NodeId};
use crate::manager::better_change;
use mosaic_core::{PixelRect, Subsampling, SubsamplingFloor};

/// One pass over the tree at a fixed subsampling.
pub(super) struct Search<'a> {
	tree: &'a TileTree,
	region: PixelRect,
	target: Subsampling,
	/// Indices of the selected tiles.
	pub selected: Vec<usize>,
	/// The best subsampling some uncovered location could be served at, if any.
	pub change: Option<Subsampling>,
	/// Clips of tiles that only reach a lower subsampling, with that floor.
	pending: Vec<(PixelRect, Subsampling)>,
}

impl<'a> Search<'a> {
	pub fn run(tree: &'a TileTree, region: PixelRect, target: Subsampling) -> Self {
		let mut search = Search {
			tree,
			region,
			target,
			selected: Vec::new(),
			change: None,
			pending: Vec::new(),
		};
		search.visit(ROOT);
		search.resolve_pending();
		search
	}

	/// Proposes a change only for clips that no selected tile covers, wherever it sits
	/// in the tree.
	fn resolve_pending(&mut self) {
		let found: Vec<PixelRect> = self
			.selected
			.iter()
			.map(|&i| self.tree.base.tiles[i].absolute_region())
			.collect();
		for (clip, floor) in std::mem::take(&mut self.pending) {
			if !clip.is_covered_by(&found) {
				self.change = better_change(self.change, floor);
			}
		}
	}

	fn visit(&mut self, id: NodeId) {
		let tree = self.tree;
		let node = &tree.nodes[id];
		if !node.bounds.intersects(&self.region) || !node.min_subsampling.componentwise_le(&self.target) {
			return;
		}
		let Some(index) = node.tile else {
			self.visit_children(id);
			return;
		};

		let tile = &tree.base.tiles[index];
		match tile.subsampling_floor(self.target) {
			// The tile covers the whole node, nothing below can do better.
			SubsamplingFloor::Unchanged => self.selected.push(index),
			SubsamplingFloor::None => self.visit_children(id),
			SubsamplingFloor::Changed(floor) => {
				self.visit_children(id);
				let clip = tile.absolute_region().intersection(&self.region);
				self.pending.push((clip, floor));
			}
		}
	}

	fn visit_children(&mut self, id: NodeId) {
		let tree = self.tree;
		for &child in &tree.nodes[id].children {
			self.visit(child);
		}
	}
}

/// `true` as soon as one intersecting tile has a defined floor at `target`.
pub(super) fn any_reachable(tree: &TileTree, id: NodeId, region: &PixelRect, target: Subsampling) -> bool {
	let node = &tree.nodes[id];
	if !node.bounds.intersects(region) || !node.min_subsampling.componentwise_le(&target) {
		return false;
	}
	if region.contains_rect(&node.bounds) && node.max_subsampling.componentwise_le(&target) {
		return true;
	}
	if let Some(index) = node.tile
		&& tree.base.tiles[index].subsampling_floor(target) != SubsamplingFloor::None
	{
		return true;
	}
	node
		.children
		.iter()
		.any(|&child| any_reachable(tree, child, region, target))
}
