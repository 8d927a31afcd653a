//! Builds the node arena of a [`TileTree`](super::TileTree).
//!
//! 1. Tiles are inserted coarse and large first, each below the deepest node containing
//!    it, preferring nodes it divides evenly.
//! 2. Children that mix subsamplings and overlap are regrouped into one virtual node per
//!    subsampling.
//! 3. Nodes with too many children are split into virtual halves along their longer side.
//! 4. Subsampling extremes are aggregated bottom-up.

use super::node::{GridNode, NodeId};
use itertools::Itertools;
use log::debug;
use mosaic_core::{PixelRect, Subsampling, Tile};
use std::{cmp::Reverse, sync::Arc};

/// Nodes with more children than this are split.
pub(crate) const MAX_CHILDREN: usize = 16;

pub(crate) const ROOT: NodeId = 0;

pub(crate) fn build(tiles: &[Arc<Tile>], bounds: PixelRect) -> Vec<GridNode> {
	let mut nodes = vec![GridNode::virtual_node(bounds, Vec::new())];

	let order = (0..tiles.len()).sorted_by_key(|&i| {
		let tile = &tiles[i];
		(
			Reverse(tile.subsampling().area()),
			Reverse(tile.absolute_region().area()),
			i,
		)
	});
	for index in order {
		insert(&mut nodes, index, &tiles[index]);
	}

	for id in 0..nodes.len() {
		split_mixed_subsamplings(&mut nodes, id);
	}

	let mut id = 0;
	while id < nodes.len() {
		if nodes[id].children.len() > MAX_CHILDREN {
			debug!("thickening node {id} with {} children", nodes[id].children.len());
			let children = std::mem::take(&mut nodes[id].children);
			nodes[id].children = partition(&mut nodes, children);
		}
		id += 1;
	}

	aggregate(&mut nodes, ROOT);
	nodes
}

/// `true` if `outer` is an exact multiple of `inner` and `inner` sits on that grid.
fn is_gridded(outer: &PixelRect, inner: &PixelRect) -> bool {
	inner.width > 0
		&& inner.height > 0
		&& outer.width % inner.width == 0
		&& outer.height % inner.height == 0
		&& (inner.x - outer.x) % inner.width == 0
		&& (inner.y - outer.y) % inner.height == 0
}

fn insert(nodes: &mut Vec<GridNode>, index: usize, tile: &Tile) {
	let bounds = tile.absolute_region();
	let mut parent = ROOT;
	loop {
		let containing = || {
			nodes[parent]
				.children
				.iter()
				.copied()
				.filter(|&child| nodes[child].bounds.contains_rect(&bounds))
		};
		let next = containing()
			.find(|&child| is_gridded(&nodes[child].bounds, &bounds))
			.or_else(|| containing().next());
		match next {
			Some(child) => parent = child,
			None => break,
		}
	}
	let id = nodes.len();
	nodes.push(GridNode::for_tile(bounds, index, tile.subsampling()));
	nodes[parent].children.push(id);
}

fn union_of(nodes: &[GridNode], ids: &[NodeId]) -> PixelRect {
	ids
		.iter()
		.fold(PixelRect::empty(), |union, &id| union.union(&nodes[id].bounds))
}

fn tile_subsampling(nodes: &[GridNode], id: NodeId) -> Option<Subsampling> {
	// Before aggregation a tile node's extremes are its own subsampling.
	nodes[id].tile.map(|_| nodes[id].max_subsampling)
}

/// Regroups the children of `id` by subsampling when children of different subsamplings overlap.
fn split_mixed_subsamplings(nodes: &mut Vec<GridNode>, id: NodeId) {
	let children = &nodes[id].children;
	let overlapping = children.iter().tuple_combinations().any(|(&a, &b)| {
		tile_subsampling(nodes, a) != tile_subsampling(nodes, b) && nodes[a].bounds.intersects(&nodes[b].bounds)
	});
	if !overlapping {
		return;
	}

	let groups: Vec<Vec<NodeId>> = children
		.iter()
		.copied()
		.sorted_by_key(|&child| {
			let sub = tile_subsampling(nodes, child).unwrap_or(Subsampling::ONE);
			(Reverse(sub.area()), Reverse(sub.x), child)
		})
		.chunk_by(|&child| tile_subsampling(nodes, child))
		.into_iter()
		.map(|(_, group)| group.collect())
		.collect();

	let mut regrouped = Vec::with_capacity(groups.len());
	for group in groups {
		if group.len() == 1 {
			regrouped.push(group[0]);
		} else {
			let bounds = union_of(nodes, &group);
			regrouped.push(nodes.len());
			nodes.push(GridNode::virtual_node(bounds, group));
		}
	}
	nodes[id].children = regrouped;
}

/// Splits `children` at the median of their centers along the longer side until every
/// resulting node has at most [`MAX_CHILDREN`] children. Returns the new child list.
fn partition(nodes: &mut Vec<GridNode>, mut children: Vec<NodeId>) -> Vec<NodeId> {
	if children.len() <= MAX_CHILDREN {
		return children;
	}
	let bounds = union_of(nodes, &children);
	if bounds.width >= bounds.height {
		children.sort_by_key(|&c| 2 * nodes[c].bounds.x + nodes[c].bounds.width);
	} else {
		children.sort_by_key(|&c| 2 * nodes[c].bounds.y + nodes[c].bounds.height);
	}
	let upper = children.split_off(children.len() / 2);

	let mut result = Vec::with_capacity(2);
	for half in [children, upper] {
		let half = partition(nodes, half);
		let bounds = union_of(nodes, &half);
		result.push(nodes.len());
		nodes.push(GridNode::virtual_node(bounds, half));
	}
	result
}

fn aggregate(nodes: &mut [GridNode], id: NodeId) -> (Subsampling, Subsampling) {
	let children = nodes[id].children.clone();
	let mut extremes = tile_subsampling(nodes, id).map(|s| (s, s));
	for child in children {
		let (max, min) = aggregate(nodes, child);
		extremes = Some(match extremes {
			Some((a, b)) => (a.componentwise_max(&max), b.componentwise_min(&min)),
			None => (max, min),
		});
	}
	let (max, min) = extremes.unwrap_or((Subsampling::ONE, Subsampling::ONE));
	nodes[id].max_subsampling = max;
	nodes[id].min_subsampling = min;
	(max, min)
}
