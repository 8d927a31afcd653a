use mosaic_core::{PixelRect, Subsampling};

pub type NodeId = usize;

/// One node of the spatial tree.
///
/// A node either holds a tile (its bounds are then the tile's absolute region) or is a
/// virtual node grouping its children. Bounds always contain the bounds of all children.
/// `max_subsampling` and `min_subsampling` are the componentwise extremes over the node's
/// own tile and every descendant.
#[derive(Clone, Debug)]
pub struct GridNode {
	pub(crate) bounds: PixelRect,
	pub(crate) tile: Option<usize>,
	pub(crate) children: Vec<NodeId>,
	pub(crate) max_subsampling: Subsampling,
	pub(crate) min_subsampling: Subsampling,
}

impl GridNode {
	pub(crate) fn for_tile(bounds: PixelRect, tile: usize, subsampling: Subsampling) -> Self {
		GridNode {
			bounds,
			tile: Some(tile),
			children: Vec::new(),
			max_subsampling: subsampling,
			min_subsampling: subsampling,
		}
	}

	pub(crate) fn virtual_node(bounds: PixelRect, children: Vec<NodeId>) -> Self {
		GridNode {
			bounds,
			tile: None,
			children,
			max_subsampling: Subsampling::ONE,
			min_subsampling: Subsampling::ONE,
		}
	}

	pub fn bounds(&self) -> PixelRect {
		self.bounds
	}

	/// Index of the tile in [`TileManager::tiles`](crate::TileManager::tiles), `None` for virtual nodes.
	pub fn tile(&self) -> Option<usize> {
		self.tile
	}

	pub fn children(&self) -> &[NodeId] {
		&self.children
	}

	pub fn max_subsampling(&self) -> Subsampling {
		self.max_subsampling
	}

	pub fn min_subsampling(&self) -> Subsampling {
		self.min_subsampling
	}
}
