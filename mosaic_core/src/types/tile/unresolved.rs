use super::Tile;
use crate::{AffineTransform, PixelRect, Subsampling, TileInput};
use anyhow::{Context, Result};
use std::sync::Arc;

/// A tile under construction.
///
/// Collects whatever is known about a tile (origin, size, subsampling, transform) until
/// [`resolve`](Self::resolve) turns it into an immutable [`Tile`]. The builder is consumed,
/// so a tile is resolved exactly once.
#[derive(Clone, Debug)]
pub struct UnresolvedTile {
	provider: Arc<str>,
	input: TileInput,
	index: u32,
	origin: Option<(i64, i64)>,
	size: Option<(u32, u32)>,
	subsampling: Option<Subsampling>,
	grid_to_world: Option<AffineTransform>,
}

impl UnresolvedTile {
	pub fn new(provider: &str, input: TileInput, index: u32) -> Self {
		UnresolvedTile {
			provider: Arc::from(provider),
			input,
			index,
			origin: None,
			size: None,
			subsampling: None,
			grid_to_world: None,
		}
	}

	/// Sets origin and size from a region in the tile's own pixel grid.
	pub fn with_region(mut self, region: PixelRect) -> Self {
		let (width, height) = region.size_u32();
		self.origin = Some((region.x, region.y));
		self.size = Some((width, height));
		self
	}

	/// Sets the origin in the tile's own pixel grid.
	pub fn with_origin(mut self, x: i64, y: i64) -> Self {
		self.origin = Some((x, y));
		self
	}

	/// Sets the image size, typically read from the codec.
	pub fn with_size(mut self, width: u32, height: u32) -> Self {
		self.size = Some((width, height));
		self
	}

	pub fn with_subsampling(mut self, subsampling: Subsampling) -> Self {
		self.subsampling = Some(subsampling);
		self
	}

	pub fn with_grid_to_world(mut self, transform: AffineTransform) -> Self {
		self.grid_to_world = Some(transform);
		self
	}

	pub fn provider(&self) -> &str {
		&self.provider
	}

	pub fn input(&self) -> &TileInput {
		&self.input
	}

	pub fn index(&self) -> u32 {
		self.index
	}

	pub fn size(&self) -> Option<(u32, u32)> {
		self.size
	}

	pub fn subsampling(&self) -> Option<Subsampling> {
		self.subsampling
	}

	pub fn grid_to_world(&self) -> Option<&AffineTransform> {
		self.grid_to_world.as_ref()
	}

	/// Produces the immutable tile.
	///
	/// # Errors
	///
	/// Fails if origin, size or subsampling is still unknown.
	pub fn resolve(self) -> Result<Tile> {
		let unknown = |what: &str| format!("cannot resolve tile {}[{}]: {what} is unknown", self.input, self.index);
		let (x, y) = self.origin.with_context(|| unknown("origin"))?;
		let (width, height) = self.size.with_context(|| unknown("size"))?;
		let subsampling = self.subsampling.with_context(|| unknown("subsampling"))?;
		let region = PixelRect::new(x, y, i64::from(width), i64::from(height))?;
		Ok(Tile::from_parts(
			self.provider,
			self.input,
			self.index,
			region,
			subsampling,
			self.grid_to_world,
		))
	}
}
