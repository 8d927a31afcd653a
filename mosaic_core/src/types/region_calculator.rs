//! Places georeferenced tiles on a common mosaic grid.
//!
//! Each tile comes with its image size and its own grid-to-world transform. The calculator
//! picks the finest pixel scale among all tiles as the mosaic's `(1,1)` grid, derives every
//! tile's integer subsampling from the ratio of scales, and computes the tile's region in
//! its own subsampled grid. Tiles that do not line up with that grid are rejected.

use super::{AffineTransform, Tile, UnresolvedTile};
use crate::MosaicError;
use anyhow::{Context, Result};
use log::{debug, trace};

const TOLERANCE: f64 = 1e-6;

/// The outcome of [`RegionCalculator::resolve`].
#[derive(Debug)]
pub struct CalculatedMosaic {
	pub tiles: Vec<Tile>,
	/// Transform from the finest mosaic grid to world coordinates.
	pub grid_to_world: AffineTransform,
}

#[derive(Default)]
pub struct RegionCalculator {
	tiles: Vec<UnresolvedTile>,
}

impl RegionCalculator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues a tile. It must carry its size and an axis-aligned grid-to-world transform.
	pub fn add(&mut self, tile: UnresolvedTile) -> Result<()> {
		let transform = tile
			.grid_to_world()
			.with_context(|| format!("tile {}[{}] has no grid-to-world transform", tile.input(), tile.index()))?;
		if !transform.is_axis_aligned() {
			return Err(MosaicError::InvalidLayout(format!(
				"tile {}[{}] is rotated or sheared",
				tile.input(),
				tile.index()
			))
			.into());
		}
		if transform.scale_x == 0.0 || transform.scale_y == 0.0 {
			return Err(MosaicError::InvalidLayout(format!("tile {}[{}] has a zero scale", tile.input(), tile.index())).into());
		}
		tile
			.size()
			.with_context(|| format!("tile {}[{}] has no size", tile.input(), tile.index()))?;
		self.tiles.push(tile);
		Ok(())
	}

	pub fn len(&self) -> usize {
		self.tiles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tiles.is_empty()
	}

	/// Computes subsampling and region of every queued tile.
	///
	/// # Errors
	///
	/// Fails with [`MosaicError::InvalidLayout`] if no tile was added, if scales differ in sign
	/// or by a non-integer ratio, or if a tile is not aligned on its subsampled grid.
	pub fn resolve(self) -> Result<CalculatedMosaic> {
		let invalid = |message: String| anyhow::Error::from(MosaicError::InvalidLayout(message));

		let reference = self
			.tiles
			.iter()
			.filter_map(UnresolvedTile::grid_to_world)
			.min_by(|a, b| {
				(a.scale_x.abs() * a.scale_y.abs()).total_cmp(&(b.scale_x.abs() * b.scale_y.abs()))
			})
			.copied()
			.ok_or_else(|| invalid("no tiles to place".to_string()))?;
		debug!("mosaic reference grid {reference:?} for {} tiles", self.tiles.len());

		let mut tiles = Vec::with_capacity(self.tiles.len());
		for tile in self.tiles {
			let Some(transform) = tile.grid_to_world().copied() else {
				continue;
			};
			let name = format!("{}[{}]", tile.input(), tile.index());

			let sx = integer_ratio(transform.scale_x, reference.scale_x)
				.ok_or_else(|| invalid(format!("scale x of tile {name} is not a multiple of the finest scale")))?;
			let sy = integer_ratio(transform.scale_y, reference.scale_y)
				.ok_or_else(|| invalid(format!("scale y of tile {name} is not a multiple of the finest scale")))?;
			let subsampling = super::Subsampling::from_u32(sx, sy)?;

			let abs_x = integer_ratio_signed(transform.translate_x - reference.translate_x, reference.scale_x)
				.ok_or_else(|| invalid(format!("tile {name} is not aligned on the mosaic grid")))?;
			let abs_y = integer_ratio_signed(transform.translate_y - reference.translate_y, reference.scale_y)
				.ok_or_else(|| invalid(format!("tile {name} is not aligned on the mosaic grid")))?;
			let (sx, sy) = (i64::from(sx), i64::from(sy));
			if abs_x % sx != 0 || abs_y % sy != 0 {
				return Err(invalid(format!(
					"tile {name} origin ({abs_x},{abs_y}) is not a multiple of its subsampling {subsampling}"
				)));
			}
			trace!("tile {name} placed at ({abs_x},{abs_y}) with subsampling {subsampling}");

			tiles.push(
				tile
					.with_origin(abs_x / sx, abs_y / sy)
					.with_subsampling(subsampling)
					.resolve()?,
			);
		}

		Ok(CalculatedMosaic {
			tiles,
			grid_to_world: reference,
		})
	}
}

/// `value / unit` as a strictly positive integer, if it is one within tolerance.
fn integer_ratio(value: f64, unit: f64) -> Option<u32> {
	let ratio = integer_ratio_signed(value, unit)?;
	u32::try_from(ratio).ok().filter(|r| *r > 0)
}

fn integer_ratio_signed(value: f64, unit: f64) -> Option<i64> {
	let ratio = value / unit;
	let rounded = ratio.round();
	if (ratio - rounded).abs() > TOLERANCE || !rounded.is_finite() {
		return None;
	}
	Some(rounded as i64)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{PixelRect, Subsampling, TileInput};
	use pretty_assertions::assert_eq;

	fn unresolved(name: &str, w: u32, h: u32, scale: f64, tx: f64, ty: f64) -> UnresolvedTile {
		UnresolvedTile::new("image", TileInput::parse(name), 0)
			.with_size(w, h)
			.with_grid_to_world(AffineTransform::scale_translate(scale, -scale, tx, ty))
	}

	#[test]
	fn overview_and_quadrants() {
		let mut calc = RegionCalculator::new();
		calc.add(unresolved("q1.png", 500, 500, 1.0, 1000.0, 5000.0)).unwrap();
		calc.add(unresolved("q2.png", 500, 500, 1.0, 1500.0, 5000.0)).unwrap();
		calc.add(unresolved("q3.png", 500, 500, 1.0, 1000.0, 4500.0)).unwrap();
		calc.add(unresolved("ov.png", 250, 250, 2.0, 1000.0, 5000.0)).unwrap();
		let mosaic = calc.resolve().unwrap();

		assert_eq!(mosaic.grid_to_world.scale_x, 1.0);
		let placed: Vec<(PixelRect, Subsampling)> = mosaic.tiles.iter().map(|t| (t.region(), t.subsampling())).collect();
		assert_eq!(
			placed,
			vec![
				(PixelRect::new(0, 0, 500, 500).unwrap(), Subsampling::ONE),
				(PixelRect::new(500, 0, 500, 500).unwrap(), Subsampling::ONE),
				(PixelRect::new(0, 500, 500, 500).unwrap(), Subsampling::ONE),
				(PixelRect::new(0, 0, 250, 250).unwrap(), Subsampling::new(2, 2).unwrap()),
			]
		);
	}

	#[test]
	fn non_integer_ratio_is_rejected() {
		let mut calc = RegionCalculator::new();
		calc.add(unresolved("a.png", 10, 10, 1.0, 0.0, 0.0)).unwrap();
		calc.add(unresolved("b.png", 10, 10, 1.5, 0.0, 0.0)).unwrap();
		let err = calc.resolve().unwrap_err();
		assert!(matches!(MosaicError::find(&err), Some(MosaicError::InvalidLayout(_))));
	}

	#[test]
	fn misaligned_origin_is_rejected() {
		let mut calc = RegionCalculator::new();
		calc.add(unresolved("a.png", 10, 10, 1.0, 0.0, 0.0)).unwrap();
		calc.add(unresolved("b.png", 10, 10, 2.0, 3.0, 0.0)).unwrap();
		assert!(calc.resolve().is_err());
	}

	#[test]
	fn sheared_or_incomplete_tiles_are_refused() {
		let mut calc = RegionCalculator::new();
		let sheared = UnresolvedTile::new("image", TileInput::parse("s.png"), 0)
			.with_size(1, 1)
			.with_grid_to_world(AffineTransform::new(1.0, 0.5, 0.0, 1.0, 0.0, 0.0));
		assert!(calc.add(sheared).is_err());
		let no_transform = UnresolvedTile::new("image", TileInput::parse("n.png"), 0).with_size(1, 1);
		assert!(calc.add(no_transform).is_err());
		assert!(calc.is_empty());
		assert!(calc.resolve().is_err());
	}
}
