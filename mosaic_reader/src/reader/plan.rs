//! Sub-read arithmetic: which pixels of a tile land where in the destination buffer.
//!
//! Destination pixel `(i, j)` shows the finest mosaic pixel
//! `(region.x + i·S.x, region.y + j·S.y)`. A tile contributes the destination pixels whose
//! mosaic pixel lies in its absolute region. Since `S` is a multiple of the tile's
//! subsampling `T`, those pixels are every `S/T`-th pixel of the tile, and the codec reads
//! exactly them.

use crate::CodecRead;
use mosaic_core::{PixelRect, Subsampling, Tile};

/// Size of the buffer holding `region` at `subsampling`.
pub fn destination_size(region: &PixelRect, subsampling: Subsampling) -> (u32, u32) {
	(
		ceil_div(region.width, i64::from(subsampling.x)) as u32,
		ceil_div(region.height, i64::from(subsampling.y)) as u32,
	)
}

/// The codec request for the part of `tile` inside `region`, read at `subsampling`, or
/// `None` if no destination pixel falls into the tile.
///
/// # Panics
///
/// If the tile cannot serve `subsampling`. Tile managers never return such tiles.
pub fn plan_tile_read(tile: &Tile, region: &PixelRect, subsampling: Subsampling) -> Option<CodecRead> {
	assert!(tile.serves(subsampling), "tile {tile} cannot serve subsampling {subsampling}");
	let absolute = tile.absolute_region();
	let clip = absolute.intersection(region);
	if clip.is_empty() {
		return None;
	}
	let own = tile.subsampling();
	let x = plan_axis(
		region.x,
		(clip.x, clip.max_x()),
		i64::from(subsampling.x),
		absolute.x,
		i64::from(own.x),
	)?;
	let y = plan_axis(
		region.y,
		(clip.y, clip.max_y()),
		i64::from(subsampling.y),
		absolute.y,
		i64::from(own.y),
	)?;
	Some(CodecRead {
		source_region: PixelRect::from_corners(x.source.0, y.source.0, x.source.1, y.source.1),
		stride: subsampling.divided_by(&own),
		destination_offset: (x.offset as u32, y.offset as u32),
	})
}

struct AxisPlan {
	offset: i64,
	source: (i64, i64),
}

fn plan_axis(origin: i64, clip: (i64, i64), step: i64, tile_origin: i64, tile_step: i64) -> Option<AxisPlan> {
	let first = ceil_div(clip.0 - origin, step);
	let end = ceil_div(clip.1 - origin, step);
	if first >= end {
		return None;
	}
	let first_pixel = origin + first * step;
	let last_pixel = origin + (end - 1) * step;
	Some(AxisPlan {
		offset: first,
		source: (
			(first_pixel - tile_origin).div_euclid(tile_step),
			ceil_div(last_pixel + 1 - tile_origin, tile_step),
		),
	})
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
	-(-value).div_euclid(divisor)
}
