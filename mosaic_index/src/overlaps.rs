use mosaic_core::{PixelRect, Tile};
use std::sync::Arc;

/// Drops every tile whose part inside `region` is contained in another tile's part.
///
/// When two tiles clip to the same rectangle the one with the coarser subsampling stays,
/// or the earlier one if both are equally coarse. Quadratic, meant for the handful of
/// tiles a query selects.
pub fn remove_overlaps(tiles: Vec<Arc<Tile>>, region: &PixelRect) -> Vec<Arc<Tile>> {
	let clips: Vec<PixelRect> = tiles
		.iter()
		.map(|tile| tile.absolute_region().intersection(region))
		.collect();
	let mut keep = vec![true; tiles.len()];

	for i in 0..tiles.len() {
		for j in 0..tiles.len() {
			if i == j || !keep[j] || !clips[j].contains_rect(&clips[i]) {
				continue;
			}
			if clips[i] == clips[j] {
				let (area_i, area_j) = (tiles[i].subsampling().area(), tiles[j].subsampling().area());
				if area_i > area_j || (area_i == area_j && i < j) {
					continue;
				}
			}
			keep[i] = false;
			break;
		}
	}

	tiles
		.into_iter()
		.zip(keep)
		.filter_map(|(tile, keep)| keep.then_some(tile))
		.collect()
}
