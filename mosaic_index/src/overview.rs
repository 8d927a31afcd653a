//! A tile manager for mosaics made of co-located overview families.
//!
//! Such mosaics consist of footprints, each covered by the same area at several
//! resolutions (a base image plus its overviews, possibly many of them side by side).
//! Tiles are bucketed into groups by footprint, the groups are sorted along one axis, and
//! a query only scans the range of groups that can reach the region.

use crate::{
	ManagerKind, TileManager, TileSizeCount,
	manager::{ManagerBase, better_change},
	remove_overlaps,
};
use anyhow::Result;
use itertools::Itertools;
use log::{debug, trace};
use mosaic_core::{AffineTransform, MosaicError, PixelRect, Subsampling, SubsamplingFloor, Tile};
use std::{
	cmp::Reverse,
	collections::{BTreeMap, BTreeSet},
	sync::Arc,
};

/// Buckets narrower or lower than this many tolerance units are rejected.
const MIN_BUCKET_UNITS: i64 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
	X,
	Y,
}

impl Axis {
	fn start(self, rect: &PixelRect) -> i64 {
		match self {
			Axis::X => rect.x,
			Axis::Y => rect.y,
		}
	}

	fn end(self, rect: &PixelRect) -> i64 {
		match self {
			Axis::X => rect.max_x(),
			Axis::Y => rect.max_y(),
		}
	}

	fn extent(self, rect: &PixelRect) -> i64 {
		match self {
			Axis::X => rect.width,
			Axis::Y => rect.height,
		}
	}

	fn other(self) -> Axis {
		match self {
			Axis::X => Axis::Y,
			Axis::Y => Axis::X,
		}
	}
}

/// Tiles sharing one footprint, coarsest first.
#[derive(Debug)]
struct Group {
	members: Vec<usize>,
	bounds: PixelRect,
}

#[derive(Debug)]
pub struct OverviewGroupManager {
	base: ManagerBase,
	groups: Vec<Group>,
	axis: Axis,
	max_extent: i64,
}

impl OverviewGroupManager {
	/// Groups the tiles by footprint.
	///
	/// # Errors
	///
	/// Fails with [`MosaicError::InvalidLayout`] if the list is empty, a footprint is
	/// degenerate, or some footprint has fewer than two tiles.
	pub fn new(tiles: Vec<Arc<Tile>>) -> Result<Self> {
		let base = ManagerBase::new(tiles)?;
		let invalid = |message: String| anyhow::Error::from(MosaicError::InvalidLayout(message));

		let coarsest = base
			.tiles
			.iter()
			.fold(Subsampling::ONE, |max, tile| max.componentwise_max(&tile.subsampling()));
		let tolerance_x = 2 * i64::from(coarsest.x);
		let tolerance_y = 2 * i64::from(coarsest.y);

		let mut buckets: BTreeMap<(i64, i64, i64, i64), Vec<usize>> = BTreeMap::new();
		for (index, tile) in base.tiles.iter().enumerate() {
			let r = tile.absolute_region();
			let key = (
				r.x.div_euclid(tolerance_x),
				r.y.div_euclid(tolerance_y),
				div_ceil(r.width, tolerance_x),
				div_ceil(r.height, tolerance_y),
			);
			if key.2 < MIN_BUCKET_UNITS || key.3 < MIN_BUCKET_UNITS {
				return Err(invalid(format!("footprint of tile {tile} is too small to group")));
			}
			buckets.entry(key).or_default().push(index);
		}

		let mut groups = Vec::with_capacity(buckets.len());
		for members in buckets.into_values() {
			if members.len() < 2 {
				return Err(invalid(format!(
					"tile {} has no overview or base image sharing its footprint",
					base.tiles[members[0]]
				)));
			}
			let members: Vec<usize> = members
				.into_iter()
				.sorted_by_key(|&i| Reverse(base.tiles[i].subsampling().area()))
				.collect();
			let bounds = members.iter().fold(PixelRect::empty(), |union, &i| {
				union.union(&base.tiles[i].absolute_region())
			});
			groups.push(Group { members, bounds });
		}

		let axis = choose_axis(&base.region, &groups);
		groups.sort_by_key(|g| (axis.start(&g.bounds), axis.other().start(&g.bounds)));
		let max_extent = groups.iter().map(|g| axis.extent(&g.bounds)).max().unwrap_or(0);
		debug!(
			"{} overview groups over {} tiles, sorted along {axis:?}",
			groups.len(),
			base.tiles.len()
		);

		Ok(OverviewGroupManager {
			base,
			groups,
			axis,
			max_extent,
		})
	}

	pub fn with_grid_to_world(mut self, transform: AffineTransform) -> Self {
		self.base.grid_to_world = Some(transform);
		self
	}

	pub fn group_count(&self) -> usize {
		self.groups.len()
	}

	pub fn axis(&self) -> Axis {
		self.axis
	}

	/// Groups that can intersect `region`, with their index.
	fn candidates<'a>(&'a self, region: &'a PixelRect) -> impl Iterator<Item = (usize, &'a Group)> + 'a {
		let lower = self.axis.start(region) - self.max_extent;
		let upper = self.axis.end(region);
		let first = self.groups.partition_point(|g| self.axis.start(&g.bounds) <= lower);
		self.groups[first..]
			.iter()
			.enumerate()
			.take_while(move |(_, g)| self.axis.start(&g.bounds) < upper)
			.filter(move |(_, g)| g.bounds.intersects(region))
			.map(move |(offset, g)| (first + offset, g))
	}
}

fn div_ceil(value: i64, divisor: i64) -> i64 {
	-((-value).div_euclid(divisor))
}

/// The axis along which groups spread out more.
fn choose_axis(bounds: &PixelRect, groups: &[Group]) -> Axis {
	let ratio = |axis: Axis| {
		let summed: i64 = groups.iter().map(|g| axis.extent(&g.bounds)).sum();
		axis.extent(bounds) as f64 / summed.max(1) as f64
	};
	if ratio(Axis::X) >= ratio(Axis::Y) { Axis::X } else { Axis::Y }
}

impl TileManager for OverviewGroupManager {
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
		// Members before the cursor cannot serve any subsampling up to the current one.
		// The subsampling only ever decreases, so cursors survive restarts.
		let mut cursors = vec![0usize; self.groups.len()];
		loop {
			let mut selected: Vec<Arc<Tile>> = Vec::new();
			let mut pending = Vec::new();
			for (index, group) in self.candidates(region) {
				let mut reachable = None;
				let mut too_coarse_prefix = true;
				let mut exact = None;
				for (position, &member) in group.members.iter().enumerate().skip(cursors[index]) {
					let tile = &self.base.tiles[member];
					match tile.subsampling_floor(*subsampling) {
						SubsamplingFloor::None => {
							if too_coarse_prefix {
								cursors[index] = position + 1;
							}
						}
						SubsamplingFloor::Unchanged => {
							too_coarse_prefix = false;
							if tile.absolute_region().intersects(region) {
								exact = Some(tile);
								break;
							}
						}
						SubsamplingFloor::Changed(floor) => {
							too_coarse_prefix = false;
							if tile.absolute_region().intersects(region) {
								reachable = better_change(reachable, floor);
							}
						}
					}
				}
				match (exact, reachable) {
					(Some(tile), _) => selected.push(tile.clone()),
					(None, Some(floor)) => pending.push((group.bounds.intersection(region), floor)),
					(None, None) => {}
				}
			}

			// Overlapping groups may already serve the footprint of a group without an exact tile.
			let found: Vec<PixelRect> = selected.iter().map(|tile| tile.absolute_region()).collect();
			let change = pending
				.into_iter()
				.filter(|(clip, _)| !clip.is_covered_by(&found))
				.fold(None, |change, (_, floor)| better_change(change, floor));

			if allow_change && let Some(floor) = change {
				trace!("no tile serves {subsampling} everywhere in {region}, retrying with {floor}");
				*subsampling = floor;
				continue;
			}

			let mut tiles = remove_overlaps(selected, region);
			tiles.sort();
			debug!("{} tiles for {region} at {subsampling}", tiles.len());
			return tiles;
		}
	}

	fn intersects(&self, region: &PixelRect, subsampling: Subsampling) -> bool {
		self.candidates(region).any(|(_, group)| {
			group.members.iter().any(|&member| {
				let tile = &self.base.tiles[member];
				tile.absolute_region().intersects(region) && tile.subsampling_floor(subsampling) != SubsamplingFloor::None
			})
		})
	}

	fn providers(&self) -> Arc<BTreeSet<String>> {
		self.base.providers()
	}

	fn tile_sizes(&self) -> Arc<Vec<TileSizeCount>> {
		self.base.tile_sizes()
	}

	fn kind(&self) -> ManagerKind {
		ManagerKind::OverviewGroups
	}
}

#[cfg(test)]
mod tests;
