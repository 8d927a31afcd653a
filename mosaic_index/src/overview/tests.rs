use super::*;
use mosaic_core::TileInput;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn s(x: u16, y: u16) -> Subsampling {
	Subsampling::new(x, y).unwrap()
}

fn r(x: i64, y: i64, w: i64, h: i64) -> PixelRect {
	PixelRect::new(x, y, w, h).unwrap()
}

/// A tile covering `abs` (in finest pixels) at square subsampling `sub`.
fn tile(name: &str, abs: PixelRect, sub: u16) -> Arc<Tile> {
	let sub = s(sub, sub);
	let region = PixelRect::new(
		abs.x / i64::from(sub.x),
		abs.y / i64::from(sub.y),
		abs.width / i64::from(sub.x),
		abs.height / i64::from(sub.y),
	)
	.unwrap();
	Arc::new(Tile::new("memory", TileInput::Named(name.to_string()), 0, region, sub))
}

fn names(tiles: &[Arc<Tile>]) -> Vec<String> {
	tiles.iter().map(|t| t.input().to_string()).collect()
}

/// `count` footprints of 1000×1000 side by side along x, each with a base image and two overviews.
fn pyramid_row(count: i64) -> OverviewGroupManager {
	let mut tiles = Vec::new();
	for i in 0..count {
		let footprint = r(i * 1000, 0, 1000, 1000);
		tiles.push(tile(&format!("base{i}"), footprint, 1));
		tiles.push(tile(&format!("half{i}"), footprint, 2));
		tiles.push(tile(&format!("quarter{i}"), footprint, 4));
	}
	OverviewGroupManager::new(tiles).unwrap()
}

#[rstest]
#[case::finest(s(1, 1), vec!["name:base0"])]
#[case::overview(s(2, 2), vec!["name:half0"])]
#[case::coarsest(s(4, 4), vec!["name:quarter0"])]
#[case::beyond_coarsest(s(8, 8), vec!["name:quarter0"])]
#[case::not_a_level(s(3, 3), vec!["name:base0"])]
#[case::mixed(s(2, 4), vec!["name:half0"])]
fn coarsest_exact_tile_is_chosen(#[case] target: Subsampling, #[case] expected: Vec<&str>) {
	let manager = pyramid_row(1);
	let mut subsampling = target;
	let tiles = manager.query(&r(0, 0, 1000, 1000), &mut subsampling, false);
	assert_eq!(names(&tiles), expected);
	assert_eq!(subsampling, target);
}

#[test]
fn overview_only_for_matching_subsampling() {
	let manager = OverviewGroupManager::new(vec![
		tile("base", r(0, 0, 1000, 1000), 1),
		tile("overview", r(0, 0, 1000, 1000), 2),
	])
	.unwrap();
	let mut subsampling = s(2, 2);
	let tiles = manager.query(&manager.region(), &mut subsampling, false);
	assert_eq!(names(&tiles), vec!["name:overview"]);
	assert_eq!(manager.kind(), ManagerKind::OverviewGroups);
}

#[test]
fn change_lowers_subsampling_for_all_groups() {
	// Only overviews: no tile serves (3,3), the best reachable is (2,2).
	let manager = OverviewGroupManager::new(vec![
		tile("a2", r(0, 0, 1000, 1000), 2),
		tile("a4", r(0, 0, 1000, 1000), 4),
		tile("b2", r(1000, 0, 1000, 1000), 2),
		tile("b4", r(1000, 0, 1000, 1000), 4),
	])
	.unwrap();
	let region = r(0, 0, 2000, 1000);

	let mut subsampling = s(3, 3);
	assert!(manager.query(&region, &mut subsampling, false).is_empty());
	assert_eq!(subsampling, s(3, 3));

	let tiles = manager.query(&region, &mut subsampling, true);
	assert_eq!(subsampling, s(2, 2));
	assert_eq!(names(&tiles), vec!["name:a2", "name:b2"]);
	assert!(tiles.iter().all(|t| t.serves(subsampling)));
	assert!(manager.intersects(&region, s(3, 3)));
	assert!(!manager.intersects(&region, s(1, 1)));
}

#[test]
fn only_reachable_groups_are_scanned() {
	let manager = pyramid_row(10);
	assert_eq!(manager.group_count(), 10);
	assert_eq!(manager.axis(), Axis::X);

	let region = r(3500, 200, 1000, 100);
	let mut subsampling = s(2, 2);
	let tiles = manager.query(&region, &mut subsampling, false);
	assert_eq!(names(&tiles), vec!["name:half3", "name:half4"]);
	for tile in &tiles {
		assert!(tile.absolute_region().intersects(&region));
		assert!(tile.subsampling().componentwise_le(&subsampling));
	}

	let mut subsampling = s(1, 1);
	assert!(manager.query(&r(20_000, 0, 10, 10), &mut subsampling, true).is_empty());
	assert!(!manager.intersects(&r(-100, 0, 100, 1000), s(4, 4)));
	assert!(manager.intersects(&r(9999, 999, 1, 1), s(1, 1)));
}

#[test]
fn column_layout_sorts_along_y() {
	let mut tiles = Vec::new();
	for i in 0..4 {
		tiles.push(tile(&format!("base{i}"), r(0, i * 500, 500, 500), 1));
		tiles.push(tile(&format!("ov{i}"), r(0, i * 500, 500, 500), 2));
	}
	let manager = OverviewGroupManager::new(tiles).unwrap();
	assert_eq!(manager.axis(), Axis::Y);
	let mut subsampling = s(1, 1);
	let tiles = manager.query(&r(0, 900, 500, 200), &mut subsampling, false);
	assert_eq!(names(&tiles), vec!["name:base1", "name:base2"]);
}

#[rstest]
#[case::single_tile(vec![tile("alone", r(0, 0, 1000, 1000), 1)])]
#[case::quadrants_without_overviews(vec![
	tile("q1", r(0, 0, 100, 100), 1),
	tile("q2", r(100, 0, 100, 100), 1),
	tile("q3", r(0, 100, 100, 100), 1),
	tile("q4", r(100, 100, 100, 100), 1),
])]
#[case::degenerate_footprint(vec![
	tile("thin", r(0, 0, 1000, 2), 1),
	tile("thin_ov", r(0, 0, 1000, 2), 2),
])]
#[case::empty(Vec::new())]
fn unsuitable_layouts_are_rejected(#[case] tiles: Vec<Arc<Tile>>) {
	let err = OverviewGroupManager::new(tiles).unwrap_err();
	assert!(matches!(
		MosaicError::find(&err),
		Some(MosaicError::InvalidLayout(_))
	));
}

#[test]
fn near_identical_footprints_share_a_group() {
	// The overview rounds the 1001 pixel wide base image up to 1002.
	let manager = OverviewGroupManager::new(vec![
		tile("base", r(0, 0, 1001, 1000), 1),
		tile("overview", r(0, 0, 1002, 1000), 2),
	])
	.unwrap();
	assert_eq!(manager.group_count(), 1);
}

#[test]
fn overlapping_group_serving_the_request_prevents_a_change() {
	// The right group only reaches (2,2), but the left base image covers it at (3,3).
	let manager = OverviewGroupManager::new(vec![
		tile("base", r(0, 0, 1000, 1000), 1),
		tile("a2", r(0, 0, 1000, 1000), 2),
		tile("b2", r(504, 0, 496, 1000), 2),
		tile("b4", r(504, 0, 496, 1000), 4),
	])
	.unwrap();
	assert_eq!(manager.group_count(), 2);

	let mut subsampling = s(3, 3);
	let tiles = manager.query(&manager.region(), &mut subsampling, true);
	assert_eq!(subsampling, s(3, 3));
	assert_eq!(names(&tiles), vec!["name:base"]);
}
