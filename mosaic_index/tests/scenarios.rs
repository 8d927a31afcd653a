use mosaic_core::{PixelRect, Subsampling, Tile, TileInput};
use mosaic_index::{ManagerKind, TileManager, TileManagerFactory};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

fn r(x: i64, y: i64, w: i64, h: i64) -> PixelRect {
	PixelRect::new(x, y, w, h).unwrap()
}

fn tile(name: &str, region: PixelRect, sub: u16) -> Arc<Tile> {
	Arc::new(Tile::new(
		"memory",
		TileInput::Named(name.to_string()),
		0,
		region,
		Subsampling::square(sub).unwrap(),
	))
}

fn names(tiles: &[Arc<Tile>]) -> Vec<String> {
	tiles.iter().map(|t| t.input().to_string()).collect()
}

fn quadrants() -> Vec<Arc<Tile>> {
	vec![
		tile("nw", r(0, 0, 100, 100), 1),
		tile("ne", r(100, 0, 100, 100), 1),
		tile("sw", r(0, 100, 100, 100), 1),
		tile("se", r(100, 100, 100, 100), 1),
	]
}

fn base_and_overview() -> Vec<Arc<Tile>> {
	vec![tile("base", r(0, 0, 1000, 1000), 1), tile("overview", r(0, 0, 500, 500), 2)]
}

#[test]
fn quadrants_are_returned_without_overlap() {
	let manager = TileManagerFactory::create(quadrants()).unwrap();
	assert_eq!(manager.kind(), ManagerKind::Tree);

	let region = r(0, 0, 200, 200);
	let mut subsampling = Subsampling::ONE;
	let tiles = manager.query(&region, &mut subsampling, false);
	assert_eq!(tiles.len(), 4);

	let clips: Vec<PixelRect> = tiles.iter().map(|t| t.absolute_region().intersection(&region)).collect();
	for (i, a) in clips.iter().enumerate() {
		for b in &clips[i + 1..] {
			assert!(!a.intersects(b), "{a} overlaps {b}");
		}
	}
	assert!(region.is_covered_by(&clips));
}

#[rstest]
#[case::factory(TileManagerFactory::create(base_and_overview()).unwrap())]
#[case::tree(TileManagerFactory::create_tree(base_and_overview(), None).unwrap())]
#[case::overview(TileManagerFactory::create_overview(base_and_overview(), None).unwrap())]
fn overview_serves_its_subsampling(#[case] manager: Box<dyn TileManager>) {
	let mut subsampling = Subsampling::square(2).unwrap();
	let tiles = manager.query(&r(0, 0, 1000, 1000), &mut subsampling, false);
	assert_eq!(names(&tiles), vec!["name:overview"]);

	let mut subsampling = Subsampling::ONE;
	let tiles = manager.query(&r(0, 0, 1000, 1000), &mut subsampling, false);
	assert_eq!(names(&tiles), vec!["name:base"]);
}

#[rstest]
#[case::quadrants(quadrants())]
#[case::overviews(base_and_overview())]
fn regions_outside_the_mosaic_are_empty(#[case] tiles: Vec<Arc<Tile>>) {
	let manager = TileManagerFactory::create(tiles).unwrap();
	let outside = r(5000, 5000, 10, 10);
	let mut subsampling = Subsampling::ONE;
	assert!(manager.query(&outside, &mut subsampling, true).is_empty());
	assert_eq!(subsampling, Subsampling::ONE);
	assert!(!manager.intersects(&outside, Subsampling::ONE));
}

#[test]
fn both_managers_agree_on_overview_families() {
	let mut tiles = Vec::new();
	for i in 0..5 {
		let x = i * 1000;
		tiles.push(tile(&format!("b{i}"), r(x, 0, 1000, 1000), 1));
		tiles.push(tile(&format!("o{i}"), r(x / 2, 0, 500, 500), 2));
		tiles.push(tile(&format!("q{i}"), r(x / 4, 0, 250, 250), 4));
	}
	let tree = TileManagerFactory::create_tree(tiles.clone(), None).unwrap();
	let overview = TileManagerFactory::create_overview(tiles, None).unwrap();

	for (sx, sy) in [(1, 1), (2, 2), (3, 3), (4, 4), (2, 4), (8, 8)] {
		for region in [r(0, 0, 5000, 1000), r(1500, 200, 2000, 10), r(999, 999, 2, 1)] {
			let target = Subsampling::new(sx, sy).unwrap();
			let (mut a, mut b) = (target, target);
			let from_tree = tree.query(&region, &mut a, true);
			let from_overview = overview.query(&region, &mut b, true);
			assert_eq!(names(&from_tree), names(&from_overview), "{region} at {target}");
			assert_eq!(a, b);
			assert_eq!(tree.intersects(&region, target), overview.intersects(&region, target));
		}
	}
}
