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

fn tile(name: &str, abs: PixelRect, sub: u16) -> Arc<Tile> {
	tile_xy(name, abs, sub, sub)
}

/// A tile with its absolute region `abs`, which must be divisible by `(sx, sy)`.
fn tile_xy(name: &str, abs: PixelRect, sx: u16, sy: u16) -> Arc<Tile> {
	let (step_x, step_y) = (i64::from(sx), i64::from(sy));
	Arc::new(Tile::new(
		"memory",
		TileInput::Named(name.to_string()),
		0,
		r(abs.x / step_x, abs.y / step_y, abs.width / step_x, abs.height / step_y),
		s(sx, sy),
	))
}

fn names(tiles: &[Arc<Tile>]) -> Vec<String> {
	tiles.iter().map(|t| t.input().to_string()).collect()
}

fn quadrants() -> Vec<Arc<Tile>> {
	vec![
		tile("q1", r(0, 0, 100, 100), 1),
		tile("q2", r(100, 0, 100, 100), 1),
		tile("q3", r(0, 100, 100, 100), 1),
		tile("q4", r(100, 100, 100, 100), 1),
	]
}

/// A 1000×1000 mosaic: 16 base tiles of 250×250, four half-resolution tiles of 500×500
/// and one quarter-resolution tile over everything.
fn pyramid() -> TileTree {
	let mut tiles = vec![tile("quarter", r(0, 0, 1000, 1000), 4)];
	for y in 0..2 {
		for x in 0..2 {
			tiles.push(tile(&format!("half{x}{y}"), r(x * 500, y * 500, 500, 500), 2));
		}
	}
	for y in 0..4 {
		for x in 0..4 {
			tiles.push(tile(&format!("base{x}{y}"), r(x * 250, y * 250, 250, 250), 1));
		}
	}
	TileTree::new(tiles).unwrap()
}

#[test]
fn four_quadrants_cover_the_mosaic() {
	let tree = TileTree::new(quadrants()).unwrap();
	let region = r(0, 0, 200, 200);
	let mut subsampling = s(1, 1);
	let tiles = tree.query(&region, &mut subsampling, false);
	assert_eq!(names(&tiles), vec!["name:q1", "name:q2", "name:q3", "name:q4"]);

	let clips: Vec<PixelRect> = tiles.iter().map(|t| t.absolute_region().intersection(&region)).collect();
	for (i, a) in clips.iter().enumerate() {
		for b in &clips[i + 1..] {
			assert!(!a.intersects(b));
		}
	}
	assert!(region.is_covered_by(&clips));
	assert_eq!(tree.kind(), ManagerKind::Tree);
	assert_eq!(tree.region(), region);
}

#[test]
fn overview_is_preferred_at_its_subsampling() {
	let tree = TileTree::new(vec![
		tile("base", r(0, 0, 1000, 1000), 1),
		tile("overview", r(0, 0, 1000, 1000), 2),
	])
	.unwrap();
	let mut subsampling = s(2, 2);
	assert_eq!(names(&tree.query(&tree.region(), &mut subsampling, false)), vec!["name:overview"]);
	let mut subsampling = s(1, 1);
	assert_eq!(names(&tree.query(&tree.region(), &mut subsampling, false)), vec!["name:base"]);
}

#[rstest]
#[case::finest(s(1, 1), r(200, 200, 100, 100), vec!["name:base00", "name:base01", "name:base10", "name:base11"])]
#[case::half(s(2, 2), r(200, 200, 400, 100), vec!["name:half00", "name:half10"])]
#[case::quarter(s(4, 4), r(0, 0, 1000, 1000), vec!["name:quarter"])]
#[case::between_levels(s(6, 6), r(600, 600, 10, 10), vec!["name:half11"])]
#[case::uneven(s(1, 3), r(0, 0, 10, 10), vec!["name:base00"])]
fn pyramid_levels(#[case] target: Subsampling, #[case] region: PixelRect, #[case] expected: Vec<&str>) {
	let tree = pyramid();
	let mut subsampling = target;
	let tiles = tree.query(&region, &mut subsampling, false);
	assert_eq!(names(&tiles), expected);
	assert_eq!(subsampling, target);
}

#[test]
fn returned_tiles_intersect_and_serve_the_request() {
	let tree = pyramid();
	for target in [s(1, 1), s(2, 2), s(3, 3), s(4, 4), s(2, 4), s(8, 2)] {
		for region in [r(0, 0, 1000, 1000), r(-50, 490, 300, 20), r(999, 999, 5, 5), r(250, 0, 1, 1000)] {
			let mut subsampling = target;
			let tiles = tree.query(&region, &mut subsampling, false);
			assert!(!tiles.is_empty(), "{region} at {target}");
			for tile in &tiles {
				assert!(tile.absolute_region().intersects(&region));
				assert!(tile.subsampling().componentwise_le(&target));
				assert!(tile.serves(target));
			}
			// The finest level is complete, so the result always covers the region.
			let clip = region.intersection(&tree.region());
			let covers: Vec<PixelRect> = tiles.iter().map(|t| t.absolute_region()).collect();
			assert!(clip.is_covered_by(&covers), "{region} at {target}");
		}
	}
}

#[test]
fn incomplete_base_level_triggers_a_change() {
	// The overview covers everything, base tiles only the left half.
	let tree = TileTree::new(vec![
		tile("overview", r(0, 0, 1000, 1000), 2),
		tile("left_top", r(0, 0, 500, 500), 1),
		tile("left_bottom", r(0, 500, 500, 500), 1),
	])
	.unwrap();
	let region = r(0, 0, 1000, 1000);

	let mut subsampling = s(3, 3);
	let tiles = tree.query(&region, &mut subsampling, false);
	assert_eq!(names(&tiles), vec!["name:left_bottom", "name:left_top"]);
	assert_eq!(subsampling, s(3, 3));

	let tiles = tree.query(&region, &mut subsampling, true);
	assert_eq!(names(&tiles), vec!["name:overview"]);
	assert_eq!(subsampling, s(2, 2));

	// Inside the left half the base tiles suffice and the request stands.
	let mut subsampling = s(3, 3);
	let tiles = tree.query(&r(0, 0, 400, 1000), &mut subsampling, true);
	assert_eq!(names(&tiles), vec!["name:left_bottom", "name:left_top"]);
	assert_eq!(subsampling, s(3, 3));
}

#[test]
fn change_picks_the_coarsest_reachable_subsampling() {
	let tree = TileTree::new(vec![tile("a", r(0, 0, 800, 800), 4), tile("b", r(800, 0, 800, 800), 2)]).unwrap();
	let mut subsampling = s(7, 7);
	let tiles = tree.query(&tree.region(), &mut subsampling, true);
	// "b" reaches (6,6) first, which "a" cannot serve; both serve (4,4).
	assert_eq!(subsampling, s(4, 4));
	assert_eq!(names(&tiles), vec!["name:a", "name:b"]);
	assert!(tiles.iter().all(|t| t.serves(subsampling)));
}

#[test]
fn sibling_serving_the_request_prevents_a_change() {
	// The overview only reaches (2,2) on the left half, the base tile serves (3,3) everywhere.
	let tree = TileTree::new(vec![
		tile("base", r(0, 0, 1000, 1000), 1),
		tile("overview", r(0, 0, 500, 1000), 2),
	])
	.unwrap();
	for allow_change in [false, true] {
		let mut subsampling = s(3, 3);
		let tiles = tree.query(&tree.region(), &mut subsampling, allow_change);
		assert_eq!(names(&tiles), vec!["name:base"]);
		assert_eq!(subsampling, s(3, 3));
	}
}

/// Union of the tile regions, clipped to `region`.
fn coverage(tiles: &[Arc<Tile>], region: &PixelRect) -> Vec<PixelRect> {
	tiles.iter().map(|t| t.absolute_region().intersection(region)).collect()
}

fn covers(outer: &[PixelRect], inner: &[PixelRect]) -> bool {
	inner.iter().all(|rect| rect.is_covered_by(outer))
}

#[rstest]
#[case::partial_overview_sibling(vec![
	tile("base", r(0, 0, 1000, 1000), 1),
	tile("overview", r(0, 0, 500, 1000), 2),
])]
#[case::incomplete_base(vec![
	tile("overview", r(0, 0, 1000, 1000), 2),
	tile("left_top", r(0, 0, 500, 500), 1),
	tile("left_bottom", r(0, 500, 500, 500), 1),
])]
#[case::overlapping_not_nested(vec![
	tile("a", r(0, 0, 600, 1000), 2),
	tile("b", r(400, 0, 600, 1000), 4),
])]
#[case::anisotropic(vec![
	tile("top", r(0, 0, 1000, 500), 1),
	tile_xy("wide", r(0, 0, 1000, 1000), 2, 1),
	tile_xy("coarse", r(0, 0, 1000, 1000), 4, 2),
])]
#[case::disjoint(vec![
	tile("a", r(0, 0, 800, 800), 4),
	tile("b", r(800, 0, 800, 800), 2),
])]
fn changed_subsampling_is_the_coarsest_that_works(#[case] tiles: Vec<Arc<Tile>>) {
	let tree = TileTree::new(tiles).unwrap();
	let region = tree.region();
	for x in 1..=4 {
		for y in 1..=4 {
			let target = s(x, y);
			let mut effective = target;
			let tiles = tree.query(&region, &mut effective, true);
			assert!(effective.componentwise_le(&target), "{effective} above {target}");
			assert!(tiles.iter().all(|t| t.serves(effective)), "{target} → {effective}");
			let found = coverage(&tiles, &region);

			for cx in effective.x..=target.x {
				for cy in effective.y..=target.y {
					let candidate = s(cx, cy);
					if candidate == effective {
						continue;
					}
					let mut exact = candidate;
					let alternative = tree.query(&region, &mut exact, false);
					assert!(
						!covers(&coverage(&alternative, &region), &found),
						"{candidate} would also serve what {target} → {effective} returned"
					);
				}
			}
		}
	}
}

#[test]
fn too_coarse_or_distant_tiles_are_not_returned() {
	let tree = TileTree::new(vec![tile("overview", r(0, 0, 1000, 1000), 2)]).unwrap();
	let mut subsampling = s(1, 1);
	assert!(tree.query(&tree.region(), &mut subsampling, true).is_empty());
	assert_eq!(subsampling, s(1, 1));
	assert!(!tree.intersects(&tree.region(), s(1, 1)));
	assert!(tree.intersects(&tree.region(), s(3, 3)));
	assert!(!tree.intersects(&r(1000, 0, 10, 10), s(2, 2)));

	let mut subsampling = s(2, 2);
	assert!(tree.query(&r(-10, -10, 10, 10), &mut subsampling, false).is_empty());
}

#[test]
fn subsampling_extremes_are_aggregated() {
	let tree = pyramid();
	assert_eq!(tree.root().max_subsampling(), s(4, 4));
	assert_eq!(tree.root().min_subsampling(), s(1, 1));
	assert_eq!(tree.root().bounds(), r(0, 0, 1000, 1000));
	// quarter → half → base
	assert_eq!(tree.depth(), 3);
	assert_eq!(tree.node_count(), 22);
}

#[test]
fn anisotropic_extremes_are_componentwise() {
	let tree = TileTree::new(vec![
		tile_xy("wide", r(0, 0, 400, 400), 4, 1),
		tile_xy("tall", r(400, 0, 400, 400), 1, 4),
	])
	.unwrap();
	assert_eq!(tree.root().max_subsampling(), s(4, 4));
	assert_eq!(tree.root().min_subsampling(), s(1, 1));
}

#[test]
fn overlapping_mixed_siblings_are_grouped_by_subsampling() {
	let tree = TileTree::new(vec![
		tile("fine", r(0, 0, 100, 100), 1),
		tile("coarse_a", r(50, 0, 100, 100), 2),
		tile("coarse_b", r(150, 0, 100, 100), 2),
	])
	.unwrap();
	let root = tree.root();
	assert_eq!(root.children().len(), 2);
	let group = tree.node(root.children()[0]).unwrap();
	assert_eq!(group.tile(), None);
	assert_eq!(group.bounds(), r(50, 0, 200, 100));

	let mut subsampling = s(2, 2);
	let tiles = tree.query(&r(0, 0, 250, 100), &mut subsampling, false);
	assert_eq!(names(&tiles), vec!["name:coarse_a", "name:coarse_b", "name:fine"]);
}

#[test]
fn flat_layouts_are_thickened() {
	let mut tiles = Vec::new();
	for y in 0..20 {
		for x in 0..20 {
			tiles.push(tile(&format!("t{x:02}_{y:02}"), r(x * 10, y * 10, 10, 10), 1));
		}
	}
	let tree = TileTree::new(tiles).unwrap();
	assert!(tree.root().children().len() <= build::MAX_CHILDREN);
	assert!(tree.node_count() > 401);
	assert!(tree.depth() > 2);

	let mut subsampling = s(1, 1);
	let found = tree.query(&r(55, 105, 10, 10), &mut subsampling, false);
	assert_eq!(names(&found), vec!["name:t05_10", "name:t05_11", "name:t06_10", "name:t06_11"]);
	assert!(tree.intersects(&r(199, 199, 1, 1), s(1, 1)));
	assert!(!tree.intersects(&r(200, 0, 1, 1), s(1, 1)));
}
