#![allow(clippy::unwrap_used)]

use vtopo::math::{BoundBox, Point3};
use vtopo::network::NetworkBuilder;
use vtopo::operations::RemoveDuplicates;
use vtopo::topology::{BuildLevel, CentroidArea, Feature, LineType, SideRef};
use vtopo::{Map, MapConfig, Primitive, SpatialIndexConfig, VecReader};

fn p(x: f64, y: f64) -> Point3 {
    Point3::new(x, y, 0.0)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A 10x10 square as four boundaries plus a centroid at its middle.
fn square_with_centroid() -> Vec<Primitive> {
    vec![
        Primitive::new(LineType::Boundary, vec![p(0.0, 0.0), p(10.0, 0.0)]),
        Primitive::new(LineType::Boundary, vec![p(10.0, 0.0), p(10.0, 10.0)]),
        Primitive::new(LineType::Boundary, vec![p(10.0, 10.0), p(0.0, 10.0)]),
        Primitive::new(LineType::Boundary, vec![p(0.0, 10.0), p(0.0, 0.0)]),
        Primitive::new(LineType::Centroid, vec![p(5.0, 5.0)]).with_cat(1, 42),
    ]
}

#[test]
fn square_boundaries_make_one_area() {
    init_tracing();
    let mut map = Map::open(MapConfig::default(), VecReader::new(square_with_centroid())).unwrap();
    let stats = map.build(BuildLevel::All).unwrap();

    assert_eq!(stats.primitives, 5);
    assert_eq!(map.num_nodes().unwrap(), 4);
    assert_eq!(map.num_areas().unwrap(), 1);
    assert_eq!(stats.bound_centroids, 1);

    let area = map.find_area(5.0, 5.0).unwrap().unwrap();
    let data = map.store().area(area).unwrap();
    assert_eq!(data.lines.len(), 4);
    assert_eq!(data.bbox, BoundBox::from_points(&[p(0.0, 0.0), p(10.0, 10.0)]));
    let centroid = data.centroid.unwrap();
    assert_eq!(
        map.centroid_area(centroid).unwrap(),
        Some(CentroidArea::Bound(area))
    );
    assert!(map.find_area(15.0, 5.0).unwrap().is_none());

    // every boundary has the area on exactly one side
    for (id, line) in map.store().lines() {
        if line.kind != LineType::Boundary {
            continue;
        }
        let (left, right) = map.line_areas(id).unwrap().unwrap();
        let sides = [left, right];
        assert_eq!(sides.iter().filter(|s| **s == SideRef::Area(area)).count(), 1);
    }

    let hits = map.category_index().unwrap().find(1, 42);
    assert!(hits.iter().any(|e| e.feature == Feature::Area(area)));
}

#[test]
fn square_builds_with_file_backed_index() {
    let dir = tempfile::tempdir().unwrap();
    let config = MapConfig::new().with_index(
        SpatialIndexConfig::default()
            .with_file_backing(dir.path())
            .with_cache_per_level(2),
    );
    let mut map = Map::open(config, VecReader::new(square_with_centroid())).unwrap();
    map.build(BuildLevel::All).unwrap();
    assert!(map.find_area(5.0, 5.0).unwrap().is_some());
    map.flush_index().unwrap();
    assert_eq!(
        map.select_lines(&BoundBox::from_xy(-1.0, -1.0, 11.0, 11.0))
            .unwrap()
            .len(),
        5
    );
}

#[test]
fn coincident_lines_merge_categories() {
    let prims = vec![
        Primitive::new(LineType::Line, vec![p(0.0, 0.0), p(4.0, 4.0)]).with_cat(1, 1),
        Primitive::new(LineType::Line, vec![p(0.0, 0.0), p(4.0, 4.0)]).with_cat(1, 2),
    ];
    let mut map = Map::open(MapConfig::default(), VecReader::new(prims)).unwrap();
    map.build(BuildLevel::Base).unwrap();

    let removed = RemoveDuplicates::new(&[LineType::Line])
        .execute(&mut map)
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(map.num_lines().unwrap(), 1);
    let (_, line) = map.store().lines().next().unwrap();
    assert_eq!(line.cats.len(), 2);
    assert!(line.cats.contains(1, 1) && line.cats.contains(1, 2));
}

#[test]
fn route_prefers_cheaper_detour() {
    // A(0,0) - B(1,0) cost 2, B - C(1,1) cost 3, A - C cost 10; costs from layer 1
    let prims = vec![
        Primitive::new(LineType::Line, vec![p(0.0, 0.0), p(1.0, 0.0)]).with_cat(1, 2),
        Primitive::new(LineType::Line, vec![p(1.0, 0.0), p(1.0, 1.0)]).with_cat(1, 3),
        Primitive::new(LineType::Line, vec![p(0.0, 0.0), p(1.0, 1.0)]).with_cat(1, 10),
    ];
    let mut map = Map::open(MapConfig::default(), VecReader::new(prims)).unwrap();
    map.build(BuildLevel::Base).unwrap();

    let builder = NetworkBuilder::new(&[LineType::Line])
        .with_forward_cost(|_, line| f64::from(line.cats.get(1).unwrap_or(0)));
    map.build_graph(&builder).unwrap();

    let a = map.find_node(0.0, 0.0, 0.01).unwrap().unwrap();
    let c = map.find_node(1.0, 1.0, 0.01).unwrap().unwrap();
    let path = map.shortest_path(a, c).unwrap();
    approx::assert_relative_eq!(path.cost(), 5.0);

    let via: Vec<i32> = path
        .arcs()
        .iter()
        .map(|d| map.store().line(d.line).unwrap().cats.get(1).unwrap())
        .collect();
    assert_eq!(via, vec![2, 3]);
}
