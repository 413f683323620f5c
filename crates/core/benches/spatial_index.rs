use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hexfog::{
    ExplorationMethod, ExploredCellRecord, GeoBounds, GeoPoint, HexGrid,
    LodPolicy, SpatialIndex,
};

const TIMES_SQUARE: GeoPoint = GeoPoint::new(40.7589, -73.9851);

/// A dense blob of explored cells, about what a heavy user racks up
fn explored_records(grid: &HexGrid) -> Vec<ExploredCellRecord> {
    let center = grid.cell_at(TIMES_SQUARE).unwrap();
    grid.disk_within(&center, 40)
        .into_iter()
        .map(|cell_id| ExploredCellRecord {
            boundary: grid.cell_to_boundary(&cell_id),
            cell_id,
            first_visited_at: Utc::now(),
            exploration_method: ExplorationMethod::Walking,
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let grid = HexGrid::default();
    let records = explored_records(&grid);

    let mut group = c.benchmark_group("spatial-index");
    group.sample_size(20);

    group.bench_function("build", |b| {
        b.iter(|| SpatialIndex::new(black_box(records.clone()), &grid))
    });

    let index = SpatialIndex::new(records, &grid);
    // Roughly an 800x600 view at zoom 16, and at zoom 12
    let street_view = GeoBounds::new(40.754, -73.994, 40.764, -73.976);
    let city_view = GeoBounds::new(40.68, -74.12, 40.84, -73.85);
    group.bench_function("query street view", |b| {
        b.iter(|| index.query_bounds(black_box(&street_view)).len())
    });
    group.bench_function("query city view", |b| {
        b.iter(|| index.query_bounds(black_box(&city_view)).len())
    });

    let lod = LodPolicy::default();
    group.bench_function("query and simplify city view", |b| {
        b.iter(|| lod.simplify(index.query_bounds(black_box(&city_view)), 12).len())
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
