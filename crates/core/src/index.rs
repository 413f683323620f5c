use crate::{
    geo::GeoBounds,
    hex::{CellId, HexGrid},
    snapshot::ExploredCellRecord,
    timed,
    util::degree_bucket,
};
use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::HashMap;

/// Size of one acceleration bucket, in degrees. 0.01° is roughly 1km, i.e. a
/// handful of res 9 cells per bucket.
const BUCKET_DEGREES: f64 = 0.01;

/// A record whose bounds cover more buckets than this isn't bucketed at all,
/// it gets checked on every query instead. Real cells only ever cover a few.
const MAX_BUCKETS_PER_CELL: u64 = 64;

/// Key of a single acceleration bucket: (latitude bucket, longitude bucket)
type BucketKey = (i64, i64);

/// A record in the index, along with its precomputed envelope
#[derive(Clone, Debug)]
struct IndexedCell {
    record: ExploredCellRecord,
    bounds: GeoBounds,
}

/// In-memory index of a user's explored cells, supporting fast "which cells
/// intersect this viewport" queries.
///
/// An index is built once from a complete snapshot and never mutated. When a
/// new snapshot arrives, build a new index and throw the old one away.
///
/// ## Acceleration
///
/// Each record is bucketed into a fixed-size degree grid by its bounds. A
/// query only visits the buckets that overlap the query box, unless that would
/// be more buckets than there are records, in which case it just scans
/// everything. Both paths return exactly the same records, in snapshot order.
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    /// Records keyed by cell. Ordered by first appearance in the snapshot.
    cells: IndexMap<CellId, IndexedCell, FnvBuildHasher>,
    /// Position of each record in `cells`, bucketed by degree grid
    buckets: HashMap<BucketKey, Vec<usize>, FnvBuildHasher>,
    /// Positions of records too big to bucket
    oversized: Vec<usize>,
}

impl SpatialIndex {
    /// Build an index from a full snapshot of explored cells.
    ///
    /// - Records with an invalid cell ID are dropped, so every cell in the
    ///   index is valid under the grid
    /// - Records with no boundary get one derived from the grid
    /// - Records whose boundary still can't be used (fewer than 3 vertices, or
    ///   non-finite coordinates) are dropped, i.e. render nothing for them
    ///
    /// If a cell appears more than once, the later record wins but keeps the
    /// position of the first.
    pub fn new(
        records: impl IntoIterator<Item = ExploredCellRecord>,
        grid: &HexGrid,
    ) -> Self {
        timed!("Spatial index build", {
            let mut cells: IndexMap<CellId, IndexedCell, FnvBuildHasher> =
                IndexMap::default();
            for mut record in records {
                if !grid.is_valid_cell(record.cell_id.as_str()) {
                    warn!("Dropping record with invalid cell {}", record.cell_id);
                    continue;
                }
                if record.boundary.is_empty() {
                    record.boundary = grid.cell_to_boundary(&record.cell_id);
                }
                let bounds = match GeoBounds::from_points(&record.boundary) {
                    Some(bounds) if record.boundary.len() >= 3 => bounds,
                    _ => {
                        warn!(
                            "Dropping record for cell {} with unusable boundary \
                            ({} vertices)",
                            record.cell_id,
                            record.boundary.len()
                        );
                        continue;
                    }
                };
                cells.insert(
                    record.cell_id.clone(),
                    IndexedCell { record, bounds },
                );
            }

            let mut buckets: HashMap<BucketKey, Vec<usize>, FnvBuildHasher> =
                HashMap::default();
            let mut oversized = Vec::new();
            for (i, cell) in cells.values().enumerate() {
                if bucket_count(&cell.bounds) > MAX_BUCKETS_PER_CELL {
                    oversized.push(i);
                    continue;
                }
                for key in bucket_keys(&cell.bounds) {
                    buckets.entry(key).or_default().push(i);
                }
            }
            if !oversized.is_empty() {
                warn!(
                    "{} cells have unusually large boundaries, they'll be \
                    checked on every query",
                    oversized.len()
                );
            }

            debug!(
                "Built spatial index with {} cells in {} buckets",
                cells.len(),
                buckets.len()
            );
            Self {
                cells,
                buckets,
                oversized,
            }
        })
    }

    /// Number of cells in the index
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Look up the record for a single cell
    pub fn get(&self, cell_id: &CellId) -> Option<&ExploredCellRecord> {
        self.cells.get(cell_id).map(|cell| &cell.record)
    }

    /// Iterate over every record, in snapshot order
    pub fn iter(&self) -> impl Iterator<Item = &ExploredCellRecord> {
        self.cells.values().map(|cell| &cell.record)
    }

    /// Get every record whose bounds intersect the given box, in snapshot
    /// order. This gets called on every animation frame, so it needs to stay
    /// cheap. An inverted or non-finite box matches nothing. A box that
    /// pokes past the poles or the antimeridian (e.g. after padding) is fine.
    pub fn query_bounds(
        &self,
        view_bounds: &GeoBounds,
    ) -> Vec<&ExploredCellRecord> {
        let usable = view_bounds.south_west().is_finite()
            && view_bounds.north_east().is_finite()
            && view_bounds.south <= view_bounds.north
            && view_bounds.west <= view_bounds.east;
        if self.is_empty() || !usable {
            return Vec::new();
        }

        if bucket_count(view_bounds) < self.cells.len() as u64 {
            self.query_buckets(view_bounds)
        } else {
            self.query_linear(view_bounds)
        }
    }

    /// Check every record. O(n), but there's no per-query setup
    fn query_linear(&self, view_bounds: &GeoBounds) -> Vec<&ExploredCellRecord> {
        self.cells
            .values()
            .filter(|cell| cell.bounds.intersects(view_bounds))
            .map(|cell| &cell.record)
            .collect()
    }

    /// Only check records in buckets that overlap the query box
    fn query_buckets(
        &self,
        view_bounds: &GeoBounds,
    ) -> Vec<&ExploredCellRecord> {
        let mut positions: Vec<usize> = bucket_keys(view_bounds)
            .filter_map(|key| self.buckets.get(&key))
            .flatten()
            .chain(&self.oversized)
            .copied()
            .collect();
        // A record spanning multiple buckets shows up once per bucket.
        // Sorting also restores snapshot order.
        positions.sort_unstable();
        positions.dedup();

        positions
            .into_iter()
            .filter_map(|i| self.cells.get_index(i))
            .map(|(_, cell)| cell)
            .filter(|cell| cell.bounds.intersects(view_bounds))
            .map(|cell| &cell.record)
            .collect()
    }
}

/// Number of buckets a box overlaps
fn bucket_count(bounds: &GeoBounds) -> u64 {
    let lat_buckets = degree_bucket(bounds.north, BUCKET_DEGREES)
        - degree_bucket(bounds.south, BUCKET_DEGREES)
        + 1;
    let lng_buckets = degree_bucket(bounds.east, BUCKET_DEGREES)
        - degree_bucket(bounds.west, BUCKET_DEGREES)
        + 1;
    lat_buckets.max(0) as u64 * lng_buckets.max(0) as u64
}

/// Every bucket a box overlaps. Boxes are closed, so a box edge sitting
/// exactly on a bucket boundary also overlaps the next bucket.
fn bucket_keys(bounds: &GeoBounds) -> impl Iterator<Item = BucketKey> {
    let lat_start = degree_bucket(bounds.south, BUCKET_DEGREES);
    let lat_end = degree_bucket(bounds.north, BUCKET_DEGREES);
    let lng_start = degree_bucket(bounds.west, BUCKET_DEGREES);
    let lng_end = degree_bucket(bounds.east, BUCKET_DEGREES);
    (lat_start..=lat_end)
        .flat_map(move |lat| (lng_start..=lng_end).map(move |lng| (lat, lng)))
}
