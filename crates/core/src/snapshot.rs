//! Explored-cell snapshots, as fetched from the exploration backend.
//!
//! The client never diffs snapshots. Each fetch is parsed into a fresh
//! [Snapshot], which is then fed wholesale into a new
//! [SpatialIndex](crate::SpatialIndex).

use crate::{
    exploration::{ExplorationMethod, ExplorationStats},
    geo::GeoPoint,
    hex::CellId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One explored cell, as recorded by the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExploredCellRecord {
    pub cell_id: CellId,
    pub first_visited_at: DateTime<Utc>,
    pub exploration_method: ExplorationMethod,
    /// Cell polygon, as an open ring (the last point implicitly connects back
    /// to the first). May be empty if the backend didn't send geometry, in
    /// which case it gets derived from the grid during indexing.
    #[serde(default)]
    pub boundary: Vec<GeoPoint>,
}

/// All explored cells for a user at a point in time, plus optional aggregate
/// stats if the backend included them
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub records: Vec<ExploredCellRecord>,
    #[serde(default)]
    pub stats: Option<ExplorationStats>,
}

#[cfg(feature = "json")]
impl Snapshot {
    /// Parse the backend's explored-areas response. Cell geometry comes in a
    /// GeoJSON-shaped feature collection, but the backend flips each position
    /// back to `[lat, lng]` before sending it. Rings repeat their first vertex
    /// at the end, which gets dropped here.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let response: wire::ExploredResponse =
            serde_json::from_str(json).context("error deserializing snapshot")?;
        let records = response
            .hexagons
            .features
            .into_iter()
            .map(wire::Feature::into_record)
            .collect();
        let stats = response.stats.map(wire::Stats::into_stats);
        Ok(Self { records, stats })
    }
}

/// Wire format of the backend response. Only the fields we care about are
/// declared, everything else is ignored.
#[cfg(feature = "json")]
mod wire {
    use super::*;
    use crate::util::unit::{Meter, Meter2};

    #[derive(Debug, Deserialize)]
    pub struct ExploredResponse {
        #[serde(default)]
        pub stats: Option<Stats>,
        pub hexagons: FeatureCollection,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Stats {
        pub total_visits: u64,
        pub unique_hexes: u64,
        pub estimated_distance_meters: f64,
        pub total_area_sq_meters: f64,
    }

    impl Stats {
        pub fn into_stats(self) -> ExplorationStats {
            ExplorationStats {
                total_visits: self.total_visits,
                unique_cells: self.unique_hexes,
                estimated_distance: Meter(self.estimated_distance_meters),
                total_area: Meter2(self.total_area_sq_meters),
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct FeatureCollection {
        #[serde(default)]
        pub features: Vec<Feature>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Feature {
        #[serde(default)]
        pub geometry: Option<Geometry>,
        pub properties: Properties,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        /// Polygon rings. The first is the outer ring, cells never have holes
        /// so any others are ignored.
        #[serde(default)]
        pub coordinates: Vec<Vec<Vec<f64>>>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Properties {
        pub hex_index: CellId,
        pub first_visited: DateTime<Utc>,
        pub exploration_method: ExplorationMethod,
    }

    impl Feature {
        pub fn into_record(self) -> ExploredCellRecord {
            let boundary = self
                .geometry
                .and_then(|geometry| geometry.coordinates.into_iter().next())
                .map(ring_to_points)
                .unwrap_or_default();
            ExploredCellRecord {
                cell_id: self.properties.hex_index,
                first_visited_at: self.properties.first_visited,
                exploration_method: self.properties.exploration_method,
                boundary,
            }
        }
    }

    /// Convert a closed `[lat, lng]` ring into our open-ring point list. A malformed
    /// position anywhere invalidates the whole ring, since a polygon with a
    /// vertex missing would render as the wrong shape.
    fn ring_to_points(ring: Vec<Vec<f64>>) -> Vec<GeoPoint> {
        let mut points = Vec::with_capacity(ring.len());
        for position in ring {
            match position.as_slice() {
                [lat, lng, ..] => points.push(GeoPoint::new(*lat, *lng)),
                _ => return Vec::new(),
            }
        }
        // Rings are explicitly closed
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        points
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{geo::GeoBounds, hex::HexGrid, index::SpatialIndex};
    use chrono::TimeZone;

    const RESPONSE: &str = r#"{
        "success": true,
        "stats": {
            "totalVisits": 12,
            "uniqueHexes": 2,
            "estimatedDistanceMeters": 111.6,
            "totalAreaSqMeters": 518,
            "estimatedDistanceKm": "0.11"
        },
        "hexagons": {
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[
                            [40.75, -73.98], [40.75, -73.97], [40.76, -73.97],
                            [40.75, -73.98]
                        ]]
                    },
                    "properties": {
                        "hexIndex": "892a100d2c3ffff",
                        "firstVisited": "2025-06-01T12:30:00Z",
                        "explorationMethod": "walking"
                    }
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "Polygon", "coordinates": [[[1.0]]]},
                    "properties": {
                        "hexIndex": "892a100d2c7ffff",
                        "firstVisited": "2025-06-02T08:00:00Z",
                        "explorationMethod": "biking"
                    }
                }
            ]
        }
    }"#;

    #[test]
    fn test_from_json() {
        let snapshot = Snapshot::from_json(RESPONSE).unwrap();
        assert_eq!(snapshot.records.len(), 2);

        let first = &snapshot.records[0];
        assert_eq!(first.cell_id, CellId::new("892a100d2c3ffff"));
        assert_eq!(
            first.first_visited_at,
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap()
        );
        assert_eq!(first.exploration_method, ExplorationMethod::Walking);
        // [lat, lng] order is kept, and the closing vertex dropped
        assert_eq!(
            first.boundary,
            vec![
                GeoPoint::new(40.75, -73.98),
                GeoPoint::new(40.75, -73.97),
                GeoPoint::new(40.76, -73.97),
            ]
        );

        // Malformed geometry means no boundary, not a parse failure
        assert!(snapshot.records[1].boundary.is_empty());

        let stats = snapshot.stats.unwrap();
        assert_eq!(stats.total_visits, 12);
        assert_eq!(stats.unique_cells, 2);
    }

    /// A ring built the way the backend builds it should come back as the
    /// grid's own boundary for that cell, and index to that cell
    #[test]
    fn test_from_json_grid_boundary() {
        let grid = HexGrid::default();
        let cell = grid.cell_at(GeoPoint::new(40.7589, -73.9851)).unwrap();
        let boundary = grid.cell_to_boundary(&cell);
        let mut ring: Vec<[f64; 2]> = boundary
            .iter()
            .map(|point| [point.latitude(), point.longitude()])
            .collect();
        ring.push(ring[0]);
        let response = serde_json::json!({
            "hexagons": {
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "Polygon", "coordinates": [ring]},
                    "properties": {
                        "hexIndex": cell,
                        "firstVisited": "2025-06-01T12:30:00Z",
                        "explorationMethod": "walking"
                    }
                }]
            }
        });

        let snapshot = Snapshot::from_json(&response.to_string()).unwrap();
        let record = &snapshot.records[0];
        assert_eq!(record.boundary, boundary);
        let envelope = GeoBounds::from_points(&record.boundary).unwrap();
        assert!(envelope.contains(&GeoPoint::new(40.7589, -73.9851)));
        // The middle of the parsed ring lands back in the same cell
        let n = record.boundary.len() as f64;
        let centroid = GeoPoint::new(
            record.boundary.iter().map(GeoPoint::latitude).sum::<f64>() / n,
            record.boundary.iter().map(GeoPoint::longitude).sum::<f64>() / n,
        );
        assert_eq!(grid.cell_at(centroid).unwrap(), cell);

        let index = SpatialIndex::new(snapshot.records, &grid);
        assert_eq!(index.query_bounds(&envelope).len(), 1);
    }

    #[test]
    fn test_from_json_garbage() {
        assert!(Snapshot::from_json("{\"hexagons\": 3}").is_err());
        assert!(Snapshot::from_json("not json").is_err());
    }
}
