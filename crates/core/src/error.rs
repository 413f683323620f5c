use thiserror::Error;

/// Errors that can come out of the geometry and rendering layers.
///
/// Most geometry failures never reach the caller as an error. Queries on an
/// invalid cell degrade to empty/zero/sentinel values at the
/// [HexGrid](crate::HexGrid) boundary, so the renderer stays live even with
/// partially corrupt data.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HexFogError {
    /// Latitude/longitude outside the valid range (or not finite)
    #[error("invalid coordinate: lat={latitude}, lng={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Malformed or unrecognized cell identifier
    #[error("invalid cell identifier: {0:?}")]
    InvalidCell(String),

    /// The drawing surface could not be acquired or written to
    #[error("render surface unavailable: {0}")]
    SurfaceUnavailable(String),
}
