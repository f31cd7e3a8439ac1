//! Coordinate transform contract shared by all projections.

use thiserror::Error;

/// Errors raised while constructing or evaluating a projection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// UTM zones are numbered 1 through 60.
    #[error("invalid UTM zone {0} (expected 1-60)")]
    InvalidZone(i32),

    /// An input coordinate was NaN or infinite.
    #[error("non-finite coordinate ({0}, {1})")]
    NonFinite(f64, f64),

    /// Latitude outside the valid geographic range.
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// The projected coordinate has no geographic counterpart.
    #[error("cannot invert projected coordinate ({easting}, {northing})")]
    InverseFailed { easting: f64, northing: f64 },
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;

/// A pair of functions between WGS84 geographic coordinates and a planar frame.
///
/// Geographic coordinates are `(longitude, latitude)` in degrees, projected
/// coordinates `(easting, northing)` in meters.
pub trait GeoTransform: Send + Sync {
    /// Project a geographic coordinate.
    fn to_projected(&self, lon: f64, lat: f64) -> Result<(f64, f64)>;

    /// Invert a projected coordinate back to geographic.
    fn to_geographic(&self, easting: f64, northing: f64) -> Result<(f64, f64)>;
}

impl<T: GeoTransform + ?Sized> GeoTransform for Box<T> {
    fn to_projected(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        (**self).to_projected(lon, lat)
    }

    fn to_geographic(&self, easting: f64, northing: f64) -> Result<(f64, f64)> {
        (**self).to_geographic(easting, northing)
    }
}

pub(crate) fn ensure_finite(a: f64, b: f64) -> Result<()> {
    if a.is_finite() && b.is_finite() {
        Ok(())
    } else {
        Err(ProjectionError::NonFinite(a, b))
    }
}
