//! Core types for velocity model queries.

use serde::{Deserialize, Serialize};

/// Marker stored in every property field that has no data.
pub const NO_DATA: f64 = -1.0;

/// A geographic query location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    /// Longitude in degrees (WGS84).
    pub longitude: f64,
    /// Latitude in degrees (WGS84).
    pub latitude: f64,
    /// Depth below the surface in meters.
    pub depth: f64,
}

impl QueryPoint {
    pub fn new(longitude: f64, latitude: f64, depth: f64) -> Self {
        Self {
            longitude,
            latitude,
            depth,
        }
    }
}

/// Material properties at a point, either a raw lattice sample or an
/// interpolated result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyTuple {
    /// P-wave velocity in m/s.
    pub vp: f64,
    /// S-wave velocity in m/s.
    pub vs: f64,
    /// Density in g/m^3.
    pub rho: f64,
    /// Not provided by this model; always [`NO_DATA`].
    pub qp: f64,
    /// Not provided by this model; always [`NO_DATA`].
    pub qs: f64,
}

impl PropertyTuple {
    /// A tuple with every field set to [`NO_DATA`].
    pub const fn no_data() -> Self {
        Self {
            vp: NO_DATA,
            vs: NO_DATA,
            rho: NO_DATA,
            qp: NO_DATA,
            qs: NO_DATA,
        }
    }

    /// A raw lattice sample: only vp is known.
    pub const fn from_vp(vp: f64) -> Self {
        Self {
            vp,
            ..Self::no_data()
        }
    }

    /// True when vp, vs and rho all carry the no-data marker.
    pub fn is_no_data(&self) -> bool {
        self.vp == NO_DATA && self.vs == NO_DATA && self.rho == NO_DATA
    }
}

impl Default for PropertyTuple {
    fn default() -> Self {
        Self::no_data()
    }
}

/// Lattice dimensions in grid points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl Dimensions {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of lattice points.
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat offset of `(x, y, z)`: z is the outermost index, x the innermost.
    #[inline]
    pub fn offset(&self, x: usize, y: usize, z: usize) -> usize {
        z * (self.nx * self.ny) + y * self.nx + x
    }

    /// Whether `(x, y, z)` addresses a lattice point.
    #[inline]
    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.nx && y < self.ny && z < self.nz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_tuple() {
        let t = PropertyTuple::no_data();
        assert!(t.is_no_data());
        assert_eq!(t.qp, NO_DATA);
        assert_eq!(t.qs, NO_DATA);
        assert_eq!(PropertyTuple::default(), t);
    }

    #[test]
    fn test_from_vp_leaves_derived_fields_unset() {
        let t = PropertyTuple::from_vp(4838.5);
        assert_eq!(t.vp, 4838.5);
        assert_eq!(t.vs, NO_DATA);
        assert_eq!(t.rho, NO_DATA);
        assert!(!t.is_no_data());
    }

    #[test]
    fn test_offset_layout() {
        let dims = Dimensions::new(66, 86, 9);
        assert_eq!(dims.len(), 66 * 86 * 9);
        assert_eq!(dims.offset(0, 0, 0), 0);
        assert_eq!(dims.offset(1, 0, 0), 1);
        assert_eq!(dims.offset(0, 1, 0), 66);
        assert_eq!(dims.offset(0, 0, 1), 66 * 86);
        assert_eq!(dims.offset(65, 85, 8), dims.len() - 1);
    }

    #[test]
    fn test_contains() {
        let dims = Dimensions::new(2, 3, 4);
        assert!(dims.contains(1, 2, 3));
        assert!(!dims.contains(2, 0, 0));
        assert!(!dims.contains(0, 3, 0));
        assert!(!dims.contains(0, 0, 4));
    }
}
