//! Mapping from the projected frame to lattice indices.
//!
//! The model region is a rectangle in UTM that may be tilted. Points are
//! translated so the bottom-left corner is at the origin and rotated into
//! the rectangle's own axes; the rotated position picks the lattice node and
//! the translated position gives the interpolation fractions.

use crate::config::{GridConfig, PlanarPoint};
use crate::error::{ModelError, Result};

/// Vertical size of the layers used to pick the depth index, meters.
///
/// Independent of `depth_interval`, which only drives the vertical
/// interpolation fraction.
pub const LAYER_THICKNESS_M: f64 = 1000.0;

/// Geometry derived once from the configuration corners.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    origin: PlanarPoint,
    /// Rotation of the rectangle's left edge from grid north, radians.
    rotation: f64,
    cos_rotation: f64,
    sin_rotation: f64,
    /// Bottom-left to top-left distance.
    total_height_m: f64,
    /// Top-left to top-right distance.
    total_width_m: f64,
    /// Easting step used for node selection.
    delta_e: f64,
    /// Northing step used for node selection.
    delta_n: f64,
    /// Node spacing along the width, for interpolation fractions.
    x_interval: f64,
    /// Node spacing along the height, for interpolation fractions.
    y_interval: f64,
    depth_interval: f64,
}

/// Where a point falls in the lattice.
///
/// Indices are signed: points outside the region produce negative or
/// too-large indices that the caller must reject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellLocation {
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub x_percent: f64,
    pub y_percent: f64,
    pub z_percent: f64,
}

impl GridGeometry {
    /// Derive the geometry from a validated configuration.
    pub fn new(config: &GridConfig) -> Result<Self> {
        let origin = config.bottom_left;

        let east_extent = config.top_left.easting - origin.easting;
        let north_extent = config.top_left.northing - origin.northing;
        let rotation = (east_extent / north_extent).atan();

        let total_height_m = origin.distance_to(&config.top_left);
        let total_width_m = config.top_left.distance_to(&config.top_right);
        if !(total_height_m > 0.0 && total_width_m > 0.0) || !rotation.is_finite() {
            return Err(ModelError::config_invalid(format!(
                "corners do not span a rectangle (width {} m, height {} m)",
                total_width_m, total_height_m
            )));
        }

        let delta_e = node_step(config.top_right.easting - origin.easting, config.nx);
        let delta_n = node_step(config.top_right.northing - origin.northing, config.ny);
        for (delta, name) in [(delta_e, "easting"), (delta_n, "northing")] {
            if !delta.is_finite() || delta == 0.0 {
                return Err(ModelError::config_invalid(format!(
                    "top-right and bottom-left corners have the same {}; nodes cannot be indexed",
                    name
                )));
            }
        }

        Ok(Self {
            origin,
            rotation,
            cos_rotation: rotation.cos(),
            sin_rotation: rotation.sin(),
            total_height_m,
            total_width_m,
            delta_e,
            delta_n,
            x_interval: node_step(total_width_m, config.nx),
            y_interval: node_step(total_height_m, config.ny),
            depth_interval: config.depth_interval,
        })
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.rotation.to_degrees()
    }

    pub fn total_width_m(&self) -> f64 {
        self.total_width_m
    }

    pub fn total_height_m(&self) -> f64 {
        self.total_height_m
    }

    /// Node spacing along (width, height) in meters.
    pub fn spacing(&self) -> (f64, f64) {
        (self.x_interval, self.y_interval)
    }

    /// Position relative to the bottom-left corner, before rotation.
    pub fn translate(&self, easting: f64, northing: f64) -> (f64, f64) {
        (easting - self.origin.easting, northing - self.origin.northing)
    }

    /// Rotate a translated position into the rectangle's axes.
    pub fn rotate(&self, u: f64, v: f64) -> (f64, f64) {
        (
            self.cos_rotation * u - self.sin_rotation * v,
            self.sin_rotation * u + self.cos_rotation * v,
        )
    }

    /// Locate a projected point at `depth` meters.
    pub fn locate(&self, easting: f64, northing: f64, depth: f64) -> CellLocation {
        let (u, v) = self.translate(easting, northing);
        let (x, y) = self.rotate(u, v);

        CellLocation {
            x: (x / self.delta_e).round() as i64,
            y: (y / self.delta_n).round() as i64,
            z: (depth / LAYER_THICKNESS_M).trunc() as i64,
            x_percent: (u % self.x_interval) / self.x_interval,
            y_percent: (v % self.y_interval) / self.y_interval,
            z_percent: (depth % self.depth_interval) / self.depth_interval,
        }
    }
}

/// Distance between adjacent nodes when `n` nodes span `extent`.
/// A single node covers the whole extent.
fn node_step(extent: f64, n: i64) -> f64 {
    if n > 1 {
        extent / (n - 1) as f64
    } else {
        extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_config(nx: i64, ny: i64) -> GridConfig {
        GridConfig {
            utm_zone: 11,
            model_dir: "iv".to_string(),
            nx,
            ny,
            nz: 9,
            depth: 8000.0,
            top_left: PlanarPoint::new(589000.0, 3692000.0),
            top_right: PlanarPoint::new(654000.0, 3692000.0),
            bottom_left: PlanarPoint::new(589000.0, 3607000.0),
            bottom_right: PlanarPoint::new(654000.0, 3607000.0),
            depth_interval: 1000.0,
            interpolation: true,
        }
    }

    #[test]
    fn test_axis_aligned_geometry() {
        let geom = GridGeometry::new(&square_config(66, 86)).unwrap();
        assert_eq!(geom.rotation_degrees(), 0.0);
        assert_eq!(geom.total_width_m(), 65000.0);
        assert_eq!(geom.total_height_m(), 85000.0);
        assert_eq!(geom.spacing(), (1000.0, 1000.0));
    }

    #[test]
    fn test_locate_on_node() {
        let geom = GridGeometry::new(&square_config(66, 86)).unwrap();
        let loc = geom.locate(589000.0 + 3000.0, 3607000.0 + 7000.0, 2000.0);
        assert_eq!((loc.x, loc.y, loc.z), (3, 7, 2));
        assert_eq!(loc.x_percent, 0.0);
        assert_eq!(loc.y_percent, 0.0);
        assert_eq!(loc.z_percent, 0.0);
    }

    #[test]
    fn test_locate_rounds_horizontally_and_truncates_vertically() {
        let geom = GridGeometry::new(&square_config(66, 86)).unwrap();
        let loc = geom.locate(589000.0 + 3600.0, 3607000.0 + 7200.0, 2700.0);
        assert_eq!((loc.x, loc.y, loc.z), (4, 7, 2));
        assert!((loc.x_percent - 0.6).abs() < 1e-9);
        assert!((loc.y_percent - 0.2).abs() < 1e-9);
        assert!((loc.z_percent - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_layer_selection_ignores_depth_interval() {
        let mut config = square_config(66, 86);
        config.depth_interval = 500.0;
        let geom = GridGeometry::new(&config).unwrap();

        let loc = geom.locate(589000.0, 3607000.0, 1750.0);
        assert_eq!(loc.z, 1);
        assert!((loc.z_percent - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_outside_region_gives_out_of_range_indices() {
        let geom = GridGeometry::new(&square_config(66, 86)).unwrap();
        let west = geom.locate(589000.0 - 5000.0, 3607000.0, 0.0);
        assert!(west.x < 0);
        let north = geom.locate(589000.0, 3692000.0 + 5000.0, 0.0);
        assert!(north.y > 85);
    }

    #[test]
    fn test_rotated_rectangle() {
        // A 10 km x 10 km square turned by 30 degrees about its bottom-left corner
        let angle = 30f64.to_radians();
        let side = 10_000.0;
        let bl = PlanarPoint::new(500_000.0, 3_600_000.0);
        let tl = PlanarPoint::new(bl.easting + side * angle.sin(), bl.northing + side * angle.cos());
        let br = PlanarPoint::new(bl.easting + side * angle.cos(), bl.northing - side * angle.sin());
        let tr = PlanarPoint::new(
            tl.easting + side * angle.cos(),
            tl.northing - side * angle.sin(),
        );
        let config = GridConfig {
            top_left: tl,
            top_right: tr,
            bottom_left: bl,
            bottom_right: br,
            ..square_config(11, 11)
        };

        let geom = GridGeometry::new(&config).unwrap();
        assert!((geom.rotation_degrees() - 30.0).abs() < 1e-9);
        assert!((geom.total_width_m() - side).abs() < 1e-6);
        assert!((geom.total_height_m() - side).abs() < 1e-6);

        // Rotating the top-left corner lands on the rectangle's vertical axis
        let (u, v) = geom.translate(tl.easting, tl.northing);
        let (x, y) = geom.rotate(u, v);
        assert!(x.abs() < 1e-6, "x = {}", x);
        assert!((y - side).abs() < 1e-6, "y = {}", y);
    }

    #[test]
    fn test_single_node_axis_uses_full_extent() {
        let geom = GridGeometry::new(&square_config(1, 86)).unwrap();
        assert_eq!(geom.spacing().0, 65000.0);
        let loc = geom.locate(589000.0 + 20000.0, 3607000.0, 0.0);
        assert_eq!(loc.x, 0);
    }

    #[test]
    fn test_degenerate_corners_rejected() {
        let mut config = square_config(66, 86);
        config.top_left = config.bottom_left;
        assert!(matches!(
            GridGeometry::new(&config),
            Err(ModelError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_diagonal_without_northing_step_rejected() {
        // A square turned by 45 degrees: top-right sits level with bottom-left
        let bl = PlanarPoint::new(500_000.0, 3_600_000.0);
        let config = GridConfig {
            top_left: PlanarPoint::new(bl.easting + 1000.0, bl.northing + 1000.0),
            top_right: PlanarPoint::new(bl.easting + 2000.0, bl.northing),
            bottom_left: bl,
            bottom_right: PlanarPoint::new(bl.easting + 1000.0, bl.northing - 1000.0),
            ..square_config(11, 11)
        };
        let err = GridGeometry::new(&config).unwrap_err();
        assert!(matches!(err, ModelError::ConfigInvalid(_)));
        assert!(err.to_string().contains("northing"), "{err}");
    }
}
