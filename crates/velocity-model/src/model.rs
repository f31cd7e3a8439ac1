//! The loaded velocity model and its query path.

use std::path::{Path, PathBuf};

use projection::{GeoTransform, Utm};
use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::config::{GridConfig, LoadOptions, CONFIG_ENTRY_COUNT};
use crate::derived;
use crate::error::{ModelError, Result};
use crate::geometry::{CellLocation, GridGeometry};
use crate::interpolation::{bilinear, trilinear};
use crate::store::{GridStore, Residency};
use crate::types::{Dimensions, PropertyTuple, QueryPoint};

/// Version string reported to hosts.
pub const MODEL_VERSION: &str = "IMPERIAL";

/// Name of the configuration file inside the model's data directory.
pub const CONFIG_FILE_NAME: &str = "config";

/// Name of the vp lattice file inside the model directory.
pub const GRID_FILE_NAME: &str = "vp.dat";

/// Directory holding the configuration for the model installed under
/// `install_dir` as `label`.
pub fn model_data_root(install_dir: impl AsRef<Path>, label: &str) -> PathBuf {
    install_dir.as_ref().join("model").join(label).join("data")
}

/// A loaded, immutable velocity model.
///
/// The handle exists only once loading has fully succeeded, so holding one
/// means the model is ready. Queries borrow it and may run concurrently.
pub struct VelocityModel {
    config: GridConfig,
    geometry: GridGeometry,
    store: GridStore,
    transform: Box<dyn GeoTransform>,
}

impl std::fmt::Debug for VelocityModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VelocityModel")
            .field("config", &self.config)
            .field("geometry", &self.geometry)
            .field("residency", &self.store.residency())
            .finish_non_exhaustive()
    }
}

impl VelocityModel {
    /// Load the model installed under `install_dir` as `label` with default
    /// load options.
    pub fn initialize(install_dir: impl AsRef<Path>, label: &str) -> Result<Self> {
        Self::initialize_with(install_dir, label, &LoadOptions::default())
    }

    /// Load the model installed under `install_dir` as `label`.
    ///
    /// Reads `model/<label>/data/config`, then the lattice from
    /// `model/<label>/data/<model_dir>/vp.dat`.
    pub fn initialize_with(
        install_dir: impl AsRef<Path>,
        label: &str,
        options: &LoadOptions,
    ) -> Result<Self> {
        let data_root = model_data_root(install_dir, label);

        let result = Self::load(&data_root, options);
        if let Err(e) = &result {
            error!(data_root = %data_root.display(), error = %e, "Failed to initialize velocity model");
        }
        result
    }

    fn load(data_root: &Path, options: &LoadOptions) -> Result<Self> {
        options.validate().map_err(ModelError::ConfigInvalid)?;

        let config = GridConfig::from_file(data_root.join(CONFIG_FILE_NAME))?;
        let grid_path = data_root.join(&config.model_dir).join(GRID_FILE_NAME);
        let store = GridStore::open(&grid_path, config.dimensions(), options)?;
        let transform = Utm::north(config.utm_zone).map_err(ModelError::ProjectionSetup)?;

        Self::from_parts(config, store, Box::new(transform))
    }

    /// Assemble a model from an already loaded configuration, lattice and
    /// coordinate transform.
    pub fn from_parts(
        config: GridConfig,
        store: GridStore,
        transform: Box<dyn GeoTransform>,
    ) -> Result<Self> {
        config.validate()?;
        if store.dims() != config.dimensions() {
            return Err(ModelError::config_invalid(format!(
                "lattice is {:?} but configuration requires {:?}",
                store.dims(),
                config.dimensions()
            )));
        }
        let geometry = GridGeometry::new(&config)?;

        info!(
            model_dir = %config.model_dir,
            nx = config.nx,
            ny = config.ny,
            nz = config.nz,
            residency = %store.residency(),
            interpolation = config.interpolation,
            rotation_deg = geometry.rotation_degrees(),
            "Velocity model ready"
        );

        Ok(Self {
            config,
            geometry,
            store,
            transform,
        })
    }

    /// Query a batch of points.
    ///
    /// The output has one entry per input point, in input order. Points
    /// outside the model come back with the no-data marker. A point that
    /// cannot be projected, or a failed lattice read, fails the whole batch.
    pub fn query(&self, points: &[QueryPoint]) -> Result<Vec<PropertyTuple>> {
        debug!(points = points.len(), "Querying velocity model");
        points.iter().map(|p| self.query_point(p)).collect()
    }

    /// Same as [`query`](Self::query), spreading the batch over the rayon pool.
    pub fn query_parallel(&self, points: &[QueryPoint]) -> Result<Vec<PropertyTuple>> {
        debug!(points = points.len(), "Querying velocity model in parallel");
        points.par_iter().map(|p| self.query_point(p)).collect()
    }

    /// Query a single point.
    pub fn query_point(&self, point: &QueryPoint) -> Result<PropertyTuple> {
        if point.depth < 0.0 {
            return Ok(PropertyTuple::no_data());
        }

        let (easting, northing) = self
            .transform
            .to_projected(point.longitude, point.latitude)
            .map_err(|source| ModelError::Projection {
                lon: point.longitude,
                lat: point.latitude,
                source,
            })?;

        let cell = self.geometry.locate(easting, northing, point.depth);
        let dims = self.store.dims();

        // NaN depth fails this comparison too
        if !(point.depth <= self.config.depth) || !within(&cell, dims) {
            return Ok(PropertyTuple::no_data());
        }

        let mut properties = self.sample(&cell, dims)?;
        derived::apply(&mut properties);
        Ok(properties)
    }

    /// Read and blend the lattice samples around an in-range cell.
    fn sample(&self, cell: &CellLocation, dims: Dimensions) -> Result<PropertyTuple> {
        let x = cell.x as usize;
        let y = cell.y as usize;
        let z = (cell.z as usize).min(dims.nz - 1);

        if !self.config.interpolation {
            return self.store.read_lattice_point(x, y, z);
        }

        let x1 = (x + 1).min(dims.nx - 1);
        let y1 = (y + 1).min(dims.ny - 1);

        if cell.z == 0 && cell.z_percent == 0.0 {
            let plane = self.plane(x, x1, y, y1, z)?;
            return Ok(bilinear(cell.x_percent, cell.y_percent, &plane));
        }

        let located = self.plane(x, x1, y, y1, z)?;
        let above = self.plane(x, x1, y, y1, z.saturating_sub(1))?;
        let points = [
            located[0], located[1], located[2], located[3], above[0], above[1], above[2], above[3],
        ];
        Ok(trilinear(
            cell.x_percent,
            cell.y_percent,
            cell.z_percent,
            &points,
        ))
    }

    fn plane(&self, x0: usize, x1: usize, y0: usize, y1: usize, z: usize) -> Result<[PropertyTuple; 4]> {
        Ok([
            self.store.read_lattice_point(x0, y0, z)?,
            self.store.read_lattice_point(x1, y0, z)?,
            self.store.read_lattice_point(x0, y1, z)?,
            self.store.read_lattice_point(x1, y1, z)?,
        ])
    }

    /// Release the model. Never fails; consuming the handle guarantees no
    /// query is still borrowing it.
    pub fn finalize(self) -> Result<()> {
        info!(model_dir = %self.config.model_dir, "Velocity model released");
        Ok(())
    }

    pub fn version(&self) -> &'static str {
        MODEL_VERSION
    }

    /// The effective configuration as `key=value` lines, and the number of
    /// entries.
    pub fn config(&self) -> (String, usize) {
        (self.config.describe(), CONFIG_ENTRY_COUNT)
    }

    pub fn grid_config(&self) -> &GridConfig {
        &self.config
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn residency(&self) -> Residency {
        self.store.residency()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.store.dims()
    }
}

/// Whether the located horizontal and vertical indices address the lattice.
fn within(cell: &CellLocation, dims: Dimensions) -> bool {
    cell.x >= 0
        && cell.y >= 0
        && cell.z >= 0
        && (cell.x as usize) < dims.nx
        && (cell.y as usize) < dims.ny
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlanarPoint;
    use projection::ProjectionError;

    /// Treats longitude/latitude as easting/northing.
    struct Planar;

    impl GeoTransform for Planar {
        fn to_projected(&self, lon: f64, lat: f64) -> projection::Result<(f64, f64)> {
            if !lon.is_finite() || !lat.is_finite() {
                return Err(ProjectionError::NonFinite(lon, lat));
            }
            Ok((lon, lat))
        }

        fn to_geographic(&self, easting: f64, northing: f64) -> projection::Result<(f64, f64)> {
            Ok((easting, northing))
        }
    }

    fn config(nx: i64, ny: i64, nz: i64) -> GridConfig {
        GridConfig {
            utm_zone: 11,
            model_dir: "iv".to_string(),
            nx,
            ny,
            nz,
            depth: 1000.0 * (nz - 1) as f64,
            top_left: PlanarPoint::new(1000.0, 1000.0 + 1000.0 * (ny - 1) as f64),
            top_right: PlanarPoint::new(
                1000.0 + 1000.0 * (nx - 1) as f64,
                1000.0 + 1000.0 * (ny - 1) as f64,
            ),
            bottom_left: PlanarPoint::new(1000.0, 1000.0),
            bottom_right: PlanarPoint::new(1000.0 + 1000.0 * (nx - 1) as f64, 1000.0),
            depth_interval: 1000.0,
            interpolation: true,
        }
    }

    fn model(config: GridConfig) -> VelocityModel {
        let dims = config.dimensions();
        let data = (0..dims.len()).map(|i| 2000.0 + 10.0 * i as f32).collect();
        let store = GridStore::from_vec(dims, data).unwrap();
        VelocityModel::from_parts(config, store, Box::new(Planar)).unwrap()
    }

    #[test]
    fn test_negative_depth_is_no_data() {
        let m = model(config(3, 3, 3));
        let result = m.query_point(&QueryPoint::new(1500.0, 1500.0, -0.5)).unwrap();
        assert!(result.is_no_data());
        assert_eq!(result.qp, -1.0);
    }

    #[test]
    fn test_beyond_max_depth_is_no_data() {
        let m = model(config(3, 3, 3));
        let result = m.query_point(&QueryPoint::new(1500.0, 1500.0, 2000.5)).unwrap();
        assert!(result.is_no_data());
        let result = m.query_point(&QueryPoint::new(1500.0, 1500.0, f64::NAN)).unwrap();
        assert!(result.is_no_data());
    }

    #[test]
    fn test_outside_horizontally_is_no_data() {
        let m = model(config(3, 3, 3));
        for (e, n) in [(0.0, 1500.0), (1500.0, 0.0), (4000.0, 1500.0), (1500.0, 4000.0)] {
            let result = m.query_point(&QueryPoint::new(e, n, 0.0)).unwrap();
            assert!(result.is_no_data(), "({}, {}) should be outside", e, n);
        }
    }

    #[test]
    fn test_raw_read_without_interpolation() {
        let mut cfg = config(3, 3, 3);
        cfg.interpolation = false;
        let m = model(cfg);
        // Node (1, 2, 1): offset 1*9 + 2*3 + 1 = 16
        let result = m.query_point(&QueryPoint::new(2000.0, 3000.0, 1000.0)).unwrap();
        assert_eq!(result.vp, 2160.0);
        assert_eq!(result.rho, derived::density(2160.0));
        assert_eq!(result.vs, derived::shear_velocity(2160.0));
    }

    #[test]
    fn test_surface_uses_single_plane() {
        let m = model(config(3, 3, 3));
        // On node (0, 0, 0) at the surface the surface sample is returned as is
        let result = m.query_point(&QueryPoint::new(1000.0, 1000.0, 0.0)).unwrap();
        assert_eq!(result.vp, 2000.0);
    }

    #[test]
    fn test_shallow_layer_blends_with_clamped_plane() {
        let m = model(config(3, 3, 3));
        // Layer 0 with a non-zero fraction has no layer above; both planes are layer 0
        let result = m.query_point(&QueryPoint::new(1000.0, 1000.0, 400.0)).unwrap();
        assert!((result.vp - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_projection_failure_fails_batch() {
        let m = model(config(3, 3, 3));
        let points = [
            QueryPoint::new(1500.0, 1500.0, 0.0),
            QueryPoint::new(f64::NAN, 1500.0, 0.0),
        ];
        let err = m.query(&points).unwrap_err();
        assert!(matches!(err, ModelError::Projection { .. }));
        assert!(!err.is_setup_error());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let store = GridStore::from_vec(Dimensions::new(2, 2, 2), vec![0.0; 8]).unwrap();
        let err = VelocityModel::from_parts(config(3, 3, 3), store, Box::new(Planar)).unwrap_err();
        assert!(matches!(err, ModelError::ConfigInvalid(_)));
    }

    #[test]
    fn test_version_and_config() {
        let m = model(config(3, 3, 3));
        assert_eq!(m.version(), "IMPERIAL");
        let (text, count) = m.config();
        assert_eq!(count, CONFIG_ENTRY_COUNT);
        assert!(text.contains("model_dir=iv"));
        assert!(m.finalize().is_ok());
    }
}
