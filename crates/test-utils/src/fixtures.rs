//! On-disk model fixtures.
//!
//! A [`ModelFixture`] lays out a throwaway install directory the same way a
//! real installation does:
//!
//! ```text
//! <install_dir>/model/<label>/data/config
//! <install_dir>/model/<label>/data/<model_dir>/vp.dat
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Reference locations in the Imperial Valley model region.
pub mod region {
    /// UTM zone of the model.
    pub const UTM_ZONE: i32 = 11;

    /// Bottom-left corner, UTM easting/northing in meters.
    pub const BOTTOM_LEFT: (f64, f64) = (589000.0, 3607000.0);

    /// Top-right corner, UTM easting/northing in meters.
    pub const TOP_RIGHT: (f64, f64) = (654000.0, 3692000.0);

    /// Longitude/latitude of the bottom-left corner.
    pub const BOTTOM_LEFT_LONLAT: (f64, f64) = (-116.051578, 32.596922);

    /// A point well outside the model.
    pub const FAR_AWAY_LONLAT: (f64, f64) = (-100.0, 45.0);
}

/// Parameters for a generated configuration file.
#[derive(Debug, Clone)]
pub struct ConfigParams {
    pub utm_zone: i32,
    pub model_dir: String,
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub depth: f64,
    /// Bottom-left corner easting, meters.
    pub origin_e: f64,
    /// Bottom-left corner northing, meters.
    pub origin_n: f64,
    /// Horizontal node spacing, meters.
    pub spacing: f64,
    pub depth_interval: f64,
    pub interpolation: bool,
}

impl ConfigParams {
    /// The full-size Imperial Valley layout: 66 x 86 x 9 at 1 km.
    pub fn imperial_valley() -> Self {
        Self {
            utm_zone: region::UTM_ZONE,
            model_dir: "iv".to_string(),
            nx: 66,
            ny: 86,
            nz: 9,
            depth: 8000.0,
            origin_e: region::BOTTOM_LEFT.0,
            origin_n: region::BOTTOM_LEFT.1,
            spacing: 1000.0,
            depth_interval: 1000.0,
            interpolation: true,
        }
    }

    /// A small axis-aligned lattice anchored at the model's bottom-left corner.
    pub fn small(nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            nx,
            ny,
            nz,
            depth: 1000.0 * nz.saturating_sub(1).max(1) as f64,
            ..Self::imperial_valley()
        }
    }

    pub fn with_interpolation(mut self, on: bool) -> Self {
        self.interpolation = on;
        self
    }

    /// Number of samples the lattice file must hold.
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render as configuration file text.
    pub fn to_config_text(&self) -> String {
        let width = self.spacing * (self.nx.max(2) - 1) as f64;
        let height = self.spacing * (self.ny.max(2) - 1) as f64;
        let (e0, n0) = (self.origin_e, self.origin_n);

        let mut out = String::from("# Generated test model\n\n");
        let _ = writeln!(out, "utm_zone = {}", self.utm_zone);
        let _ = writeln!(out, "model_dir = {}", self.model_dir);
        let _ = writeln!(out, "nx = {}", self.nx);
        let _ = writeln!(out, "ny = {}", self.ny);
        let _ = writeln!(out, "nz = {}", self.nz);
        let _ = writeln!(out, "depth = {}", self.depth);
        let _ = writeln!(out, "top_left_corner_e = {}", e0);
        let _ = writeln!(out, "top_left_corner_n = {}", n0 + height);
        let _ = writeln!(out, "top_right_corner_e = {}", e0 + width);
        let _ = writeln!(out, "top_right_corner_n = {}", n0 + height);
        let _ = writeln!(out, "bottom_left_corner_e = {}", e0);
        let _ = writeln!(out, "bottom_left_corner_n = {}", n0);
        let _ = writeln!(out, "bottom_right_corner_e = {}", e0 + width);
        let _ = writeln!(out, "bottom_right_corner_n = {}", n0);
        let _ = writeln!(out, "depth_interval = {}", self.depth_interval);
        let _ = writeln!(
            out,
            "interpolation = {}",
            if self.interpolation { "on" } else { "off" }
        );
        out
    }
}

/// A model installed into a temporary directory.
///
/// The directory is removed when the fixture is dropped.
pub struct ModelFixture {
    dir: tempfile::TempDir,
    label: String,
    model_dir: String,
}

impl ModelFixture {
    /// Install a model from generated parameters and lattice samples.
    pub fn install(label: &str, params: &ConfigParams, lattice: &[f32]) -> Self {
        Self::install_raw(label, &params.to_config_text(), &params.model_dir, Some(lattice))
    }

    /// Install a model from literal configuration text. `lattice` of `None`
    /// leaves the data directory without a `vp.dat`.
    pub fn install_raw(
        label: &str,
        config_text: &str,
        model_dir: &str,
        lattice: Option<&[f32]>,
    ) -> Self {
        let dir = crate::temp_test_dir_with_prefix("vm_fixture_");
        let fixture = Self {
            dir,
            label: label.to_string(),
            model_dir: model_dir.to_string(),
        };

        std::fs::create_dir_all(fixture.data_dir()).expect("Failed to create model data dir");
        std::fs::write(fixture.config_path(), config_text).expect("Failed to write config");
        if let Some(lattice) = lattice {
            write_lattice_file(fixture.grid_path(), lattice);
        }
        fixture
    }

    pub fn install_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// `<install_dir>/model/<label>/data`
    pub fn data_root(&self) -> PathBuf {
        self.install_dir()
            .join("model")
            .join(&self.label)
            .join("data")
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_root().join("config")
    }

    /// `<data_root>/<model_dir>`
    pub fn data_dir(&self) -> PathBuf {
        self.data_root().join(&self.model_dir)
    }

    pub fn grid_path(&self) -> PathBuf {
        self.data_dir().join("vp.dat")
    }
}

/// Write samples as little-endian `f32`, the `vp.dat` layout.
pub fn write_lattice_file(path: impl AsRef<Path>, lattice: &[f32]) {
    let bytes: Vec<u8> = lattice.iter().flat_map(|v| v.to_le_bytes()).collect();
    std::fs::write(path, bytes).expect("Failed to write lattice file");
}
