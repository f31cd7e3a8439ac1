//! Model configuration file and runtime load options.
//!
//! The configuration file is a plain-text list of `key = value` lines.
//! Lines starting with `#` or a space, and blank lines, are ignored:
//!
//! ```text
//! # LSU Imperial Valley
//! utm_zone = 11
//! model_dir = iv
//! nx = 66
//! ny = 86
//! nz = 9
//! depth = 8000
//! top_left_corner_e = 589000
//! top_left_corner_n = 3692000
//! ...
//! depth_interval = 1000
//! interpolation = on
//! ```

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::store::SAMPLE_SIZE;
use crate::types::Dimensions;

/// An easting/northing pair in the projected frame, meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub easting: f64,
    pub northing: f64,
}

impl PlanarPoint {
    pub fn new(easting: f64, northing: f64) -> Self {
        Self { easting, northing }
    }

    /// Straight-line distance to another point.
    pub fn distance_to(&self, other: &PlanarPoint) -> f64 {
        (other.easting - self.easting).hypot(other.northing - self.northing)
    }
}

/// Parsed model configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// UTM zone of the projected frame.
    pub utm_zone: i32,
    /// Data directory name, relative to the model's `data/` directory.
    pub model_dir: String,
    /// Number of lattice points along the easting axis.
    pub nx: i64,
    /// Number of lattice points along the northing axis.
    pub ny: i64,
    /// Number of depth layers.
    pub nz: i64,
    /// Maximum depth served, meters.
    pub depth: f64,
    pub top_left: PlanarPoint,
    pub top_right: PlanarPoint,
    pub bottom_left: PlanarPoint,
    pub bottom_right: PlanarPoint,
    /// Vertical sample spacing, meters.
    pub depth_interval: f64,
    /// Blend neighbouring lattice points instead of reading the nearest one.
    pub interpolation: bool,
}

/// Number of entries reported by [`GridConfig::describe`].
pub const CONFIG_ENTRY_COUNT: usize = 16;

impl GridConfig {
    /// Read and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::ConfigNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text. Unknown keys are ignored; values that do
    /// not parse as numbers read as zero and are caught by [`validate`].
    ///
    /// [`validate`]: GridConfig::validate
    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();

        for line in text.lines() {
            if line.is_empty() || line.starts_with('#') || line.starts_with(' ') {
                continue;
            }
            let Some((key, value)) = split_entry(line) else {
                continue;
            };

            match key {
                "utm_zone" => config.utm_zone = i32::try_from(parse_int(value)).unwrap_or(0),
                "model_dir" => config.model_dir = value.to_string(),
                "nx" => config.nx = parse_int(value),
                "ny" => config.ny = parse_int(value),
                "nz" => config.nz = parse_int(value),
                "depth" => config.depth = parse_float(value),
                "top_left_corner_e" => config.top_left.easting = parse_float(value),
                "top_left_corner_n" => config.top_left.northing = parse_float(value),
                "top_right_corner_e" => config.top_right.easting = parse_float(value),
                "top_right_corner_n" => config.top_right.northing = parse_float(value),
                "bottom_left_corner_e" => config.bottom_left.easting = parse_float(value),
                "bottom_left_corner_n" => config.bottom_left.northing = parse_float(value),
                "bottom_right_corner_e" => config.bottom_right.easting = parse_float(value),
                "bottom_right_corner_n" => config.bottom_right.northing = parse_float(value),
                "depth_interval" => config.depth_interval = parse_float(value),
                "interpolation" => config.interpolation = value == "on",
                _ => {}
            }
        }

        config
    }

    /// Check that every required parameter was set and is usable.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.utm_zone == 0 {
            missing.push("utm_zone");
        }
        if self.model_dir.is_empty() {
            missing.push("model_dir");
        }
        if self.nx == 0 {
            missing.push("nx");
        }
        if self.ny == 0 {
            missing.push("ny");
        }
        if self.nz == 0 {
            missing.push("nz");
        }
        if self.depth == 0.0 {
            missing.push("depth");
        }
        let corners = [
            (self.top_left.easting, "top_left_corner_e"),
            (self.top_left.northing, "top_left_corner_n"),
            (self.top_right.easting, "top_right_corner_e"),
            (self.top_right.northing, "top_right_corner_n"),
            (self.bottom_left.easting, "bottom_left_corner_e"),
            (self.bottom_left.northing, "bottom_left_corner_n"),
            (self.bottom_right.easting, "bottom_right_corner_e"),
            (self.bottom_right.northing, "bottom_right_corner_n"),
        ];
        for (value, name) in corners {
            if value == 0.0 {
                missing.push(name);
            }
        }
        if self.depth_interval == 0.0 {
            missing.push("depth_interval");
        }
        if !missing.is_empty() {
            return Err(ModelError::ConfigIncomplete(missing));
        }

        for (n, name) in [(self.nx, "nx"), (self.ny, "ny"), (self.nz, "nz")] {
            if n < 1 {
                return Err(ModelError::config_invalid(format!(
                    "{} must be >= 1, got {}",
                    name, n
                )));
            }
        }
        self.sample_count()?;

        let floats = [
            (self.depth, "depth"),
            (self.top_left.easting, "top_left_corner_e"),
            (self.top_left.northing, "top_left_corner_n"),
            (self.top_right.easting, "top_right_corner_e"),
            (self.top_right.northing, "top_right_corner_n"),
            (self.bottom_left.easting, "bottom_left_corner_e"),
            (self.bottom_left.northing, "bottom_left_corner_n"),
            (self.bottom_right.easting, "bottom_right_corner_e"),
            (self.bottom_right.northing, "bottom_right_corner_n"),
            (self.depth_interval, "depth_interval"),
        ];
        for (value, name) in floats {
            if !value.is_finite() {
                return Err(ModelError::config_invalid(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        if !(self.depth_interval > 0.0) {
            return Err(ModelError::config_invalid(format!(
                "depth_interval must be > 0, got {}",
                self.depth_interval
            )));
        }

        Ok(())
    }

    /// Number of lattice samples, checked so the lattice's byte length
    /// fits in memory arithmetic.
    fn sample_count(&self) -> Result<usize> {
        let overflow = || {
            ModelError::config_invalid(format!(
                "lattice of {} x {} x {} samples is too large",
                self.nx, self.ny, self.nz
            ))
        };
        let mut count: usize = 1;
        for n in [self.nx, self.ny, self.nz] {
            let n = usize::try_from(n).map_err(|_| overflow())?;
            count = count.checked_mul(n).ok_or_else(overflow)?;
        }
        count
            .checked_mul(SAMPLE_SIZE as usize)
            .and_then(|bytes| u64::try_from(bytes).ok())
            .ok_or_else(overflow)?;
        Ok(count)
    }

    /// Lattice dimensions. Only meaningful on a validated configuration.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.nx as usize, self.ny as usize, self.nz as usize)
    }

    /// One `key=value` line per configuration entry, for host introspection.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "utm_zone={}", self.utm_zone);
        let _ = writeln!(out, "model_dir={}", self.model_dir);
        let _ = writeln!(out, "nx={}", self.nx);
        let _ = writeln!(out, "ny={}", self.ny);
        let _ = writeln!(out, "nz={}", self.nz);
        let _ = writeln!(out, "depth={}", self.depth);
        let _ = writeln!(out, "top_left_corner_e={}", self.top_left.easting);
        let _ = writeln!(out, "top_left_corner_n={}", self.top_left.northing);
        let _ = writeln!(out, "top_right_corner_e={}", self.top_right.easting);
        let _ = writeln!(out, "top_right_corner_n={}", self.top_right.northing);
        let _ = writeln!(out, "bottom_left_corner_e={}", self.bottom_left.easting);
        let _ = writeln!(out, "bottom_left_corner_n={}", self.bottom_left.northing);
        let _ = writeln!(out, "bottom_right_corner_e={}", self.bottom_right.easting);
        let _ = writeln!(out, "bottom_right_corner_n={}", self.bottom_right.northing);
        let _ = writeln!(out, "depth_interval={}", self.depth_interval);
        let _ = writeln!(
            out,
            "interpolation={}",
            if self.interpolation { "on" } else { "off" }
        );
        out
    }
}

/// Split `key = value` into its parts. The key is the first whitespace
/// delimited token and must be followed by `=`.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_end();
    let key_end = line.find(char::is_whitespace).unwrap_or(line.len());
    let (key, rest) = line.split_at(key_end);
    let rest = rest.trim_start().strip_prefix('=')?;
    let value = rest.split_whitespace().next()?;
    Some((key, value))
}

fn parse_int(value: &str) -> i64 {
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
        .unwrap_or(0)
}

fn parse_float(value: &str) -> f64 {
    value.parse::<f64>().unwrap_or(0.0)
}

/// Runtime options controlling how the lattice is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Largest lattice, in megabytes, that will be held in memory.
    /// Larger lattices are served from the file. `None` means no cap.
    pub max_memory_mb: Option<usize>,

    /// Always serve the lattice from the file.
    pub force_file_backed: bool,
}

impl LoadOptions {
    /// Load options from environment variables.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(val) = std::env::var("VM_MAX_MEMORY_MB") {
            if let Ok(mb) = val.parse() {
                options.max_memory_mb = Some(mb);
            }
        }

        if let Ok(val) = std::env::var("VM_FORCE_FILE_BACKED") {
            options.force_file_backed = val.to_lowercase() == "true" || val == "1";
        }

        options
    }

    /// Validate the options.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_memory_mb == Some(0) {
            return Err("max_memory_mb must be > 0 when set".to_string());
        }
        Ok(())
    }

    /// Memory cap in bytes, if any.
    pub fn max_memory_bytes(&self) -> Option<u64> {
        self.max_memory_mb
            .map(|mb| (mb as u64).saturating_mul(1024 * 1024))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../testdata/config.sample");

    #[test]
    fn test_parse_sample() {
        let config = GridConfig::parse(SAMPLE);
        assert!(config.validate().is_ok());

        assert_eq!(config.utm_zone, 11);
        assert_eq!(config.model_dir, "iv");
        assert_eq!(config.dimensions(), Dimensions::new(66, 86, 9));
        assert_eq!(config.depth, 8000.0);
        assert_eq!(config.bottom_left, PlanarPoint::new(589000.0, 3607000.0));
        assert_eq!(config.top_right, PlanarPoint::new(654000.0, 3692000.0));
        assert_eq!(config.depth_interval, 1000.0);
        assert!(config.interpolation);
    }

    #[test]
    fn test_comments_and_indented_lines_are_skipped() {
        let text = "# nx = 5\n nx = 7\n\nnx = 3\n";
        let config = GridConfig::parse(text);
        assert_eq!(config.nx, 3);
    }

    #[test]
    fn test_entry_requires_equals() {
        assert_eq!(split_entry("nx = 66"), Some(("nx", "66")));
        assert_eq!(split_entry("nx =66"), Some(("nx", "66")));
        assert_eq!(split_entry("nx\t=\t66 trailing"), Some(("nx", "66")));
        assert_eq!(split_entry("nx=66"), None);
        assert_eq!(split_entry("nx 66"), None);
        assert_eq!(split_entry("nx ="), None);
    }

    #[test]
    fn test_interpolation_flag() {
        assert!(GridConfig::parse("interpolation = on").interpolation);
        assert!(!GridConfig::parse("interpolation = off").interpolation);
        assert!(!GridConfig::parse("interpolation = ON").interpolation);
        assert!(!GridConfig::parse("").interpolation);
    }

    #[test]
    fn test_numeric_parsing_is_lenient() {
        let config = GridConfig::parse("nx = 12.7\nny = abc\ndepth = 1e3");
        assert_eq!(config.nx, 12);
        assert_eq!(config.ny, 0);
        assert_eq!(config.depth, 1000.0);
    }

    #[test]
    fn test_missing_fields_reported() {
        let text = SAMPLE.replace("depth_interval = 1000", "");
        let err = GridConfig::parse(&text).validate().unwrap_err();
        match err {
            ModelError::ConfigIncomplete(fields) => assert_eq!(fields, vec!["depth_interval"]),
            other => panic!("unexpected error: {other}"),
        }

        let err = GridConfig::parse("").validate().unwrap_err();
        match err {
            ModelError::ConfigIncomplete(fields) => assert_eq!(fields.len(), CONFIG_ENTRY_COUNT - 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_dimension_rejected() {
        let text = SAMPLE.replace("nz = 9", "nz = -2");
        assert!(matches!(
            GridConfig::parse(&text).validate(),
            Err(ModelError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_oversized_lattice_rejected() {
        let text = SAMPLE
            .replace("nx = 66", "nx = 100000000")
            .replace("ny = 86", "ny = 100000000")
            .replace("nz = 9", "nz = 100000000");
        let err = GridConfig::parse(&text).validate().unwrap_err();
        assert!(matches!(err, ModelError::ConfigInvalid(_)), "{err}");
    }

    #[test]
    fn test_non_finite_values_rejected() {
        for (from, to) in [
            ("depth_interval = 1000", "depth_interval = nan"),
            ("depth_interval = 1000", "depth_interval = inf"),
            ("depth_interval = 1000", "depth_interval = -1000"),
            ("depth = 8000", "depth = NaN"),
            ("bottom_left_corner_e = 589000", "bottom_left_corner_e = -inf"),
        ] {
            let text = SAMPLE.replace(from, to);
            assert_ne!(text, SAMPLE, "sample lacks `{from}`");
            let err = GridConfig::parse(&text).validate().unwrap_err();
            assert!(matches!(err, ModelError::ConfigInvalid(_)), "{to}: {err}");
        }
    }

    #[test]
    fn test_out_of_range_zone_reads_as_unset() {
        assert_eq!(GridConfig::parse("utm_zone = 4294967307").utm_zone, 0);
        assert_eq!(GridConfig::parse("utm_zone = 11").utm_zone, 11);

        let text = SAMPLE.replace("utm_zone = 11", "utm_zone = 4294967307");
        assert!(matches!(
            GridConfig::parse(&text).validate(),
            Err(ModelError::ConfigIncomplete(_))
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let err = GridConfig::from_file("/nonexistent/model/config").unwrap_err();
        assert!(matches!(err, ModelError::ConfigNotFound { .. }));
        assert!(err.is_setup_error());
    }

    #[test]
    fn test_describe() {
        let config = GridConfig::parse(SAMPLE);
        let text = config.describe();
        assert_eq!(text.lines().count(), CONFIG_ENTRY_COUNT);
        assert!(text.contains("utm_zone=11\n"));
        assert!(text.contains("interpolation=on\n"));

        // The description parses back to the same configuration
        let reparsed = GridConfig::parse(&text.replace('=', " = "));
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_load_options_validation() {
        let mut options = LoadOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.max_memory_bytes(), None);

        options.max_memory_mb = Some(0);
        assert!(options.validate().is_err());

        options.max_memory_mb = Some(2);
        assert_eq!(options.max_memory_bytes(), Some(2 * 1024 * 1024));
    }
}
