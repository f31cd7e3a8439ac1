//! Error types for velocity model loading and queries.

use std::path::PathBuf;

use projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur while loading or querying a velocity model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The configuration file could not be opened.
    #[error("no configuration file was found to read from at {path}: {source}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more required configuration parameters were left unset.
    #[error("configuration parameter(s) not specified: {}; please check your configuration file", .0.join(", "))]
    ConfigIncomplete(Vec<&'static str>),

    /// A configuration value is present but unusable.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The lattice file does not exist or cannot be opened.
    #[error("no model file was found to read from at {0}")]
    GridNotFound(PathBuf),

    /// The lattice file holds fewer samples than the configured dimensions.
    #[error("model file {path} is too short: expected {expected} bytes, found {actual}")]
    GridTooShort {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Reading a lattice sample failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The projection could not be set up for the configured zone.
    #[error("could not set up UTM projection: {0}")]
    ProjectionSetup(#[source] ProjectionError),

    /// A query point could not be projected.
    #[error("could not project point ({lon}, {lat}): {source}")]
    Projection {
        lon: f64,
        lat: f64,
        #[source]
        source: ProjectionError,
    },

    /// A query or finalize was issued before the model was loaded.
    #[error("model is not initialized")]
    NotInitialized,

    /// Initialize was called on a slot that already holds a loaded model.
    #[error("model is already initialized")]
    AlreadyInitialized,
}

impl ModelError {
    /// Create a ConfigInvalid error.
    pub fn config_invalid(msg: impl Into<String>) -> Self {
        Self::ConfigInvalid(msg.into())
    }

    /// Create a Storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether this error happened during setup rather than while serving queries.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. }
                | Self::ConfigIncomplete(_)
                | Self::ConfigInvalid(_)
                | Self::GridNotFound(_)
                | Self::GridTooShort { .. }
                | Self::ProjectionSetup(_)
                | Self::AlreadyInitialized
        )
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type for velocity model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
