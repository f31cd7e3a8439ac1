//! LSU Imperial Valley velocity model.
//!
//! Serves P-wave velocity, S-wave velocity and density at geographic points
//! from a regular lattice of vp samples laid over a (possibly rotated)
//! rectangle in UTM.
//!
//! # Architecture
//!
//! ```text
//! query(points)
//!      │
//!      ├─► depth < 0 ──────────────────────────► no data
//!      │
//!      ├─► lon/lat ─► UTM easting/northing  (projection crate)
//!      │
//!      ├─► GridGeometry::locate ─► lattice indices + fractions
//!      │         │
//!      │         └─► outside lattice / too deep ─► no data
//!      │
//!      ├─► GridStore reads 1, 4 or 8 samples (memory or file)
//!      │
//!      ├─► nearest / bilinear / trilinear blend
//!      │
//!      └─► vs and rho derived from vp
//! ```
//!
//! # Example
//!
//! ```ignore
//! use velocity_model::{QueryPoint, VelocityModel};
//!
//! let model = VelocityModel::initialize("/opt/ucvm", "ivlsu")?;
//! let results = model.query(&[QueryPoint::new(-115.5, 32.9, 1500.0)])?;
//! println!("vp = {}", results[0].vp);
//! model.finalize()?;
//! ```

pub mod backend;
pub mod config;
pub mod derived;
pub mod error;
pub mod geometry;
pub mod interpolation;
pub mod model;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use backend::{ModelSlot, VelocityModelBackend};
pub use config::{GridConfig, LoadOptions, PlanarPoint, CONFIG_ENTRY_COUNT};
pub use error::{ModelError, Result};
pub use geometry::{CellLocation, GridGeometry};
pub use model::{model_data_root, VelocityModel, GRID_FILE_NAME, MODEL_VERSION};
pub use store::{write_lattice, GridStore, Residency};
pub use types::{Dimensions, PropertyTuple, QueryPoint, NO_DATA};
