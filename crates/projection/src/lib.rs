//! Coordinate reference system transformations.
//!
//! Implements map projections from scratch; no geodesy library is pulled in.

pub mod transform;
pub mod utm;

pub use transform::{GeoTransform, ProjectionError, Result};
pub use utm::{Hemisphere, Utm};
