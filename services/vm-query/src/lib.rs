//! Command-line access to the Imperial Valley velocity model.
//!
//! The binary wraps these modules; they are exposed as a library so the
//! integration tests can drive them without spawning processes.

pub mod grid_tools;
pub mod input;
pub mod report;

pub use grid_tools::{build_grid, verify_grid, BuiltGrid, Mismatch, TableRow, Verification};
pub use input::{parse_line, read_points};
pub use report::{format_info, records, render, OutputFormat, QueryRecord};
