//! Building and verifying the binary lattice from the published text table.
//!
//! The text table has one node per line, `easting_km northing_km depth_km
//! vp_km_s`, ordered with x fastest, then y, then z.

use std::io::BufRead;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use velocity_model::{GridConfig, GridGeometry, GridStore, NO_DATA};

/// One row of the text table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableRow {
    pub easting_km: f64,
    pub northing_km: f64,
    pub depth_km: f64,
    pub vp_km_s: f64,
}

impl TableRow {
    /// vp in m/s.
    pub fn vp(&self) -> f64 {
        self.vp_km_s * 1000.0
    }
}

/// Parse one table line. Returns `None` for blank and comment lines.
pub fn parse_row(line: &str) -> Result<Option<TableRow>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let fields: Vec<f64> = line
        .split_whitespace()
        .map(|f| f.parse::<f64>().with_context(|| format!("invalid number: {}", f)))
        .collect::<Result<_>>()?;
    if fields.len() < 4 {
        bail!("expected 4 columns, found {}", fields.len());
    }
    Ok(Some(TableRow {
        easting_km: fields[0],
        northing_km: fields[1],
        depth_km: fields[2],
        vp_km_s: fields[3],
    }))
}

fn rows<R: BufRead>(reader: R) -> impl Iterator<Item = Result<(usize, TableRow)>> {
    reader.lines().enumerate().filter_map(|(index, line)| {
        let line_no = index + 1;
        let parsed = line
            .with_context(|| format!("failed to read line {}", line_no))
            .and_then(|l| parse_row(&l).with_context(|| format!("line {}", line_no)));
        match parsed {
            Ok(Some(row)) => Some(Ok((line_no, row))),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    })
}

/// Result of converting a text table.
#[derive(Debug, Clone)]
pub struct BuiltGrid {
    /// Samples in storage order, m/s. Nodes missing from the table hold the
    /// no-data marker.
    pub lattice: Vec<f32>,
    /// Number of table rows consumed.
    pub rows: usize,
}

/// Convert a text table into a lattice sized by `config`.
///
/// Rows are placed in file order; the table must not hold more rows than
/// the lattice has nodes.
pub fn build_grid<R: BufRead>(reader: R, config: &GridConfig) -> Result<BuiltGrid> {
    let dims = config.dimensions();
    let mut lattice = vec![NO_DATA as f32; dims.len()];
    let mut count = 0;

    for row in rows(reader) {
        let (line_no, row) = row?;
        if count >= lattice.len() {
            bail!(
                "line {}: table has more rows than the {} x {} x {} lattice",
                line_no,
                dims.nx,
                dims.ny,
                dims.nz
            );
        }
        lattice[count] = row.vp() as f32;
        count += 1;
    }

    if count < lattice.len() {
        warn!(
            rows = count,
            nodes = lattice.len(),
            "Table is shorter than the lattice; remaining nodes hold no data"
        );
    } else {
        info!(rows = count, "Built lattice from table");
    }

    Ok(BuiltGrid {
        lattice,
        rows: count,
    })
}

/// A table row whose stored value disagrees with the lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub line: usize,
    pub expected: f64,
    /// `None` when the row maps outside the lattice.
    pub found: Option<f64>,
}

/// Outcome of checking a lattice against its source table.
#[derive(Debug, Clone, Default)]
pub struct Verification {
    pub checked: usize,
    pub mismatches: Vec<Mismatch>,
}

impl Verification {
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Check every table row against the lattice at 0.1 m/s precision.
///
/// Rows are located by their coordinates rather than their order, so a
/// lattice written in the wrong order is caught.
pub fn verify_grid<R: BufRead>(
    reader: R,
    config: &GridConfig,
    store: &GridStore,
) -> Result<Verification> {
    let geometry = GridGeometry::new(config)?;
    let dims = store.dims();
    let mut verification = Verification::default();

    for row in rows(reader) {
        let (line_no, row) = row?;
        verification.checked += 1;

        let cell = geometry.locate(
            row.easting_km * 1000.0,
            row.northing_km * 1000.0,
            row.depth_km * 1000.0,
        );
        let inside = cell.x >= 0
            && cell.y >= 0
            && cell.z >= 0
            && dims.contains(cell.x as usize, cell.y as usize, cell.z as usize);

        let expected = round_tenth(row.vp());
        let found = if inside {
            let sample =
                store.read_lattice_point(cell.x as usize, cell.y as usize, cell.z as usize)?;
            Some(round_tenth(sample.vp))
        } else {
            None
        };

        if found != Some(expected) {
            verification.mismatches.push(Mismatch {
                line: line_no,
                expected,
                found,
            });
        }
    }

    Ok(verification)
}

fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
