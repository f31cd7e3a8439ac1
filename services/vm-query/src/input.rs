//! Reading query points from text.
//!
//! One point per line as `lon lat depth`, whitespace separated. Blank lines
//! and lines starting with `#` are skipped.

use std::io::BufRead;

use anyhow::{bail, Context, Result};
use velocity_model::QueryPoint;

/// Parse every point from a reader.
pub fn read_points<R: BufRead>(reader: R) -> Result<Vec<QueryPoint>> {
    let mut points = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", index + 1))?;
        if let Some(point) =
            parse_line(&line).with_context(|| format!("line {}: {:?}", index + 1, line))?
        {
            points.push(point);
        }
    }
    Ok(points)
}

/// Parse one line. Returns `None` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<QueryPoint>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        bail!("expected `lon lat depth`, found {} field(s)", fields.len());
    }

    let mut values = [0.0f64; 3];
    for (value, (field, name)) in values
        .iter_mut()
        .zip(fields.iter().zip(["longitude", "latitude", "depth"]))
    {
        *value = field
            .parse::<f64>()
            .with_context(|| format!("invalid {}: {}", name, field))?;
    }

    Ok(Some(QueryPoint::new(values[0], values[1], values[2])))
}
