//! Formatting query results and model information for output.

use std::str::FromStr;

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use serde::Serialize;
use velocity_model::{PropertyTuple, QueryPoint, VelocityModel};

/// Output format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format: {} (expected table, json or csv)", other)),
        }
    }
}

/// A query point paired with its result.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRecord {
    #[serde(flatten)]
    pub point: QueryPoint,
    #[serde(flatten)]
    pub properties: PropertyTuple,
}

/// Pair points with results, keeping input order.
pub fn records(points: &[QueryPoint], results: &[PropertyTuple]) -> Vec<QueryRecord> {
    points
        .iter()
        .zip(results)
        .map(|(point, properties)| QueryRecord {
            point: *point,
            properties: *properties,
        })
        .collect()
}

/// Render records in the requested format.
pub fn render(records: &[QueryRecord], format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Table => format_table(records),
        OutputFormat::Json => format_json(records)?,
        OutputFormat::Csv => format_csv(records),
    })
}

/// Format records as a console table.
pub fn format_table(records: &[QueryRecord]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            "Longitude",
            "Latitude",
            "Depth (m)",
            "Vp (m/s)",
            "Vs (m/s)",
            "Density (g/m³)",
        ]);

    for r in records {
        table.add_row(vec![
            format!("{:.6}", r.point.longitude),
            format!("{:.6}", r.point.latitude),
            format!("{:.1}", r.point.depth),
            format!("{:.4}", r.properties.vp),
            format!("{:.4}", r.properties.vs),
            format!("{:.4}", r.properties.rho),
        ]);
    }

    table.to_string()
}

/// Format records as a JSON array.
pub fn format_json(records: &[QueryRecord]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn csv_header() -> &'static str {
    "longitude,latitude,depth,vp,vs,rho,qp,qs"
}

/// Format records as CSV with a header row.
pub fn format_csv(records: &[QueryRecord]) -> String {
    let mut out = String::from(csv_header());
    out.push('\n');
    for r in records {
        out.push_str(&format!(
            "{},{},{},{:.4},{:.4},{:.4},{},{}\n",
            r.point.longitude,
            r.point.latitude,
            r.point.depth,
            r.properties.vp,
            r.properties.vs,
            r.properties.rho,
            r.properties.qp,
            r.properties.qs
        ));
    }
    out
}

/// Summary of a loaded model.
pub fn format_info(model: &VelocityModel) -> String {
    let geometry = model.geometry();
    let (width, height) = (geometry.total_width_m(), geometry.total_height_m());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![format!("Velocity Model: {}", model.version())]);

    let dims = model.dimensions();
    table.add_row(vec![
        "Lattice:".to_string(),
        format!("{} x {} x {}", dims.nx, dims.ny, dims.nz),
    ]);
    table.add_row(vec![
        "Extent:".to_string(),
        format!("{:.1} x {:.1} km", width / 1000.0, height / 1000.0),
    ]);
    table.add_row(vec![
        "Rotation:".to_string(),
        format!("{:.4}°", geometry.rotation_degrees()),
    ]);
    table.add_row(vec!["Storage:".to_string(), model.residency().to_string()]);

    let (config, count) = model.config();
    table.add_row(vec!["".to_string(), "".to_string()]);
    table.add_row(vec![format!("Configuration ({})", count), String::new()]);
    for line in config.lines() {
        if let Some((key, value)) = line.split_once('=') {
            table.add_row(vec![key.to_string(), value.to_string()]);
        }
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<QueryRecord> {
        let points = [
            QueryPoint::new(-115.5, 32.9, 1500.0),
            QueryPoint::new(-100.0, 45.0, 0.0),
        ];
        let mut found = PropertyTuple::from_vp(4000.0);
        found.vs = 2200.0;
        found.rho = 2400.0;
        records(&points, &[found, PropertyTuple::no_data()])
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_csv() {
        let csv = format_csv(&sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], csv_header());
        assert_eq!(lines[1], "-115.5,32.9,1500,4000.0000,2200.0000,2400.0000,-1,-1");
        assert_eq!(lines[2], "-100,45,0,-1.0000,-1.0000,-1.0000,-1,-1");
    }

    #[test]
    fn test_json_is_flat() {
        let json = format_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["longitude"], -115.5);
        assert_eq!(value[0]["vp"], 4000.0);
        assert_eq!(value[1]["rho"], -1.0);
    }

    #[test]
    fn test_table_contains_values() {
        let table = format_table(&sample());
        assert!(table.contains("4000.0000"));
        assert!(table.contains("Vp (m/s)"));
    }
}
