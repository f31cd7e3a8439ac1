//! Synthetic velocity lattices.
//!
//! All generators return samples in storage order: x fastest, then y, then
//! z (the layout of `vp.dat`).

/// The 2 x 2 x 2 lattice `[100, 200, ..., 800]`.
///
/// Layer 0 holds 100 (origin), 200 (+x), 300 (+y), 400 (+x +y); layer 1
/// holds 500 to 800 in the same order.
pub fn create_cube_lattice() -> Vec<f32> {
    (1..=8).map(|i| (i * 100) as f32).collect()
}

/// Creates a lattice whose values encode their own indices.
///
/// Each sample is `1000 * (z + 1) + 10 * y + x`, exact in `f32` for any
/// lattice up to 10 x 100 x 16000, which makes layout mistakes easy to spot.
///
/// # Example
///
/// ```
/// use test_utils::create_indexed_lattice;
///
/// let data = create_indexed_lattice(3, 2, 2);
/// assert_eq!(data.len(), 12);
/// assert_eq!(data[0], 1000.0);  // (0, 0, 0)
/// assert_eq!(data[1], 1001.0);  // (1, 0, 0)
/// assert_eq!(data[3], 1010.0);  // (0, 1, 0)
/// assert_eq!(data[6], 2000.0);  // (0, 0, 1)
/// ```
pub fn create_indexed_lattice(nx: usize, ny: usize, nz: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(nx * ny * nz);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                data.push((1000 * (z + 1) + 10 * y + x) as f32);
            }
        }
    }
    data
}

/// Creates a horizontally uniform lattice with vp increasing with depth.
///
/// Layer `z` holds `surface_vp + z * gradient` m/s everywhere.
pub fn create_depth_gradient_lattice(
    nx: usize,
    ny: usize,
    nz: usize,
    surface_vp: f32,
    gradient: f32,
) -> Vec<f32> {
    let mut data = Vec::with_capacity(nx * ny * nz);
    for z in 0..nz {
        data.extend(std::iter::repeat(surface_vp + z as f32 * gradient).take(nx * ny));
    }
    data
}

/// Creates a sedimentary-basin-like lattice.
///
/// Velocities start low in the centre of the region and rise towards the
/// edges and with depth, staying inside the 1.5 to 8 km/s range.
pub fn create_basin_lattice(nx: usize, ny: usize, nz: usize) -> Vec<f32> {
    let cx = (nx.max(2) - 1) as f32 / 2.0;
    let cy = (ny.max(2) - 1) as f32 / 2.0;
    let mut data = Vec::with_capacity(nx * ny * nz);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let dx = (x as f32 - cx) / cx.max(1.0);
                let dy = (y as f32 - cy) / cy.max(1.0);
                let edge = (dx * dx + dy * dy).sqrt().min(1.0);
                let vp = 1800.0 + 1500.0 * edge + 600.0 * z as f32;
                data.push(vp.min(8000.0));
            }
        }
    }
    data
}

/// Renders a lattice as the whitespace text table consumed by the grid
/// builder: `easting_km northing_km depth_km vp_km_s` per line, x fastest.
///
/// Node positions start at `(origin_e, origin_n)` meters with `spacing_m`
/// between nodes horizontally and 1 km between layers.
pub fn lattice_to_text_table(
    data: &[f32],
    nx: usize,
    ny: usize,
    origin_e: f64,
    origin_n: f64,
    spacing_m: f64,
) -> String {
    let mut out = String::new();
    for (i, vp) in data.iter().enumerate() {
        let x = i % nx;
        let y = (i / nx) % ny;
        let z = i / (nx * ny);
        let easting = (origin_e + x as f64 * spacing_m) / 1000.0;
        let northing = (origin_n + y as f64 * spacing_m) / 1000.0;
        out.push_str(&format!(
            "{:.3} {:.3} {:.3} {:.4}\n",
            easting,
            northing,
            z as f64,
            *vp as f64 / 1000.0
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_lattice() {
        let data = create_cube_lattice();
        assert_eq!(data, vec![100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0, 800.0]);
    }

    #[test]
    fn test_indexed_lattice_layout() {
        let (nx, ny, nz) = (4, 3, 2);
        let data = create_indexed_lattice(nx, ny, nz);
        let at = |x: usize, y: usize, z: usize| data[z * nx * ny + y * nx + x];
        assert_eq!(at(3, 2, 1), 2023.0);
        assert_eq!(at(0, 2, 0), 1020.0);
    }

    #[test]
    fn test_depth_gradient_lattice() {
        let data = create_depth_gradient_lattice(2, 2, 3, 2000.0, 500.0);
        assert_eq!(data.len(), 12);
        assert!(data[..4].iter().all(|&v| v == 2000.0));
        assert!(data[8..].iter().all(|&v| v == 3000.0));
    }

    #[test]
    fn test_basin_lattice_range() {
        let data = create_basin_lattice(11, 9, 4);
        assert_eq!(data.len(), 11 * 9 * 4);
        assert!(data.iter().all(|&v| (1500.0..=8000.0).contains(&v)));
        // Centre is slower than the corner on the same layer
        assert!(data[4 * 11 + 5] < data[0]);
    }

    #[test]
    fn test_text_table() {
        let text = lattice_to_text_table(&create_cube_lattice(), 2, 2, 589000.0, 3607000.0, 1000.0);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "589.000 3607.000 0.000 0.1000");
        assert_eq!(lines[3], "590.000 3608.000 0.000 0.4000");
        assert_eq!(lines[7], "590.000 3608.000 1.000 0.8000");
    }
}
