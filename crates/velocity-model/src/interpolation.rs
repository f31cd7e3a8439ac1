//! Interpolation between lattice samples.
//!
//! All three methods blend vp, vs and rho componentwise; qp and qs are not
//! modelled and always come back as [`NO_DATA`].
//!
//! [`NO_DATA`]: crate::types::NO_DATA

use crate::types::PropertyTuple;

/// Linear interpolation between two samples.
///
/// `percent` is the fractional position from `x0` (0.0) to `x1` (1.0).
pub fn linear(x0: &PropertyTuple, x1: &PropertyTuple, percent: f64) -> PropertyTuple {
    let lerp = |a: f64, b: f64| (1.0 - percent) * a + percent * b;
    PropertyTuple {
        vp: lerp(x0.vp, x1.vp),
        vs: lerp(x0.vs, x1.vs),
        rho: lerp(x0.rho, x1.rho),
        ..PropertyTuple::no_data()
    }
}

/// Bilinear interpolation over one plane.
///
/// `plane` holds the samples at the origin, +1 in x, +1 in y and +1 in both,
/// in that order. Blends along x on both rows, then along y.
pub fn bilinear(x_percent: f64, y_percent: f64, plane: &[PropertyTuple; 4]) -> PropertyTuple {
    let near = linear(&plane[0], &plane[1], x_percent);
    let far = linear(&plane[2], &plane[3], x_percent);
    linear(&near, &far, y_percent)
}

/// Trilinear interpolation over two planes.
///
/// `points[0..4]` is the located layer and `points[4..8]` the layer above it,
/// each ordered as for [`bilinear`]. `z_percent` runs from the located layer
/// (0.0) to the layer above (1.0).
pub fn trilinear(
    x_percent: f64,
    y_percent: f64,
    z_percent: f64,
    points: &[PropertyTuple; 8],
) -> PropertyTuple {
    let located = bilinear(
        x_percent,
        y_percent,
        &[points[0], points[1], points[2], points[3]],
    );
    let above = bilinear(
        x_percent,
        y_percent,
        &[points[4], points[5], points[6], points[7]],
    );
    linear(&located, &above, z_percent)
}
