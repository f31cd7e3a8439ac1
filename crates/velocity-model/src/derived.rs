//! Properties derived from P-wave velocity.

use crate::types::PropertyTuple;

/// Density from vp using the Nafe-Drake relation (Brocher 2005, eq. 1).
///
/// Input in m/s, output in g/m^3. Never less than 1000.
pub fn density(vp: f64) -> f64 {
    let v = vp * 0.001;
    let rho = 1.6612 * v - 0.4721 * v.powi(2) + 0.0671 * v.powi(3) - 0.0043 * v.powi(4)
        + 0.000106 * v.powi(5);
    rho.max(1.0) * 1000.0
}

/// S-wave velocity from vp using Brocher's regression (Brocher 2005, eq. 1).
///
/// Input and output in m/s. The polynomial is fitted for 1.5 to 8 km/s and is
/// not range checked.
pub fn shear_velocity(vp: f64) -> f64 {
    let v = vp * 0.001;
    (0.7858 - 1.2344 * v + 0.7949 * v.powi(2) - 0.1238 * v.powi(3) + 0.0064 * v.powi(4)) * 1000.0
}

/// Overwrite rho and vs with the values derived from vp.
pub fn apply(properties: &mut PropertyTuple) {
    properties.rho = density(properties.vp);
    properties.vs = shear_velocity(properties.vp);
}
