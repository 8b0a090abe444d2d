use nalgebra::Vector3;

use super::body::MU_EARTH;

/// Radius-squared floor, km^2. Keeps the inverse-cube finite at the origin.
const R2_FLOOR: f64 = 1e-12;

/// Point-mass gravitational acceleration toward the origin, km/s^2.
pub fn central_accel(pos: &Vector3<f64>, mu: f64) -> Vector3<f64> {
    let r2 = pos.norm_squared().max(R2_FLOOR);
    let r = r2.sqrt();
    -mu / (r2 * r) * pos
}

/// Earth convenience wrapper.
pub fn central_accel_earth(pos: &Vector3<f64>) -> Vector3<f64> {
    central_accel(pos, MU_EARTH)
}
