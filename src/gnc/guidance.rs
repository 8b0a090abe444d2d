use nalgebra::Vector3;

use crate::physics::vecmath::unit_or;

// ---------------------------------------------------------------------------
// Ascent steering: blend "fly up" with "fly at the lead point"
// ---------------------------------------------------------------------------

/// Guidance target: the body being flown toward, sampled this tick.
#[derive(Debug, Clone, Copy)]
pub struct TargetTrack {
    pub pos: Vector3<f64>,  // km
    pub vel: Vector3<f64>,  // km/s
}

/// Tunable guidance policy. The speed-weighted blend is a heuristic
/// pitch-over approximation, not an optimal control law, so every knob
/// stays configurable.
#[derive(Debug, Clone, Copy)]
pub struct GuidanceParams {
    /// Multiplier on commanded stage thrust.
    pub thrust_scale: f64,
    /// Seconds of target velocity extrapolation for the lead point.
    pub lead_time_s: f64,
    /// Speed (km/s) at which steering is fully committed to the intercept
    /// direction; below it the radial-out component dominates.
    pub blend_speed_kms: f64,
}

impl Default for GuidanceParams {
    fn default() -> Self {
        Self {
            thrust_scale: 1.0,
            lead_time_s: 0.0,
            blend_speed_kms: 6.0,
        }
    }
}

/// Commanded unit thrust direction.
///
/// Radial-out is the default; as speed builds, weight shifts toward the
/// direction of the lead point (target position extrapolated by lead time).
/// An intercept direction pointing below the local horizon has its inward
/// radial component removed first, so the vehicle never steers into the
/// primary.
pub fn steer(
    pos: &Vector3<f64>,
    vel: &Vector3<f64>,
    target: Option<&TargetTrack>,
    params: &GuidanceParams,
) -> Vector3<f64> {
    let radial = unit_or(pos, Vector3::z());

    let Some(t) = target else {
        return radial;
    };

    let lead_point = t.pos + t.vel * params.lead_time_s;
    let mut intercept_dir = unit_or(&(lead_point - pos), radial);

    let below_horizon = intercept_dir.dot(&radial);
    if below_horizon < 0.0 {
        intercept_dir = unit_or(&(intercept_dir - radial * below_horizon), radial);
    }

    let w = (vel.norm() / params.blend_speed_kms).clamp(0.0, 1.0);
    unit_or(&(radial * (1.0 - w) + intercept_dir * w), radial)
}
