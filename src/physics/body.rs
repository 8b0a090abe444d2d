use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

/// Earth gravitational parameter, km^3/s^2.
pub const MU_EARTH: f64 = 398_600.441_8;
/// Mean Earth radius, km (altitude reference).
pub const R_EARTH: f64 = 6_371.0;
/// Equatorial Earth radius, km (geodesy reference).
pub const R_EARTH_EQ: f64 = 6_378.137;
/// Standard gravity, m/s^2 (Isp conversions).
pub const G0: f64 = 9.80665;
/// Earth rotation rate, rad/s.
pub const OMEGA_EARTH: f64 = 7.292_115_9e-5;

// ---------------------------------------------------------------------------
// Body state
// ---------------------------------------------------------------------------

/// Point-mass state in an Earth-centered inertial frame.
///
/// Mass 0 marks a massless reference point (ground sites, TLE entities) —
/// such bodies still propagate but never act as a gravity source.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub pos: Vector3<f64>,  // km
    pub vel: Vector3<f64>,  // km/s
    pub mass: f64,          // kg
}

impl Body {
    pub fn new(pos: Vector3<f64>, vel: Vector3<f64>, mass: f64) -> Self {
        Self { pos, vel, mass }
    }

    /// Stationary massless point (ground site, lookup entry).
    pub fn fixed(pos: Vector3<f64>) -> Self {
        Self { pos, vel: Vector3::zeros(), mass: 0.0 }
    }

    pub fn radius(&self) -> f64 {
        self.pos.norm()
    }

    pub fn altitude(&self) -> f64 {
        self.radius() - R_EARTH
    }

    pub fn speed(&self) -> f64 {
        self.vel.norm()
    }

    /// Specific orbital energy, km^2/s^2: v^2/2 - mu/r.
    pub fn specific_energy(&self, mu: f64) -> f64 {
        0.5 * self.vel.norm_squared() - mu / self.radius()
    }

    pub fn is_finite(&self) -> bool {
        self.pos.iter().chain(self.vel.iter()).all(|c| c.is_finite()) && self.mass.is_finite()
    }
}

impl Default for Body {
    fn default() -> Self {
        Self {
            pos: Vector3::zeros(),
            vel: Vector3::zeros(),
            mass: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_orbit_energy_is_negative() {
        let r = 7000.0;
        let v = (MU_EARTH / r).sqrt();
        let b = Body::new(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0), 1000.0);
        assert!(b.specific_energy(MU_EARTH) < 0.0);
        assert!((b.specific_energy(MU_EARTH) + MU_EARTH / (2.0 * r)).abs() < 1e-9);
    }

    #[test]
    fn nan_state_is_not_finite() {
        let mut b = Body::default();
        assert!(b.is_finite());
        b.vel.x = f64::NAN;
        assert!(!b.is_finite());
    }
}
