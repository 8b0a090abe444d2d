use std::f64::consts::TAU;

use nalgebra::Vector3;

use crate::physics::body::{Body, MU_EARTH};

/// Eccentricity / inclination threshold below which raan, argp are treated
/// as undefined and the longitude-based fallback applies.
const DEGENERATE_TOL: f64 = 1e-10;

/// Classical orbital elements. Angles in radians, reduced to [0, 2*pi).
///
/// `a` is positive for ellipses and negative for hyperbolas (a = -mu/2E).
#[derive(Debug, Clone, Copy, Default)]
pub struct Coe {
    pub a: f64,     // semi-major axis, km
    pub e: f64,     // eccentricity
    pub i: f64,     // inclination, rad
    pub raan: f64,  // right ascension of ascending node, rad
    pub argp: f64,  // argument of periapsis, rad
    pub ta: f64,    // true anomaly, rad
}

fn wrap_tau(x: f64) -> f64 {
    let w = x % TAU;
    if w < 0.0 { w + TAU } else { w }
}

impl Coe {
    /// Circular orbit of radius `r` km at inclination `inc`.
    pub fn circular(r: f64, inc: f64) -> Self {
        Coe { a: r, e: 0.0, i: inc, raan: 0.0, argp: 0.0, ta: 0.0 }
    }

    /// Orbital period for an elliptical orbit, seconds.
    pub fn period(&self, mu: f64) -> f64 {
        TAU * (self.a.powi(3) / mu).sqrt()
    }

    /// Convert elements to an inertial state vector.
    ///
    /// Position and velocity are built in the perifocal frame from (a, e, ta),
    /// then rotated by argp, inclination, and raan in that order.
    pub fn to_body(&self, mu: f64) -> Body {
        let p = self.a * (1.0 - self.e * self.e); // semi-latus rectum
        let r = p / (1.0 + self.e * self.ta.cos());

        let r_pqw = Vector3::new(r * self.ta.cos(), r * self.ta.sin(), 0.0);

        let sqrt_mu_p = (mu / p).sqrt();
        let v_pqw = Vector3::new(
            -sqrt_mu_p * self.ta.sin(),
            sqrt_mu_p * (self.e + self.ta.cos()),
            0.0,
        );

        let (sin_raan, cos_raan) = self.raan.sin_cos();
        let (sin_argp, cos_argp) = self.argp.sin_cos();
        let (sin_inc, cos_inc) = self.i.sin_cos();

        let rot = |v: &Vector3<f64>| -> Vector3<f64> {
            Vector3::new(
                (cos_raan * cos_argp - sin_raan * sin_argp * cos_inc) * v.x
                    + (-cos_raan * sin_argp - sin_raan * cos_argp * cos_inc) * v.y,
                (sin_raan * cos_argp + cos_raan * sin_argp * cos_inc) * v.x
                    + (-sin_raan * sin_argp + cos_raan * cos_argp * cos_inc) * v.y,
                (sin_argp * sin_inc) * v.x + (cos_argp * sin_inc) * v.y,
            )
        };

        Body::new(rot(&r_pqw), rot(&v_pqw), 0.0)
    }

    /// Earth convenience wrapper.
    pub fn to_body_earth(&self) -> Body {
        self.to_body(MU_EARTH)
    }

    /// Recover elements from an inertial state vector.
    ///
    /// Quadrants: raan from the sign of n.y, argp from the sign of e_vec.z,
    /// true anomaly from the sign of r.v. When e or i is degenerate the
    /// node/periapsis directions are undefined; raan/argp collapse to 0 and
    /// the true anomaly falls back to the polar angle of position.
    pub fn from_body(body: &Body, mu: f64) -> Self {
        let r_vec = body.pos;
        let v_vec = body.vel;
        let r = r_vec.norm();

        let h = r_vec.cross(&v_vec);
        let h_mag = h.norm();

        // Node vector: z_hat x h
        let n = Vector3::new(-h.y, h.x, 0.0);
        let n_mag = n.norm();

        let e_vec = v_vec.cross(&h) / mu - r_vec / r;
        let ecc = e_vec.norm();

        let energy = body.specific_energy(mu);
        let a = if energy.abs() > 1e-12 {
            -mu / (2.0 * energy)
        } else {
            f64::INFINITY // parabolic
        };

        let inc = if h_mag > 0.0 {
            (h.z / h_mag).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let degenerate = ecc < DEGENERATE_TOL || inc < DEGENERATE_TOL || n_mag < DEGENERATE_TOL;
        if degenerate {
            return Coe {
                a,
                e: ecc,
                i: inc,
                raan: 0.0,
                argp: 0.0,
                ta: wrap_tau(r_vec.y.atan2(r_vec.x)),
            };
        }

        let raan = {
            let ang = (n.x / n_mag).clamp(-1.0, 1.0).acos();
            if n.y < 0.0 { TAU - ang } else { ang }
        };

        let argp = {
            let ang = (n.dot(&e_vec) / (n_mag * ecc)).clamp(-1.0, 1.0).acos();
            if e_vec.z < 0.0 { TAU - ang } else { ang }
        };

        let ta = {
            let ang = (e_vec.dot(&r_vec) / (ecc * r)).clamp(-1.0, 1.0).acos();
            if r_vec.dot(&v_vec) < 0.0 { TAU - ang } else { ang }
        };

        Coe {
            a,
            e: ecc,
            i: inc,
            raan: wrap_tau(raan),
            argp: wrap_tau(argp),
            ta: wrap_tau(ta),
        }
    }

    pub fn from_body_earth(body: &Body) -> Self {
        Self::from_body(body, MU_EARTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn angle_diff(a: f64, b: f64) -> f64 {
        let d = wrap_tau(a - b);
        d.min(TAU - d)
    }

    #[test]
    fn leo_roundtrip() {
        let c = Coe {
            a: 7000.0,
            e: 0.01,
            i: 51.6_f64.to_radians(),
            raan: 1.2,
            argp: 0.7,
            ta: 2.1,
        };
        let r = Coe::from_body(&c.to_body(MU_EARTH), MU_EARTH);
        assert!((r.a - c.a).abs() / c.a < 1e-6);
        assert!((r.e - c.e).abs() < 1e-6);
        assert!(angle_diff(r.i, c.i) < 1e-6);
        assert!(angle_diff(r.raan, c.raan) < 1e-6);
        assert!(angle_diff(r.argp, c.argp) < 1e-6);
        assert!(angle_diff(r.ta, c.ta) < 1e-6);
    }

    #[test]
    fn earth_wrappers_match_explicit_mu() {
        let c = Coe { a: 7200.0, e: 0.02, i: 0.6, raan: 1.1, argp: 0.4, ta: 2.8 };
        let b = c.to_body_earth();
        let explicit = c.to_body(MU_EARTH);
        assert!((b.pos - explicit.pos).norm() < 1e-12);
        assert!((b.vel - explicit.vel).norm() < 1e-12);
        let r = Coe::from_body_earth(&b);
        assert!((r.a - c.a).abs() / c.a < 1e-6);
        assert!((r.e - c.e).abs() < 1e-6);
    }

    #[test]
    fn circular_orbit_speed() {
        let r = 7000.0;
        let b = Coe::circular(r, 0.3).to_body(MU_EARTH);
        let expected = (MU_EARTH / r).sqrt();
        assert!((b.speed() - expected).abs() < 1e-9);
    }

    #[test]
    fn degenerate_equatorial_circular_uses_polar_angle() {
        let r = 8000.0;
        let v = (MU_EARTH / r).sqrt();
        let ang = 0.9_f64;
        let b = Body::new(
            Vector3::new(r * ang.cos(), r * ang.sin(), 0.0),
            Vector3::new(-v * ang.sin(), v * ang.cos(), 0.0),
            0.0,
        );
        let c = Coe::from_body(&b, MU_EARTH);
        assert!(c.e < 1e-8);
        assert!(c.raan == 0.0 && c.argp == 0.0);
        assert!(angle_diff(c.ta, ang) < 1e-8);
    }

    #[test]
    fn hyperbolic_a_is_negative() {
        let b = Body::new(
            Vector3::new(7000.0, 0.0, 0.0),
            Vector3::new(0.0, 12.0, 0.0), // well above escape speed
            0.0,
        );
        let c = Coe::from_body(&b, MU_EARTH);
        assert!(c.a < 0.0);
        assert!(c.e > 1.0);
    }

    #[test]
    fn leo_period_near_iss() {
        let c = Coe::circular(6771.0, 0.9);
        let p = c.period(MU_EARTH);
        assert!(p > 5400.0 && p < 5700.0, "LEO period should be ~92 min, got {p:.0} s");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn roundtrip_nondegenerate(
            a in 6800.0..60_000.0f64,
            e in 1e-4..0.9f64,
            i in 0.01..(std::f64::consts::PI - 0.01),
            raan in 0.0..TAU,
            argp in 0.0..TAU,
            ta in 0.0..TAU,
        ) {
            let c = Coe { a, e, i, raan, argp, ta };
            let r = Coe::from_body(&c.to_body(MU_EARTH), MU_EARTH);
            prop_assert!((r.a - c.a).abs() / c.a < 1e-6);
            prop_assert!((r.e - c.e).abs() < 1e-6);
            prop_assert!(angle_diff(r.i, c.i) < 1e-6);
            prop_assert!(angle_diff(r.raan, c.raan) < 1e-6);
            prop_assert!(angle_diff(r.argp, c.argp) < 1e-6);
            prop_assert!(angle_diff(r.ta, c.ta) < 1e-6);
        }
    }
}
