use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;

use crate::physics::vecmath::unit_or;

use super::stumpff::{stumpff_c, stumpff_s};

// ---------------------------------------------------------------------------
// Lambert two-point boundary value solver, universal-variable form
// ---------------------------------------------------------------------------

/// Boundary velocities for one transfer geometry.
///
/// Degenerate geometry (collinear endpoints) yields the zero-vector
/// sentinel; other numerical failures surface as non-finite components.
/// Callers must check `is_finite` before using a solution.
#[derive(Debug, Clone, Copy)]
pub struct LambertSolution {
    pub v1: Vector3<f64>,  // departure velocity, km/s
    pub v2: Vector3<f64>,  // arrival velocity, km/s
}

impl LambertSolution {
    pub fn is_finite(&self) -> bool {
        self.v1.iter().chain(self.v2.iter()).all(|c| c.is_finite())
    }
}

/// Near-circular formation entry parameters: a 2x1 relative ellipse in the
/// target's orbital plane, sized by its semi-minor (closest-approach) axis.
#[derive(Debug, Clone, Copy)]
pub struct NmcParams {
    pub semi_minor_km: f64,
    pub entry_angle_deg: f64,
}

const FOUR_PI2: f64 = 4.0 * PI * PI;
const BRACKET_ITERS: usize = 60;
const REFINE_ITERS: usize = 120;
const TOF_TOL_S: f64 = 1e-6;

fn solve_single(
    r1: &Vector3<f64>,
    r2: &Vector3<f64>,
    tof_s: f64,
    mu: f64,
    k_rev: u32,
) -> LambertSolution {
    let r1m = r1.norm();
    let r2m = r2.norm();

    let cos_dnu = (r1.dot(r2) / (r1m * r2m)).clamp(-1.0, 1.0);
    let dnu = cos_dnu.acos() + TAU * f64::from(k_rev);

    let one_minus_cos = 1.0 - dnu.cos();
    if one_minus_cos.abs() < 1e-12 {
        // Collinear endpoints: transfer plane undefined.
        return LambertSolution { v1: Vector3::zeros(), v2: Vector3::zeros() };
    }
    let a_coef = dnu.sin() * ((r1m * r2m) / one_minus_cos).sqrt();

    // Time of flight as a function of the universal variable z.
    // Returns +inf where the geometry is unreachable (y < 0) or C(z) <= 0,
    // so the root search treats those regions as "too slow".
    let time_of_flight = |z: f64| -> f64 {
        let c = stumpff_c(z);
        let s = stumpff_s(z);
        if !c.is_finite() || c <= 0.0 {
            return f64::INFINITY;
        }
        let y = r1m + r2m + a_coef * (z * s - 1.0) / c.sqrt();
        if !y.is_finite() || y < 0.0 {
            return f64::INFINITY;
        }
        let x = (y / c).sqrt();
        (x * x * x * s + a_coef * y.sqrt()) / mu.sqrt()
    };

    // Bracket: z_hi sits just below 4*pi^2 where TOF diverges, z_lo is grown
    // geometrically into the hyperbolic region until TOF(z_lo) <= tof.
    let mut z_lo = -FOUR_PI2;
    let mut z_hi = FOUR_PI2 - 1e-9;
    for _ in 0..BRACKET_ITERS {
        let t_lo = time_of_flight(z_lo);
        if t_lo.is_finite() && t_lo <= tof_s {
            break;
        }
        if t_lo.is_finite() {
            z_lo *= 1.4;
        } else {
            // y < 0 at z_lo: step back toward the feasible region.
            z_lo = 0.5 * (z_lo + z_hi);
        }
    }

    // Damped bisection: move 30% toward the bracket midpoint per step.
    // Fixed budget, last iterate wins; non-convergence is not an error.
    let mut z = 0.0;
    for _ in 0..REFINE_ITERS {
        let t = time_of_flight(z);
        if !t.is_finite() {
            z = 0.5 * (z + z_hi);
            continue;
        }
        let err = t - tof_s;
        if err.abs() < TOF_TOL_S {
            break;
        }
        if err > 0.0 {
            z_hi = z;
        } else {
            z_lo = z;
        }
        z = 0.7 * z + 0.3 * 0.5 * (z_lo + z_hi);
    }

    let c = stumpff_c(z);
    let s = stumpff_s(z);
    let sqrt_c = c.max(1e-16).sqrt();
    let y = r1m + r2m + a_coef * (z * s - 1.0) / sqrt_c;

    // f, g Lagrange coefficients
    let f = 1.0 - y / r1m;
    let g = a_coef * (y / mu).sqrt();
    let gdot = 1.0 - y / r2m;

    LambertSolution {
        v1: (r2 - f * r1) / g,
        v2: (gdot * r2 - r1) / g,
    }
}

/// Free intercept: one solution per revolution count k in [0, max_rev].
pub fn intercept(
    r1: &Vector3<f64>,
    r2: &Vector3<f64>,
    tof_s: f64,
    mu: f64,
    max_rev: i32,
) -> Vec<LambertSolution> {
    let max_rev = max_rev.max(0) as u32;
    (0..=max_rev)
        .map(|k| solve_single(r1, r2, tof_s, mu, k))
        .collect()
}

/// Rendezvous: arrival is a velocity-matching burn, so each solution's v2 is
/// replaced with the target's actual velocity.
pub fn rendezvous(
    r1: &Vector3<f64>,
    v_target: &Vector3<f64>,
    r2: &Vector3<f64>,
    tof_s: f64,
    mu: f64,
    max_rev: i32,
) -> Vec<LambertSolution> {
    let mut out = intercept(r1, r2, tof_s, mu, max_rev);
    for s in &mut out {
        s.v2 = *v_target;
    }
    out
}

/// Near-circular formation entry: build the desired relative state on a 2x1
/// ellipse in the target's radial/in-track plane, convert it to an absolute
/// arrival state, and solve a zero-revolution rendezvous to that state.
pub fn nmc(
    r1: &Vector3<f64>,
    r2_target: &Vector3<f64>,
    v2_target: &Vector3<f64>,
    tof_s: f64,
    params: &NmcParams,
    mu: f64,
) -> Vec<LambertSolution> {
    // Target R/I/C basis at arrival
    let e_r = unit_or(r2_target, Vector3::x());
    let h = r2_target.cross(v2_target);
    let e_c = unit_or(&h, Vector3::z());
    let e_i = unit_or(&e_c.cross(&e_r), Vector3::y());

    // LVLH frame rate omega = h / r^2; |omega| sizes the relative motion
    let r_mag = r2_target.norm().max(1e-12);
    let omega = h / (r_mag * r_mag);
    let n = omega.norm();

    let b = params.semi_minor_km.max(1e-9);
    let a = 2.0 * b;
    let th = params.entry_angle_deg.to_radians();

    // Parametric 2x1 ellipse: radial b*cos, in-track 2b*sin
    let rel_pos = e_r * (b * th.cos()) + e_i * (a * th.sin());
    let rel_vel_basis = e_r * (-b * n * th.sin()) + e_i * (a * n * th.cos());

    let r2_des = r2_target + rel_pos;
    let v2_des = v2_target + rel_vel_basis + omega.cross(&rel_pos);

    rendezvous(r1, &v2_des, &r2_des, tof_s, mu, 0)
}
