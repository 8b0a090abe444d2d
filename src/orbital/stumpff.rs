// ---------------------------------------------------------------------------
// Stumpff functions + Kepler's equation
// ---------------------------------------------------------------------------

/// Width of the z≈0 band where the closed-form limits are used.
const Z_EPS: f64 = 1e-12;

/// Stumpff C(z) = (1 - cos√z)/z, continued through z=0 (limit 1/2) and into
/// the hyperbolic branch via cosh.
pub fn stumpff_c(z: f64) -> f64 {
    if z > Z_EPS {
        (1.0 - z.sqrt().cos()) / z
    } else if z < -Z_EPS {
        (1.0 - (-z).sqrt().cosh()) / z
    } else {
        0.5
    }
}

/// Stumpff S(z) = (√z - sin√z)/z^1.5, continued through z=0 (limit 1/6) and
/// into the hyperbolic branch via sinh.
pub fn stumpff_s(z: f64) -> f64 {
    if z > Z_EPS {
        let sq = z.sqrt();
        (sq - sq.sin()) / z.powf(1.5)
    } else if z < -Z_EPS {
        let sq = (-z).sqrt();
        (sq.sinh() - sq) / (-z).powf(1.5)
    } else {
        1.0 / 6.0
    }
}

/// Newton iteration budget for the Kepler solve. Non-convergence is not an
/// error: the last iterate is returned after the budget is spent, trading
/// guaranteed convergence for bounded latency.
const KEPLER_ITERS: usize = 15;

/// Solve Kepler's equation E - e·sinE = M for eccentric anomaly E.
pub fn solve_kepler(mean_anom: f64, ecc: f64) -> f64 {
    let mut e_anom = mean_anom;
    for _ in 0..KEPLER_ITERS {
        let f = e_anom - ecc * e_anom.sin() - mean_anom;
        let fp = 1.0 - ecc * e_anom.cos();
        e_anom -= f / fp;
    }
    e_anom
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn continuous_at_zero() {
        for z in [-1e-6, 1e-6] {
            assert!((stumpff_c(z) - 0.5).abs() < 1e-6, "C({z}) = {}", stumpff_c(z));
            assert!((stumpff_s(z) - 1.0 / 6.0).abs() < 1e-6, "S({z}) = {}", stumpff_s(z));
        }
    }

    #[test]
    fn elliptic_branch_values() {
        // C(pi^2) = (1 - cos(pi))/pi^2 = 2/pi^2
        let z = std::f64::consts::PI.powi(2);
        assert_relative_eq!(stumpff_c(z), 2.0 / z, epsilon = 1e-12);
    }

    #[test]
    fn hyperbolic_branch_is_finite() {
        assert!(stumpff_c(-25.0).is_finite());
        assert!(stumpff_s(-25.0).is_finite());
        assert!(stumpff_c(-25.0) > 0.0);
    }

    #[test]
    fn kepler_residual_small() {
        for (m, e) in [(0.3, 0.1), (2.5, 0.7), (5.9, 0.05), (1.0, 0.9)] {
            let big_e = solve_kepler(m, e);
            let resid = big_e - e * big_e.sin() - m;
            assert!(resid.abs() < 1e-10, "M={m} e={e} resid={resid:.2e}");
        }
    }

    #[test]
    fn kepler_circular_is_identity() {
        assert_relative_eq!(solve_kepler(1.234, 0.0), 1.234, epsilon = 1e-12);
    }
}
