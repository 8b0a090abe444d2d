use std::f64::consts::TAU;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::orbital::stumpff::solve_kepler;
use crate::orbital::Coe;
use crate::physics::body::Body;

// ---------------------------------------------------------------------------
// Two-line element sets: fixed-column parsing and orbit conversion
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TleError {
    #[error("failed to read TLE file: {0}")]
    Io(#[from] std::io::Error),
}

/// One parsed element set. Angles in radians, mean motion in rev/day.
#[derive(Debug, Clone)]
pub struct Tle {
    pub name: String,
    pub inc_rad: f64,
    pub raan_rad: f64,
    pub ecc: f64,
    pub argp_rad: f64,
    pub mean_anom_rad: f64,
    pub n_rev_per_day: f64,
}

const SECONDS_PER_DAY: f64 = 86_400.0;
const MIN_LINE_LEN: usize = 69;

fn field(line: &str, lo: usize, hi: usize) -> Option<f64> {
    line.get(lo..hi)?.trim().parse().ok()
}

/// Parse one record from its name line and line 2. Line 2 uses the standard
/// fixed columns; the eccentricity field carries an implied "0." prefix.
fn parse_record(name: &str, l1: &str, l2: &str) -> Option<Tle> {
    if l1.len() < MIN_LINE_LEN || l2.len() < MIN_LINE_LEN {
        return None;
    }
    let ecc_digits = l2.get(26..33)?.trim();
    Some(Tle {
        name: name.trim().to_string(),
        inc_rad: field(l2, 8, 16)?.to_radians(),
        raan_rad: field(l2, 17, 25)?.to_radians(),
        ecc: format!("0.{ecc_digits}").parse().ok()?,
        argp_rad: field(l2, 34, 42)?.to_radians(),
        mean_anom_rad: field(l2, 43, 51)?.to_radians(),
        n_rev_per_day: field(l2, 52, 63)?,
    })
}

/// Parse 3-line records from catalog text. Records that are short or fail
/// to parse are skipped; parsing always continues with the next record.
pub fn parse_tles(text: &str) -> Vec<Tle> {
    let mut out = Vec::new();
    let mut lines = text.lines();
    while let (Some(name), Some(l1), Some(l2)) = (lines.next(), lines.next(), lines.next()) {
        if let Some(t) = parse_record(name, l1, l2) {
            out.push(t);
        }
    }
    out
}

pub fn load_tles(path: impl AsRef<Path>) -> Result<Vec<Tle>, TleError> {
    Ok(parse_tles(&fs::read_to_string(path)?))
}

impl Tle {
    /// Mean motion in rad/s.
    pub fn mean_motion_rad_s(&self) -> f64 {
        self.n_rev_per_day * TAU / SECONDS_PER_DAY
    }

    /// Semi-major axis from mean motion: a = (mu / n^2)^(1/3).
    pub fn semi_major_axis(&self, mu: f64) -> f64 {
        let n = self.mean_motion_rad_s();
        (mu / (n * n)).cbrt()
    }

    /// Element-set view with the mean anomaly carried straight through as
    /// the true anomaly. That is an approximation (exact only at e = 0);
    /// `to_body` does the proper anomaly conversion for spawning.
    pub fn to_coe(&self, mu: f64) -> Coe {
        Coe {
            a: self.semi_major_axis(mu),
            e: self.ecc,
            i: self.inc_rad,
            raan: self.raan_rad,
            argp: self.argp_rad,
            ta: self.mean_anom_rad,
        }
    }

    /// Inertial state at epoch: Kepler's equation for the eccentric anomaly,
    /// then true anomaly, then the standard element conversion.
    pub fn to_body(&self, mu: f64) -> Body {
        let e = self.ecc;
        let ecc_anom = solve_kepler(self.mean_anom_rad, e);
        let ta = 2.0
            * ((1.0 + e).sqrt() * (ecc_anom / 2.0).sin())
                .atan2((1.0 - e).sqrt() * (ecc_anom / 2.0).cos());
        Coe { ta, ..self.to_coe(mu) }.to_body(mu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::MU_EARTH;
    use approx::assert_relative_eq;

    const ISS_NAME: &str = "ISS (ZARYA)";
    const ISS_L1: &str = "1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9000";
    const ISS_L2: &str = "2 25544  51.6400 208.9163 0007260  69.9862  25.2906 15.49560532    00";

    #[test]
    fn parses_fixed_columns() {
        let t = parse_record(ISS_NAME, ISS_L1, ISS_L2).unwrap();
        assert_eq!(t.name, "ISS (ZARYA)");
        assert_relative_eq!(t.inc_rad, 51.64_f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(t.inc_rad, 0.9013, epsilon = 1e-4);
        assert_relative_eq!(t.ecc, 0.000726, epsilon = 1e-9);
        assert_relative_eq!(t.raan_rad, 208.9163_f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(t.n_rev_per_day, 15.49560532, epsilon = 1e-12);
    }

    #[test]
    fn short_or_garbled_records_are_skipped() {
        let text = format!(
            "{ISS_NAME}\n{ISS_L1}\n{ISS_L2}\nBAD SAT\n1 short\n2 short\nOK2\n{ISS_L1}\n{ISS_L2}\n"
        );
        let tles = parse_tles(&text);
        assert_eq!(tles.len(), 2);
        assert_eq!(tles[1].name, "OK2");
    }

    #[test]
    fn iss_semi_major_axis_is_leo() {
        let t = parse_record(ISS_NAME, ISS_L1, ISS_L2).unwrap();
        let a = t.semi_major_axis(MU_EARTH);
        assert!((6700.0..6900.0).contains(&a), "a = {a}");
    }

    #[test]
    fn spawned_body_sits_on_its_orbit() {
        let t = parse_record(ISS_NAME, ISS_L1, ISS_L2).unwrap();
        let b = t.to_body(MU_EARTH);
        let a = t.semi_major_axis(MU_EARTH);
        // Near-circular orbit: radius within e-bounds of a
        let r = b.pos.norm();
        assert!(r > a * (1.0 - 2.0 * t.ecc) && r < a * (1.0 + 2.0 * t.ecc));
        // Velocity near circular speed
        assert_relative_eq!(b.vel.norm(), (MU_EARTH / a).sqrt(), max_relative = 1e-2);
    }

    #[test]
    fn to_coe_carries_mean_anomaly_through() {
        let t = parse_record(ISS_NAME, ISS_L1, ISS_L2).unwrap();
        let c = t.to_coe(MU_EARTH);
        assert_relative_eq!(c.ta, 25.2906_f64.to_radians(), epsilon = 1e-12);
    }
}
