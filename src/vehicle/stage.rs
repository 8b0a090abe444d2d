use crate::physics::body::G0;

// ---------------------------------------------------------------------------
// Stage definition (one stage of a multi-stage rocket)
// ---------------------------------------------------------------------------

/// Immutable stage template. The running vehicle copies it and depletes the
/// copy's fuel mass.
#[derive(Debug, Clone)]
pub struct Stage {
    pub thrust: f64,     // N
    pub isp: f64,        // s
    pub fuel_mass: f64,  // kg
    pub dry_mass: f64,   // kg
}

impl Stage {
    /// Propellant mass flow rate, kg/s: mdot = F / (Isp * g0).
    pub fn mass_flow(&self) -> f64 {
        self.thrust / (self.isp * G0)
    }

    pub fn total_mass(&self) -> f64 {
        self.fuel_mass + self.dry_mass
    }

    /// Self-consistent burn time from fuel and mass flow.
    pub fn burn_time(&self) -> f64 {
        if self.thrust > 0.0 {
            self.fuel_mass / self.mass_flow()
        } else {
            0.0
        }
    }

    /// Ideal stage delta-v (Tsiolkovsky), m/s, carrying `payload_mass` kg.
    pub fn delta_v(&self, payload_mass: f64) -> f64 {
        let m0 = self.total_mass() + payload_mass;
        let mf = self.dry_mass + payload_mass;
        self.isp * G0 * (m0 / mf).ln()
    }
}

// ---------------------------------------------------------------------------
// Stage builder
// ---------------------------------------------------------------------------

pub struct StageBuilder {
    thrust: f64,
    isp: f64,
    fuel_mass: f64,
    dry_mass: f64,
}

impl StageBuilder {
    pub fn new() -> Self {
        Self {
            thrust: 1.0e6,
            isp: 300.0,
            fuel_mass: 100_000.0,
            dry_mass: 10_000.0,
        }
    }

    pub fn thrust(mut self, v: f64) -> Self { self.thrust = v; self }
    pub fn isp(mut self, v: f64) -> Self { self.isp = v; self }
    pub fn fuel_mass(mut self, v: f64) -> Self { self.fuel_mass = v; self }
    pub fn dry_mass(mut self, v: f64) -> Self { self.dry_mass = v; self }

    pub fn build(self) -> Stage {
        Stage {
            thrust: self.thrust,
            isp: self.isp,
            fuel_mass: self.fuel_mass,
            dry_mass: self.dry_mass,
        }
    }
}

impl Default for StageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Three-stage heavy-lift reference vehicle used by the ascent model.
pub fn heavy_lift_stages() -> Vec<Stage> {
    vec![
        Stage { thrust: 7.6e6, isp: 263.0, fuel_mass: 395_000.0, dry_mass: 25_600.0 },
        Stage { thrust: 9.34e5, isp: 421.0, fuel_mass: 92_670.0, dry_mass: 4_000.0 },
        Stage { thrust: 9.34e5, isp: 450.0, fuel_mass: 15_000.0, dry_mass: 3_500.0 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mass_flow_matches_hand_calc() {
        let s = StageBuilder::new().thrust(2000.0).isp(220.0).build();
        assert_relative_eq!(s.mass_flow(), 2000.0 / (220.0 * G0), epsilon = 1e-12);
    }

    #[test]
    fn burn_time_consistent() {
        let s = StageBuilder::new().thrust(5000.0).isp(250.0).fuel_mass(100.0).build();
        assert_relative_eq!(s.burn_time() * s.mass_flow(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn delta_v_positive_and_drops_with_payload() {
        let s = heavy_lift_stages().remove(0);
        let dv0 = s.delta_v(0.0);
        let dv1 = s.delta_v(100_000.0);
        assert!(dv0 > dv1);
        assert!(dv1 > 0.0);
    }
}
