use nalgebra::Vector3;
use rayon::prelude::*;

use super::body::Body;
use super::gravity::central_accel;

// ---------------------------------------------------------------------------
// Body collection + two-body propagation
// ---------------------------------------------------------------------------

/// Named collection of independent bodies orbiting a single fixed primary
/// at the origin.
///
/// Bodies do not attract each other; each step is a pure function of the
/// primary's gravitational parameter and the body's own state.
#[derive(Debug, Clone)]
pub struct BodySet {
    pub bodies: Vec<Body>,
    pub names: Vec<String>,
    pub mu: f64,
}

impl BodySet {
    pub fn new(mu: f64) -> Self {
        Self { bodies: Vec::new(), names: Vec::new(), mu }
    }

    pub fn add(&mut self, body: Body, name: impl Into<String>) -> usize {
        self.bodies.push(body);
        self.names.push(name.into());
        self.bodies.len() - 1
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Advance every body by one semi-implicit Euler step.
    ///
    /// Accelerations are evaluated over an immutable snapshot of the
    /// pre-step positions before any body is mutated, so the result does
    /// not depend on iteration order. Velocity updates first, then the
    /// position update uses the new velocity.
    ///
    /// Never fails; non-finite states pass through untouched by design and
    /// the caller is responsible for finiteness checks.
    pub fn step(&mut self, dt: f64) {
        let mu = self.mu;
        let accels: Vec<Vector3<f64>> = self
            .bodies
            .par_iter()
            .map(|b| central_accel(&b.pos, mu))
            .collect();

        self.bodies
            .par_iter_mut()
            .zip(accels.par_iter())
            .for_each(|(b, a)| {
                b.vel += a * dt;
                b.pos += b.vel * dt;
            });
    }
}

/// Propagate a single body under central gravity for `tof` seconds.
///
/// Fixed internal step with a fractional tail step so the final state lands
/// exactly on `tof`.
pub fn propagate_body(body: &Body, tof: f64, dt: f64, mu: f64) -> Body {
    let mut b = *body;
    let mut t = 0.0;
    while t + dt < tof {
        step_single(&mut b, dt, mu);
        t += dt;
    }
    step_single(&mut b, (tof - t).max(0.0), mu);
    b
}

fn step_single(b: &mut Body, dt: f64, mu: f64) {
    let a = central_accel(&b.pos, mu);
    b.vel += a * dt;
    b.pos += b.vel * dt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::MU_EARTH;

    fn circular_body(r: f64) -> Body {
        let v = (MU_EARTH / r).sqrt();
        Body::new(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0), 1000.0)
    }

    #[test]
    fn energy_conserved_over_long_run() {
        let mut set = BodySet::new(MU_EARTH);
        set.add(circular_body(7000.0), "sat");
        let e0 = set.bodies[0].specific_energy(MU_EARTH);

        for _ in 0..10_000 {
            set.step(1.0);
        }
        let e1 = set.bodies[0].specific_energy(MU_EARTH);
        let drift = ((e1 - e0) / e0).abs();
        assert!(drift < 1e-6, "relative energy drift {drift:.3e}");
    }

    #[test]
    fn step_is_order_independent() {
        let mut fwd = BodySet::new(MU_EARTH);
        fwd.add(circular_body(7000.0), "a");
        fwd.add(circular_body(8000.0), "b");

        let mut rev = BodySet::new(MU_EARTH);
        rev.add(circular_body(8000.0), "b");
        rev.add(circular_body(7000.0), "a");

        fwd.step(10.0);
        rev.step(10.0);
        assert!((fwd.bodies[0].pos - rev.bodies[1].pos).norm() < 1e-12);
        assert!((fwd.bodies[1].pos - rev.bodies[0].pos).norm() < 1e-12);
    }

    #[test]
    fn propagate_body_full_revolution() {
        let r = 7000.0;
        let b0 = circular_body(r);
        let period = 2.0 * std::f64::consts::PI * (r.powi(3) / MU_EARTH).sqrt();
        let b1 = propagate_body(&b0, period, 1.0, MU_EARTH);
        // Semi-implicit Euler with dt=1 s closes the orbit to well under 1% of r
        assert!((b1.pos - b0.pos).norm() < 0.01 * r);
    }

    #[test]
    fn name_lookup() {
        let mut set = BodySet::new(MU_EARTH);
        set.add(Body::default(), "Ace");
        set.add(Body::default(), "Chat");
        assert_eq!(set.index_of("Chat"), Some(1));
        assert_eq!(set.index_of("missing"), None);
    }
}
