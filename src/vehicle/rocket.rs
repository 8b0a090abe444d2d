use nalgebra::Vector3;

use crate::gnc::guidance::{steer, GuidanceParams, TargetTrack};
use crate::physics::atmosphere::air_density;
use crate::physics::body::{Body, G0, R_EARTH};
use crate::physics::gravity::central_accel;

use super::stage::Stage;

// ---------------------------------------------------------------------------
// Staged rocket dynamics
// ---------------------------------------------------------------------------

/// Translational rocket state, km / km/s / kg. Mass is the sum of the
/// remaining stage masses.
#[derive(Debug, Clone, Copy)]
pub struct RocketState {
    pub pos: Vector3<f64>,
    pub vel: Vector3<f64>,
    pub mass: f64,
}

impl RocketState {
    pub fn is_finite(&self) -> bool {
        self.pos.iter().chain(self.vel.iter()).all(|c| c.is_finite()) && self.mass.is_finite()
    }
}

/// Drag reference Cd*A, m^2. Single bluff-body value for the whole stack.
const DRAG_REF_M2: f64 = 5.0;

/// A vehicle with an ordered stage list, advanced one tick at a time.
///
/// State machine over the active stage index: powered while fuel for the
/// current stage remains, then a one-tick separation event drops the spent
/// dry mass and advances; past the last stage (or after a forced cutoff)
/// the vehicle coasts under gravity and drag only.
#[derive(Debug, Clone)]
pub struct Rocket {
    stages: Vec<Stage>,  // running copies; fuel depletes
    cur: usize,
    sep: bool,
    cutoff: bool,
    ground_r: f64,
    state: RocketState,
}

impl Rocket {
    /// Build a vehicle from stage templates at an initial body state.
    /// The body's own mass is ignored; total mass comes from the stages.
    /// The spawn radius (floored at the mean Earth radius) becomes the
    /// ground-clamp surface.
    pub fn new(stages: Vec<Stage>, initial: &Body) -> Self {
        let mass = stages.iter().map(Stage::total_mass).sum();
        Self {
            stages,
            cur: 0,
            sep: false,
            cutoff: false,
            ground_r: initial.pos.norm().max(R_EARTH),
            state: RocketState { pos: initial.pos, vel: initial.vel, mass },
        }
    }

    /// Mass of the stages still attached, kg. Summed fresh so burnout lands
    /// on exactly zero instead of a floating-point residual.
    fn stack_mass(&self) -> f64 {
        self.stages[self.cur..].iter().map(Stage::total_mass).sum()
    }

    pub fn state(&self) -> RocketState {
        self.state
    }

    /// Current state as a massless-compatible Body (for element conversion
    /// and reporting).
    pub fn as_body(&self) -> Body {
        Body::new(self.state.pos, self.state.vel, self.state.mass)
    }

    /// True while a stage is burning (no cutoff, fuel available).
    pub fn powered(&self) -> bool {
        !self.cutoff && self.cur < self.stages.len()
    }

    pub fn coasting(&self) -> bool {
        !self.powered()
    }

    /// One-shot separation flag for the tick just advanced.
    pub fn stage_sep(&self) -> bool {
        self.sep
    }

    pub fn active_stage(&self) -> usize {
        self.cur
    }

    /// Permanently disable thrust; the vehicle coasts from here on.
    pub fn cut_thrust(&mut self) {
        self.cutoff = true;
    }

    /// Fatal per-vehicle condition: any non-finite state component.
    /// The driving loop must stop advancing a dead vehicle.
    pub fn is_dead(&self) -> bool {
        !self.state.is_finite()
    }

    /// Advance one tick of dt seconds.
    pub fn step(
        &mut self,
        dt: f64,
        mu: f64,
        target: Option<&TargetTrack>,
        guidance: &GuidanceParams,
    ) {
        self.sep = false;
        if self.is_dead() {
            return;
        }

        let mut accel = central_accel(&self.state.pos, mu);

        // Drag (exponential atmosphere, force in N, state in km). A fully
        // burned-out stack has zero mass and takes no drag acceleration.
        let speed_kms = self.state.vel.norm();
        if speed_kms > 0.0 && self.state.mass > 0.0 {
            let alt_m = (self.state.pos.norm() - R_EARTH) * 1000.0;
            let rho = air_density(alt_m);
            let speed_ms = speed_kms * 1000.0;
            let drag_n = 0.5 * rho * speed_ms * speed_ms * DRAG_REF_M2;
            accel -= self.state.vel / speed_kms * (drag_n / self.state.mass / 1000.0);
        }

        if self.powered() {
            let thrust_n = self.stages[self.cur].thrust * guidance.thrust_scale;
            let isp = self.stages[self.cur].isp;

            // Fuel draw, capped at what the stage still holds
            let mdot = thrust_n / (isp * G0);
            let dm = (mdot * dt).min(self.stages[self.cur].fuel_mass);
            self.stages[self.cur].fuel_mass -= dm;
            self.state.mass = self.stack_mass();

            if self.state.mass > 0.0 {
                let dir = steer(&self.state.pos, &self.state.vel, target, guidance);
                accel += dir * (thrust_n / self.state.mass / 1000.0);
            }
        }

        // Semi-implicit Euler
        self.state.vel += accel * dt;
        self.state.pos += self.state.vel * dt;

        // Ground: clamp to the spawn-radius surface, kill inward radial
        // velocity, no rebound
        let r = self.state.pos.norm();
        if r < self.ground_r && r > 0.0 {
            self.state.pos *= self.ground_r / r;
            let radial = self.state.pos / self.ground_r;
            let v_r = self.state.vel.dot(&radial);
            if v_r < 0.0 {
                self.state.vel -= radial * v_r;
            }
        }

        // Stage separation: drop the spent dry mass, advance
        if self.powered() && self.stages[self.cur].fuel_mass <= 0.0 {
            self.cur += 1;
            self.sep = true;
            self.state.mass = self.stack_mass();
        }
    }
}
