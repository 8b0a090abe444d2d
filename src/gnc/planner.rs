use crate::orbital::Coe;
use crate::physics::body::Body;
use crate::physics::gravity::central_accel;
use crate::vehicle::{Rocket, Stage};

use super::guidance::{GuidanceParams, TargetTrack};

// ---------------------------------------------------------------------------
// Launch planner: coarse grid search over guidance knobs
// ---------------------------------------------------------------------------

/// Search space and scoring for the ascent plan.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Grid points per axis.
    pub grid_points: usize,
    /// Thrust multiplier range searched, inclusive.
    pub thrust_scale_range: (f64, f64),
    /// Lead-time range searched, seconds, inclusive.
    pub lead_time_range_s: (f64, f64),
    /// Timestep for the abbreviated search runs, seconds.
    pub coarse_dt_s: f64,
    /// Horizon for each search run, seconds.
    pub horizon_s: f64,
    /// Preferred time of closest approach, seconds after launch.
    pub desired_tca_s: f64,
    /// Cost per second of closest-approach timing error, km/s.
    pub tca_weight: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            grid_points: 5,
            thrust_scale_range: (0.8, 1.2),
            lead_time_range_s: (0.0, 600.0),
            coarse_dt_s: 4.0,
            horizon_s: 6_000.0,
            desired_tca_s: 14_400.0,
            tca_weight: 0.05,
        }
    }
}

/// Best grid cell found by `plan`.
#[derive(Debug, Clone, Copy)]
pub struct PlanResult {
    pub thrust_scale: f64,
    pub lead_time_s: f64,
    pub miss_km: f64,
    pub t_closest_s: f64,
    pub cost: f64,
}

fn axis_value(range: (f64, f64), idx: usize, points: usize) -> f64 {
    if points <= 1 {
        return range.0;
    }
    range.0 + (range.1 - range.0) * idx as f64 / (points - 1) as f64
}

/// Two-body step for the target track, matching the rocket's integrator.
fn step_target(target: &mut Body, dt: f64, mu: f64) {
    let a = central_accel(&target.pos, mu);
    target.vel += a * dt;
    target.pos += target.vel * dt;
}

/// Fly one run and record the closest approach to the target.
///
/// With `monitor_cutoff` set, thrust is forced off as soon as the vehicle's
/// osculating apogee reaches the target's current radius; the search runs
/// leave it off and let the cell's miss distance speak for itself.
fn fly(
    rocket: &mut Rocket,
    target: &mut Body,
    guidance: &GuidanceParams,
    dt: f64,
    horizon_s: f64,
    mu: f64,
    monitor_cutoff: bool,
) -> (f64, f64) {
    let mut miss_km = f64::INFINITY;
    let mut t_closest = 0.0;
    let mut t = 0.0;
    while t < horizon_s {
        let track = TargetTrack { pos: target.pos, vel: target.vel };
        rocket.step(dt, mu, Some(&track), guidance);
        step_target(target, dt, mu);
        t += dt;

        if rocket.is_dead() {
            break;
        }
        let d = (rocket.state().pos - target.pos).norm();
        if d < miss_km {
            miss_km = d;
            t_closest = t;
        }

        if monitor_cutoff && rocket.powered() {
            let coe = Coe::from_body(&rocket.as_body(), mu);
            if coe.a > 0.0 && coe.a * (1.0 + coe.e) >= target.pos.norm() {
                rocket.cut_thrust();
            }
        }
    }
    (miss_km, t_closest)
}

/// Grid search over (thrust_scale, lead_time). Each cell is an abbreviated
/// run at coarse dt; cost is the closest-approach miss plus a penalty on
/// closest-approach timing error. Cells where the vehicle goes non-finite
/// score infinite cost and lose to any surviving cell.
pub fn plan(
    stages: &[Stage],
    launch_state: &Body,
    target: &Body,
    config: &PlannerConfig,
    mu: f64,
) -> PlanResult {
    let mut best = PlanResult {
        thrust_scale: config.thrust_scale_range.0,
        lead_time_s: config.lead_time_range_s.0,
        miss_km: f64::INFINITY,
        t_closest_s: 0.0,
        cost: f64::INFINITY,
    };

    for i in 0..config.grid_points {
        for j in 0..config.grid_points {
            let guidance = GuidanceParams {
                thrust_scale: axis_value(config.thrust_scale_range, i, config.grid_points),
                lead_time_s: axis_value(config.lead_time_range_s, j, config.grid_points),
                ..GuidanceParams::default()
            };

            let mut rocket = Rocket::new(stages.to_vec(), launch_state);
            let mut tgt = target.clone();
            let (miss_km, t_closest_s) = fly(
                &mut rocket,
                &mut tgt,
                &guidance,
                config.coarse_dt_s,
                config.horizon_s,
                mu,
                false,
            );

            let cost = if miss_km.is_finite() {
                miss_km + config.tca_weight * (t_closest_s - config.desired_tca_s).abs()
            } else {
                f64::INFINITY
            };

            if cost < best.cost {
                best = PlanResult {
                    thrust_scale: guidance.thrust_scale,
                    lead_time_s: guidance.lead_time_s,
                    miss_km,
                    t_closest_s,
                    cost,
                };
            }
        }
    }

    best
}

/// Fly the chosen plan at full fidelity with the apogee cutoff monitor armed.
/// Returns the achieved (miss_km, t_closest_s).
pub fn fly_plan(
    stages: &[Stage],
    launch_state: &Body,
    target: &Body,
    result: &PlanResult,
    dt: f64,
    horizon_s: f64,
    mu: f64,
) -> (f64, f64) {
    let guidance = GuidanceParams {
        thrust_scale: result.thrust_scale,
        lead_time_s: result.lead_time_s,
        ..GuidanceParams::default()
    };
    let mut rocket = Rocket::new(stages.to_vec(), launch_state);
    let mut tgt = target.clone();
    fly(&mut rocket, &mut tgt, &guidance, dt, horizon_s, mu, true)
}
