use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::environment::{ecef_lon_deg, local_solar_time_hours, Environment};
use crate::gnc::{GuidanceParams, TargetTrack};
use crate::io::StateWriter;
use crate::physics::vecmath::angle_between_deg;
use crate::vehicle::Rocket;

use super::scenario::Scenario;

// ---------------------------------------------------------------------------
// Tick loop with pacing, reporting, and CSV output
// ---------------------------------------------------------------------------

/// Shared speed multiplier for a running simulation.
///
/// Stored as f64 bits in an atomic; writers race benignly (last write wins)
/// and the loop polls the value once per tick. Pacing only: the physics is
/// unaffected by the speed setting.
#[derive(Debug, Clone)]
pub struct SpeedControl(Arc<AtomicU64>);

impl SpeedControl {
    pub fn new(speed: f64) -> Self {
        Self(Arc::new(AtomicU64::new(speed.to_bits())))
    }

    pub fn set(&self, speed: f64) {
        self.0.store(speed.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Runner knobs independent of the scenario file.
pub struct RunConfig {
    /// Sleep toward wall-clock deadlines derived from dt / speed.
    pub pace_real_time: bool,
    /// Wall-clock heartbeat interval.
    pub heartbeat: Duration,
    /// Sim-time interval between text reports.
    pub report_every_s: f64,
    /// Julian date at t = 0.
    pub jd_epoch: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pace_real_time: true,
            heartbeat: Duration::from_secs(10),
            report_every_s: 3600.0,
            jd_epoch: 2_451_545.0,
        }
    }
}

const REPORT_SITES: [&str; 2] = ["WashingtonDC", "LosAngeles"];

fn report<W: Write>(
    out: &mut W,
    t: f64,
    jd: f64,
    scenario: &Scenario,
    env: &Environment,
) -> std::io::Result<()> {
    let sats = &scenario.satellites;
    if sats.is_empty() {
        return Ok(());
    }

    // First entity: range and off-nadir angle to the named ground sites
    let lead = &sats.bodies[0];
    let lead_name = &sats.names[0];
    write!(out, "t {t}")?;
    for site in REPORT_SITES {
        if let Some(site_body) = env.get(site) {
            let to_site = site_body.pos - lead.pos;
            let angle = angle_between_deg(&lead.pos, &to_site);
            write!(out, " {lead_name}_{site}_deg {angle:.6} {lead_name}_{site}_km {:.6}", to_site.norm())?;
        }
    }
    writeln!(out)?;

    // Second entity (the LEO track): closest city and its local solar time
    if sats.len() > 1 {
        let leo = &sats.bodies[1];
        if let Some((city, dist)) = env.closest_site(&leo.pos) {
            let lon = env
                .get(city)
                .map(|b| ecef_lon_deg(&b.pos))
                .unwrap_or(0.0);
            let lst = local_solar_time_hours(lon, jd);
            writeln!(out, "t {t} LeoClosest {city} dist_km {dist:.6} LST {lst:.6}")?;
        }
    }
    Ok(())
}

/// Run a scenario to completion.
///
/// Per tick: poll the speed control, advance the satellite set, step every
/// live rocket against the first satellite's track, emit the CSV snapshot at
/// the output rate, and write the periodic text report. A rocket that goes
/// non-finite is reported once and never stepped again.
pub fn run_sim<W: Write, C: Write>(
    scenario: &mut Scenario,
    env: &Environment,
    speed: &SpeedControl,
    config: &RunConfig,
    out: &mut W,
    mut csv: Option<&mut StateWriter<C>>,
) -> std::io::Result<()> {
    let dt = scenario.cfg.dt;
    let t_end = scenario.cfg.t_end;
    let guidance = GuidanceParams::default();

    let mut rockets: Vec<Rocket> = scenario
        .rockets
        .iter()
        .map(|r| Rocket::new(r.stages.clone(), &r.launch))
        .collect();
    let mut dead_reported = vec![false; rockets.len()];

    let mut sim_t = 0.0;
    let mut jd = config.jd_epoch;
    let mut next_report = 0.0;

    let t0 = Instant::now();
    let mut next_hb = t0;
    let mut next_step = t0;

    while sim_t <= t_end {
        let speed_now = {
            let s = speed.get();
            if s > 0.0 { s } else { 1.0 }
        };

        scenario.satellites.step(dt);
        let track = scenario.satellites.bodies.first().map(|b| TargetTrack {
            pos: b.pos,
            vel: b.vel,
        });

        for (i, rocket) in rockets.iter_mut().enumerate() {
            if rocket.is_dead() {
                if !dead_reported[i] {
                    dead_reported[i] = true;
                    writeln!(out, "t {sim_t} rocket {} dead", scenario.rockets[i].name)?;
                }
                continue;
            }
            rocket.step(dt, scenario.satellites.mu, track.as_ref(), &guidance);
        }

        sim_t += dt;
        jd += dt / 86_400.0;

        if let Some(w) = csv.as_deref_mut() {
            w.tick(sim_t, &scenario.satellites)
                .map_err(std::io::Error::other)?;
        }

        if sim_t + 1e-9 >= next_report {
            report(out, sim_t, jd, scenario, env)?;
            out.flush()?;
            next_report += config.report_every_s;
        }

        let now = Instant::now();
        if now >= next_hb {
            let wall_s = now.duration_since(t0).as_secs_f64();
            writeln!(out, "heartbeat wall_s {wall_s:.3} sim_s {sim_t} speed {speed_now}")?;
            out.flush()?;
            next_hb = now + config.heartbeat;
        }

        if config.pace_real_time {
            next_step += Duration::from_secs_f64(dt / speed_now);
            let now = Instant::now();
            if next_step > now {
                std::thread::sleep(next_step - now);
            }
        }
    }
    Ok(())
}
