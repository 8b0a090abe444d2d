use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nalgebra::Vector3;

use orbit_sim::environment::Environment;
use orbit_sim::gnc::{fly_plan, plan, PlannerConfig};
use orbit_sim::io::StateWriter;
use orbit_sim::orbital::{intercept, Coe};
use orbit_sim::physics::body::{MU_EARTH, R_EARTH};
use orbit_sim::physics::Body;
use orbit_sim::sim::{expand_scenario, load_scenario, run_sim, RunConfig, SpeedControl};
use orbit_sim::vehicle::heavy_lift_stages;

#[derive(Parser)]
#[command(name = "orbit-sim", about = "Earth-orbit simulation and targeting toolkit", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scenario file to completion
    Run {
        /// Scenario file path
        scenario: PathBuf,
        /// Simulation speed multiplier (pacing only)
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Write the per-tick state table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write text reports here instead of stdout
        #[arg(long)]
        report: Option<PathBuf>,
        /// Run as fast as possible instead of pacing to wall clock
        #[arg(long)]
        no_pace: bool,
    },
    /// Plan and fly a rocket ascent toward a circular target orbit
    Rocket {
        /// Target circular orbit radius, km
        #[arg(long, default_value_t = 7000.0)]
        target_radius_km: f64,
        /// Launch latitude, degrees
        #[arg(long, default_value_t = 28.5)]
        lat: f64,
        /// Launch longitude, degrees
        #[arg(long, default_value_t = -80.6)]
        lon: f64,
        /// Final-run timestep, seconds
        #[arg(long, default_value_t = 1.0)]
        dt: f64,
        /// Final-run horizon, seconds
        #[arg(long, default_value_t = 6000.0)]
        horizon_s: f64,
    },
    /// Solve a transfer between two circular-orbit radii
    Lambert {
        /// Departure radius, km
        #[arg(long, default_value_t = 7000.0)]
        r1_km: f64,
        /// Arrival radius, km (quarter turn ahead)
        #[arg(long, default_value_t = 8000.0)]
        r2_km: f64,
        /// Time of flight, seconds
        #[arg(long, default_value_t = 1200.0)]
        tof_s: f64,
        /// Extra full revolutions to solve for
        #[arg(long, default_value_t = 0)]
        max_rev: i32,
    },
    /// Rewrite a scenario with tle_file references expanded into entities
    Expand {
        /// Input scenario path
        input: PathBuf,
        /// Output scenario path
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run { scenario, speed, csv, report, no_pace } => {
            cmd_run(&scenario, speed, csv.as_deref(), report.as_deref(), no_pace)
        }
        Command::Rocket { target_radius_km, lat, lon, dt, horizon_s } => {
            cmd_rocket(target_radius_km, lat, lon, dt, horizon_s)
        }
        Command::Lambert { r1_km, r2_km, tof_s, max_rev } => {
            cmd_lambert(r1_km, r2_km, tof_s, max_rev);
            Ok(())
        }
        Command::Expand { input, output } => {
            let mut warn = std::io::stderr();
            let count = expand_scenario(&input, &output, &mut warn)?;
            println!("expanded {count} TLE entities into {}", output.display());
            Ok(())
        }
    }
}

fn cmd_run(
    scenario_path: &std::path::Path,
    speed: f64,
    csv: Option<&std::path::Path>,
    report: Option<&std::path::Path>,
    no_pace: bool,
) -> Result<()> {
    let mut warn = std::io::stderr();
    let mut scenario = load_scenario(scenario_path, &mut warn)?;
    let env = Environment::standard();
    let control = SpeedControl::new(speed);
    let config = RunConfig { pace_real_time: !no_pace, ..RunConfig::default() };

    println!("====================================================================");
    println!("  SCENARIO RUN — {}", scenario_path.display());
    println!("====================================================================");
    println!(
        "  {} satellites, {} rockets, dt {} s, duration {} s",
        scenario.satellites.len(),
        scenario.rockets.len(),
        scenario.cfg.dt,
        scenario.cfg.t_end
    );

    let mut out: Box<dyn Write> = match report {
        Some(p) => Box::new(File::create(p).with_context(|| format!("create {}", p.display()))?),
        None => Box::new(std::io::stdout()),
    };

    match csv {
        Some(p) => {
            let mut writer = StateWriter::create(p, scenario.cfg.output_rate_s)
                .with_context(|| format!("create {}", p.display()))?;
            run_sim(&mut scenario, &env, &control, &config, &mut out, Some(&mut writer))?;
        }
        None => {
            run_sim(
                &mut scenario,
                &env,
                &control,
                &config,
                &mut out,
                None::<&mut StateWriter<File>>,
            )?;
        }
    }
    Ok(())
}

fn cmd_rocket(target_radius_km: f64, lat: f64, lon: f64, dt: f64, horizon_s: f64) -> Result<()> {
    let stages = heavy_lift_stages();
    let launch = orbit_sim::sim::scenario::launch_state(lat, lon);
    let target = Coe::circular(target_radius_km, 51.6_f64.to_radians()).to_body(MU_EARTH);

    println!("====================================================================");
    println!("  ASCENT PLAN — target orbit radius {target_radius_km:.0} km");
    println!("====================================================================");

    let config = PlannerConfig::default();
    let best = plan(&stages, &launch, &target, &config, MU_EARTH);
    println!();
    println!("  Grid search ({0} x {0} cells)", config.grid_points);
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Thrust scale:  {:>8.3}", best.thrust_scale);
    println!("  Lead time:     {:>8.1} s", best.lead_time_s);
    println!("  Miss:          {:>8.1} km at t = {:.0} s", best.miss_km, best.t_closest_s);
    println!("  Cost:          {:>8.1}", best.cost);

    let (miss, t_ca) = fly_plan(&stages, &launch, &target, &best, dt, horizon_s, MU_EARTH);
    println!();
    println!("  Full-fidelity run (dt {dt} s, horizon {horizon_s} s)");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Closest approach: {miss:.1} km at t = {t_ca:.0} s");
    Ok(())
}

fn cmd_lambert(r1_km: f64, r2_km: f64, tof_s: f64, max_rev: i32) {
    let r1 = Vector3::new(r1_km, 0.0, 0.0);
    let r2 = Vector3::new(0.0, r2_km, 0.0);
    let v_circ1 = (MU_EARTH / r1_km).sqrt();

    println!("====================================================================");
    println!("  LAMBERT TRANSFER — {r1_km:.0} km -> {r2_km:.0} km in {tof_s:.0} s");
    println!("====================================================================");

    let sols = intercept(&r1, &r2, tof_s, MU_EARTH, max_rev);
    for (k, s) in sols.iter().enumerate() {
        println!();
        println!("  Solution k = {k}");
        println!("  ──────────────────────────────────────────────────────────────────");
        if !s.is_finite() || s.v1 == Vector3::zeros() {
            println!("  no valid geometry for this revolution count");
            continue;
        }
        println!("  v1: [{:>9.4} {:>9.4} {:>9.4}] km/s", s.v1.x, s.v1.y, s.v1.z);
        println!("  v2: [{:>9.4} {:>9.4} {:>9.4}] km/s", s.v2.x, s.v2.y, s.v2.z);
        let dv = (s.v1 - Vector3::new(0.0, v_circ1, 0.0)).norm();
        println!("  departure dv from circular: {dv:.4} km/s");

        let b = Body::new(r1, s.v1, 0.0);
        let coe = Coe::from_body_earth(&b);
        println!(
            "  transfer orbit: a = {:.1} km, e = {:.4}, perigee alt = {:.1} km",
            coe.a,
            coe.e,
            coe.a * (1.0 - coe.e) - R_EARTH
        );
    }
}
