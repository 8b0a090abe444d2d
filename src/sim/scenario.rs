use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use nalgebra::Vector3;
use thiserror::Error;

use crate::environment::lla_to_ecef;
use crate::io::tle::{load_tles, Tle};
use crate::orbital::Coe;
use crate::physics::body::{Body, MU_EARTH, OMEGA_EARTH};
use crate::physics::BodySet;
use crate::vehicle::{heavy_lift_stages, Stage};

// ---------------------------------------------------------------------------
// Scenario files: key-value text, one key per line
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to write scenario {path}: {source}")]
    Write { path: String, source: std::io::Error },
}

/// Global run settings.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioCfg {
    pub dt: f64,
    pub t_end: f64,
    pub output_rate_s: f64,
}

impl Default for ScenarioCfg {
    fn default() -> Self {
        Self { dt: 1.0, t_end: 3600.0, output_rate_s: 60.0 }
    }
}

/// A rocket entity waiting on the pad: launch state plus its stage list.
#[derive(Debug, Clone)]
pub struct RocketEntry {
    pub name: String,
    pub launch: Body,
    pub stages: Vec<Stage>,
}

/// Fully loaded scenario: settings, the orbiting body set, and any rockets.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub cfg: ScenarioCfg,
    pub satellites: BodySet,
    pub rockets: Vec<RocketEntry>,
}

#[derive(Debug, Clone, Default)]
struct EntityDraft {
    name: String,
    kind: String,
    coe: Coe,
    has_coe: bool,
    launch_lat_deg: f64,
    launch_lon_deg: f64,
    stages: Vec<Stage>,
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
    .trim()
}

fn parse_f64(tok: Option<&str>) -> Option<f64> {
    tok?.parse().ok()
}

fn warn_bad_value(warn: &mut dyn Write, lineno: usize, key: &str) {
    let _ = writeln!(warn, "scenario line {lineno}: bad value for '{key}', skipped");
}

/// Surface launch state on the rotating Earth: ECEF taken as ECI at t = 0,
/// co-rotation velocity v = omega x r.
pub fn launch_state(lat_deg: f64, lon_deg: f64) -> Body {
    let pos = lla_to_ecef(lat_deg, lon_deg, 0.0);
    let vel = Vector3::new(-OMEGA_EARTH * pos.y, OMEGA_EARTH * pos.x, 0.0);
    Body::new(pos, vel, 0.0)
}

/// Parse scenario text. Malformed lines are reported with their line number
/// on `warn` and skipped; parsing always continues. TLE references come back
/// as paths for the caller to resolve.
pub fn parse_scenario(text: &str, warn: &mut dyn Write) -> (Scenario, Vec<String>) {
    let mut cfg = ScenarioCfg::default();
    let mut drafts: Vec<EntityDraft> = Vec::new();
    let mut cur: Option<EntityDraft> = None;
    let mut tle_paths = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = strip_comment(raw);
        if line.is_empty() {
            continue;
        }
        let mut toks = line.split_whitespace();
        let key = match toks.next() {
            Some(k) => k,
            None => continue,
        };
        let lineno = idx + 1;

        match key {
            "duration_seconds" => match parse_f64(toks.next()) {
                Some(v) => cfg.t_end = v,
                None => warn_bad_value(warn, lineno, key),
            },
            "timestep_seconds" => match parse_f64(toks.next()) {
                Some(v) => cfg.dt = v,
                None => warn_bad_value(warn, lineno, key),
            },
            "output_rate_seconds" => match parse_f64(toks.next()) {
                Some(v) => cfg.output_rate_s = v,
                None => warn_bad_value(warn, lineno, key),
            },
            "entity" => {
                if let Some(done) = cur.take() {
                    drafts.push(done);
                }
                match toks.next() {
                    Some(name) => {
                        cur = Some(EntityDraft { name: name.to_string(), ..Default::default() })
                    }
                    None => warn_bad_value(warn, lineno, key),
                }
            }
            "tle_file" => match toks.next() {
                Some(p) => tle_paths.push(p.to_string()),
                None => warn_bad_value(warn, lineno, key),
            },
            _ => {
                let Some(ent) = cur.as_mut() else {
                    let _ = writeln!(warn, "scenario line {lineno}: '{key}' outside entity, skipped");
                    continue;
                };
                match key {
                    "type" => match toks.next() {
                        Some(t) => ent.kind = t.to_string(),
                        None => warn_bad_value(warn, lineno, key),
                    },
                    "coe" => ent.has_coe = true,
                    "a_km" => match parse_f64(toks.next()) {
                        Some(v) => ent.coe.a = v,
                        None => warn_bad_value(warn, lineno, key),
                    },
                    "e" => match parse_f64(toks.next()) {
                        Some(v) => ent.coe.e = v,
                        None => warn_bad_value(warn, lineno, key),
                    },
                    "i_deg" => match parse_f64(toks.next()) {
                        Some(v) => ent.coe.i = v.to_radians(),
                        None => warn_bad_value(warn, lineno, key),
                    },
                    "raan_deg" => match parse_f64(toks.next()) {
                        Some(v) => ent.coe.raan = v.to_radians(),
                        None => warn_bad_value(warn, lineno, key),
                    },
                    "argp_deg" => match parse_f64(toks.next()) {
                        Some(v) => ent.coe.argp = v.to_radians(),
                        None => warn_bad_value(warn, lineno, key),
                    },
                    "ta_deg" => match parse_f64(toks.next()) {
                        Some(v) => ent.coe.ta = v.to_radians(),
                        None => warn_bad_value(warn, lineno, key),
                    },
                    "launch_lat" => match parse_f64(toks.next()) {
                        Some(v) => ent.launch_lat_deg = v,
                        None => warn_bad_value(warn, lineno, key),
                    },
                    "launch_lon" => match parse_f64(toks.next()) {
                        Some(v) => ent.launch_lon_deg = v,
                        None => warn_bad_value(warn, lineno, key),
                    },
                    "stage" => {
                        let vals: Vec<Option<f64>> =
                            (0..4).map(|_| parse_f64(toks.next())).collect();
                        match (vals[0], vals[1], vals[2], vals[3]) {
                            (Some(thrust), Some(isp), Some(fuel), Some(dry)) => {
                                ent.stages.push(Stage {
                                    thrust,
                                    isp,
                                    fuel_mass: fuel,
                                    dry_mass: dry,
                                });
                            }
                            _ => warn_bad_value(warn, lineno, key),
                        }
                    }
                    _ => {
                        let _ = writeln!(warn, "scenario line {lineno}: unknown key '{key}', skipped");
                    }
                }
            }
        }
    }
    if let Some(done) = cur.take() {
        drafts.push(done);
    }

    let mut satellites = BodySet::new(MU_EARTH);
    let mut rockets = Vec::new();
    for ent in drafts {
        match ent.kind.as_str() {
            "satellite" if ent.has_coe => {
                satellites.add(ent.coe.to_body_earth(), ent.name);
            }
            "rocket" => {
                let stages = if ent.stages.is_empty() {
                    heavy_lift_stages()
                } else {
                    ent.stages
                };
                rockets.push(RocketEntry {
                    name: ent.name,
                    launch: launch_state(ent.launch_lat_deg, ent.launch_lon_deg),
                    stages,
                });
            }
            other => {
                let _ = writeln!(
                    warn,
                    "entity '{}' has unusable type '{other}' or missing elements, skipped",
                    ent.name
                );
            }
        }
    }

    (Scenario { cfg, satellites, rockets }, tle_paths)
}

/// Load a scenario file, resolving `tle_file` references into satellite
/// entities. TLE files that fail to load are reported and skipped.
pub fn load_scenario(path: impl AsRef<Path>, warn: &mut dyn Write) -> Result<Scenario, ScenarioError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let (mut scenario, tle_paths) = parse_scenario(&text, warn);

    for p in tle_paths {
        match load_tles(&p) {
            Ok(tles) => {
                for t in tles {
                    let body = t.to_body(MU_EARTH);
                    scenario.satellites.add(body, t.name.clone());
                }
            }
            Err(e) => {
                let _ = writeln!(warn, "tle_file {p}: {e}, skipped");
            }
        }
    }
    Ok(scenario)
}

// ---------------------------------------------------------------------------
// Scenario expansion: inline TLE references as entity blocks
// ---------------------------------------------------------------------------

fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_us = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_us = false;
        } else if ch.is_whitespace() || ch == '-' || ch == '.' {
            if !last_us {
                out.push('_');
            }
            last_us = true;
        }
        // anything else is dropped
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "TLE_SAT".to_string()
    } else {
        trimmed.to_string()
    }
}

fn make_unique(used: &mut HashSet<String>, base: String) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    for i in 2.. {
        let candidate = format!("{base}_{i}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
    }
    unreachable!()
}

fn tle_entity_block(name: &str, tle: &Tle) -> String {
    let c = tle.to_coe(MU_EARTH);
    format!(
        "\nentity {name}\ntype satellite\ncoe\na_km {}\ne {}\ni_deg {}\nraan_deg {}\nargp_deg {}\nta_deg {}\n",
        c.a,
        c.e,
        c.i.to_degrees(),
        c.raan.to_degrees(),
        c.argp.to_degrees(),
        c.ta.to_degrees(),
    )
}

/// Rewrite a scenario with every `tle_file` reference replaced by generated
/// satellite entity blocks. Entity names are sanitized and de-duplicated
/// against the names already present.
pub fn expand_scenario(
    in_path: impl AsRef<Path>,
    out_path: impl AsRef<Path>,
    warn: &mut dyn Write,
) -> Result<usize, ScenarioError> {
    let in_path = in_path.as_ref();
    let text = fs::read_to_string(in_path).map_err(|source| ScenarioError::Read {
        path: in_path.display().to_string(),
        source,
    })?;

    let mut kept = String::new();
    let mut used = HashSet::new();
    let mut tles = Vec::new();

    for raw in text.lines() {
        let line = strip_comment(raw);
        let mut toks = line.split_whitespace();
        match toks.next() {
            Some("tle_file") => {
                if let Some(p) = toks.next() {
                    match load_tles(p) {
                        Ok(mut loaded) => tles.append(&mut loaded),
                        Err(e) => {
                            let _ = writeln!(warn, "tle_file {p}: {e}, skipped");
                        }
                    }
                }
                // the reference line itself is replaced, not kept
            }
            Some("entity") => {
                if let Some(name) = toks.next() {
                    used.insert(name.to_string());
                }
                kept.push_str(raw);
                kept.push('\n');
            }
            _ => {
                kept.push_str(raw);
                kept.push('\n');
            }
        }
    }

    let mut out = kept;
    if !tles.is_empty() {
        out.push_str(&format!("\n# --- Expanded TLE entities ({}) ---\n", tles.len()));
    }
    let count = tles.len();
    for t in &tles {
        let name = make_unique(&mut used, sanitize_name(&t.name));
        out.push_str(&tle_entity_block(&name, t));
    }

    let out_path = out_path.as_ref();
    fs::write(out_path, out).map_err(|source| ScenarioError::Write {
        path: out_path.display().to_string(),
        source,
    })?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const BASIC: &str = "\
duration_seconds 7200
timestep_seconds 0.5
output_rate_seconds 30

entity Ace
type satellite
coe
a_km 7000
e 0.001
i_deg 51.6
raan_deg 40
argp_deg 10
ta_deg 0

entity Booster
type rocket
launch_lat 28.5
launch_lon -80.6
stage 7.6e6 263 395000 25600
stage 9.34e5 421 92670 4000
";

    #[test]
    fn parses_settings_and_entities() {
        let mut warn = Vec::new();
        let (s, tle_paths) = parse_scenario(BASIC, &mut warn);
        assert!(tle_paths.is_empty());
        assert_eq!(s.cfg.t_end, 7200.0);
        assert_eq!(s.cfg.dt, 0.5);
        assert_eq!(s.cfg.output_rate_s, 30.0);
        assert_eq!(s.satellites.len(), 1);
        assert_eq!(s.satellites.names[0], "Ace");
        assert_eq!(s.rockets.len(), 1);
        assert_eq!(s.rockets[0].stages.len(), 2);
        assert!(warn.is_empty(), "{}", String::from_utf8_lossy(&warn));
    }

    #[test]
    fn rocket_spawns_co_rotating_on_the_surface() {
        let mut warn = Vec::new();
        let (s, _) = parse_scenario(BASIC, &mut warn);
        let launch = &s.rockets[0].launch;
        assert_relative_eq!(launch.pos.norm(), crate::physics::body::R_EARTH_EQ, epsilon = 1e-9);
        // Eastward co-rotation: v = omega x r, horizontal
        let expected_speed = OMEGA_EARTH * launch.pos.xy().norm();
        assert_relative_eq!(launch.vel.norm(), expected_speed, epsilon = 1e-12);
        assert!(launch.vel.dot(&launch.pos).abs() < 1e-9);
    }

    #[test]
    fn rocket_without_stage_lines_gets_default_stack() {
        let text = "entity R\ntype rocket\nlaunch_lat 0\nlaunch_lon 0\n";
        let mut warn = Vec::new();
        let (s, _) = parse_scenario(text, &mut warn);
        assert_eq!(s.rockets[0].stages.len(), heavy_lift_stages().len());
    }

    #[test]
    fn malformed_lines_warn_and_are_skipped() {
        let text = "\
duration_seconds banana
entity Sat
type satellite
coe
a_km 7000
e not_a_number
i_deg 10
";
        let mut warn = Vec::new();
        let (s, _) = parse_scenario(text, &mut warn);
        let warnings = String::from_utf8(warn).unwrap();
        assert!(warnings.contains("line 1"));
        assert!(warnings.contains("line 6"));
        // Entity still loads with the surviving fields
        assert_eq!(s.satellites.len(), 1);
        assert_eq!(s.cfg.t_end, ScenarioCfg::default().t_end);
    }

    #[test]
    fn satellite_without_coe_is_dropped() {
        let text = "entity Ghost\ntype satellite\na_km 7000\n";
        let mut warn = Vec::new();
        let (s, _) = parse_scenario(text, &mut warn);
        assert_eq!(s.satellites.len(), 0);
        assert!(String::from_utf8(warn).unwrap().contains("Ghost"));
    }

    #[test]
    fn name_sanitizer_collapses_and_trims() {
        assert_eq!(sanitize_name("ISS (ZARYA)"), "ISS_ZARYA");
        assert_eq!(sanitize_name("COSMOS 2251 DEB"), "COSMOS_2251_DEB");
        assert_eq!(sanitize_name("***"), "TLE_SAT");
        assert_eq!(sanitize_name("A--B..C"), "A_B_C");
    }

    #[test]
    fn unique_names_get_numeric_suffixes() {
        let mut used = HashSet::new();
        assert_eq!(make_unique(&mut used, "SAT".into()), "SAT");
        assert_eq!(make_unique(&mut used, "SAT".into()), "SAT_2");
        assert_eq!(make_unique(&mut used, "SAT".into()), "SAT_3");
    }
}
