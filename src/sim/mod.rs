pub mod runner;
pub mod scenario;

pub use runner::{run_sim, RunConfig, SpeedControl};
pub use scenario::{expand_scenario, load_scenario, parse_scenario, Scenario, ScenarioCfg, ScenarioError};
