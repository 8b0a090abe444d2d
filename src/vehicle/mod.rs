pub mod rocket;
pub mod stage;

pub use rocket::{Rocket, RocketState};
pub use stage::{heavy_lift_stages, Stage, StageBuilder};
