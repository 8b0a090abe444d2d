pub mod guidance;
pub mod planner;

pub use guidance::{steer, GuidanceParams, TargetTrack};
pub use planner::{fly_plan, plan, PlanResult, PlannerConfig};
