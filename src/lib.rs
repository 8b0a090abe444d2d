pub mod environment;
pub mod gnc;
pub mod io;
pub mod orbital;
pub mod physics;
pub mod sim;
pub mod vehicle;

pub use environment::Environment;
pub use physics::{Body, BodySet};
