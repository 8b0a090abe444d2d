pub mod atmosphere;
pub mod body;
pub mod gravity;
pub mod propagator;
pub mod vecmath;

pub use body::{Body, G0, MU_EARTH, OMEGA_EARTH, R_EARTH, R_EARTH_EQ};
pub use propagator::{propagate_body, BodySet};
