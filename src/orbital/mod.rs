pub mod elements;
pub mod lambert;
pub mod stumpff;

pub use elements::Coe;
pub use lambert::{intercept, nmc, rendezvous, LambertSolution, NmcParams};
