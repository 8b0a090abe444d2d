pub mod output;
pub mod tle;

pub use output::StateWriter;
pub use tle::{load_tles, parse_tles, Tle, TleError};
