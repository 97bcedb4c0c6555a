pub mod forecaster;

pub use forecaster::*;
