pub mod cross_validation;
pub mod metrics;
pub mod search;

pub use metrics::*;
pub use search::*;
