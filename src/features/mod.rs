pub mod builder;
pub mod scaler;
pub mod schema;

pub use builder::*;
pub use scaler::*;
pub use schema::*;
