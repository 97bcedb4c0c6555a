pub mod export;
pub mod loader;

pub use export::*;
pub use loader::*;
