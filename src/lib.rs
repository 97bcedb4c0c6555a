pub mod data;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod forecast;
pub mod model;
pub mod pipeline;
