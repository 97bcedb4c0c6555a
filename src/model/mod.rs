pub mod kdtree;
pub mod knn;

pub use kdtree::*;
pub use knn::*;
