pub mod features;
pub mod indicators;


pub use features::{build_feature_vector, compute_features, MIN_BARS};
pub use indicators::*;
