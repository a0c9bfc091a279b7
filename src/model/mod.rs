pub mod annotations;
pub mod features;
pub mod thresholds;
