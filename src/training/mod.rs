//! Model training
//!
//! Training loop and evaluation metrics.

pub mod metrics;
pub mod trainer;

pub use metrics::Metrics;
pub use trainer::{train_classifier, TrainReport};
