//! Outcome classifier
//!
//! A softmax regression over the form feature vector, plus the explicit
//! label table that decodes its class indices.

pub mod classifier;
pub mod labels;

pub use classifier::{OutcomeNet, ServingClassifier, N_CLASSES};
pub use labels::LabelDecoder;
