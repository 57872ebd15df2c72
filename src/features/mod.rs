//! Form derivation and feature construction
//!
//! The form ledger walks a league's history once and keeps a bounded
//! trailing window per team; the projector turns a pair of windows into the
//! classifier's fixed feature vector.

pub mod form;
pub mod projector;

pub use form::{FormLedger, FormWindow, TrainingRow};
pub use projector::FeatureScaler;
