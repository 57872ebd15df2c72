//! Prediction serving state
//!
//! The league registry and its snapshot types.

pub mod registry;

pub use registry::{Forecast, LeagueDir, LeagueRegistry, LeagueSnapshot, OutcomeProbs, SnapshotBundle};
