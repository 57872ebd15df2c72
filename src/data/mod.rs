//! Data ingestion
//!
//! CSV normalization and the alias tables it relies on.

pub mod aliases;
pub mod loader;

pub use loader::{load_league_dir, LoadReport};
