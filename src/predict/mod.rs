//! Matchup prediction
//!
//! Elo-style rating and outcome forecasting from aggregate career
//! statistics.

pub mod elo;

pub use elo::{predict, Forecast, OutcomeType};
