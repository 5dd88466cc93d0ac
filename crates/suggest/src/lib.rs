//! `reconwarden-suggest` — match suggestion engine.
//!
//! Scores candidate (bank transaction, invoice) pairs against a fixed rubric,
//! generates ranked suggestions per exception, and handles the confirm/reject
//! lifecycle that feeds the drift monitor's outcome trail.

pub mod calibration;
pub mod generator;
pub mod lifecycle;
pub mod scorer;

pub use calibration::{CalibrationReport, CalibrationReporter, CalibrationStatsRecord};
pub use generator::SuggestionEngine;
pub use lifecycle::{ConfirmReceipt, LifecycleManager};
pub use scorer::{ScoreInput, score, SCORE_ADMISSION_THRESHOLD};
