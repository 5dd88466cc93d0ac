//! `reconwarden-drift` — automation-safety monitor.
//!
//! Computes drift signals (accuracy, calibration, feature distribution,
//! outcome shift, automation risk) from the append-only outcome trail and
//! drives the tenant ML status state machine in response.

pub mod detector;
pub mod governor;
pub mod stats;

pub use detector::{DriftDetector, MonitoringSnapshot};
pub use governor::{AutoResponseGovernor, GovernorReport};
pub use stats::{expected_calibration_error, population_stability_index};
