//! Browser fingerprint privacy audit.
//!
//! The analysis engine takes one collector-produced [`core::bundle::SignalBundle`]
//! and scores it along three independent axes (uniqueness, consistency,
//! anomaly) before merging them into a single [`core::types::AnalysisResult`].

pub mod cli;
pub mod config;
pub mod core;
pub mod detectors;
pub mod pipeline;

pub use crate::core::bundle::SignalBundle;
pub use crate::core::types::AnalysisResult;
pub use crate::pipeline::aggregator::analyze_fingerprint;
