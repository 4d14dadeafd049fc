//! Scoring pipeline: per-axis analyzers, the aggregator and report writers.

pub mod aggregator;
pub mod entropy;
pub mod narrator;
pub mod rarity;
pub mod reporter;
pub mod uniqueness;
