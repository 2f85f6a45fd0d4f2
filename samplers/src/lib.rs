//! Scenario selectors
//!
//! This crate provides implementations of the `Sampler` trait. The default
//! selector draws request shapes from a weighted [`Scenario`](loadgen_core::Scenario).

#![warn(missing_docs)]
#![warn(clippy::all)]

mod weighted;

pub use weighted::WeightedSampler;
