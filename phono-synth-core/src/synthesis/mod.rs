//! Greedy search for a phonetically representative excerpt.
//!
//! - Run parameters (`SynthesisParams`)
//! - The append/delete state machine (`Synthesizer`)
//! - The result record handed to exporters (`SynthesisReport`)

/// Chunk mode, direction, criterion, group size and threshold of a run.
pub mod params;

/// Result record and termination status.
pub mod report;

/// Iterative append/delete search driven by the relevance oracle.
pub mod synthesizer;
