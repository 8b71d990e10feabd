//! stimprep - prepare long-form audio stimuli for sequence-model inference.
//!
//! Loads a waveform, applies normalizing transforms (resample, trim
//! silence, mean-center, truncate), slices it into a deterministic series
//! of fixed-size, context-padded windows grouped into batches, and writes
//! the processed audio back out.

pub mod config;
pub mod stimuli;
pub mod transforms;
pub mod types;
pub mod window;
