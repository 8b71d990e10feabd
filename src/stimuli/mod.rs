//! Stimulus sources, selection, and the batch processing driver.

pub mod process;
pub mod select;
pub mod source;

pub use process::{process_stimuli, ProcessSummary};
pub use select::{select_processed, select_stories};
pub use source::{BucketSource, LocalDirSource, StimulusDescriptor, StimulusSource};
