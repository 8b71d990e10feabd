//! Core types for the stimprep preprocessing pipeline

use std::fmt;
use std::path::PathBuf;

use ndarray::Array2;
use serde::Deserialize;

/// One named unit of source audio processed end-to-end.
///
/// The record is created fresh per stimulus at pipeline entry and mutated
/// additively by each stage; fields a stage has not yet populated stay
/// `None`, so every stage's input contract is checkable.
#[derive(Debug, Clone)]
pub struct Stimulus {
    /// Source audio location.
    pub path: PathBuf,
    /// Destination for the processed output.
    pub out_path: PathBuf,
    /// Waveform as channels x samples, normalized to [-1.0, 1.0].
    pub waveform: Option<Array2<f32>>,
    /// Sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// Ordered snippet boundaries in samples, populated by the window stage.
    pub snippet_times: Option<Vec<SnippetSpan>>,
    /// `snippet_times` divided by the sample rate, same ordering.
    pub snippet_times_sec: Option<Vec<(f64, f64)>>,
    /// Snippets grouped into batches for sequential feed-forward processing.
    pub snippet_iter: Option<Vec<Vec<SnippetSpan>>>,
}

impl Stimulus {
    pub fn new(path: impl Into<PathBuf>, out_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            out_path: out_path.into(),
            waveform: None,
            sample_rate: None,
            snippet_times: None,
            snippet_times_sec: None,
            snippet_iter: None,
        }
    }

    /// Number of samples per channel, or zero before the loader has run.
    pub fn num_samples(&self) -> usize {
        self.waveform.as_ref().map_or(0, |w| w.ncols())
    }
}

/// A half-open `[start, end)` sample range produced by the windowing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetSpan {
    pub start: usize,
    pub end: usize,
}

impl SnippetSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span length in samples.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The span in seconds at the given sample rate.
    pub fn as_seconds(&self, sample_rate: u32) -> (f64, f64) {
        let rate = f64::from(sample_rate);
        (self.start as f64 / rate, self.end as f64 / rate)
    }
}

impl fmt::Display for SnippetSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Output encoding for processed stimuli.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Wav,
    Flac,
}

impl OutputFormat {
    /// The file extension the destination path must carry.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Flac => "flac",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
