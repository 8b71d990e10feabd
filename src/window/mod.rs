//! Windowing engine: slices a waveform into a deterministic, ordered series
//! of fixed-size, context-padded snippets grouped into batches.
//!
//! Each snippet covers `chunk` new samples plus up to `context` samples of
//! look-back history. Early snippets with partial history ("warm-up"
//! windows) are only emitted when full context is not required.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::types::SnippetSpan;

#[cfg(test)]
mod tests;

/// Windowing parameters, deserializable from the transform config.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Duration of the "new" audio each snippet scores, in seconds.
    pub chunk_size_sec: f64,
    /// Duration of look-back history prepended to each chunk, in seconds.
    pub context_size_sec: f64,
    /// Maximum snippets per batch. Forced to 1 when `skip_window` is set.
    pub batch_size: usize,
    /// When true, only snippets spanning exactly chunk + context samples
    /// are emitted; warm-up snippets are excluded entirely.
    pub require_full_context: bool,
    /// Snippets shorter than this are dropped regardless of mode.
    pub min_length_samples: usize,
    /// When true, the whole waveform becomes a single snippet.
    pub skip_window: bool,
    /// Sample rate the durations are converted against; waveforms arriving
    /// at a different rate are rejected.
    pub sample_rate: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            chunk_size_sec: 0.1,
            context_size_sec: 8.0,
            batch_size: 1,
            require_full_context: true,
            min_length_samples: 0,
            skip_window: false,
            sample_rate: 16_000,
        }
    }
}

/// Windowing failures the driver can act on.
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("chunk size {chunk_size_sec}s yields zero samples at {sample_rate} Hz")]
    EmptyChunk { chunk_size_sec: f64, sample_rate: u32 },

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error(
        "no snippets possible: waveform has {num_samples} samples but a full-context \
         snippet needs chunk {chunk_samples} + context {context_samples}; \
         reduce the context size or disable require_full_context"
    )]
    NoSnippets {
        num_samples: usize,
        chunk_samples: usize,
        context_samples: usize,
    },

    #[error(
        "all {candidates} candidate snippets are shorter than the minimum \
         length of {min_length_samples} samples"
    )]
    BelowMinLength {
        candidates: usize,
        min_length_samples: usize,
    },

    #[error("sample rate {actual} Hz does not match the windowing rate {expected} Hz; resample first")]
    SampleRateMismatch { expected: u32, actual: u32 },
}

/// The engine's output: ordered snippet boundaries plus their batch grouping.
#[derive(Debug, Clone)]
pub struct WindowPlan {
    /// All retained snippets, ordered by strictly increasing end sample.
    pub snippet_times: Vec<SnippetSpan>,
    /// `snippet_times` divided by the sample rate.
    pub snippet_times_sec: Vec<(f64, f64)>,
    /// Consecutive groups of at most `batch_size` snippets; under full
    /// context every group holds snippets of a single span length.
    pub batches: Vec<Vec<SnippetSpan>>,
}

/// Windowing engine bound to a sample rate.
///
/// Durations are converted to sample counts once, at construction.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    sample_rate: u32,
    chunk_samples: usize,
    context_samples: usize,
    batch_size: usize,
    require_full_context: bool,
    min_length_samples: usize,
    skip_window: bool,
}

impl Window {
    pub fn new(config: &WindowConfig, sample_rate: u32) -> Result<Self, WindowError> {
        let rate = f64::from(sample_rate);
        let chunk_samples = (config.chunk_size_sec * rate).round() as usize;
        let context_samples = (config.context_size_sec * rate).round() as usize;
        if chunk_samples == 0 && !config.skip_window {
            return Err(WindowError::EmptyChunk {
                chunk_size_sec: config.chunk_size_sec,
                sample_rate,
            });
        }
        if config.batch_size == 0 {
            return Err(WindowError::InvalidBatchSize);
        }
        Ok(Self {
            sample_rate,
            chunk_samples,
            context_samples,
            batch_size: if config.skip_window { 1 } else { config.batch_size },
            require_full_context: config.require_full_context,
            min_length_samples: config.min_length_samples,
            skip_window: config.skip_window,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn chunk_samples(&self) -> usize {
        self.chunk_samples
    }

    pub fn context_samples(&self) -> usize {
        self.context_samples
    }

    /// Full snippet span: chunk plus context, in samples.
    pub fn total_samples(&self) -> usize {
        self.chunk_samples + self.context_samples
    }

    /// Compute the snippet boundaries and batch grouping for a waveform of
    /// `num_samples` samples.
    pub fn plan(&self, num_samples: usize) -> Result<WindowPlan, WindowError> {
        let spans = self.snippet_spans(num_samples)?;
        let spans = self.filter_min_length(spans)?;

        if self.require_full_context {
            // Step 3 constructs only equal spans; anything else is an
            // internal logic error, not a recoverable condition.
            let span_len = spans[0].len();
            assert!(
                spans.iter().all(|span| span.len() == span_len),
                "uneven snippet lengths under require_full_context"
            );
        }

        let snippet_times_sec = spans
            .iter()
            .map(|span| span.as_seconds(self.sample_rate))
            .collect();
        let batches = self.batch(&spans);
        debug!(
            snippets = spans.len(),
            batches = batches.len(),
            "windowing plan computed"
        );

        Ok(WindowPlan {
            snippet_times: spans,
            snippet_times_sec,
            batches,
        })
    }

    fn snippet_spans(&self, num_samples: usize) -> Result<Vec<SnippetSpan>, WindowError> {
        if self.skip_window {
            if num_samples == 0 {
                return Err(self.no_snippets(num_samples));
            }
            return Ok(vec![SnippetSpan::new(0, num_samples)]);
        }

        let total = self.total_samples();
        let mut ends = Vec::new();

        if !self.require_full_context {
            // Warm-up windows: every chunk multiple strictly below the full
            // span, capped at the waveform length so ends stay in bounds.
            let mut end = self.chunk_samples;
            while end < total && end <= num_samples {
                ends.push(end);
                end += self.chunk_samples;
            }
        }

        if num_samples >= total {
            // Slide a full chunk+context window in strides of one chunk,
            // keeping every position that fits entirely in the waveform.
            let mut end = total;
            while end <= num_samples {
                ends.push(end);
                end += self.chunk_samples;
            }
        }

        if ends.is_empty() {
            return Err(self.no_snippets(num_samples));
        }

        Ok(ends
            .into_iter()
            .map(|end| SnippetSpan::new(end.saturating_sub(total), end))
            .collect())
    }

    fn filter_min_length(
        &self,
        spans: Vec<SnippetSpan>,
    ) -> Result<Vec<SnippetSpan>, WindowError> {
        if self.min_length_samples == 0 {
            return Ok(spans);
        }
        let candidates = spans.len();
        let retained: Vec<SnippetSpan> = spans
            .into_iter()
            .filter(|span| span.len() >= self.min_length_samples)
            .collect();
        if retained.is_empty() {
            return Err(WindowError::BelowMinLength {
                candidates,
                min_length_samples: self.min_length_samples,
            });
        }
        Ok(retained)
    }

    fn batch(&self, spans: &[SnippetSpan]) -> Vec<Vec<SnippetSpan>> {
        if self.require_full_context || self.skip_window {
            // All spans are equal, so a plain consecutive split suffices.
            return spans
                .chunks(self.batch_size)
                .map(|group| group.to_vec())
                .collect();
        }

        // Warm-up spans strictly increase before becoming constant. Split
        // into maximal equal-span runs first, then cap each run at the
        // batch size, preserving order throughout.
        let mut batches = Vec::new();
        let mut run_start = 0;
        for idx in 1..=spans.len() {
            let run_ended =
                idx == spans.len() || spans[idx].len() != spans[run_start].len();
            if run_ended {
                for group in spans[run_start..idx].chunks(self.batch_size) {
                    batches.push(group.to_vec());
                }
                run_start = idx;
            }
        }
        batches
    }

    fn no_snippets(&self, num_samples: usize) -> WindowError {
        WindowError::NoSnippets {
            num_samples,
            chunk_samples: self.chunk_samples,
            context_samples: self.context_samples,
        }
    }
}
