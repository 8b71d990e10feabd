//! Padding stage: prepend a fixed duration of silence, with a helper to map
//! time offsets computed against the padded signal back to the original
//! timeline.

use anyhow::{ensure, Result};
use ndarray::{s, Array2};

use super::{take_loaded, Transform};
use crate::types::Stimulus;

pub struct PadSilence {
    context_size_sec: f64,
}

impl PadSilence {
    pub fn new(context_size_sec: f64) -> Self {
        Self { context_size_sec }
    }
}

impl Transform for PadSilence {
    fn name(&self) -> &'static str {
        "pad"
    }

    fn apply(&self, stimulus: &mut Stimulus) -> Result<()> {
        let (waveform, sample_rate) = take_loaded(stimulus)?;
        let pad = (self.context_size_sec * f64::from(sample_rate)).round() as usize;
        let mut padded = Array2::zeros((waveform.nrows(), pad + waveform.ncols()));
        padded.slice_mut(s![.., pad..]).assign(&waveform);
        stimulus.waveform = Some(padded);
        Ok(())
    }
}

/// Map second-denominated spans computed against a signal padded by
/// `context_size_sec` back to the unpadded timeline. Starts are clamped at
/// zero; a span whose corrected end is non-positive lay entirely inside the
/// padding and is rejected.
pub fn remove_padding(
    times_sec: &[(f64, f64)],
    context_size_sec: f64,
) -> Result<Vec<(f64, f64)>> {
    let corrected: Vec<(f64, f64)> = times_sec
        .iter()
        .map(|&(start, end)| ((start - context_size_sec).max(0.0), end - context_size_sec))
        .collect();
    ensure!(
        corrected.iter().all(|&(_, end)| end > 0.0),
        "insufficient padding: a corrected snippet end is non-positive"
    );
    Ok(corrected)
}
