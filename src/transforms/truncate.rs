//! Truncation stage: keep a fixed-length segment at a given offset.

use anyhow::{ensure, Result};
use ndarray::s;

use super::{take_loaded, Transform};
use crate::types::Stimulus;

pub struct Truncate {
    clip_length: usize,
    offset: usize,
}

impl Truncate {
    pub fn new(clip_length: usize, offset: usize) -> Self {
        Self {
            clip_length,
            offset,
        }
    }
}

impl Transform for Truncate {
    fn name(&self) -> &'static str {
        "truncate"
    }

    fn apply(&self, stimulus: &mut Stimulus) -> Result<()> {
        let (waveform, _) = take_loaded(stimulus)?;
        let needed = self.offset + self.clip_length;
        ensure!(
            waveform.ncols() >= needed,
            "waveform has {} samples but truncation needs offset {} + clip length {}",
            waveform.ncols(),
            self.offset,
            self.clip_length
        );
        let clipped = waveform.slice(s![.., self.offset..needed]).to_owned();
        stimulus.waveform = Some(clipped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn stimulus_with(cols: usize) -> Stimulus {
        let mut stimulus = Stimulus::new("in.wav", "out.wav");
        let samples: Vec<f32> = (0..cols).map(|i| i as f32).collect();
        stimulus.waveform = Some(Array2::from_shape_vec((1, cols), samples).unwrap());
        stimulus.sample_rate = Some(16_000);
        stimulus
    }

    #[test]
    fn slices_requested_segment() {
        let mut stimulus = stimulus_with(100);
        Truncate::new(10, 20).apply(&mut stimulus).unwrap();

        let waveform = stimulus.waveform.unwrap();
        assert_eq!(waveform.ncols(), 10);
        assert_eq!(waveform[[0, 0]], 20.0);
        assert_eq!(waveform[[0, 9]], 29.0);
    }

    #[test]
    fn short_waveform_is_rejected() {
        let mut stimulus = stimulus_with(25);
        let err = Truncate::new(10, 20).apply(&mut stimulus).unwrap_err();
        assert!(err.to_string().contains("25 samples"));
    }
}
