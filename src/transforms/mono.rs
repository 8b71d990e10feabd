//! Channel reduction: sum all channels into one.

use anyhow::Result;
use ndarray::Axis;

use super::{take_loaded, Transform};
use crate::types::Stimulus;

/// Reduces the waveform to a single channel by summing across channels,
/// matching the upstream feature extractors' expectation of a summed mix.
pub struct ToMonochannel;

impl Transform for ToMonochannel {
    fn name(&self) -> &'static str {
        "monochannel"
    }

    fn apply(&self, stimulus: &mut Stimulus) -> Result<()> {
        let (waveform, _) = take_loaded(stimulus)?;
        let summed = waveform.sum_axis(Axis(0)).insert_axis(Axis(0));
        stimulus.waveform = Some(summed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn sums_channels_not_averages() {
        let mut stimulus = Stimulus::new("in.wav", "out.wav");
        stimulus.waveform = Some(array![[0.1_f32, 0.2], [0.3, 0.4]]);
        stimulus.sample_rate = Some(16_000);

        ToMonochannel.apply(&mut stimulus).unwrap();

        let waveform = stimulus.waveform.unwrap();
        assert_eq!(waveform.nrows(), 1);
        assert!((waveform[[0, 0]] - 0.4).abs() < 1e-6);
        assert!((waveform[[0, 1]] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn mono_input_is_unchanged() {
        let mut stimulus = Stimulus::new("in.wav", "out.wav");
        stimulus.waveform = Some(array![[0.25_f32, -0.25]]);
        stimulus.sample_rate = Some(16_000);

        ToMonochannel.apply(&mut stimulus).unwrap();

        let waveform = stimulus.waveform.unwrap();
        assert_eq!(waveform, array![[0.25_f32, -0.25]]);
    }
}
