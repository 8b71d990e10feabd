//! Mean subtraction: center each channel independently around zero.

use anyhow::Result;
use ndarray::Axis;

use super::Transform;
use crate::types::Stimulus;

pub struct WaveMean;

impl Transform for WaveMean {
    fn name(&self) -> &'static str {
        "wavemean"
    }

    fn apply(&self, stimulus: &mut Stimulus) -> Result<()> {
        let waveform = stimulus
            .waveform
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("waveform not loaded; the loader stage must run first"))?;
        for mut channel in waveform.axis_iter_mut(Axis(0)) {
            let mean = channel.mean().unwrap_or(0.0);
            channel -= mean;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn centers_each_channel_independently() {
        let mut stimulus = Stimulus::new("in.wav", "out.wav");
        stimulus.waveform = Some(array![[1.0_f32, 2.0, 3.0], [10.0, 20.0, 30.0]]);
        stimulus.sample_rate = Some(16_000);

        WaveMean.apply(&mut stimulus).unwrap();

        let waveform = stimulus.waveform.unwrap();
        assert_abs_diff_eq!(waveform[[0, 0]], -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(waveform[[0, 2]], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(waveform[[1, 0]], -10.0, epsilon = 1e-6);
        for channel in waveform.rows() {
            assert_abs_diff_eq!(channel.sum(), 0.0, epsilon = 1e-4);
        }
    }
}
