//! Pipeline stages. Each stage consumes and returns the mutable stimulus
//! record; stages are composed into an ordered pipeline and run left to
//! right. Everything before the writer operates purely in memory.

pub mod load;
pub mod mono;
pub mod pad;
pub mod resample;
pub mod trim;
pub mod truncate;
pub mod wavemean;
pub mod window;
pub mod write;

use anyhow::{Context, Result};
use ndarray::Array2;
use tracing::debug;

use crate::config::TransformConfig;
use crate::types::Stimulus;

/// A unit of work against one stimulus record.
pub trait Transform {
    fn name(&self) -> &'static str;

    /// Mutate the record. An error aborts the remaining stages for this
    /// stimulus only.
    fn apply(&self, stimulus: &mut Stimulus) -> Result<()>;
}

/// An ordered list of stages executed against one stimulus at a time.
pub struct Pipeline {
    stages: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Transform>>) -> Self {
        Self { stages }
    }

    /// Compose the stages named by `config`, bracketed by the loader and
    /// the writer. Stage order is fixed; absent keys are skipped.
    pub fn from_config(config: &TransformConfig) -> Result<Self> {
        let mut stages: Vec<Box<dyn Transform>> = vec![Box::new(load::PathToWave)];
        if config.monochannel.is_some() {
            stages.push(Box::new(mono::ToMonochannel));
        }
        if let Some(params) = config.resample {
            stages.push(Box::new(resample::ResampleAudio::new(params.resample_rate)));
        }
        if let Some(params) = config.trim {
            stages.push(Box::new(trim::TrimSilence::new(params.trim_level)));
        }
        if let Some(params) = config.truncate {
            stages.push(Box::new(truncate::Truncate::new(
                params.clip_length,
                params.offset,
            )));
        }
        if config.wavemean.is_some() {
            stages.push(Box::new(wavemean::WaveMean));
        }
        if let Some(params) = config.pad {
            stages.push(Box::new(pad::PadSilence::new(params.context_size_sec)));
        }
        if let Some(window_config) = &config.window {
            stages.push(Box::new(window::WindowStage::new(window_config)?));
        }
        stages.push(Box::new(write::WaveToFile::new(config.format)));
        Ok(Self::new(stages))
    }

    pub fn run(&self, stimulus: &mut Stimulus) -> Result<()> {
        for stage in &self.stages {
            debug!(stage = stage.name(), "applying transform");
            stage
                .apply(stimulus)
                .with_context(|| format!("transform '{}' failed", stage.name()))?;
        }
        Ok(())
    }
}

/// Borrow the loaded waveform and sample rate, failing if the loader has
/// not run yet.
pub(crate) fn loaded(stimulus: &Stimulus) -> Result<(&Array2<f32>, u32)> {
    let waveform = stimulus
        .waveform
        .as_ref()
        .context("waveform not loaded; the loader stage must run first")?;
    let sample_rate = stimulus
        .sample_rate
        .context("sample rate not set; the loader stage must run first")?;
    Ok((waveform, sample_rate))
}

/// Take ownership of the loaded waveform for in-place replacement.
pub(crate) fn take_loaded(stimulus: &mut Stimulus) -> Result<(Array2<f32>, u32)> {
    let sample_rate = stimulus
        .sample_rate
        .context("sample rate not set; the loader stage must run first")?;
    let waveform = stimulus
        .waveform
        .take()
        .context("waveform not loaded; the loader stage must run first")?;
    Ok((waveform, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    struct FailingStage;

    impl Transform for FailingStage {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn apply(&self, _stimulus: &mut Stimulus) -> Result<()> {
            anyhow::bail!("boom")
        }
    }

    struct CountingStage;

    impl Transform for CountingStage {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn apply(&self, stimulus: &mut Stimulus) -> Result<()> {
            let rate = stimulus.sample_rate.unwrap_or(0) + 1;
            stimulus.sample_rate = Some(rate);
            Ok(())
        }
    }

    #[test]
    fn stages_run_in_order_until_failure() {
        let pipeline = Pipeline::new(vec![
            Box::new(CountingStage),
            Box::new(FailingStage),
            Box::new(CountingStage),
        ]);
        let mut stimulus = Stimulus::new("in.wav", "out.wav");
        let err = pipeline.run(&mut stimulus).unwrap_err();
        assert!(err.to_string().contains("failing"));
        // Only the stage before the failure ran.
        assert_eq!(stimulus.sample_rate, Some(1));
    }

    #[test]
    fn loaded_requires_the_loader() {
        let stimulus = Stimulus::new("in.wav", "out.wav");
        assert!(loaded(&stimulus).is_err());

        let mut stimulus = Stimulus::new("in.wav", "out.wav");
        stimulus.waveform = Some(array![[0.0_f32, 1.0]]);
        stimulus.sample_rate = Some(16_000);
        let (waveform, rate) = loaded(&stimulus).unwrap();
        assert_eq!(waveform.ncols(), 2);
        assert_eq!(rate, 16_000);
    }
}
