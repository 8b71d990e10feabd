//! Pipeline adapter for the windowing engine: records snippet boundaries
//! and their batch grouping on the stimulus.

use anyhow::{ensure, Result};

use super::{loaded, Transform};
use crate::types::Stimulus;
use crate::window::{Window, WindowConfig, WindowError};

pub struct WindowStage {
    window: Window,
}

impl WindowStage {
    pub fn new(config: &WindowConfig) -> Result<Self, WindowError> {
        Ok(Self {
            window: Window::new(config, config.sample_rate)?,
        })
    }
}

impl Transform for WindowStage {
    fn name(&self) -> &'static str {
        "window"
    }

    fn apply(&self, stimulus: &mut Stimulus) -> Result<()> {
        let (waveform, sample_rate) = loaded(stimulus)?;
        ensure!(
            waveform.nrows() == 1,
            "windowing requires a mono waveform but got {} channels; \
             add the monochannel transform first",
            waveform.nrows()
        );
        if sample_rate != self.window.sample_rate() {
            return Err(WindowError::SampleRateMismatch {
                expected: self.window.sample_rate(),
                actual: sample_rate,
            }
            .into());
        }

        let plan = self.window.plan(waveform.ncols())?;
        stimulus.snippet_times = Some(plan.snippet_times);
        stimulus.snippet_times_sec = Some(plan.snippet_times_sec);
        stimulus.snippet_iter = Some(plan.batches);
        Ok(())
    }
}
