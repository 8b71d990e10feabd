//! Transform configuration, parsed from a JSON mapping of transform names
//! to their parameters. Absent keys mean the stage is skipped entirely;
//! unrecognized keys are ignored.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::OutputFormat;
use crate::window::WindowConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    /// Sum all channels into one. No parameters: configured as `{}`.
    #[serde(default)]
    pub monochannel: Option<EmptyParams>,
    #[serde(default)]
    pub resample: Option<ResampleParams>,
    #[serde(default)]
    pub trim: Option<TrimParams>,
    #[serde(default)]
    pub truncate: Option<TruncateParams>,
    /// Mean-center each channel. No parameters: configured as `{}`.
    #[serde(default)]
    pub wavemean: Option<EmptyParams>,
    #[serde(default)]
    pub pad: Option<PadParams>,
    #[serde(default)]
    pub window: Option<WindowConfig>,
    /// Output format for the writer stage. Required.
    pub format: OutputFormat,
}

impl TransformConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read transform config {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("failed to parse transform config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid transform config JSON")
    }
}

/// Marker for parameterless transforms.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EmptyParams {}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResampleParams {
    pub resample_rate: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TrimParams {
    /// Trigger level in dB below full scale for the boundary detector.
    pub trim_level: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TruncateParams {
    /// Segment length to keep, in samples.
    pub clip_length: usize,
    /// Offset of the segment start, in samples.
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PadParams {
    /// Duration of silence prepended to the waveform, in seconds.
    pub context_size_sec: f64,
}

#[cfg(test)]
mod tests {
    use super::TransformConfig;
    use crate::types::OutputFormat;

    #[test]
    fn parses_full_config() {
        let config = TransformConfig::from_json(
            r#"{
                "monochannel": {},
                "resample": {"resample_rate": 16000},
                "trim": {"trim_level": 60},
                "truncate": {"clip_length": 160000, "offset": 0},
                "wavemean": {},
                "format": "flac"
            }"#,
        )
        .unwrap();

        assert!(config.monochannel.is_some());
        assert_eq!(config.resample.unwrap().resample_rate, 16_000);
        assert_eq!(config.truncate.unwrap().clip_length, 160_000);
        assert!(config.window.is_none());
        assert_eq!(config.format, OutputFormat::Flac);
    }

    #[test]
    fn absent_keys_skip_stages_and_unknown_keys_are_ignored() {
        let config = TransformConfig::from_json(
            r#"{"format": "wav", "an_unknown_transform": {"x": 1}}"#,
        )
        .unwrap();
        assert!(config.monochannel.is_none());
        assert!(config.resample.is_none());
        assert_eq!(config.format, OutputFormat::Wav);
    }

    #[test]
    fn format_is_required() {
        assert!(TransformConfig::from_json("{}").is_err());
    }
}
