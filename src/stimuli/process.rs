//! Batch driver: resolve, fetch, and run the transform pipeline over each
//! selected stimulus, cleaning up staged downloads on every exit path.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use tempfile::TempDir;
use tracing::{error, info};

use super::source::{StimulusDescriptor, StimulusSource};
use crate::config::TransformConfig;
use crate::transforms::Pipeline;
use crate::types::{OutputFormat, Stimulus};

/// What happened to each stimulus in a batch. A per-stimulus failure never
/// aborts the rest of the batch.
#[derive(Debug, Default)]
pub struct ProcessSummary {
    pub processed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Process every story through the configured pipeline, writing outputs
/// under `out_dir`.
///
/// All stories are resolved up front; unresolvable names abort the batch in
/// one lookup error before any work is done. Staged fetches live in a
/// temporary directory removed when the driver returns, and each stimulus's
/// staged file is additionally deleted as soon as that stimulus finishes.
pub fn process_stimuli(
    out_dir: &Path,
    source: &dyn StimulusSource,
    config: &TransformConfig,
    stories: &BTreeSet<String>,
) -> Result<ProcessSummary> {
    let pipeline = Pipeline::from_config(config)?;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let mut descriptors = Vec::with_capacity(stories.len());
    let mut missing = Vec::new();
    for story in stories {
        match source.resolve(story) {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(_) => missing.push(story.as_str()),
        }
    }
    ensure!(
        missing.is_empty(),
        "missing stimuli for stories: {}",
        missing.join(" ")
    );

    let staging = if source.requires_staging() {
        Some(TempDir::new().context("failed to create staging directory")?)
    } else {
        None
    };

    let mut summary = ProcessSummary::default();
    for descriptor in descriptors {
        match process_one(
            &pipeline,
            source,
            &descriptor,
            staging.as_ref(),
            out_dir,
            config.format,
        ) {
            Ok(out_path) => {
                info!(story = %descriptor.name, out = %out_path.display(), "processed stimulus");
                summary.processed.push(descriptor.name);
            }
            Err(err) => {
                error!(story = %descriptor.name, error = %format!("{err:#}"), "stimulus failed");
                summary.failed.push((descriptor.name, format!("{err:#}")));
            }
        }
    }

    // Dropping `staging` here removes the directory even when stimuli
    // failed above.
    Ok(summary)
}

fn process_one(
    pipeline: &Pipeline,
    source: &dyn StimulusSource,
    descriptor: &StimulusDescriptor,
    staging: Option<&TempDir>,
    out_dir: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let local_path = match staging {
        Some(dir) => source.fetch(descriptor, dir.path())?,
        None => descriptor.location.clone(),
    };

    let out_path = out_dir.join(format!("{}.{}", descriptor.name, format.extension()));
    if let Some(parent) = out_path.parent() {
        // Story names from a recursive scan can carry subdirectories.
        fs::create_dir_all(parent)?;
    }

    let mut stimulus = Stimulus::new(&local_path, &out_path);
    let outcome = pipeline.run(&mut stimulus);

    if staging.is_some() {
        // Failure of one stimulus must not leak its staged file.
        let _ = fs::remove_file(&local_path);
    }

    outcome?;
    Ok(out_path)
}
