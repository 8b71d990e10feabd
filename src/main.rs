use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stimprep::config::TransformConfig;
use stimprep::stimuli::{
    process_stimuli, select_stories, BucketSource, LocalDirSource, StimulusSource,
};

/// Prepare long-form audio stimuli for sequence-model inference.
#[derive(Parser, Debug)]
#[command(name = "stimprep", version)]
#[command(about = "Audio stimulus preprocessing pipeline", long_about = None)]
struct Args {
    /// Directory to write processed stimuli to
    #[arg(long, value_name = "DIR")]
    out_dir: PathBuf,

    /// Path to the JSON transform configuration
    #[arg(long, value_name = "PATH")]
    transform_config: PathBuf,

    /// Root of a mirrored stimulus bucket (with manifest.json)
    #[arg(long, value_name = "DIR", conflicts_with = "in_dir")]
    bucket: Option<PathBuf>,

    /// Stories to process (e.g. `legacy`)
    #[arg(long, num_args = 1.., value_name = "NAME", conflicts_with = "sessions")]
    stories: Option<Vec<String>>,

    /// Sessions whose stories should be processed (e.g. `1`)
    #[arg(long, num_args = 1.., value_name = "ID")]
    sessions: Option<Vec<String>>,

    /// Scan the input directory recursively
    #[arg(long)]
    recursive: bool,

    /// Local directory containing stimulus files
    #[arg(long, value_name = "DIR")]
    in_dir: Option<PathBuf>,
}

impl Args {
    fn validate(&self) -> Result<()> {
        if self.bucket.is_none() && self.in_dir.is_none() {
            bail!("provide a stimulus source via --bucket or --in-dir");
        }
        if self.bucket.is_some() && self.stories.is_none() == self.sessions.is_none() {
            bail!("bucket mode requires exactly one of --stories or --sessions");
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    args.validate()
        .context("failed to validate command-line arguments")?;

    let config = TransformConfig::from_file(&args.transform_config)?;

    let source: Box<dyn StimulusSource> = match (&args.bucket, &args.in_dir) {
        (Some(bucket), _) => Box::new(BucketSource::open(bucket)?),
        (None, Some(in_dir)) => Box::new(LocalDirSource::new(in_dir, args.recursive)?),
        (None, None) => bail!("no stimulus source"), // unreachable after validation
    };

    let stories = select_stories(
        source.as_ref(),
        args.stories.as_deref(),
        args.sessions.as_deref(),
    )?;
    info!(count = stories.len(), "selected stories");

    let summary = process_stimuli(&args.out_dir, source.as_ref(), &config, &stories)?;
    if !summary.failed.is_empty() {
        let names: Vec<&str> = summary.failed.iter().map(|(name, _)| name.as_str()).collect();
        bail!(
            "{} of {} stimuli failed: {}",
            summary.failed.len(),
            stories.len(),
            names.join(" ")
        );
    }

    info!(processed = summary.processed.len(), "all stimuli processed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            out_dir: PathBuf::from("out"),
            transform_config: PathBuf::from("config.json"),
            bucket: None,
            stories: None,
            sessions: None,
            recursive: false,
            in_dir: None,
        }
    }

    #[test]
    fn requires_a_source() {
        let args = base_args();
        assert!(args.validate().is_err());
    }

    #[test]
    fn local_dir_needs_no_selection() {
        let mut args = base_args();
        args.in_dir = Some(PathBuf::from("stimuli"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn bucket_needs_exactly_one_selection() {
        let mut args = base_args();
        args.bucket = Some(PathBuf::from("bucket"));
        assert!(args.validate().is_err());

        args.stories = Some(vec!["legacy".to_string()]);
        assert!(args.validate().is_ok());

        args.stories = None;
        args.sessions = Some(vec!["1".to_string()]);
        assert!(args.validate().is_ok());
    }
}
