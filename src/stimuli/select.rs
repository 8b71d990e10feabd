//! Story selection: expand CLI selection inputs into a concrete story set,
//! and map story names to already-processed output files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Result};
use tracing::debug;

use super::source::StimulusSource;

/// Expand a story list or a session list into the set of stories to
/// process. Giving both is a configuration error; giving neither, or an
/// empty expansion, selects everything the source knows about.
pub fn select_stories(
    source: &dyn StimulusSource,
    stories: Option<&[String]>,
    sessions: Option<&[String]>,
) -> Result<BTreeSet<String>> {
    let selected: BTreeSet<String> = match (stories, sessions) {
        (Some(_), Some(_)) => {
            bail!("specify a story list or a session list, not both")
        }
        (Some(stories), None) => stories.iter().cloned().collect(),
        (None, Some(sessions)) => {
            let mut selected = BTreeSet::new();
            for session in sessions {
                selected.extend(source.session_stories(session)?);
            }
            selected
        }
        (None, None) => BTreeSet::new(),
    };

    if selected.is_empty() {
        debug!("no explicit selection; processing every known stimulus");
        return source.list_all();
    }
    Ok(selected)
}

/// Locate already-processed output files for the given stories, preferring
/// FLAC over WAV. Every missing story is collected so the operator can fix
/// all gaps in one pass.
pub fn select_processed(
    stim_dir: &Path,
    stories: &BTreeSet<String>,
) -> Result<BTreeMap<String, PathBuf>> {
    ensure!(
        stim_dir.is_dir(),
        "stimulus dir {} does not exist or is not a directory",
        stim_dir.display()
    );

    let mut found = BTreeMap::new();
    let mut missing = Vec::new();
    for story in stories {
        let path = ["flac", "wav"]
            .iter()
            .map(|ext| stim_dir.join(format!("{story}.{ext}")))
            .find(|candidate| candidate.is_file());
        match path {
            Some(path) => {
                found.insert(story.clone(), path);
            }
            None => missing.push(story.as_str()),
        }
    }

    ensure!(
        missing.is_empty(),
        "missing processed stimuli for stories: {}",
        missing.join(" ")
    );
    Ok(found)
}
