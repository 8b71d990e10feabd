//! Where stimuli come from: a local directory of audio files, or a mirror
//! of the remote stimulus bucket described by a manifest. The remote
//! transfer protocol itself is out of scope; the driver only needs fetched
//! audio to arrive as a readable file at a known local path.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;

/// Audio file extensions recognized as stimuli, in preference order.
const AUDIO_EXTENSIONS: [&str; 2] = ["flac", "wav"];

/// A located stimulus, ready to fetch.
#[derive(Debug, Clone)]
pub struct StimulusDescriptor {
    pub name: String,
    pub location: PathBuf,
}

/// Narrow interface the pipeline driver needs from any stimulus store.
pub trait StimulusSource {
    /// Locate a stimulus by name.
    fn resolve(&self, name: &str) -> Result<StimulusDescriptor>;

    /// Materialize the stimulus as a readable local file, staging into
    /// `dest_dir` when the source is not already local.
    fn fetch(&self, descriptor: &StimulusDescriptor, dest_dir: &Path) -> Result<PathBuf>;

    /// Names of every stimulus the source knows about.
    fn list_all(&self) -> Result<BTreeSet<String>>;

    /// Whether `fetch` creates temporary copies the driver must clean up.
    fn requires_staging(&self) -> bool {
        false
    }

    /// Expand a session identifier into its story names.
    fn session_stories(&self, session: &str) -> Result<Vec<String>> {
        bail!("session '{session}' cannot be expanded: this source has no session index")
    }
}

/// Stimuli in a local directory, identified by extension-stripped paths
/// relative to the root.
pub struct LocalDirSource {
    root: PathBuf,
    recursive: bool,
}

impl LocalDirSource {
    pub fn new(root: impl Into<PathBuf>, recursive: bool) -> Result<Self> {
        let root = root.into();
        ensure!(
            root.is_dir(),
            "stimulus directory {} does not exist or is not a directory",
            root.display()
        );
        Ok(Self { root, recursive })
    }

    fn scan(&self, dir: &Path, paths: &mut Vec<PathBuf>) -> Result<()> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("failed to read directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                if self.recursive {
                    self.scan(&path, paths)?;
                }
                continue;
            }
            let is_audio = path
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext));
            if is_audio {
                paths.push(path);
            }
        }
        Ok(())
    }
}

impl StimulusSource for LocalDirSource {
    fn resolve(&self, name: &str) -> Result<StimulusDescriptor> {
        for ext in AUDIO_EXTENSIONS {
            let candidate = self.root.join(format!("{name}.{ext}"));
            if candidate.is_file() {
                return Ok(StimulusDescriptor {
                    name: name.to_string(),
                    location: candidate,
                });
            }
        }
        bail!(
            "stimulus '{name}' not found under {}",
            self.root.display()
        )
    }

    fn fetch(&self, descriptor: &StimulusDescriptor, _dest_dir: &Path) -> Result<PathBuf> {
        // Already local; nothing to stage.
        Ok(descriptor.location.clone())
    }

    fn list_all(&self) -> Result<BTreeSet<String>> {
        let mut paths = Vec::new();
        self.scan(&self.root, &mut paths)?;
        let mut names = BTreeSet::new();
        for path in paths {
            let relative = path
                .strip_prefix(&self.root)
                .expect("scanned paths live under the root");
            names.insert(relative.with_extension("").to_string_lossy().into_owned());
        }
        Ok(names)
    }
}

/// Manifest describing a mirrored stimulus bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct BucketManifest {
    /// Stimulus name to its segment files, one per part, relative to the
    /// bucket root.
    #[serde(default)]
    pub stimuli: BTreeMap<String, StimulusEntry>,
    /// Session identifier to the stories presented in that session.
    #[serde(default)]
    pub sessions: BTreeMap<String, SessionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StimulusEntry {
    pub segments: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionEntry {
    pub train_stories: Vec<String>,
    pub test_story: String,
}

/// A bucket mirror on local disk: audio segments plus a `manifest.json`
/// index. Fetches are copied into the staging directory, standing in for
/// the remote download.
pub struct BucketSource {
    root: PathBuf,
    manifest: BucketManifest,
}

impl BucketSource {
    pub const MANIFEST_NAME: &'static str = "manifest.json";

    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let manifest_path = root.join(Self::MANIFEST_NAME);
        let raw = fs::read_to_string(&manifest_path).with_context(|| {
            format!("failed to read bucket manifest {}", manifest_path.display())
        })?;
        let manifest: BucketManifest = serde_json::from_str(&raw).with_context(|| {
            format!("invalid bucket manifest {}", manifest_path.display())
        })?;
        Ok(Self { root, manifest })
    }
}

impl StimulusSource for BucketSource {
    fn resolve(&self, name: &str) -> Result<StimulusDescriptor> {
        let (base, part_idx) = split_part_name(name);
        let entry = self
            .manifest
            .stimuli
            .get(base)
            .with_context(|| format!("stimulus '{base}' is not in the bucket manifest"))?;
        let segment = entry.segments.get(part_idx).with_context(|| {
            format!(
                "stimulus '{base}' has {} segments but part {} was requested",
                entry.segments.len(),
                part_idx + 1
            )
        })?;
        let location = self.root.join(segment);
        ensure!(
            location.is_file(),
            "segment {} for stimulus '{name}' is missing from the bucket mirror",
            location.display()
        );
        Ok(StimulusDescriptor {
            name: name.to_string(),
            location,
        })
    }

    fn fetch(&self, descriptor: &StimulusDescriptor, dest_dir: &Path) -> Result<PathBuf> {
        let extension = descriptor
            .location
            .extension()
            .and_then(OsStr::to_str)
            .unwrap_or("wav");
        let staged = dest_dir.join(format!("{}.{extension}", descriptor.name));
        if let Some(parent) = staged.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&descriptor.location, &staged).with_context(|| {
            format!(
                "failed to fetch stimulus '{}' to {}",
                descriptor.name,
                staged.display()
            )
        })?;
        Ok(staged)
    }

    fn list_all(&self) -> Result<BTreeSet<String>> {
        Ok(self.manifest.stimuli.keys().cloned().collect())
    }

    fn requires_staging(&self) -> bool {
        true
    }

    fn session_stories(&self, session: &str) -> Result<Vec<String>> {
        let entry = self
            .manifest
            .sessions
            .get(session)
            .with_context(|| format!("session '{session}' is not in the bucket manifest"))?;
        let mut stories = entry.train_stories.clone();
        stories.push(entry.test_story.clone());
        Ok(stories)
    }
}

/// Split a multi-part story name (`<base>part<N>`, 1-based) into its base
/// name and zero-based segment index. Names without a part suffix map to
/// segment zero.
fn split_part_name(name: &str) -> (&str, usize) {
    if let Some(pos) = name.rfind("part") {
        let digits = &name[pos + 4..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(part) = digits.parse::<usize>() {
                if part > 0 {
                    return (&name[..pos], part - 1);
                }
            }
        }
    }
    (name, 0)
}
