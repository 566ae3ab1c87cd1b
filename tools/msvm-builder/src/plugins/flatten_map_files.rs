// =============================================================================
// FLATTEN MAP FILES PLUGIN - tools/msvm-builder/src/plugins/flatten_map_files.rs
// =============================================================================

//! Copies every linker map file of a build into one flat directory
//!
//! Map files end up nested deep inside each module's build directory. When
//! source level debugging is not available it is much easier to find them in
//! `BUILD_OUTPUT_BASE/MAP`.
//!
//! Traversal is depth first and top down. Inside a directory, regular files
//! are visited before subdirectories and each group is sorted by file name, so
//! when two map files share a name the one visited last wins.

use anyhow::Result as AnyhowResult;
use log::{debug, error, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use shared::types::error::FlattenError;

use crate::environment::{EnvironmentLookup, BUILD_OUTPUT_BASE};
use crate::plugins::{BuildContext, PostBuildPlugin};

/// Flat destination directory, created under the build output root
pub const MAP_DIRECTORY_NAME: &str = "MAP";

const MAP_EXTENSION: &str = ".map";

/// What to do when a single map file cannot be copied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyFailurePolicy {
    /// Stop the pass and report the failed copy
    #[default]
    Abort,
    /// Log the failure and keep copying
    Skip,
}

/// Counters for one flatten pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenSummary {
    pub copied: usize,
    pub ignored: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MapFileFlattener {
    ignore_patterns: Vec<String>,
    copy_failure_policy: CopyFailurePolicy,
}

impl MapFileFlattener {
    /// Patterns are matched as plain substrings of the lower-cased file name
    pub fn new<I, S>(ignore_patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ignore_patterns: ignore_patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
            copy_failure_policy: CopyFailurePolicy::default(),
        }
    }

    pub fn with_copy_failure_policy(mut self, policy: CopyFailurePolicy) -> Self {
        self.copy_failure_policy = policy;
        self
    }

    /// Flatten all map files below `build_output_root` into its `MAP` directory
    pub fn flatten(&self, build_output_root: &Path) -> Result<FlattenSummary, FlattenError> {
        let map_files_dir = build_output_root.join(MAP_DIRECTORY_NAME);

        if !map_files_dir.is_dir() {
            if let Err(e) = fs::create_dir(&map_files_dir) {
                error!("Error making map files directory {}: {}", map_files_dir.display(), e);
            }
        }

        warn!("Copying map files to flat directory {}", map_files_dir.display());

        let mut summary = FlattenSummary::default();
        // lower-cased name -> destination written during this pass
        let mut written: HashMap<String, PathBuf> = HashMap::new();

        let walker = WalkDir::new(build_output_root)
            .follow_links(false)
            .sort_by(|a, b| {
                a.file_type()
                    .is_dir()
                    .cmp(&b.file_type().is_dir())
                    .then_with(|| a.file_name().cmp(b.file_name()))
            })
            .into_iter()
            .filter_entry(|entry| !entry.path().starts_with(&map_files_dir));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable build output entry: {}", e);
                    continue;
                }
            };

            if !is_regular_file(&entry) {
                continue;
            }

            let normalized = entry.file_name().to_string_lossy().trim().to_lowercase();
            if !normalized.ends_with(MAP_EXTENSION) {
                continue;
            }

            if self.is_ignored(&normalized) {
                trace!("Flatten - ignoring map file {}", entry.path().display());
                summary.ignored += 1;
                continue;
            }

            let destination = map_files_dir.join(entry.file_name());
            match copy_map_file(entry.path(), &destination, written.get(&normalized)) {
                Ok(()) => {
                    written.insert(normalized, destination);
                    summary.copied += 1;
                }
                Err(source) => match self.copy_failure_policy {
                    CopyFailurePolicy::Abort => {
                        return Err(FlattenError::Copy {
                            from: entry.path().to_path_buf(),
                            to: destination,
                            source,
                        });
                    }
                    CopyFailurePolicy::Skip => {
                        warn!(
                            "Failed to copy {} to {}: {}",
                            entry.path().display(),
                            destination.display(),
                            source
                        );
                        summary.failed += 1;
                    }
                },
            }
        }

        debug!(
            "Flatten map files done: {} copied, {} ignored, {} failed",
            summary.copied, summary.ignored, summary.failed
        );
        Ok(summary)
    }

    fn is_ignored(&self, normalized_name: &str) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| normalized_name.contains(pattern.as_str()))
    }
}

/// Flatten map files and report the status code the build pipeline expects
pub fn flatten<S: AsRef<str>>(
    build_output_root: &Path,
    ignore_patterns: &[S],
) -> Result<i32, FlattenError> {
    MapFileFlattener::new(ignore_patterns)
        .flatten(build_output_root)
        .map(|_| 0)
}

fn is_regular_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_dir() {
        return false;
    }
    // symlinks are followed for files only
    file_type.is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

/// Copy one map file, replacing an earlier copy whose name differs only in case
fn copy_map_file(source: &Path, destination: &Path, previous: Option<&PathBuf>) -> io::Result<()> {
    if let Some(previous) = previous {
        if previous.as_path() != destination {
            match fs::remove_file(previous) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
    }
    fs::copy(source, destination)?;
    Ok(())
}

/// Post-build adapter reading the output root from the build environment
#[derive(Debug, Clone)]
pub struct FlattenMapFiles {
    flattener: MapFileFlattener,
}

impl FlattenMapFiles {
    pub fn new(flattener: MapFileFlattener) -> Self {
        Self { flattener }
    }
}

impl PostBuildPlugin for FlattenMapFiles {
    fn name(&self) -> &str {
        "FlattenMapFiles"
    }

    fn do_post_build(&self, context: &BuildContext) -> AnyhowResult<i32> {
        let build_output_base = context
            .env()
            .get_value(BUILD_OUTPUT_BASE)
            .ok_or(FlattenError::MissingOutputBase(BUILD_OUTPUT_BASE))?;

        self.flattener.flatten(Path::new(build_output_base))?;
        Ok(0)
    }
}
