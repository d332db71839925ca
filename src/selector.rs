//! Deciding whether a folder really is build output.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::FoldersConfig;
use crate::error::Error;

/// Answers "is this folder an actionable target?".
pub trait FolderSelector {
    fn select_folder(&self, folder: &Path) -> bool;
}

impl<F> FolderSelector for F
where
    F: Fn(&Path) -> bool,
{
    fn select_folder(&self, folder: &Path) -> bool {
        self(folder)
    }
}

/// Selects `bin`/`obj`-style folders that sit next to a project file.
#[derive(Debug, Clone)]
pub struct BuildFolderSelector {
    /// Lowercased folder names that are candidates
    targets: HashSet<String>,
    project_files: GlobSet,
}

impl BuildFolderSelector {
    pub fn new<T, P>(targets: T, project_files: P) -> Result<Self, Error>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let targets = targets
            .into_iter()
            .map(|t| t.as_ref().to_lowercase())
            .collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in project_files {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| Error::InvalidGlob {
                    pattern: pattern.to_string(),
                    source,
                })?;
            builder.add(glob);
        }
        let project_files = builder.build().map_err(|source| Error::InvalidGlob {
            pattern: "<project files>".to_string(),
            source,
        })?;

        Ok(Self {
            targets,
            project_files,
        })
    }

    pub fn from_config(config: &FoldersConfig) -> Result<Self, Error> {
        Self::new(&config.targets, &config.project_files)
    }

    fn is_candidate_name(&self, folder: &Path) -> bool {
        folder
            .file_name()
            .map(|name| self.targets.contains(&name.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }

    /// Count files directly inside `parent` matching a project file pattern.
    fn count_project_files(&self, parent: &Path) -> usize {
        let entries = match fs::read_dir(parent) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("Unable to list project files in {}: {}", parent.display(), err);
                return 0;
            }
        };

        entries
            .flatten()
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .filter(|entry| self.project_files.is_match(entry.file_name()))
            .count()
    }
}

impl FolderSelector for BuildFolderSelector {
    fn select_folder(&self, folder: &Path) -> bool {
        if !self.is_candidate_name(folder) {
            return false;
        }

        // Without a parent it can't be a build folder
        let Some(parent) = folder.parent() else {
            return false;
        };

        match self.count_project_files(parent) {
            0 => {
                debug!(
                    "Folder '{}' does not appear to be a build folder (no project files found)",
                    folder.display()
                );
                false
            }
            1 => true,
            _ => {
                warn!("Folder '{}' sits beside multiple project files", folder.display());
                true
            }
        }
    }
}
