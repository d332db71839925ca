//! Recursive folder location.
//!
//! The walk is depth-first and pre-order. At each folder the exclusion rules
//! and the selector decide between three outcomes:
//!
//! - **yield**: the folder is a target; it is handed to the caller and its
//!   children are never visited separately.
//! - **descend**: the folder is not a target (or is self-excluded) but its
//!   children may be, so they are enumerated.
//! - **prune**: children are excluded; nothing below is enumerated.
//!
//! [`FolderWalk`] is a lazy iterator backed by an explicit stack, so callers
//! can do arbitrary work (prompting, sizing, deleting) between folders and stop
//! at any point without further directory enumeration.

use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, trace, warn};

use crate::error::Error;
use crate::exclusions::ExclusionRules;
use crate::issues::AccessIssue;
use crate::report;
use crate::selector::FolderSelector;

/// What the literal root `.` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootAnchor {
    /// The process working directory
    #[default]
    CurrentDirectory,
    /// The directory holding the running executable
    ExecutableDirectory,
}

impl RootAnchor {
    /// The folder this anchor refers to right now.
    pub fn folder(self) -> Result<PathBuf, Error> {
        let resolved = match self {
            Self::CurrentDirectory => env::current_dir(),
            Self::ExecutableDirectory => executable_directory(),
        };
        resolved.map_err(|source| Error::UnresolvableAnchor {
            anchor: self,
            source,
        })
    }
}

impl fmt::Display for RootAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentDirectory => f.write_str("current-directory"),
            Self::ExecutableDirectory => f.write_str("executable-directory"),
        }
    }
}

impl FromStr for RootAnchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current-directory" | "cwd" => Ok(Self::CurrentDirectory),
            "executable-directory" | "exe" => Ok(Self::ExecutableDirectory),
            other => Err(format!(
                "Invalid root anchor '{}'. Expected current-directory or executable-directory",
                other
            )),
        }
    }
}

/// Directory holding the running executable.
pub fn executable_directory() -> io::Result<PathBuf> {
    let exe = env::current_exe()?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "executable has no parent directory",
        )
    })
}

/// Turn a user supplied root into an absolute, normalized path.
///
/// `.` resolves through `anchor`, a leading `~` expands to the home directory
/// and anything else is made absolute against the working directory. Existence
/// is checked later by [`RecursiveFolderLocator::walk`].
pub fn resolve_root(raw: &str, anchor: RootAnchor) -> Result<PathBuf, Error> {
    if raw.trim().is_empty() {
        return Err(Error::EmptyRoot);
    }

    if raw == "." {
        return anchor.folder();
    }

    let expanded = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
            let home = dirs::home_dir().ok_or(Error::NoHomeDirectory)?;
            home.join(rest.trim_start_matches(['/', '\\']))
        }
        _ => PathBuf::from(raw),
    };

    normalize_path(&expanded).map_err(|source| Error::ResolveRoot {
        path: expanded,
        source,
    })
}

/// Make `path` absolute and drop `.` and `..` components without touching
/// the disk.
pub fn normalize_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();

    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    Ok(normalized)
}

/// Where the walk gets its subdirectories from.
pub trait FolderSource {
    /// Immediate subdirectories of `parent`, in any order.
    fn read_folders(&self, parent: &Path) -> io::Result<Vec<PathBuf>>;

    fn is_folder(&self, path: &Path) -> bool;

    /// Filesystem-normalized form of an existing, already absolute folder.
    fn canonicalize(&self, folder: &Path) -> io::Result<PathBuf> {
        Ok(folder.to_path_buf())
    }
}

/// The real filesystem.
///
/// Symbolic links that point at directories are listed too; pruning them is
/// the job of the symbolic link rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFolders;

impl FolderSource for DiskFolders {
    fn read_folders(&self, parent: &Path) -> io::Result<Vec<PathBuf>> {
        let mut folders = Vec::new();

        for entry in fs::read_dir(parent)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();

            if file_type.is_dir() || (file_type.is_symlink() && path.is_dir()) {
                folders.push(path);
            }
        }

        Ok(folders)
    }

    fn is_folder(&self, path: &Path) -> bool {
        path.is_dir()
    }

    // Resolves links in the prefix; dunce keeps Windows paths free of `\\?\`
    fn canonicalize(&self, folder: &Path) -> io::Result<PathBuf> {
        dunce::canonicalize(folder)
    }
}

/// Reporting switches for [`RecursiveFolderLocator::visit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub display_base_folder: bool,
    pub display_access_issues: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            display_base_folder: true,
            display_access_issues: false,
        }
    }
}

/// Finds target folders beneath a root.
#[derive(Debug, Clone)]
pub struct RecursiveFolderLocator<F = DiskFolders> {
    rules: ExclusionRules,
    source: F,
}

impl RecursiveFolderLocator<DiskFolders> {
    pub fn new(rules: ExclusionRules) -> Self {
        Self::with_source(rules, DiskFolders)
    }
}

impl<F: FolderSource> RecursiveFolderLocator<F> {
    pub fn with_source(rules: ExclusionRules, source: F) -> Self {
        Self { rules, source }
    }

    pub fn rules(&self) -> &ExclusionRules {
        &self.rules
    }

    /// Lazily walk the folders beneath `root` (which is not itself a candidate).
    ///
    /// The root is made absolute and normalized first, so every yielded path is
    /// too. Fails when the root is not an existing folder.
    pub fn walk<S: FolderSelector>(
        &self,
        root: &Path,
        selector: S,
    ) -> Result<FolderWalk<'_, F, S>, Error> {
        let root = self.normalize_root(root)?;
        trace!("Walking from {}", root.display());

        Ok(FolderWalk {
            rules: &self.rules,
            source: &self.source,
            selector,
            root,
            started: false,
            stack: Vec::new(),
            issues: Vec::new(),
        })
    }

    fn normalize_root(&self, root: &Path) -> Result<PathBuf, Error> {
        let resolve_error = |source| Error::ResolveRoot {
            path: root.to_path_buf(),
            source,
        };

        let normalized = normalize_path(root).map_err(resolve_error)?;
        if !self.source.is_folder(&normalized) {
            return Err(Error::MissingDirectory(normalized));
        }

        self.source.canonicalize(&normalized).map_err(resolve_error)
    }

    /// Walk `root`, handing every target folder to `visitor`.
    ///
    /// The visitor may append its own issues (e.g. a failed delete) and returns
    /// [`ControlFlow::Break`] to stop immediately. Returns every access issue
    /// collected along the way; their presence does not make the visit fail.
    pub fn visit<V, S>(
        &self,
        root: &Path,
        mut visitor: V,
        selector: S,
        options: &Options,
    ) -> Result<Vec<AccessIssue>, Error>
    where
        V: FnMut(&Path, &mut Vec<AccessIssue>) -> ControlFlow<()>,
        S: FolderSelector,
    {
        let mut walk = self.walk(root, selector)?;
        let mut stdout = io::stdout();

        if options.display_base_folder {
            report::print_base_folder(&mut stdout, walk.root()).map_err(Error::Report)?;
        }

        while let Some(folder) = walk.next() {
            if visitor(&folder, walk.issues_mut()).is_break() {
                debug!("Visitor stopped the walk at {}", folder.display());
                break;
            }
        }

        let issues = walk.into_issues();

        if options.display_access_issues {
            report::print_access_issues(&mut stdout, &issues).map_err(Error::Report)?;
        }

        Ok(issues)
    }
}

/// Subdirectories of one folder still waiting to be processed.
struct Frame {
    folders: std::vec::IntoIter<PathBuf>,
    depth: usize,
}

/// Depth-first iterator over target folders.
///
/// Directories are only enumerated when the iterator is advanced, so dropping
/// it (or simply not calling `next` again) abandons the rest of the tree.
pub struct FolderWalk<'a, F, S> {
    rules: &'a ExclusionRules,
    source: &'a F,
    selector: S,
    root: PathBuf,
    started: bool,
    stack: Vec<Frame>,
    issues: Vec<AccessIssue>,
}

impl<F: FolderSource, S: FolderSelector> FolderWalk<'_, F, S> {
    /// The normalized root the walk started from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn issues(&self) -> &[AccessIssue] {
        &self.issues
    }

    pub fn issues_mut(&mut self) -> &mut Vec<AccessIssue> {
        &mut self.issues
    }

    pub fn into_issues(self) -> Vec<AccessIssue> {
        self.issues
    }

    /// Enumerate `folder` and push its sorted subdirectories.
    fn descend(&mut self, folder: &Path, depth: usize) {
        match self.source.read_folders(folder) {
            Ok(mut folders) => {
                sort_folders(&mut folders);
                debug!("From {} found {} folders", folder.display(), folders.len());
                self.stack.push(Frame {
                    folders: folders.into_iter(),
                    depth,
                });
            }
            Err(err) => {
                if err.kind() == io::ErrorKind::PermissionDenied {
                    debug!("Problem getting directories: {}: {}", folder.display(), err);
                } else {
                    error!("Problem getting directories: {}: {}", folder.display(), err);
                }
                self.issues.push(AccessIssue::from_io(folder, &err));
            }
        }
    }
}

impl<F: FolderSource, S: FolderSelector> Iterator for FolderWalk<'_, F, S> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        if !self.started {
            self.started = true;
            let root = self.root.clone();
            self.descend(&root, 0);
        }

        loop {
            let frame = self.stack.last_mut()?;
            let depth = frame.depth;
            let Some(folder) = frame.folders.next() else {
                self.stack.pop();
                continue;
            };

            trace!("Processing folder '{}' (Depth = {})", folder.display(), depth);

            let exclusion = match self.rules.enforce(&folder) {
                Ok(enforced) => {
                    self.issues
                        .extend(enforced.faults.iter().map(AccessIssue::from_rule));
                    enforced.exclusion
                }
                Err(err) => {
                    warn!("Skipping {}: exclusion rules failed", folder.display());
                    self.issues
                        .extend(err.faults.iter().map(AccessIssue::from_rule));
                    continue;
                }
            };

            if !exclusion.excludes_self() && self.selector.select_folder(&folder) {
                trace!("Visiting folder {} [{}]", folder.display(), depth);
                return Some(folder);
            }

            if !exclusion.excludes_children() {
                trace!("Calling children of folder {} [{}]", folder.display(), depth);
                self.descend(&folder, depth + 1);
            }
        }
    }
}

/// Case-insensitive by name, exact name as the tie-break.
fn sort_folders(folders: &mut [PathBuf]) {
    folders.sort_by_cached_key(|folder| {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (name.to_lowercase(), name)
    });
}
