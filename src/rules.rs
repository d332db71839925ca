//! Exclusion decisions and the individual rules that produce them.

use globset::{GlobBuilder, GlobMatcher};
use std::fmt;
use std::fs;
use std::io;
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::error::Error;

/// Pruning decision for a single folder.
///
/// Two independent flags: exclude the folder itself from selection, and
/// exclude its children from traversal. Decisions combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Exclusion(u8);

impl Exclusion {
    pub const NONE: Exclusion = Exclusion(0);
    pub const SELF: Exclusion = Exclusion(1);
    pub const CHILDREN: Exclusion = Exclusion(2);
    pub const SELF_AND_CHILDREN: Exclusion = Exclusion(3);

    /// The folder must never be yielded as a target.
    pub fn excludes_self(self) -> bool {
        self.0 & Self::SELF.0 != 0
    }

    /// The folder's subdirectories must never be enumerated.
    pub fn excludes_children(self) -> bool {
        self.0 & Self::CHILDREN.0 != 0
    }
}

impl BitOr for Exclusion {
    type Output = Exclusion;

    fn bitor(self, rhs: Exclusion) -> Exclusion {
        Exclusion(self.0 | rhs.0)
    }
}

impl BitOrAssign for Exclusion {
    fn bitor_assign(&mut self, rhs: Exclusion) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::NONE => "none",
            Self::SELF => "self",
            Self::CHILDREN => "children",
            _ => "both",
        };
        f.write_str(name)
    }
}

impl FromStr for Exclusion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::NONE),
            "self" => Ok(Self::SELF),
            "children" => Ok(Self::CHILDREN),
            "both" | "self-and-children" => Ok(Self::SELF_AND_CHILDREN),
            other => Err(format!(
                "Invalid exclusion '{}'. Expected one of: none, self, children, both",
                other
            )),
        }
    }
}

/// A rule failed to classify a folder.
#[derive(Debug, thiserror::Error)]
#[error("{rule} rule failed for '{}': {source}", folder.display())]
pub struct RuleError {
    pub rule: &'static str,
    pub folder: PathBuf,
    #[source]
    pub source: io::Error,
}

/// A single exclusion predicate.
///
/// Rules hold only the configuration they were built with, so each one can be
/// evaluated in isolation against any path.
#[derive(Debug, Clone)]
pub enum ExclusionRule {
    /// Protects every ancestor of `protected` (usually the directory the
    /// program runs from). Only the folder itself is excluded; its children
    /// may still lead somewhere else.
    AncestorPath { protected: PathBuf },
    /// Folders whose name starts with `.`.
    DotFolders,
    /// Folders carrying the platform "hidden" attribute.
    HiddenFolders,
    /// Symbolic links and other reparse points.
    SymbolicLinks,
    /// Folders with the given name (case-insensitive), e.g. `.git`.
    Subtree { name: String },
    /// Folders whose full path matches a glob.
    Glob {
        pattern: String,
        matcher: GlobMatcher,
    },
}

impl ExclusionRule {
    pub fn ancestor_path(protected: impl Into<PathBuf>) -> Self {
        Self::AncestorPath {
            protected: protected.into(),
        }
    }

    pub fn subtree(name: impl Into<String>) -> Self {
        Self::Subtree { name: name.into() }
    }

    /// Compile a glob rule. `*` and `?` stay within one path segment, `**`
    /// crosses segments.
    pub fn glob(pattern: &str) -> Result<Self, Error> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| Error::InvalidGlob {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();

        Ok(Self::Glob {
            pattern: pattern.to_string(),
            matcher,
        })
    }

    /// Short name used in logs and access issues
    pub fn name(&self) -> &'static str {
        match self {
            Self::AncestorPath { .. } => "ancestor-path",
            Self::DotFolders => "dot-folders",
            Self::HiddenFolders => "hidden-folders",
            Self::SymbolicLinks => "symbolic-links",
            Self::Subtree { .. } => "subtree",
            Self::Glob { .. } => "glob",
        }
    }

    /// Classify `folder`.
    pub fn evaluate(&self, folder: &Path) -> Result<Exclusion, RuleError> {
        let excluded = match self {
            Self::AncestorPath { protected } => {
                return Ok(if is_ancestor_of(folder, protected) {
                    Exclusion::SELF
                } else {
                    Exclusion::NONE
                });
            }
            Self::DotFolders => is_dot_folder(folder),
            Self::HiddenFolders => is_hidden(folder).map_err(|source| RuleError {
                rule: self.name(),
                folder: folder.to_path_buf(),
                source,
            })?,
            Self::SymbolicLinks => is_link_or_unknown(folder),
            Self::Subtree { name } => folder_name(folder)
                .map(|n| n.to_lowercase() == name.to_lowercase())
                .unwrap_or(false),
            Self::Glob { matcher, .. } => matcher.is_match(folder),
        };

        Ok(if excluded {
            Exclusion::SELF_AND_CHILDREN
        } else {
            Exclusion::NONE
        })
    }
}

fn folder_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn is_dot_folder(path: &Path) -> bool {
    folder_name(path).is_some_and(|name| name.len() > 1 && name.starts_with('.'))
}

/// Component-wise, case-insensitive "is `folder` `protected` or one of its parents".
fn is_ancestor_of(folder: &Path, protected: &Path) -> bool {
    let folder = PathBuf::from(folder.to_string_lossy().to_lowercase());
    let protected = PathBuf::from(protected.to_string_lossy().to_lowercase());
    protected.starts_with(folder)
}

#[cfg(windows)]
fn is_hidden(path: &Path) -> io::Result<bool> {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    let metadata = fs::symlink_metadata(path)?;
    Ok(metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
}

// Unix has no hidden attribute; a leading dot is the convention.
#[cfg(not(windows))]
fn is_hidden(path: &Path) -> io::Result<bool> {
    fs::symlink_metadata(path)?;
    Ok(is_dot_folder(path))
}

/// Probe failures count as links so an unreadable entry is never descended into.
fn is_link_or_unknown(path: &Path) -> bool {
    match fs::symlink_metadata(path) {
        Ok(metadata) => metadata.file_type().is_symlink() || is_reparse_point(&metadata),
        Err(err) => {
            debug!(
                "Found a {:?} whilst examining {}, treating it as a link",
                err.kind(),
                path.display()
            );
            true
        }
    }
}

#[cfg(windows)]
fn is_reparse_point(metadata: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;

    metadata.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0
}

#[cfg(not(windows))]
fn is_reparse_point(_metadata: &fs::Metadata) -> bool {
    false
}
