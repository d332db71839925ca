//! Errors that abort an operation before traversal starts.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::locator::RootAnchor;

/// Fatal failures surfaced directly to the caller.
///
/// Problems found while walking the tree are never reported through this type;
/// they are collected as [`AccessIssue`](crate::AccessIssue)s instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The root folder does not exist (or is not a folder).
    #[error("Unable to find directory '{}'", .0.display())]
    MissingDirectory(PathBuf),

    /// No root folder was supplied at all.
    #[error("Unspecified issue with root folder supplied")]
    EmptyRoot,

    /// The anchor used to resolve `.` could not be determined.
    #[error("Unable to resolve the {anchor} for root '.'")]
    UnresolvableAnchor {
        anchor: RootAnchor,
        #[source]
        source: io::Error,
    },

    /// A leading `~` was used but there is no home directory.
    #[error("Unable to expand '~': no home directory is available")]
    NoHomeDirectory,

    /// The root could not be made absolute.
    #[error("Unable to resolve root '{}'", path.display())]
    ResolveRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The console report could not be written.
    #[error("Unable to write report")]
    Report(#[source] io::Error),

    /// An exclusion glob failed to compile.
    #[error("Invalid exclusion glob '{pattern}'")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
