//! Build Cleaner - locate and remove build output folders
//!
//! Build Cleaner walks a directory tree looking for build output folders such
//! as `bin`, `obj` and `testresults`, and deletes them (or just lists them).
//! A folder is only a target when a selector confirms it really is build output,
//! e.g. because its parent holds a project file.
//!
//! ## Architecture
//!
//! - [`rules`]: single exclusion predicates (dot folders, symbolic links,
//!   named subtrees, globs, ancestors of the running program)
//! - [`exclusions`]: the ordered rule set, combined with bitwise OR and tolerant
//!   of failing rules
//! - [`locator`]: the depth-first walk deciding, per folder, whether to yield it,
//!   descend into it or prune it
//! - [`selector`] and [`size`]: collaborators consumed by the commands
//! - [`commands`]: `delete` and `whatif`

pub mod commands;
pub mod config;
pub mod error;
pub mod exclusions;
pub mod issues;
pub mod locator;
pub mod logging;
pub mod report;
pub mod rules;
pub mod selector;
pub mod size;

// Re-export commonly used items
pub use commands::{run, CommandKind, CommandSettings, CommandSummary};
pub use config::Config;
pub use error::Error;
pub use exclusions::{ExclusionRules, RuleFaultPolicy};
pub use issues::AccessIssue;
pub use locator::{
    resolve_root, DiskFolders, FolderSource, FolderWalk, Options, RecursiveFolderLocator,
    RootAnchor,
};
pub use rules::{Exclusion, ExclusionRule};
pub use selector::{BuildFolderSelector, FolderSelector};
pub use size::folder_size;
