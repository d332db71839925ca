//! The `delete` and `whatif` commands.
//!
//! Both walk the tree the same way; they only differ in what happens to each
//! target folder once it has been confirmed.

use anyhow::Result;
use colored::Colorize;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, trace, warn};

use crate::config::Config;
use crate::exclusions::ExclusionRules;
use crate::issues::AccessIssue;
use crate::locator::{executable_directory, resolve_root, FolderSource, RecursiveFolderLocator};
use crate::report;
use crate::selector::{BuildFolderSelector, FolderSelector};
use crate::size::folder_size;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Remove every confirmed folder
    Delete,
    /// Only report what `Delete` would remove
    WhatIf,
}

impl CommandKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Delete => "Delete",
            Self::WhatIf => "WhatIf",
        }
    }

    fn explain<W: Write>(self, out: &mut W) -> io::Result<()> {
        match self {
            Self::Delete => writeln!(out, "{}", "Delete (Build Cleaner)".bold().purple()),
            Self::WhatIf => {
                writeln!(
                    out,
                    "WhatIf shows the folders that would be deleted when using the 'delete' command"
                )?;
                writeln!(out)
            }
        }
    }
}

/// Per-invocation flags shared by both commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSettings {
    pub root: String,
    pub display_access_issues: bool,
    pub display_base_folder: bool,
    pub interactive: bool,
    pub show_sizes: bool,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            display_access_issues: false,
            display_base_folder: false,
            interactive: false,
            show_sizes: false,
        }
    }
}

/// Answer to the interactive prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Delete,
    Keep,
    /// Delete this folder and every later one without asking
    DeleteAll,
    /// Stop the walk
    DeleteNothing,
}

impl Activity {
    fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "" | "y" | "yes" => Some(Self::Delete),
            "n" | "no" => Some(Self::Keep),
            "a" | "all" => Some(Self::DeleteAll),
            "none" => Some(Self::DeleteNothing),
            _ => None,
        }
    }
}

/// Ask whether `folder` should be deleted. End of input stops the walk.
pub fn prompt<R, W>(folder: &Path, input: &mut R, output: &mut W) -> io::Result<Activity>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(
            output,
            "Delete folder {}? [yes/no/all/none] (yes): ",
            folder.display().to_string().yellow()
        )?;
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            writeln!(output)?;
            return Ok(Activity::DeleteNothing);
        }

        match Activity::parse(&answer) {
            Some(activity) => return Ok(activity),
            None => writeln!(output, "{}", "Not a valid action".red())?,
        }
    }
}

/// What a command did.
#[derive(Debug, Default)]
pub struct CommandSummary {
    /// Folders acted on (or that would be, for `WhatIf`)
    pub folders: Vec<PathBuf>,
    /// Bytes found in those folders, when sizes were requested
    pub total_size: u64,
    pub issues: Vec<AccessIssue>,
}

/// Run a command against the real filesystem using stdin for prompts.
pub fn run(
    kind: CommandKind,
    settings: &CommandSettings,
    config: &Config,
) -> Result<CommandSummary> {
    let root = resolve_root(&settings.root, config.root_anchor)?;
    let rules = ExclusionRules::from_config(&config.exclude, executable_directory().ok())?;
    let selector = BuildFolderSelector::from_config(&config.folders)?;
    let locator = RecursiveFolderLocator::new(rules);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    run_with(kind, settings, &root, &locator, selector, &mut input, &mut output)
}

/// Run a command with explicit collaborators.
///
/// Prompts and every report line go to `output`.
pub fn run_with<F, S, R, W>(
    kind: CommandKind,
    settings: &CommandSettings,
    root: &Path,
    locator: &RecursiveFolderLocator<F>,
    selector: S,
    input: &mut R,
    output: &mut W,
) -> Result<CommandSummary>
where
    F: FolderSource,
    S: FolderSelector,
    R: BufRead,
    W: Write,
{
    trace!("Invoked {}", kind.name());
    kind.explain(output)?;

    let mut walk = locator.walk(root, selector)?;
    let root = walk.root().to_path_buf();

    if settings.display_base_folder {
        report::print_base_folder(output, &root)?;
    }

    let mut summary = CommandSummary::default();
    let mut delete_all = false;

    while let Some(folder) = walk.next() {
        trace!("Visiting {}", folder.display());

        let action = if delete_all || !settings.interactive {
            Activity::Delete
        } else {
            prompt(&folder, input, output).unwrap_or_else(|err| {
                error!("Unable to read answer: {}", err);
                Activity::DeleteNothing
            })
        };

        match action {
            Activity::DeleteNothing => {
                debug!("Stopped the walk at {}", folder.display());
                break;
            }
            Activity::Keep => continue,
            Activity::DeleteAll => delete_all = true,
            Activity::Delete => {}
        }

        let size = settings.show_sizes.then(|| measure(&folder));
        print_action(output, kind, &folder, size)?;
        summary.total_size += size.unwrap_or(0);

        if kind == CommandKind::Delete {
            let issues = walk.issues_mut();
            match delete_folder(&folder, &root) {
                Ok(Removal::Removed) | Ok(Removal::Missing) => {}
                Ok(Removal::SkippedLink) => {
                    issues.push(AccessIssue::general(&folder, "Skipped symbolic link"))
                }
                Ok(Removal::SkippedOutsideRoot) => issues.push(AccessIssue::general(
                    &folder,
                    "Skipped folder outside the root",
                )),
                Err(err) => {
                    error!("Unable to process folder {}: {}", folder.display(), err);
                    issues.push(AccessIssue::from_io(&folder, &err));
                }
            }
        }

        summary.folders.push(folder);
    }

    summary.issues = walk.into_issues();

    if settings.display_access_issues {
        report::print_access_issues(output, &summary.issues)?;
    }

    if settings.show_sizes {
        writeln!(output)?;
        writeln!(
            output,
            "Space recovered {}.",
            format_size(summary.total_size, BINARY).yellow()
        )?;
    }

    Ok(summary)
}

fn print_action<W: Write>(
    out: &mut W,
    kind: CommandKind,
    folder: &Path,
    size: Option<u64>,
) -> io::Result<()> {
    let tag = "[DELETE]".red();
    match size {
        Some(0) => writeln!(
            out,
            "{}: {} {} {}",
            kind.name(),
            tag,
            folder.display(),
            "empty".yellow()
        ),
        Some(bytes) => writeln!(
            out,
            "{}: {} {} {}",
            kind.name(),
            tag,
            folder.display(),
            format_size(bytes, BINARY).yellow()
        ),
        None => writeln!(out, "{}: {} {}", kind.name(), tag, folder.display()),
    }
}

/// Size a folder behind a spinner.
fn measure(folder: &Path) -> u64 {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Calculating folder size...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let size = folder_size(folder);

    spinner.finish_and_clear();
    size
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    /// Already gone
    Missing,
    SkippedLink,
    SkippedOutsideRoot,
}

/// Remove `folder` and its contents, refusing links and anything not strictly
/// beneath `root`.
pub fn delete_folder(folder: &Path, root: &Path) -> io::Result<Removal> {
    let metadata = match fs::symlink_metadata(folder) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Removal::Missing),
        Err(err) => return Err(err),
    };

    if metadata.file_type().is_symlink() {
        warn!("Skipping symbolic link: {}", folder.display());
        return Ok(Removal::SkippedLink);
    }

    if folder == root || !folder.starts_with(root) {
        warn!("Skipping unsafe folder: {}", folder.display());
        return Ok(Removal::SkippedOutsideRoot);
    }

    fs::remove_dir_all(folder)?;
    Ok(Removal::Removed)
}
