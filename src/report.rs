//! Console rendering of traversal information.

use colored::Colorize;
use std::io::{self, Write};
use std::path::Path;

use crate::issues::AccessIssue;

const MAX_MESSAGE_WIDTH: usize = 60;

/// Print the resolved root folder.
pub fn print_base_folder<W: Write>(out: &mut W, root: &Path) -> io::Result<()> {
    writeln!(out, "Base folder : {}", root.display().to_string().yellow())?;
    writeln!(out)
}

/// Print the summary of folders that could not be accessed.
pub fn print_access_issues<W: Write>(out: &mut W, issues: &[AccessIssue]) -> io::Result<()> {
    writeln!(out)?;

    if issues.is_empty() {
        return writeln!(
            out,
            "{}",
            "No folders reported an access problem, however on deletion subfolders may".cyan()
        );
    }

    writeln!(out, "{}", "The following locations reported an access problem".cyan())?;
    writeln!(out)?;
    for line in format_issue_table(issues) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Render issues as a two column table: category and location.
pub fn format_issue_table(issues: &[AccessIssue]) -> Vec<String> {
    let width = issues
        .iter()
        .map(|issue| issue.category().len())
        .chain(std::iter::once("Error".len()))
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(issues.len() + 2);
    lines.push(format!("{:<width$}  Location", "Error", width = width));
    lines.push(format!("{}  {}", "-".repeat(width), "-".repeat("Location".len())));

    for issue in issues {
        lines.push(format!(
            "{:<width$}  {} ({})",
            issue.category(),
            issue.folder().display(),
            truncate_name_with_suffix(issue.message(), MAX_MESSAGE_WIDTH),
            width = width
        ));
    }

    lines
}

/// Truncate `name` with a "..." suffix if it exceeds `max_width`
fn truncate_name_with_suffix(name: &str, max_width: usize) -> String {
    if name.chars().count() <= max_width {
        name.to_string()
    } else if max_width >= 3 {
        let kept: String = name.chars().take(max_width - 3).collect();
        format!("{}...", kept)
    } else {
        "...".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_table_alignment() {
        let issues = vec![
            AccessIssue::from_io(
                "/r/locked",
                &io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
            ),
            AccessIssue::general("/r/link", "skipped"),
        ];

        let lines = format_issue_table(&issues);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Error             Location");
        assert_eq!(lines[2], "PermissionDenied  /r/locked (access denied)");
        assert_eq!(lines[3], "General           /r/link (skipped)");
    }

    #[test]
    fn test_access_summary_is_written_to_output() {
        let mut out = Vec::new();
        print_access_issues(&mut out, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No folders reported an access problem"));

        let mut out = Vec::new();
        print_access_issues(&mut out, &[AccessIssue::general("/r/link", "skipped")]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("The following locations reported an access problem"));
        assert!(text.contains("/r/link (skipped)"));
    }

    #[test]
    fn test_truncate_name_with_suffix() {
        assert_eq!(truncate_name_with_suffix("short", 10), "short");
        assert_eq!(truncate_name_with_suffix("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_name_with_suffix("a-much-longer-name", 10), "a-much-...");
        assert_eq!(truncate_name_with_suffix("abc", 2), "...");
    }
}
