//! Non-fatal problems collected while walking the tree.

use std::io;
use std::path::{Path, PathBuf};

use crate::rules::RuleError;

/// A folder that could not be fully processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessIssue {
    pub folder: PathBuf,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// A caught fault, with its category (e.g. `PermissionDenied`) and message
    Fault { category: String, message: String },
    /// A descriptive message with no underlying fault
    General(String),
}

impl AccessIssue {
    pub fn from_io(folder: impl Into<PathBuf>, err: &io::Error) -> Self {
        Self {
            folder: folder.into(),
            kind: IssueKind::Fault {
                category: format!("{:?}", err.kind()),
                message: err.to_string(),
            },
        }
    }

    pub fn from_rule(err: &RuleError) -> Self {
        Self {
            folder: err.folder.clone(),
            kind: IssueKind::Fault {
                category: format!("RuleError({})", err.rule),
                message: err.source.to_string(),
            },
        }
    }

    pub fn general(folder: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            kind: IssueKind::General(message.into()),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Fault category, or `General` for plain messages.
    pub fn category(&self) -> &str {
        match &self.kind {
            IssueKind::Fault { category, .. } => category,
            IssueKind::General(_) => "General",
        }
    }

    pub fn message(&self) -> &str {
        match &self.kind {
            IssueKind::Fault { message, .. } => message,
            IssueKind::General(message) => message,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        self.category() == "PermissionDenied"
    }
}
