//! Project classification rules.
//!
//! Window titles are mapped to user-defined projects by ordered regular
//! expressions. Projects are tried in `projectSequence` order and, within a
//! project, patterns in list order; the first match wins. Titles matching an
//! ignore pattern leave the current project untouched.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timeline::NO_FOCUS;

/// Project reported when no rule matches.
pub const NO_PROJECT: &str = "No Project Defined";

/// The only rule document format this crate understands.
pub const RULES_FORMAT_VERSION: &str = "0.1";

/// Errors raised while loading a rule document.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The document declared a different format version, or none at all.
    #[error("unsupported rule format version: {}", .found.as_deref().unwrap_or("<missing>"))]
    UnsupportedVersion { found: Option<String> },

    /// The document is not valid JSON for the rule schema.
    #[error("failed to parse rule document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A pattern is not a valid regular expression.
    #[error("invalid pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// `projectSequence` names a project with no rules.
    #[error("project {0:?} is listed in projectSequence but has no rules")]
    UnknownProject(String),
}

/// On-disk rule definitions.
///
/// ```json
/// {
///   "formatVersion": "0.1",
///   "projects": { "Facebook": ["Facebook"], "Unsorted": [".*"] },
///   "projectSequence": ["Facebook", "Unsorted"],
///   "ignores": ["Library"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<String>,
    #[serde(default)]
    pub projects: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub project_sequence: Vec<String>,
    #[serde(default)]
    pub ignores: Vec<String>,
}

#[derive(Debug, Clone)]
struct ProjectRules {
    name: String,
    patterns: Vec<Regex>,
}

/// Compiled classification rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    projects: Vec<ProjectRules>,
    ignores: Vec<Regex>,
}

fn compile(pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

impl RuleSet {
    /// Parses and compiles a JSON rule document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RuleError> {
        let document: RuleDocument = serde_json::from_slice(bytes)?;
        Self::from_document(&document)
    }

    /// Compiles a rule document, rejecting unknown format versions.
    pub fn from_document(document: &RuleDocument) -> Result<Self, RuleError> {
        if document.format_version.as_deref() != Some(RULES_FORMAT_VERSION) {
            return Err(RuleError::UnsupportedVersion {
                found: document.format_version.clone(),
            });
        }

        let mut projects = Vec::with_capacity(document.project_sequence.len());
        for name in &document.project_sequence {
            let patterns = document
                .projects
                .get(name)
                .ok_or_else(|| RuleError::UnknownProject(name.clone()))?
                .iter()
                .map(|pattern| compile(pattern))
                .collect::<Result<Vec<_>, _>>()?;
            projects.push(ProjectRules {
                name: name.clone(),
                patterns,
            });
        }

        for name in document.projects.keys() {
            if !document.project_sequence.contains(name) {
                tracing::warn!(project = %name, "project is not in projectSequence and will never match");
            }
        }

        let ignores = document
            .ignores
            .iter()
            .map(|pattern| compile(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { projects, ignores })
    }

    /// Project names in evaluation order.
    pub fn project_order(&self) -> impl Iterator<Item = &str> {
        self.projects.iter().map(|project| project.name.as_str())
    }

    /// Number of ignore patterns.
    pub fn ignore_count(&self) -> usize {
        self.ignores.len()
    }

    /// Maps a window title to the first project with a matching pattern.
    pub fn classify(&self, title: &str) -> &str {
        if title == NO_FOCUS {
            return NO_PROJECT;
        }

        self.projects
            .iter()
            .find(|project| project.patterns.iter().any(|re| re.is_match(title)))
            .map_or(NO_PROJECT, |project| project.name.as_str())
    }

    /// Whether a title should leave project accounting untouched.
    pub fn should_ignore(&self, title: &str) -> bool {
        title != NO_FOCUS && self.ignores.iter().any(|re| re.is_match(title))
    }
}
