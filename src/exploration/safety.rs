//! Interaction safety rules for the exploration pass.

use anyhow::Context;
use log::{info, warn};
use serde::Deserialize;
use std::path::Path;

use crate::page_extractor::Element;

/// Terms that keep an element from being touched when no safety file exists.
pub const DEFAULT_BLACKLIST: &[&str] = &[
    "delete", "remove", "logout", "sign out", "删除", "注销", "退出",
];

pub const DEFAULT_MAX_INTERACTIONS: usize = 1;

/// On-disk form: `{ blacklist: [..], max_depth: N }`.
#[derive(Debug, Default, Deserialize)]
struct SafetyFile {
    #[serde(default)]
    blacklist: Vec<String>,
    #[serde(default)]
    max_depth: Option<usize>,
}

/// Blacklist of lower-cased terms plus an interaction budget per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyPolicy {
    blacklist: Vec<String>,
    max_interactions: usize,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_BLACKLIST.iter().map(|s| (*s).to_string()),
            DEFAULT_MAX_INTERACTIONS,
        )
    }
}

impl SafetyPolicy {
    /// Build a policy; terms are lower-cased and empty ones dropped.
    #[must_use]
    pub fn new(blacklist: impl IntoIterator<Item = String>, max_interactions: usize) -> Self {
        Self {
            blacklist: blacklist
                .into_iter()
                .map(|term| term.trim().to_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
            max_interactions,
        }
    }

    /// Load the policy file at `path`.
    ///
    /// A missing file gives the built-in defaults. A file without a
    /// `blacklist` key blocks nothing. An unreadable or malformed file is
    /// logged and the defaults are used.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(
                target: "sitescout::explore",
                "{} not found, using default safety rules",
                path.display()
            );
            return Self::default();
        }
        match Self::parse_file(path) {
            Ok(policy) => {
                info!(
                    target: "sitescout::explore",
                    "Loaded safety rules from {} ({} terms, max {} interactions)",
                    path.display(),
                    policy.blacklist.len(),
                    policy.max_interactions
                );
                policy
            }
            Err(e) => {
                warn!(target: "sitescout::explore", "Error loading safety config: {e:#}");
                Self::default()
            }
        }
    }

    fn parse_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parse a policy document. An empty document blocks nothing.
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML or a wrongly typed field.
    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let file: SafetyFile = if raw.trim().is_empty() {
            SafetyFile::default()
        } else {
            serde_yaml::from_str::<Option<SafetyFile>>(raw)?.unwrap_or_default()
        };
        Ok(Self::new(
            file.blacklist,
            file.max_depth.unwrap_or(DEFAULT_MAX_INTERACTIONS),
        ))
    }

    /// `false` when the element's text or name contains a blacklisted term,
    /// ignoring case.
    #[must_use]
    pub fn is_safe(&self, element: &Element) -> bool {
        self.blocking_term(element).is_none()
    }

    /// The first blacklisted term found in the element's text or name.
    #[must_use]
    pub fn blocking_term(&self, element: &Element) -> Option<&str> {
        let text = element.text.to_lowercase();
        let name = element.name.to_lowercase();
        self.blacklist
            .iter()
            .find(|term| text.contains(term.as_str()) || name.contains(term.as_str()))
            .map(String::as_str)
    }

    #[must_use]
    pub fn max_interactions(&self) -> usize {
        self.max_interactions
    }

    #[must_use]
    pub fn blacklist(&self) -> &[String] {
        &self.blacklist
    }
}
