//! Desired state and hostname helpers

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Build the fully-qualified hostname used as the directory key
///
/// This is a plain `label + "." + domain` join; the provider's apex label
/// `@` therefore maps to `@.example.com`. DNS names are case-insensitive,
/// so the key is lowercased.
pub fn hostname(label: &str, domain: &str) -> String {
    format!("{}.{}", label, domain).to_ascii_lowercase()
}

/// Check a single `domain`/`label` pair
pub fn validate_host(domain: &str, label: &str) -> Result<()> {
    validate_name(domain, "Domain")?;
    validate_name(label, "Label")
}

/// Domains and the labels that should resolve to the host IP
///
/// Serialized as a JSON object, e.g. `{"example.com": ["www", "api"]}`.
/// Domains iterate in sorted order; labels keep insertion order and are
/// de-duplicated per domain. Names are stored lowercased. Deserialization
/// rejects invalid names; the builders do not, so callers that build a state
/// by hand should [`validate`](Self::validate) it (`Reconciler::sync` does).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Vec<String>>",
    into = "BTreeMap<String, Vec<String>>"
)]
pub struct DesiredState {
    domains: BTreeMap<String, Vec<String>>,
}

impl DesiredState {
    /// Create an empty desired state
    pub fn new() -> Self {
        Self::default()
    }

    /// Add labels for a domain (builder style)
    pub fn with_labels<I, S>(mut self, domain: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(domain, labels);
        self
    }

    /// Add labels for a domain, skipping ones already present
    pub fn insert<I, S>(&mut self, domain: impl Into<String>, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self
            .domains
            .entry(domain.into().to_ascii_lowercase())
            .or_default();
        for label in labels {
            let label = label.into().to_ascii_lowercase();
            if !entry.contains(&label) {
                entry.push(label);
            }
        }
    }

    /// Iterate over `(domain, labels)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.domains
            .iter()
            .map(|(domain, labels)| (domain.as_str(), labels.as_slice()))
    }

    /// Number of domains
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether no domain is configured
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Total number of labels across all domains
    pub fn label_count(&self) -> usize {
        self.domains.values().map(Vec::len).sum()
    }

    /// Validate domain and label names
    pub fn validate(&self) -> Result<()> {
        for (domain, labels) in &self.domains {
            validate_name(domain, "Domain")?;
            for label in labels {
                validate_name(label, "Label")?;
            }
        }
        Ok(())
    }

    /// Parse the compact form `example.com=www,api;example.org=@`
    pub fn parse(input: &str) -> Result<Self> {
        let mut state = Self::new();

        for entry in input.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (domain, labels) = entry.split_once('=').ok_or_else(|| {
                Error::invalid_input(format!(
                    "Expected 'domain=label[,label...]', got '{}'",
                    entry
                ))
            })?;

            let labels: Vec<&str> = labels
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();
            if labels.is_empty() {
                return Err(Error::invalid_input(format!(
                    "No labels given for domain '{}'",
                    domain.trim()
                )));
            }

            state.insert(domain.trim(), labels);
        }

        state.validate()?;
        Ok(state)
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for DesiredState {
    type Error = Error;

    fn try_from(domains: BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut state = Self::new();
        for (domain, labels) in domains {
            state.insert(domain, labels);
        }
        state.validate()?;
        Ok(state)
    }
}

impl From<DesiredState> for BTreeMap<String, Vec<String>> {
    fn from(state: DesiredState) -> Self {
        state.domains
    }
}

impl FromStr for DesiredState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn validate_name(name: &str, what: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_input(format!("{} name cannot be empty", what)));
    }
    if name.len() > 253 {
        return Err(Error::invalid_input(format!(
            "{} name too long: {} chars (max 253)",
            what,
            name.len()
        )));
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Err(Error::invalid_input(format!(
            "{} name cannot start or end with '.': '{}'",
            what, name
        )));
    }
    if name.chars().any(|c| c.is_whitespace() || c == '/' || c == '=') {
        return Err(Error::invalid_input(format!(
            "{} name contains invalid characters: '{}'",
            what, name
        )));
    }
    Ok(())
}
