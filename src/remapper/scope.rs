//! Namespace guard for remapping.

use crate::config::RemapConfig;

/// Decides which internal names are eligible for remapping.
///
/// A name is eligible if it starts with one of the configured prefixes. Platform and library
/// types (`java/`, `org/`, ...) fall outside every prefix and are never translated, even if a
/// mapping table happens to contain a matching entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
    prefixes: Vec<String>,
}

impl ScopeFilter {
    /// Create a filter from a list of internal-name prefixes.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScopeFilter {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a filter from the prefixes of a configuration.
    #[must_use]
    pub fn from_config(config: &RemapConfig) -> Self {
        Self::new(config.scope_prefixes.iter().cloned())
    }

    /// Returns `true` if `name` starts with any configured prefix.
    #[must_use]
    pub fn is_eligible(&self, name: &str) -> bool {
        self.prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// The configured prefixes.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl Default for ScopeFilter {
    fn default() -> Self {
        Self::from_config(&RemapConfig::default())
    }
}
