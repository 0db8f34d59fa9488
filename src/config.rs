//! Remapping configuration.
//!
//! [`RemapConfig`] collects everything that varies between embedding hosts: whether final names
//! are already authoritative, which namespaces may be touched, and which secondary mapping
//! channel to consult when they are not.

use strum::Display;

/// Prefixes of the internal names covered by the bundled mapping data.
pub const DEFAULT_SCOPE_PREFIXES: [&str; 2] = ["net/minecraft", "com/mojang"];

/// Key of the host channel consulted in [`TranslationMode::HostDelegated`] mode.
pub const DEFAULT_CHANNEL: &str = "srg";

/// How the lookup service finishes a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TranslationMode {
    /// Final names are what the runtime uses; the composite table is the last step.
    #[strum(serialize = "baked")]
    Baked,
    /// The runtime uses yet another naming scheme, reachable through a host channel.
    #[strum(serialize = "host-delegated")]
    HostDelegated,
}

/// Configuration for a remapping environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapConfig {
    /// Whether translations are final or handed on to a host channel
    pub mode: TranslationMode,
    /// Internal-name prefixes eligible for remapping
    pub scope_prefixes: Vec<String>,
    /// Key of the host channel used in host-delegated mode
    pub channel: String,
    /// Naming domain the translated names come from
    pub source_domain: String,
    /// Naming domain the translated names are expressed in
    pub target_domain: String,
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl RemapConfig {
    /// Configuration for a production runtime, where final names are authoritative.
    #[must_use]
    pub fn production() -> Self {
        Self {
            mode: TranslationMode::Baked,
            scope_prefixes: DEFAULT_SCOPE_PREFIXES.iter().map(|p| (*p).to_string()).collect(),
            channel: DEFAULT_CHANNEL.to_string(),
            source_domain: "tiny".to_string(),
            target_domain: "mcp".to_string(),
        }
    }

    /// Configuration for a development runtime, where the host translates final names further.
    #[must_use]
    pub fn development() -> Self {
        Self {
            mode: TranslationMode::HostDelegated,
            ..Self::production()
        }
    }

    /// Replace the translation mode.
    #[must_use]
    pub fn with_mode(mut self, mode: TranslationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the scope prefixes.
    #[must_use]
    pub fn with_scope<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the host channel key.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }
}
