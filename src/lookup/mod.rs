//! Domain-qualified name lookup with a defined fallback chain.
//!
//! [`LookupService::translate`] answers "what is this symbol called in the target domain":
//!
//! 1. look the name up in the [`CompositeTable`] map for its kind,
//! 2. in [`TranslationMode::Baked`] mode return the hit, or the input on a miss,
//! 3. in [`TranslationMode::HostDelegated`] mode hand the hit (or the input) to the host channel
//!    registered under the configured key, falling back to step 2 when none is registered.
//!
//! `translate` never fails. Unknown symbols come back unchanged so that code not covered by any
//! mapping passes through the rewriter untouched.
//!
//! # Usage Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use crossmap::{
//!     lookup::{HostChannels, LookupService},
//!     mappings::{table::CompositeTable, SymbolKind},
//!     RemapConfig,
//! };
//!
//! let table = Arc::new(CompositeTable::from_pairs([(SymbolKind::Method, "bar", "baz")]));
//! let channels = HostChannels::new();
//! channels.register("srg", |_kind, name: &str| name.to_uppercase());
//!
//! let baked = LookupService::new(table.clone(), &RemapConfig::production(), None);
//! assert_eq!(baked.translate(SymbolKind::Method, "bar"), "baz");
//! assert_eq!(baked.translate(SymbolKind::Method, "unknown"), "unknown");
//!
//! let delegated = LookupService::new(table, &RemapConfig::development(), Some(channels));
//! assert_eq!(delegated.translate(SymbolKind::Method, "bar"), "BAZ");
//! ```

use std::{borrow::Cow, fmt, sync::Arc};

use dashmap::DashMap;
use tracing::trace;

use crate::{
    config::{RemapConfig, TranslationMode},
    mappings::{table::CompositeTable, SymbolKind},
};

/// A translation function `(kind, name) -> name`, as exchanged with the host.
pub type NamingFunction = Arc<dyn Fn(SymbolKind, &str) -> String + Send + Sync>;

/// Registry of secondary mapping channels supplied by the embedding host.
///
/// Cloning is cheap and clones share the same registry, so a host can keep a handle and
/// register channels after the lookup service has been built.
#[derive(Clone, Default)]
pub struct HostChannels {
    channels: Arc<DashMap<String, NamingFunction>>,
}

impl HostChannels {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the channel `key`.
    pub fn register<F>(&self, key: impl Into<String>, function: F)
    where
        F: Fn(SymbolKind, &str) -> String + Send + Sync + 'static,
    {
        self.channels.insert(key.into(), Arc::new(function));
    }

    /// Remove the channel `key`, returning whether it was present.
    pub fn unregister(&self, key: &str) -> bool {
        self.channels.remove(key).is_some()
    }

    /// The channel registered under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<NamingFunction> {
        // Clone out of the map so no shard lock is held while host code runs
        self.channels.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` if no channel is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl fmt::Debug for HostChannels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.channels.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("HostChannels").field("keys", &keys).finish()
    }
}

/// Name translation over a [`CompositeTable`] and an optional host channel.
///
/// The service is `Send + Sync`; rewriter threads share one instance without locking.
#[derive(Debug, Clone)]
pub struct LookupService {
    table: Arc<CompositeTable>,
    mode: TranslationMode,
    channel: String,
    channels: Option<HostChannels>,
    source_domain: String,
    target_domain: String,
}

impl LookupService {
    /// Create a lookup service.
    ///
    /// `channels` is only consulted in [`TranslationMode::HostDelegated`] mode.
    #[must_use]
    pub fn new(
        table: Arc<CompositeTable>,
        config: &RemapConfig,
        channels: Option<HostChannels>,
    ) -> Self {
        LookupService {
            table,
            mode: config.mode,
            channel: config.channel.clone(),
            channels,
            source_domain: config.source_domain.clone(),
            target_domain: config.target_domain.clone(),
        }
    }

    /// Translate `name` of the given kind into the target domain.
    ///
    /// Total: returns `name` itself when nothing along the fallback chain knows it.
    pub fn translate<'a>(&'a self, kind: SymbolKind, name: &'a str) -> Cow<'a, str> {
        trace!(name, %kind, "Got name");

        let candidate = self.table.get(kind, name).unwrap_or(name);
        match self.mode {
            TranslationMode::Baked => Cow::Borrowed(candidate),
            TranslationMode::HostDelegated => match self.delegate() {
                Some(delegate) => Cow::Owned(delegate(kind, candidate)),
                None => Cow::Borrowed(candidate),
            },
        }
    }

    fn delegate(&self) -> Option<NamingFunction> {
        self.channels.as_ref()?.get(&self.channel)
    }

    /// The table this service reads from.
    #[must_use]
    pub fn table(&self) -> &Arc<CompositeTable> {
        &self.table
    }

    /// The active translation mode.
    #[must_use]
    pub fn mode(&self) -> TranslationMode {
        self.mode
    }

    /// Name under which this service is offered to hosts.
    #[must_use]
    pub fn mapping_name(&self) -> &'static str {
        "tinytosrg"
    }

    /// Version of the naming service contract.
    #[must_use]
    pub fn mapping_version(&self) -> &'static str {
        "1"
    }

    /// The `(source, target)` naming domains this service translates between.
    #[must_use]
    pub fn understanding(&self) -> (&str, &str) {
        (&self.source_domain, &self.target_domain)
    }

    /// A shareable closure over [`LookupService::translate`], for registration with a host.
    #[must_use]
    pub fn naming_function(self: &Arc<Self>) -> NamingFunction {
        let service = Arc::clone(self);
        Arc::new(move |kind: SymbolKind, name: &str| -> String {
            service.translate(kind, name).into_owned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use strum::IntoEnumIterator;

    fn table() -> Arc<CompositeTable> {
        Arc::new(CompositeTable::from_pairs([
            (SymbolKind::Class, "net/minecraft/class_1", "net/minecraft/A"),
            (SymbolKind::Method, "method_1", "func_1"),
            (SymbolKind::Field, "field_1", "field_a"),
        ]))
    }

    #[test]
    fn baked_hits_and_misses() {
        let service = LookupService::new(table(), &RemapConfig::production(), None);
        assert_eq!(service.translate(SymbolKind::Class, "net/minecraft/class_1"), "net/minecraft/A");
        assert_eq!(service.translate(SymbolKind::Method, "method_1"), "func_1");
        assert_eq!(service.translate(SymbolKind::Field, "field_1"), "field_a");
        // Kinds do not bleed into each other
        assert_eq!(service.translate(SymbolKind::Field, "method_1"), "method_1");
    }

    #[test]
    fn identity_fallback() {
        let service = LookupService::new(table(), &RemapConfig::development(), None);
        for kind in SymbolKind::iter() {
            for name in ["unknown", "", "net/minecraft/Nope", "method_2"] {
                assert_eq!(service.translate(kind, name), name);
            }
        }
    }

    #[test]
    fn baked_mode_ignores_channels() {
        let channels = HostChannels::new();
        channels.register("srg", |_, _: &str| "delegated".to_string());

        let service = LookupService::new(table(), &RemapConfig::production(), Some(channels));
        assert_eq!(service.translate(SymbolKind::Method, "method_1"), "func_1");
        assert_eq!(service.translate(SymbolKind::Method, "other"), "other");
    }

    #[test]
    fn delegated_receives_candidate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let channels = HostChannels::new();
        channels.register("srg", move |kind, name: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            format!("{kind}:{name}")
        });

        let service = LookupService::new(table(), &RemapConfig::development(), Some(channels));
        assert_eq!(service.translate(SymbolKind::Method, "method_1"), "Method:func_1");
        assert_eq!(service.translate(SymbolKind::Field, "unknown"), "Field:unknown");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn delegated_uses_configured_channel() {
        let channels = HostChannels::new();
        channels.register("srg", |_, _: &str| "wrong".to_string());

        let config = RemapConfig::development().with_channel("named");
        let service = LookupService::new(table(), &config, Some(channels.clone()));
        assert_eq!(service.translate(SymbolKind::Method, "method_1"), "func_1");

        // Registration after construction is visible through the shared registry
        channels.register("named", |_, name: &str| format!("{name}_named"));
        assert_eq!(service.translate(SymbolKind::Method, "method_1"), "func_1_named");

        assert!(channels.unregister("named"));
        assert!(!channels.unregister("named"));
        assert_eq!(service.translate(SymbolKind::Method, "method_1"), "func_1");
    }

    #[test]
    fn channel_registry() {
        let channels = HostChannels::new();
        assert!(channels.is_empty());
        channels.register("a", |_, n: &str| n.to_string());
        assert_eq!(channels.len(), 1);
        assert!(channels.get("a").is_some());
        assert!(channels.get("b").is_none());
        assert!(format!("{channels:?}").contains("\"a\""));
    }

    #[test]
    fn naming_service_metadata() {
        let service = Arc::new(LookupService::new(table(), &RemapConfig::production(), None));
        assert_eq!(service.mapping_name(), "tinytosrg");
        assert_eq!(service.mapping_version(), "1");
        assert_eq!(service.understanding(), ("tiny", "mcp"));
        assert_eq!(service.mode(), TranslationMode::Baked);
        assert_eq!(service.table().len(SymbolKind::Class), 1);

        let function = service.naming_function();
        assert_eq!(function(SymbolKind::Field, "field_1"), "field_a");
        assert_eq!(function(SymbolKind::Field, "x"), "x");
    }

    #[test]
    fn concurrent_reads() {
        let service = Arc::new(LookupService::new(table(), &RemapConfig::production(), None));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        assert_eq!(service.translate(SymbolKind::Method, "method_1"), "func_1");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
