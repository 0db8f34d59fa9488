//! Load-time transformation entry points.
//!
//! A host builds one [`RemapEnvironment`] through the [`EnvironmentLoader`], wraps it in a
//! [`RemapTransformer`] together with the set of class names it wants rewritten, and then hands
//! class bytes to [`RemapTransformer::transform`] as they are loaded, or a whole batch to
//! [`RemapTransformer::transform_all`].
//!
//! # Key Components
//!
//! - [`EnvironmentLoader`] - Builder that reads and joins the mapping files
//! - [`RemapEnvironment`] - Immutable table, lookup service and scope, shared across threads
//! - [`TargetSet`] - The internal names of the units to rewrite
//! - [`RemapTransformer`] - Per-unit and batch transformation
//! - [`result::TransformReport`] - Per-unit outcomes of a batch
//!
//! # Usage Examples
//!
//! ```rust
//! use crossmap::{
//!     classfile::{flags::MemberAccessFlags, ClassUnit},
//!     pipeline::{EnvironmentLoader, RemapTransformer, TargetSet},
//! };
//!
//! let environment = EnvironmentLoader::new()
//!     .intermediate_bytes("mappings.tiny", b"v1\tofficial\tintermediary\nCLASS\ta\tnet/minecraft/class_1\n".to_vec())
//!     .final_bytes("joined.tsrg", b"a net/minecraft/Entity\n".to_vec())
//!     .build();
//!
//! let unit = ClassUnit::new("net/minecraft/class_1", Some("java/lang/Object"))?.encode()?;
//! let targets = TargetSet::from_class_files([&unit]);
//! let transformer = RemapTransformer::new(environment, targets);
//!
//! let rewritten = transformer.transform("net/minecraft/class_1", &unit)?.expect("is a target");
//! assert_eq!(ClassUnit::peek_name(&rewritten)?, "net/minecraft/Entity");
//! assert_eq!(transformer.transform("java/lang/String", &unit)?, None);
//! # Ok::<(), crossmap::Error>(())
//! ```

pub mod loader;
pub mod result;

pub use loader::EnvironmentLoader;

use std::{collections::HashSet, sync::Arc};

use rayon::prelude::*;
use tracing::{debug, error, warn};

use crate::{
    classfile::ClassUnit,
    config::RemapConfig,
    lookup::{HostChannels, LookupService},
    mappings::{table::CompositeTable, MappingRecord},
    pipeline::result::{TransformReport, UnitOutcome},
    remapper::{
        rewriter::{ClassRewriter, RewriteStats},
        scope::ScopeFilter,
        ScopedRemapper,
    },
    Error, Result,
};

/// Everything needed to rewrite class units, built once and shared read-only.
#[derive(Debug)]
pub struct RemapEnvironment {
    config: RemapConfig,
    table: Arc<CompositeTable>,
    lookup: Arc<LookupService>,
    scope: ScopeFilter,
}

impl RemapEnvironment {
    /// Build an environment around an already composed table.
    #[must_use]
    pub fn new(table: Arc<CompositeTable>, config: RemapConfig, channels: Option<HostChannels>) -> Self {
        let lookup = Arc::new(LookupService::new(Arc::clone(&table), &config, channels));
        let scope = ScopeFilter::from_config(&config);
        RemapEnvironment {
            config,
            table,
            lookup,
            scope,
        }
    }

    /// Join intermediate and final records and build an environment around the result.
    #[must_use]
    pub fn from_records(
        intermediate: &[MappingRecord],
        finals: &[MappingRecord],
        config: RemapConfig,
        channels: Option<HostChannels>,
    ) -> Self {
        let table = Arc::new(CompositeTable::build(intermediate, finals));
        Self::new(table, config, channels)
    }

    /// The configuration the environment was built with.
    #[must_use]
    pub fn config(&self) -> &RemapConfig {
        &self.config
    }

    /// The composite table.
    #[must_use]
    pub fn table(&self) -> &Arc<CompositeTable> {
        &self.table
    }

    /// The lookup service, for hosts that want to offer it as a naming service.
    #[must_use]
    pub fn lookup(&self) -> &Arc<LookupService> {
        &self.lookup
    }

    /// The scope filter.
    #[must_use]
    pub fn scope(&self) -> &ScopeFilter {
        &self.scope
    }

    /// A [`crate::remapper::NameMapper`] over this environment.
    #[must_use]
    pub fn remapper(&self) -> ScopedRemapper<'_> {
        ScopedRemapper::new(&self.lookup, &self.scope)
    }

    /// Rewrite a decoded unit in place.
    ///
    /// # Errors
    /// See [`ClassRewriter::rewrite`].
    pub fn rewrite(&self, unit: &mut ClassUnit) -> Result<RewriteStats> {
        let remapper = self.remapper();
        ClassRewriter::new(&remapper).rewrite(unit)
    }

    /// Decode, rewrite and encode one class file.
    ///
    /// # Errors
    /// Any decode, rewrite or encode error for this unit.
    pub fn rewrite_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut unit = ClassUnit::decode(data)?;
        self.rewrite(&mut unit)?;
        unit.encode()
    }
}

/// The internal names of the class units a transformer rewrites.
///
/// Names may be given in internal (`a/b/C`) or binary (`a.b.C`) form; both are stored and
/// matched in internal form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    names: HashSet<String>,
}

impl TargetSet {
    /// An empty set; nothing is a target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from class names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(name.as_ref());
        }
        set
    }

    /// Build a set from the names of class files.
    ///
    /// Files whose name cannot be read are logged and left out.
    pub fn from_class_files<I, B>(files: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut set = Self::new();
        for file in files {
            match ClassUnit::peek_name(file.as_ref()) {
                Ok(name) => {
                    set.insert(&name);
                }
                Err(e) => warn!(error = %e, "Skipping class file without a readable name"),
            }
        }
        set
    }

    /// Add a class name.
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.replace('.', "/"))
    }

    /// Returns `true` if `name` is a target.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        if name.contains('.') {
            self.names.contains(&name.replace('.', "/"))
        } else {
            self.names.contains(name)
        }
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if there are no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over the targets in internal form.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Rewrites the target class units of a [`RemapEnvironment`].
///
/// The transformer is `Send + Sync`; hosts may call [`RemapTransformer::transform`] from any
/// number of class loading threads.
#[derive(Debug, Clone)]
pub struct RemapTransformer {
    environment: Arc<RemapEnvironment>,
    targets: TargetSet,
}

impl RemapTransformer {
    /// Create a transformer for `targets`.
    pub fn new(environment: impl Into<Arc<RemapEnvironment>>, targets: TargetSet) -> Self {
        RemapTransformer {
            environment: environment.into(),
            targets,
        }
    }

    /// The environment used for rewriting.
    #[must_use]
    pub fn environment(&self) -> &Arc<RemapEnvironment> {
        &self.environment
    }

    /// The units this transformer rewrites.
    #[must_use]
    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    /// Transform one unit.
    ///
    /// Returns `Ok(None)` if `name` is not a target, in which case the host passes the bytes on
    /// unchanged.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnitFailed`] naming the unit if it is a target but cannot be
    /// decoded, rewritten or encoded.
    pub fn transform(&self, name: &str, data: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.targets.contains(name) {
            return Ok(None);
        }

        debug!(name, "Transforming");
        self.environment
            .rewrite_bytes(data)
            .map(Some)
            .map_err(|e| Error::UnitFailed {
                unit: name.to_string(),
                source: Box::new(e),
            })
    }

    /// Transform a batch of `(name, bytes)` units in parallel.
    ///
    /// Every unit is processed independently; a failing unit is recorded in the report and
    /// does not affect the others.
    pub fn transform_all<S, B>(&self, units: &[(S, B)]) -> TransformReport
    where
        S: AsRef<str> + Sync,
        B: AsRef<[u8]> + Sync,
    {
        let outcomes: Vec<(String, UnitOutcome)> = units
            .par_iter()
            .map(|(name, data)| {
                let name = name.as_ref();
                let outcome = UnitOutcome::from(self.transform(name, data.as_ref()));
                if let UnitOutcome::Failed(e) = &outcome {
                    error!(unit = name, error = %e, "Failed to transform class unit");
                }
                (name.to_string(), outcome)
            })
            .collect();

        let mut report = TransformReport::new();
        for (name, outcome) in outcomes {
            report.record(name, outcome);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mappings::SymbolKind, test::sample_unit};

    fn environment() -> RemapEnvironment {
        let table = Arc::new(CompositeTable::from_pairs([
            (SymbolKind::Class, "net/minecraft/class_1", "net/minecraft/Entity"),
            (SymbolKind::Class, "net/minecraft/class_2", "net/minecraft/Base"),
            (SymbolKind::Method, "method_1", "tick"),
            (SymbolKind::Method, "hashCode", "broken"),
            (SymbolKind::Field, "field_1", "world"),
        ]));
        RemapEnvironment::new(table, RemapConfig::production(), None)
    }

    #[test]
    fn rewrites_targets_only() {
        let bytes = sample_unit().encode().unwrap();
        let transformer = RemapTransformer::new(
            environment(),
            TargetSet::from_names(["net.minecraft.class_1"]),
        );

        assert_eq!(transformer.transform("net/minecraft/Other", &bytes).unwrap(), None);

        let rewritten = transformer
            .transform("net/minecraft/class_1", &bytes)
            .unwrap()
            .unwrap();
        let unit = ClassUnit::decode(&rewritten).unwrap();
        assert_eq!(unit.name().unwrap(), "net/minecraft/Entity");
        assert_eq!(unit.super_name().unwrap(), Some("net/minecraft/Base"));
        assert_eq!(unit.member_name(&unit.fields[0]).unwrap(), "world");
        assert_eq!(unit.member_descriptor(&unit.fields[0]).unwrap(), "Lnet/minecraft/Base;");
        assert_eq!(unit.member_name(&unit.methods[0]).unwrap(), "tick");
        // java/lang/Object is out of scope, so its hashCode stays
        let (owner, name, _) = unit
            .pool
            .iter()
            .find_map(|(index, _)| unit.pool.member_ref(index).ok())
            .unwrap();
        assert_eq!((owner, name), ("java/lang/Object", "hashCode"));
    }

    #[test]
    fn failures_name_the_unit() {
        let transformer = RemapTransformer::new(environment(), TargetSet::from_names(["a/B"]));
        let error = transformer.transform("a/B", &[0xCA, 0xFE]).unwrap_err();
        match error {
            Error::UnitFailed { unit, source } => {
                assert_eq!(unit, "a/B");
                assert!(matches!(*source, Error::OutOfBounds));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn batch_isolates_failures() {
        let good = sample_unit().encode().unwrap();
        let mut truncated = good.clone();
        truncated.truncate(good.len() / 2);

        let targets = TargetSet::from_names(["net/minecraft/class_1", "net/minecraft/class_9"]);
        let transformer = RemapTransformer::new(environment(), targets);
        let report = transformer.transform_all(&[
            ("net/minecraft/class_1", good.clone()),
            ("net/minecraft/class_9", truncated),
            ("java/lang/String", good),
        ]);

        assert_eq!(report.success_count(), 1);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.outcomes[0].0, "net/minecraft/class_1");
        assert_eq!(
            report.failures().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["net/minecraft/class_9"]
        );
    }

    #[test]
    fn target_set() {
        let bytes = sample_unit().encode().unwrap();
        let targets = TargetSet::from_class_files([bytes.as_slice(), &[0u8, 1, 2][..]]);
        assert_eq!(targets.len(), 1);
        assert!(targets.contains("net/minecraft/class_1"));
        assert!(targets.contains("net.minecraft.class_1"));
        assert!(!targets.contains("net/minecraft/class_2"));
        assert_eq!(targets.iter().collect::<Vec<_>>(), vec!["net/minecraft/class_1"]);
        assert!(TargetSet::new().is_empty());
    }
}
