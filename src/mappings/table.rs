//! The composite `intermediate -> final` translation table.
//!
//! [`CompositeTable::build`] performs a soft left join from the final (TSRG) records into the
//! intermediate (Tiny) records:
//!
//! 1. index every intermediate record by its [`PivotKey`] (later records overwrite earlier ones),
//! 2. for every final record, look up the intermediate record with the same pivot key,
//! 3. on a hit insert `intermediate name -> final name` into the map of the record's kind,
//! 4. on a miss log the orphaned pivot key and drop the record.
//!
//! The resulting table is immutable and shared by reference between the lookup service and
//! every rewriter thread.

use std::collections::HashMap;

use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::mappings::{MappingRecord, PivotKey, SymbolKind};

/// Counters collected while joining.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Number of intermediate records read
    pub intermediate_records: usize,
    /// Number of final records read
    pub final_records: usize,
    /// Final records matched to an intermediate record
    pub joined: usize,
    /// Final records without a matching intermediate record
    pub orphaned: usize,
}

/// Three `intermediate -> final` maps, one per [`SymbolKind`].
///
/// Method and field maps are keyed by member name alone. Intermediate member names are globally
/// unique in the mappings this table is built from, so no owner is needed at lookup time.
#[derive(Debug, Clone, Default)]
pub struct CompositeTable {
    classes: HashMap<String, String>,
    methods: HashMap<String, String>,
    fields: HashMap<String, String>,
    stats: JoinStats,
}

impl CompositeTable {
    /// An empty table; every lookup misses.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Join intermediate (Tiny) and final (TSRG) records on their pivot keys.
    ///
    /// Either side may be empty, in which case the table is empty as well; the join needs both
    /// sides to produce an entry.
    #[must_use]
    pub fn build(intermediate: &[MappingRecord], finals: &[MappingRecord]) -> Self {
        let mut index: HashMap<&PivotKey, &str> = HashMap::with_capacity(intermediate.len());
        for record in intermediate {
            index.insert(&record.key, record.name.as_str());
        }

        let mut table = CompositeTable {
            stats: JoinStats {
                intermediate_records: intermediate.len(),
                final_records: finals.len(),
                ..JoinStats::default()
            },
            ..CompositeTable::default()
        };

        for record in finals {
            match index.get(&record.key) {
                Some(intermediate_name) => {
                    table
                        .map_mut(record.kind())
                        .insert((*intermediate_name).to_string(), record.name.clone());
                    table.stats.joined += 1;
                }
                None => {
                    warn!(
                        target: "crossmap::mappings",
                        kind = %record.kind(),
                        "{} wasn't found in the Tiny map",
                        record.key
                    );
                    table.stats.orphaned += 1;
                }
            }
        }

        info!(
            classes = table.classes.len(),
            methods = table.methods.len(),
            fields = table.fields.len(),
            orphaned = table.stats.orphaned,
            "Built composite mapping table"
        );

        table.dump();
        table
    }

    /// Build a table directly from `intermediate -> final` pairs.
    ///
    /// Useful for hosts that already hold a resolved table, and for tests.
    pub fn from_pairs<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (SymbolKind, K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = CompositeTable::default();
        for (kind, from, to) in entries {
            table.map_mut(kind).insert(from.into(), to.into());
        }
        table
    }

    /// Final name for an intermediate name of the given kind.
    #[must_use]
    pub fn get(&self, kind: SymbolKind, name: &str) -> Option<&str> {
        self.map(kind).get(name).map(String::as_str)
    }

    /// The complete map for one kind.
    #[must_use]
    pub fn map(&self, kind: SymbolKind) -> &HashMap<String, String> {
        match kind {
            SymbolKind::Class => &self.classes,
            SymbolKind::Method => &self.methods,
            SymbolKind::Field => &self.fields,
        }
    }

    fn map_mut(&mut self, kind: SymbolKind) -> &mut HashMap<String, String> {
        match kind {
            SymbolKind::Class => &mut self.classes,
            SymbolKind::Method => &mut self.methods,
            SymbolKind::Field => &mut self.fields,
        }
    }

    /// Number of entries of one kind.
    #[must_use]
    pub fn len(&self, kind: SymbolKind) -> usize {
        self.map(kind).len()
    }

    /// Returns `true` if no kind has any entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        SymbolKind::iter().all(|kind| self.map(kind).is_empty())
    }

    /// Join counters from [`CompositeTable::build`]. All zero for other constructors.
    #[must_use]
    pub fn stats(&self) -> JoinStats {
        self.stats
    }

    /// Log every entry at debug level on the `crossmap::dump` target.
    pub fn dump(&self) {
        for kind in SymbolKind::iter() {
            for (from, to) in self.map(kind) {
                debug!(target: "crossmap::dump", "Mapping : {} : {} -> {}", kind, from, to);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappings::{tiny, tsrg};

    #[test]
    fn worked_example() {
        let intermediate = tiny::parse("v1\tofficial\tintermediary\nMETHOD\tpkg/Owner\t()V\tfoo\tbar\n");
        let finals = tsrg::parse("pkg/Owner pkg2/Owner2\n\tfoo\t()V\tbaz\n");

        let table = CompositeTable::build(&intermediate, &finals);
        assert_eq!(table.get(SymbolKind::Method, "bar"), Some("baz"));
        assert_eq!(table.get(SymbolKind::Method, "unknown"), None);
        // The class header has no Tiny counterpart and is dropped
        assert!(table.map(SymbolKind::Class).is_empty());
        assert_eq!(table.stats().joined, 1);
        assert_eq!(table.stats().orphaned, 1);
    }

    #[test]
    fn joins_every_kind() {
        let intermediate = vec![
            MappingRecord::class("a", "net/minecraft/class_1"),
            MappingRecord::method("a", "b", "(La;)V", "method_2"),
            MappingRecord::field("a", "c", "field_3"),
        ];
        let finals = vec![
            MappingRecord::class("a", "net/minecraft/block/Block"),
            MappingRecord::method("a", "b", "(La;)V", "func_2_a"),
            MappingRecord::field("a", "c", "field_3_b"),
        ];

        let table = CompositeTable::build(&intermediate, &finals);
        assert_eq!(
            table.get(SymbolKind::Class, "net/minecraft/class_1"),
            Some("net/minecraft/block/Block")
        );
        assert_eq!(table.get(SymbolKind::Method, "method_2"), Some("func_2_a"));
        assert_eq!(table.get(SymbolKind::Field, "field_3"), Some("field_3_b"));
        assert_eq!(table.stats().orphaned, 0);
    }

    #[test]
    fn join_respects_descriptor_and_owner() {
        let intermediate = vec![
            MappingRecord::method("a", "b", "()V", "method_1"),
            MappingRecord::method("a", "b", "(I)V", "method_2"),
            MappingRecord::field("x", "b", "field_9"),
        ];
        let finals = vec![
            MappingRecord::method("a", "b", "(I)V", "func_2"),
            MappingRecord::method("a", "b", "(J)V", "func_orphan"),
            MappingRecord::field("a", "b", "field_orphan"),
        ];

        let table = CompositeTable::build(&intermediate, &finals);
        assert_eq!(table.len(SymbolKind::Method), 1);
        assert_eq!(table.get(SymbolKind::Method, "method_2"), Some("func_2"));
        assert!(table.map(SymbolKind::Field).is_empty());
        assert_eq!(table.stats().orphaned, 2);
    }

    #[test]
    fn field_keys_collide_last_write_wins() {
        // Two fields named `f` on `a`; the field key has no descriptor
        let intermediate = tiny::parse(
            "v1\tofficial\tintermediary\nFIELD\ta\tI\tf\tfield_1\nFIELD\ta\tJ\tf\tfield_2\n",
        );
        let finals = tsrg::parse("a b\n\tf field_final\n");

        let table = CompositeTable::build(&intermediate, &finals);
        assert_eq!(table.len(SymbolKind::Field), 1);
        assert_eq!(table.get(SymbolKind::Field, "field_2"), Some("field_final"));
        assert_eq!(table.get(SymbolKind::Field, "field_1"), None);
    }

    #[test]
    fn degraded_sides() {
        let intermediate = vec![MappingRecord::class("a", "net/minecraft/class_1")];
        let finals = vec![MappingRecord::class("a", "net/minecraft/Named")];

        assert!(CompositeTable::build(&intermediate, &[]).is_empty());
        assert!(CompositeTable::build(&[], &finals).is_empty());
        assert!(CompositeTable::build(&[], &[]).is_empty());
        assert!(CompositeTable::empty().is_empty());
    }

    #[test]
    fn join_correctness() {
        let intermediate = tiny::parse(
            "v1\tofficial\tintermediary\n\
CLASS\ta\tnet/minecraft/class_1\n\
CLASS\tb\tnet/minecraft/class_2\n\
METHOD\ta\t()V\tc\tmethod_1\n\
FIELD\tb\tI\td\tfield_1\n",
        );
        let finals = tsrg::parse("a net/minecraft/A\n\tc ()V func_c\nb net/minecraft/B\n\td field_d\nz net/minecraft/Z\n");

        let table = CompositeTable::build(&intermediate, &finals);
        for kind in SymbolKind::iter() {
            for (from, to) in table.map(kind) {
                let witness = finals.iter().any(|f| {
                    f.kind() == kind
                        && &f.name == to
                        && intermediate.iter().any(|i| i.key == f.key && &i.name == from)
                });
                assert!(witness, "{kind} entry {from} -> {to} has no witness");
            }
        }
        assert_eq!(table.len(SymbolKind::Class), 2);
        assert_eq!(table.stats().orphaned, 1);
    }

    #[test]
    fn from_pairs() {
        let table = CompositeTable::from_pairs([
            (SymbolKind::Class, "net/minecraft/class_1", "net/minecraft/A"),
            (SymbolKind::Field, "field_1", "field_a"),
        ]);
        assert_eq!(table.len(SymbolKind::Class), 1);
        assert_eq!(table.get(SymbolKind::Field, "field_1"), Some("field_a"));
        assert_eq!(table.stats(), JoinStats::default());
        table.dump();
    }
}
