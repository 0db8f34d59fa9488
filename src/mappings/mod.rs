//! Mapping records, mapping file loaders and the composite translation table.
//!
//! Two mapping files describe the same obfuscated ("pivot") names from different angles:
//!
//! - **Tiny v1** ([`tiny`]) maps pivot names to stable intermediate names,
//! - **TSRG v1** ([`tsrg`]) maps pivot names to final, human-facing names.
//!
//! Neither file relates intermediate names to final names directly. The
//! [`table::CompositeTable`] joins both record sets on their pivot keys and produces the three
//! `intermediate -> final` maps the rest of the crate works with.
//!
//! # Key Components
//!
//! - [`SymbolKind`] - Class, method or field
//! - [`PivotKey`] - Join key of a record; its variant carries the kind
//! - [`MappingRecord`] - A pivot key paired with the name it maps to
//! - [`tiny::parse`] / [`tsrg::parse`] - Line parsers producing plain record sequences
//! - [`table::CompositeTable::build`] - The join
//!
//! # Usage Examples
//!
//! ```rust
//! use crossmap::mappings::{tiny, tsrg, table::CompositeTable, SymbolKind};
//!
//! let intermediate = tiny::parse("v1\tofficial\tintermediary\nMETHOD\tpkg/Owner\t()V\tfoo\tbar\n");
//! let finals = tsrg::parse("pkg/Owner pkg2/Owner2\n\tfoo ()V baz\n");
//!
//! let table = CompositeTable::build(&intermediate, &finals);
//! assert_eq!(table.get(SymbolKind::Method, "bar"), Some("baz"));
//! ```

pub mod table;
pub mod tiny;
pub mod tsrg;

use std::fmt;

use strum::{Display, EnumCount, EnumIter};

/// The symbol domain a name belongs to.
///
/// Every translation query is qualified by its kind, since one string may legitimately be the
/// name of a class, a method and a field at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
pub enum SymbolKind {
    /// A class or interface, named by its internal (slash separated) name
    #[strum(serialize = "Class")]
    Class,
    /// A method name
    #[strum(serialize = "Method")]
    Method,
    /// A field name
    #[strum(serialize = "Field")]
    Field,
}

/// Join key shared by both mapping formats, expressed in the pivot (obfuscated) domain.
///
/// Fields are keyed without their descriptor: Tiny records carry one but TSRG v1 does not, so
/// two same-named fields of different types on one owner collapse into a single key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PivotKey {
    /// Internal name of the class
    Class(String),
    /// Owner class, method name and method descriptor
    Method {
        /// Pivot name of the declaring class
        owner: String,
        /// Pivot name of the method
        name: String,
        /// Method descriptor, in pivot-domain class names
        descriptor: String,
    },
    /// Owner class and field name
    Field {
        /// Pivot name of the declaring class
        owner: String,
        /// Pivot name of the field
        name: String,
    },
}

impl PivotKey {
    /// The symbol kind this key identifies.
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        match self {
            PivotKey::Class(_) => SymbolKind::Class,
            PivotKey::Method { .. } => SymbolKind::Method,
            PivotKey::Field { .. } => SymbolKind::Field,
        }
    }
}

impl fmt::Display for PivotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PivotKey::Class(name) => write!(f, "{name}"),
            PivotKey::Method {
                owner,
                name,
                descriptor,
            } => write!(f, "{owner}.{name}{descriptor}"),
            PivotKey::Field { owner, name } => write!(f, "{owner}.{name}"),
        }
    }
}

/// One mapping entry: a pivot key and the name it maps to in the file's target domain.
///
/// For Tiny records `name` is the intermediate name, for TSRG records it is the final name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    /// Pivot-domain identity of the symbol
    pub key: PivotKey,
    /// Name of the symbol in the file's target domain
    pub name: String,
}

impl MappingRecord {
    /// Record for a class.
    pub fn class(pivot: impl Into<String>, name: impl Into<String>) -> Self {
        MappingRecord {
            key: PivotKey::Class(pivot.into()),
            name: name.into(),
        }
    }

    /// Record for a method.
    pub fn method(
        owner: impl Into<String>,
        pivot: impl Into<String>,
        descriptor: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        MappingRecord {
            key: PivotKey::Method {
                owner: owner.into(),
                name: pivot.into(),
                descriptor: descriptor.into(),
            },
            name: name.into(),
        }
    }

    /// Record for a field.
    pub fn field(
        owner: impl Into<String>,
        pivot: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        MappingRecord {
            key: PivotKey::Field {
                owner: owner.into(),
                name: pivot.into(),
            },
            name: name.into(),
        }
    }

    /// The symbol kind of this record.
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        self.key.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn kinds() {
        assert_eq!(SymbolKind::COUNT, 3);
        let names: Vec<String> = SymbolKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["Class", "Method", "Field"]);
    }

    #[test]
    fn record_constructors() {
        assert_eq!(MappingRecord::class("a", "b").kind(), SymbolKind::Class);
        assert_eq!(
            MappingRecord::method("a", "b", "()V", "c").kind(),
            SymbolKind::Method
        );
        assert_eq!(MappingRecord::field("a", "b", "c").kind(), SymbolKind::Field);
    }

    #[test]
    fn key_display() {
        let method = MappingRecord::method("a", "b", "(I)V", "c");
        assert_eq!(method.key.to_string(), "a.b(I)V");
        let field = MappingRecord::field("a", "f", "g");
        assert_eq!(field.key.to_string(), "a.f");
    }
}
