//! Symbol remapping for class units.
//!
//! This module connects the [`crate::lookup::LookupService`] to the class-file model. The
//! [`NameMapper`] trait is the seam between them: the [`rewriter::ClassRewriter`] asks a mapper
//! for every symbolic name it encounters, and [`ScopedRemapper`] answers by consulting the
//! [`scope::ScopeFilter`] first and the lookup service second.
//!
//! # Key Components
//!
//! - [`NameMapper`] - Per-symbol translation hooks with provided descriptor/signature handling
//! - [`ScopedRemapper`] - The production mapper over a lookup service and a scope filter
//! - [`rewriter::ClassRewriter`] - Applies a mapper to a [`crate::ClassUnit`]
//! - [`descriptor`] - Descriptor and generic signature remapping
//! - [`scope::ScopeFilter`] - Namespace prefix guard
//!
//! # Usage Examples
//!
//! ```rust
//! use std::{borrow::Cow, sync::Arc};
//! use crossmap::{
//!     lookup::LookupService,
//!     mappings::{table::CompositeTable, SymbolKind},
//!     remapper::{scope::ScopeFilter, NameMapper, ScopedRemapper},
//!     RemapConfig,
//! };
//!
//! let table = Arc::new(CompositeTable::from_pairs([
//!     (SymbolKind::Class, "net/minecraft/class_1", "net/minecraft/Entity"),
//!     (SymbolKind::Class, "java/lang/Object", "java/lang/Thing"),
//! ]));
//! let lookup = LookupService::new(table, &RemapConfig::production(), None);
//! let scope = ScopeFilter::default();
//! let mapper = ScopedRemapper::new(&lookup, &scope);
//!
//! assert_eq!(mapper.map_class("net/minecraft/class_1"), "net/minecraft/Entity");
//! // Outside the scope, the table is never consulted
//! assert_eq!(mapper.map_class("java/lang/Object"), "java/lang/Object");
//! assert_eq!(
//!     mapper.map_descriptor("(Lnet/minecraft/class_1;)V")?,
//!     Cow::<str>::Owned("(Lnet/minecraft/Entity;)V".into())
//! );
//! # Ok::<(), crossmap::Error>(())
//! ```

mod attributes;
pub mod descriptor;
pub mod rewriter;
pub mod scope;

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::{
    lookup::LookupService,
    mappings::SymbolKind,
    remapper::{
        descriptor::{remap_descriptor, remap_signature, SignatureKind},
        scope::ScopeFilter,
    },
    Result,
};

/// Translation hooks consulted by the [`rewriter::ClassRewriter`].
///
/// Implementors provide the per-symbol hooks; descriptor, array type and signature handling
/// are provided on top of [`NameMapper::map_class`]. Every hook returns its input (borrowed)
/// when the name does not change.
pub trait NameMapper {
    /// Map an internal class name (never an array descriptor).
    fn map_class<'a>(&'a self, name: &'a str) -> Cow<'a, str>;

    /// Map the name of a method declared in or referenced through `owner`.
    fn map_method_name<'a>(&'a self, owner: &str, name: &'a str, descriptor: &str) -> Cow<'a, str>;

    /// Map the name of a field declared in or referenced through `owner`.
    fn map_field_name<'a>(&'a self, owner: &str, name: &'a str, descriptor: &str) -> Cow<'a, str>;

    /// Map the name of an `invokedynamic` call site or dynamic constant.
    fn map_invoke_dynamic_method_name<'a>(&'a self, name: &'a str, _descriptor: &str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }

    /// Map a package name (`CONSTANT_Package`).
    fn map_package_name<'a>(&'a self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }

    /// Map a module name (`CONSTANT_Module`).
    fn map_module_name<'a>(&'a self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }

    /// Map the name of a `CONSTANT_Class`, which may also be an array descriptor.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an invalid array descriptor.
    fn map_type<'a>(&'a self, name: &'a str) -> Result<Cow<'a, str>> {
        if name.starts_with('[') {
            self.map_descriptor(name)
        } else {
            Ok(self.map_class(name))
        }
    }

    /// Map every class name in a field or method descriptor.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an unterminated object type.
    fn map_descriptor<'a>(&'a self, descriptor: &'a str) -> Result<Cow<'a, str>> {
        remap_descriptor(self, descriptor)
    }

    /// Map every class name in a generic signature.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the signature does not parse.
    fn map_signature<'a>(&'a self, signature: &'a str, kind: SignatureKind) -> Result<Cow<'a, str>> {
        remap_signature(self, signature, kind)
    }
}

/// The production [`NameMapper`]: scope check, then lookup.
///
/// Class names are checked against the scope directly. Members are checked through their
/// owner, so a field or method is only translated when the class it belongs to is in scope.
#[derive(Debug, Clone, Copy)]
pub struct ScopedRemapper<'r> {
    lookup: &'r LookupService,
    scope: &'r ScopeFilter,
}

impl<'r> ScopedRemapper<'r> {
    /// Create a mapper over a lookup service and a scope filter.
    #[must_use]
    pub fn new(lookup: &'r LookupService, scope: &'r ScopeFilter) -> Self {
        ScopedRemapper { lookup, scope }
    }

    fn translate_member<'a>(&'a self, kind: SymbolKind, owner: &str, name: &'a str) -> Cow<'a, str> {
        if !self.scope.is_eligible(owner) {
            return Cow::Borrowed(name);
        }
        let mapped = self.lookup.translate(kind, name);
        debug!(owner, name, mapped = %mapped, %kind, "Remapping member");
        mapped
    }
}

impl NameMapper for ScopedRemapper<'_> {
    fn map_class<'a>(&'a self, name: &'a str) -> Cow<'a, str> {
        if !self.scope.is_eligible(name) {
            return Cow::Borrowed(name);
        }
        let mapped = self.lookup.translate(SymbolKind::Class, name);
        debug!("Remapping : {} found {}", name, mapped);
        mapped
    }

    fn map_method_name<'a>(&'a self, owner: &str, name: &'a str, _descriptor: &str) -> Cow<'a, str> {
        self.translate_member(SymbolKind::Method, owner, name)
    }

    fn map_field_name<'a>(&'a self, owner: &str, name: &'a str, _descriptor: &str) -> Cow<'a, str> {
        self.translate_member(SymbolKind::Field, owner, name)
    }

    fn map_invoke_dynamic_method_name<'a>(&'a self, name: &'a str, descriptor: &str) -> Cow<'a, str> {
        trace!(name, descriptor, "Leaving dynamic call site name unchanged");
        Cow::Borrowed(name)
    }

    fn map_package_name<'a>(&'a self, name: &'a str) -> Cow<'a, str> {
        debug!(name, "Package");
        Cow::Borrowed(name)
    }

    fn map_module_name<'a>(&'a self, name: &'a str) -> Cow<'a, str> {
        debug!(name, "Module");
        Cow::Borrowed(name)
    }
}
