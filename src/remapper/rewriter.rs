//! Applies a [`NameMapper`] to a decoded [`ClassUnit`].
//!
//! The rewriter works on the constant pool and on the attributes that embed names. Existing
//! pool entries keep their indices and Utf8 entries are never edited: a changed name is
//! interned as a new (or reused) entry and only the entry that refers to it is repointed. Every
//! bytecode operand and attribute index therefore stays valid, and a Utf8 that doubles as a
//! string literal keeps its value.
//!
//! Member references are rewritten before class entries, because the owner of a member has to
//! be looked up under its original name. Declared fields and methods use the unit's own
//! original name as owner. Attribute payloads are walked before class entries as well, so
//! inner class entries are seen under their original names.

use std::borrow::Cow;

use tracing::debug;

use crate::{
    classfile::{
        constant::{Constant, ConstantPool, RefKind},
        AttributeInfo, ClassUnit, MemberInfo, ATTR_ENCLOSING_METHOD,
    },
    file::io::{read_be_at, write_be_at},
    remapper::{attributes::AttributeRewriter, descriptor::SignatureKind, NameMapper},
    Result,
};

/// Counts of entries a rewrite pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// `CONSTANT_Class` entries repointed
    pub classes: usize,
    /// Field, method and interface method references repointed
    pub member_refs: usize,
    /// Declared fields and methods renamed or given a new descriptor
    pub members: usize,
    /// `CONSTANT_MethodType`, `CONSTANT_Dynamic` and `CONSTANT_InvokeDynamic` entries repointed
    pub dynamic: usize,
    /// `Signature` attributes and local variable signatures rewritten
    pub signatures: usize,
    /// `EnclosingMethod` attributes rewritten
    pub enclosing_methods: usize,
    /// Descriptors and simple names repointed inside annotation, local variable, record and
    /// inner class attributes
    pub attributes: usize,
}

impl RewriteStats {
    /// Total number of changes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.classes
            + self.member_refs
            + self.members
            + self.dynamic
            + self.signatures
            + self.enclosing_methods
            + self.attributes
    }

    /// Returns `true` if the pass changed nothing.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.total() == 0
    }
}

/// Rewrites the symbolic references of class units through a [`NameMapper`].
pub struct ClassRewriter<'m, M: NameMapper + ?Sized> {
    mapper: &'m M,
}

impl<'m, M: NameMapper + ?Sized> ClassRewriter<'m, M> {
    /// Create a rewriter over `mapper`.
    pub fn new(mapper: &'m M) -> Self {
        ClassRewriter { mapper }
    }

    /// Rewrite `unit` in place.
    ///
    /// Running the same rewrite twice is a no-op the second time, provided the mapper maps
    /// final names to themselves.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for dangling pool references, invalid descriptors or
    /// attribute payloads that do not follow their layout, and [`crate::Error::PoolOverflow`]
    /// if the new names do not fit into the pool. Malformed generic signatures are logged and
    /// left unchanged instead.
    pub fn rewrite(&self, unit: &mut ClassUnit) -> Result<RewriteStats> {
        let mut stats = RewriteStats::default();
        let this_name = unit.name()?.to_string();
        let original_len = unit.pool.len();

        let ClassUnit {
            pool,
            fields,
            methods,
            attributes,
            ..
        } = unit;

        self.rewrite_references(pool, original_len, &mut stats)?;
        for field in fields.iter_mut() {
            self.rewrite_member(pool, &this_name, field, RefKind::Field, &mut stats)?;
        }
        for method in methods.iter_mut() {
            self.rewrite_member(pool, &this_name, method, RefKind::Method, &mut stats)?;
        }
        for attribute in attributes.iter_mut() {
            if pool.utf8(attribute.name_index)? == ATTR_ENCLOSING_METHOD {
                self.rewrite_enclosing_method(pool, attribute, &mut stats)?;
            }
        }
        AttributeRewriter::new(self.mapper, pool, &mut stats)
            .rewrite_all(attributes, SignatureKind::Class)?;
        self.rewrite_classes(pool, original_len, &mut stats)?;

        debug!(class = this_name, ?stats, "Rewrote class unit");
        Ok(stats)
    }

    fn rewrite_references(
        &self,
        pool: &mut ConstantPool,
        original_len: usize,
        stats: &mut RewriteStats,
    ) -> Result<()> {
        for index in 1..original_len {
            let index = index as u16;
            let constant = match pool.get(index) {
                Ok(Constant::Utf8(_) | Constant::RawUtf8(_)) | Err(_) => continue,
                Ok(constant) => constant.clone(),
            };

            match constant {
                Constant::MemberRef {
                    kind,
                    class_index,
                    name_and_type_index,
                } => {
                    let owner = pool.class_name(class_index)?.to_string();
                    let (name, descriptor) = owned_pair(pool.name_and_type(name_and_type_index)?);
                    let mapped_name = match kind {
                        RefKind::Field => self.mapper.map_field_name(&owner, &name, &descriptor),
                        RefKind::Method | RefKind::InterfaceMethod => {
                            self.mapper.map_method_name(&owner, &name, &descriptor)
                        }
                    };
                    let mapped_descriptor = self.mapper.map_descriptor(&descriptor)?;

                    if let Some(name_and_type_index) =
                        intern_changed(pool, &name, &descriptor, &mapped_name, &mapped_descriptor)?
                    {
                        pool.set(
                            index,
                            Constant::MemberRef {
                                kind,
                                class_index,
                                name_and_type_index,
                            },
                        )?;
                        stats.member_refs += 1;
                    }
                }
                Constant::Dynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                }
                | Constant::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => {
                    let (name, descriptor) = owned_pair(pool.name_and_type(name_and_type_index)?);
                    let mapped_name = self.mapper.map_invoke_dynamic_method_name(&name, &descriptor);
                    let mapped_descriptor = self.mapper.map_descriptor(&descriptor)?;

                    if let Some(name_and_type_index) =
                        intern_changed(pool, &name, &descriptor, &mapped_name, &mapped_descriptor)?
                    {
                        let replacement = if matches!(constant, Constant::Dynamic { .. }) {
                            Constant::Dynamic {
                                bootstrap_method_attr_index,
                                name_and_type_index,
                            }
                        } else {
                            Constant::InvokeDynamic {
                                bootstrap_method_attr_index,
                                name_and_type_index,
                            }
                        };
                        pool.set(index, replacement)?;
                        stats.dynamic += 1;
                    }
                }
                Constant::MethodType { descriptor_index } => {
                    let descriptor = pool.utf8(descriptor_index)?.to_string();
                    let mapped = self.mapper.map_descriptor(&descriptor)?;
                    if mapped != descriptor.as_str() {
                        let descriptor_index = pool.intern_utf8(&mapped)?;
                        pool.set(index, Constant::MethodType { descriptor_index })?;
                        stats.dynamic += 1;
                    }
                }
                Constant::Module { name_index } => {
                    let name = pool.utf8(name_index)?.to_string();
                    let mapped = self.mapper.map_module_name(&name);
                    if mapped != name.as_str() {
                        let name_index = pool.intern_utf8(&mapped)?;
                        pool.set(index, Constant::Module { name_index })?;
                    }
                }
                Constant::Package { name_index } => {
                    let name = pool.utf8(name_index)?.to_string();
                    let mapped = self.mapper.map_package_name(&name);
                    if mapped != name.as_str() {
                        let name_index = pool.intern_utf8(&mapped)?;
                        pool.set(index, Constant::Package { name_index })?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn rewrite_member(
        &self,
        pool: &mut ConstantPool,
        owner: &str,
        member: &mut MemberInfo,
        kind: RefKind,
        stats: &mut RewriteStats,
    ) -> Result<()> {
        let name = pool.utf8(member.name_index)?.to_string();
        let descriptor = pool.utf8(member.descriptor_index)?.to_string();

        let mapped_name = match kind {
            RefKind::Field => self.mapper.map_field_name(owner, &name, &descriptor),
            // constructors and initializers keep their reserved names
            _ if name.starts_with('<') => Cow::Borrowed(name.as_str()),
            _ => self.mapper.map_method_name(owner, &name, &descriptor),
        };
        let mapped_descriptor = self.mapper.map_descriptor(&descriptor)?;

        let mut changed = false;
        if mapped_name != name.as_str() {
            member.name_index = pool.intern_utf8(&mapped_name)?;
            changed = true;
        }
        if mapped_descriptor != descriptor.as_str() {
            member.descriptor_index = pool.intern_utf8(&mapped_descriptor)?;
            changed = true;
        }
        if changed {
            stats.members += 1;
        }

        let signature_kind = match kind {
            RefKind::Field => SignatureKind::Field,
            _ => SignatureKind::Method,
        };
        AttributeRewriter::new(self.mapper, pool, stats)
            .rewrite_all(&mut member.attributes, signature_kind)
    }

    fn rewrite_enclosing_method(
        &self,
        pool: &mut ConstantPool,
        attribute: &mut AttributeInfo,
        stats: &mut RewriteStats,
    ) -> Result<()> {
        if attribute.data.len() != 4 {
            return Err(malformed_error!(
                "EnclosingMethod attribute of {} bytes",
                attribute.data.len()
            ));
        }

        let mut offset = 0;
        let class_index = read_be_at::<u16>(&attribute.data, &mut offset)?;
        let method_index = read_be_at::<u16>(&attribute.data, &mut offset)?;
        if method_index == 0 {
            return Ok(());
        }

        let owner = pool.class_name(class_index)?.to_string();
        let (name, descriptor) = owned_pair(pool.name_and_type(method_index)?);
        let mapped_name = self.mapper.map_method_name(&owner, &name, &descriptor);
        let mapped_descriptor = self.mapper.map_descriptor(&descriptor)?;

        if let Some(index) =
            intern_changed(pool, &name, &descriptor, &mapped_name, &mapped_descriptor)?
        {
            write_be_at(&mut attribute.data, &mut 2, index)?;
            stats.enclosing_methods += 1;
        }
        Ok(())
    }

    fn rewrite_classes(
        &self,
        pool: &mut ConstantPool,
        original_len: usize,
        stats: &mut RewriteStats,
    ) -> Result<()> {
        for index in 1..original_len {
            let index = index as u16;
            let Ok(Constant::Class { name_index }) = pool.get(index) else {
                continue;
            };
            let name = pool.utf8(*name_index)?.to_string();

            let mapped = self.mapper.map_type(&name)?;
            if mapped != name.as_str() {
                let name_index = pool.intern_utf8(&mapped)?;
                pool.set(index, Constant::Class { name_index })?;
                stats.classes += 1;
            }
        }
        Ok(())
    }
}

fn owned_pair((name, descriptor): (&str, &str)) -> (String, String) {
    (name.to_string(), descriptor.to_string())
}

/// Intern the mapped name and type if either half changed.
fn intern_changed(
    pool: &mut ConstantPool,
    name: &str,
    descriptor: &str,
    mapped_name: &str,
    mapped_descriptor: &str,
) -> Result<Option<u16>> {
    if name == mapped_name && descriptor == mapped_descriptor {
        return Ok(None);
    }
    pool.intern_name_and_type(mapped_name, mapped_descriptor).map(Some)
}
