//! Names embedded in attribute payloads.
//!
//! Annotations, local variable tables, record components and inner class entries refer to
//! descriptors, signatures and simple names through Utf8 indices inside their raw payloads.
//! The payloads are walked in place and only those `u16` slots are repointed, so no attribute
//! changes its length. `Code` and `Record` carry attributes of their own, which are walked the
//! same way.
//!
//! Attributes without embedded names (`LineNumberTable`, `StackMapTable`, ...) are left
//! alone; whatever they reference through `CONSTANT_Class` entries is handled with the pool.

use tracing::{trace, warn};

use crate::{
    classfile::{
        constant::ConstantPool, AttributeInfo, ATTR_ANNOTATION_DEFAULT, ATTR_CODE,
        ATTR_INNER_CLASSES, ATTR_LOCAL_VARIABLE_TABLE, ATTR_LOCAL_VARIABLE_TYPE_TABLE,
        ATTR_RECORD, ATTR_RUNTIME_INVISIBLE_ANNOTATIONS,
        ATTR_RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS, ATTR_RUNTIME_INVISIBLE_TYPE_ANNOTATIONS,
        ATTR_RUNTIME_VISIBLE_ANNOTATIONS, ATTR_RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS,
        ATTR_RUNTIME_VISIBLE_TYPE_ANNOTATIONS, ATTR_SIGNATURE,
    },
    file::io::{read_be_at, write_be_at},
    remapper::{descriptor::SignatureKind, rewriter::RewriteStats, NameMapper},
    Result,
};

/// Maximum depth of nested element values and attributes.
const MAX_NESTING_DEPTH: usize = 256;

/// Walks attribute payloads of one class unit and repoints the name slots they contain.
///
/// Must run before the unit's `CONSTANT_Class` entries are rewritten, since inner class
/// entries are matched against the original class names.
pub(crate) struct AttributeRewriter<'a, M: NameMapper + ?Sized> {
    mapper: &'a M,
    pool: &'a mut ConstantPool,
    stats: &'a mut RewriteStats,
    depth: usize,
}

impl<'a, M: NameMapper + ?Sized> AttributeRewriter<'a, M> {
    pub(crate) fn new(mapper: &'a M, pool: &'a mut ConstantPool, stats: &'a mut RewriteStats) -> Self {
        AttributeRewriter {
            mapper,
            pool,
            stats,
            depth: 0,
        }
    }

    /// Rewrite every attribute in `attributes`.
    ///
    /// `kind` is the flavour of a `Signature` attribute found directly in the list.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] for payloads that
    /// do not follow their attribute's layout. Malformed generic signatures are logged and
    /// left unchanged.
    pub(crate) fn rewrite_all(
        &mut self,
        attributes: &mut [AttributeInfo],
        kind: SignatureKind,
    ) -> Result<()> {
        for attribute in attributes {
            let name = self.pool.utf8(attribute.name_index)?.to_string();
            self.rewrite(&name, &mut attribute.data, kind)?;
        }
        Ok(())
    }

    fn rewrite(&mut self, name: &str, data: &mut [u8], kind: SignatureKind) -> Result<()> {
        match name {
            ATTR_SIGNATURE => self.signature(data, kind),
            ATTR_RUNTIME_VISIBLE_ANNOTATIONS | ATTR_RUNTIME_INVISIBLE_ANNOTATIONS => {
                self.annotations(data, &mut 0)
            }
            ATTR_RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS
            | ATTR_RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS => self.parameter_annotations(data),
            ATTR_RUNTIME_VISIBLE_TYPE_ANNOTATIONS | ATTR_RUNTIME_INVISIBLE_TYPE_ANNOTATIONS => {
                self.type_annotations(data)
            }
            ATTR_ANNOTATION_DEFAULT => self.element_value(data, &mut 0),
            ATTR_CODE => self.code(data),
            ATTR_LOCAL_VARIABLE_TABLE => self.local_variables(data, false),
            ATTR_LOCAL_VARIABLE_TYPE_TABLE => self.local_variables(data, true),
            ATTR_RECORD => self.record(data),
            ATTR_INNER_CLASSES => self.inner_classes(data),
            _ => Ok(()),
        }
    }

    fn signature(&mut self, data: &mut [u8], kind: SignatureKind) -> Result<()> {
        let &[high, low] = &*data else {
            warn!(length = data.len(), "Skipping Signature attribute of invalid length");
            return Ok(());
        };
        if let Err(e) = self.pool.utf8(u16::from_be_bytes([high, low])) {
            warn!(error = %e, "Skipping Signature attribute with invalid index");
            return Ok(());
        }
        self.signature_slot(data, &mut 0, kind)
    }

    fn annotations(&mut self, data: &mut [u8], offset: &mut usize) -> Result<()> {
        let count = read_be_at::<u16>(data, offset)?;
        for _ in 0..count {
            self.annotation(data, offset)?;
        }
        Ok(())
    }

    fn annotation(&mut self, data: &mut [u8], offset: &mut usize) -> Result<()> {
        self.descriptor_slot(data, offset)?;
        let pairs = read_be_at::<u16>(data, offset)?;
        for _ in 0..pairs {
            // element_name_index
            skip(data, offset, 2)?;
            self.element_value(data, offset)?;
        }
        Ok(())
    }

    fn element_value(&mut self, data: &mut [u8], offset: &mut usize) -> Result<()> {
        let tag = read_be_at::<u8>(data, offset)?;
        match tag {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => skip(data, offset, 2),
            b'e' => {
                self.descriptor_slot(data, offset)?;
                // const_name_index
                skip(data, offset, 2)
            }
            b'c' => self.descriptor_slot(data, offset),
            b'@' => self.nested(|this| this.annotation(data, offset)),
            b'[' => self.nested(|this| {
                let count = read_be_at::<u16>(data, offset)?;
                for _ in 0..count {
                    this.element_value(data, offset)?;
                }
                Ok(())
            }),
            _ => Err(malformed_error!("Unknown element value tag 0x{:02X}", tag)),
        }
    }

    fn parameter_annotations(&mut self, data: &mut [u8]) -> Result<()> {
        let mut offset = 0;
        let parameters = read_be_at::<u8>(data, &mut offset)?;
        for _ in 0..parameters {
            self.annotations(data, &mut offset)?;
        }
        Ok(())
    }

    fn type_annotations(&mut self, data: &mut [u8]) -> Result<()> {
        let mut offset = 0;
        let count = read_be_at::<u16>(data, &mut offset)?;
        for _ in 0..count {
            let target_type = read_be_at::<u8>(data, &mut offset)?;
            let target_info = match target_type {
                0x13..=0x15 => 0,
                0x00 | 0x01 | 0x16 => 1,
                0x10..=0x12 | 0x17 | 0x42..=0x46 => 2,
                0x47..=0x4B => 3,
                // localvar_target: a table of (start_pc, length, index)
                0x40 | 0x41 => usize::from(read_be_at::<u16>(data, &mut offset)?) * 6,
                _ => {
                    return Err(malformed_error!(
                        "Unknown type annotation target 0x{:02X}",
                        target_type
                    ))
                }
            };
            skip(data, &mut offset, target_info)?;

            let path_length = read_be_at::<u8>(data, &mut offset)?;
            skip(data, &mut offset, usize::from(path_length) * 2)?;
            self.annotation(data, &mut offset)?;
        }
        Ok(())
    }

    fn code(&mut self, data: &mut [u8]) -> Result<()> {
        let mut offset = 0;
        // max_stack, max_locals
        skip(data, &mut offset, 4)?;
        let code_length = read_be_at::<u32>(data, &mut offset)?;
        skip(data, &mut offset, code_length as usize)?;
        let exceptions = read_be_at::<u16>(data, &mut offset)?;
        skip(data, &mut offset, usize::from(exceptions) * 8)?;

        self.attributes(data, &mut offset)
    }

    fn local_variables(&mut self, data: &mut [u8], generic: bool) -> Result<()> {
        let mut offset = 0;
        let count = read_be_at::<u16>(data, &mut offset)?;
        for _ in 0..count {
            // start_pc, length, name_index
            skip(data, &mut offset, 6)?;
            if generic {
                self.signature_slot(data, &mut offset, SignatureKind::Field)?;
            } else {
                self.descriptor_slot(data, &mut offset)?;
            }
            // index
            skip(data, &mut offset, 2)?;
        }
        Ok(())
    }

    fn record(&mut self, data: &mut [u8]) -> Result<()> {
        let mut offset = 0;
        let count = read_be_at::<u16>(data, &mut offset)?;
        for _ in 0..count {
            // name_index
            skip(data, &mut offset, 2)?;
            self.descriptor_slot(data, &mut offset)?;
            self.attributes(data, &mut offset)?;
        }
        Ok(())
    }

    fn inner_classes(&mut self, data: &mut [u8]) -> Result<()> {
        let mut offset = 0;
        let count = read_be_at::<u16>(data, &mut offset)?;
        for _ in 0..count {
            let inner_class_index = read_be_at::<u16>(data, &mut offset)?;
            // outer_class_info_index
            skip(data, &mut offset, 2)?;
            let mut slot = offset;
            let inner_name_index = read_be_at::<u16>(data, &mut offset)?;
            // inner_class_access_flags
            skip(data, &mut offset, 2)?;

            // anonymous classes have no simple name
            if inner_class_index == 0 || inner_name_index == 0 {
                continue;
            }

            let name = self.pool.class_name(inner_class_index)?.to_string();
            let simple_name = self.pool.utf8(inner_name_index)?.to_string();
            let mapped = self.mapper.map_class(&name);
            if let Some(mapped_simple) = inner_simple_name(&name, &mapped, &simple_name) {
                trace!(name, simple_name, mapped_simple, "Renaming inner class");
                let index = self.pool.intern_utf8(mapped_simple)?;
                write_be_at(data, &mut slot, index)?;
                self.stats.attributes += 1;
            }
        }
        Ok(())
    }

    /// Walk a nested `attributes_count` / `attribute_info` list.
    fn attributes(&mut self, data: &mut [u8], offset: &mut usize) -> Result<()> {
        self.nested(|this| {
            let count = read_be_at::<u16>(data, offset)?;
            for _ in 0..count {
                let name_index = read_be_at::<u16>(data, offset)?;
                let length = read_be_at::<u32>(data, offset)? as usize;
                let start = *offset;
                skip(data, offset, length)?;

                let name = this.pool.utf8(name_index)?.to_string();
                this.rewrite(&name, &mut data[start..*offset], SignatureKind::Field)?;
            }
            Ok(())
        })
    }

    fn nested(&mut self, walk: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(malformed_error!(
                "Attribute nesting exceeds {} levels",
                MAX_NESTING_DEPTH
            ));
        }
        self.depth += 1;
        let result = walk(self);
        self.depth -= 1;
        result
    }

    /// Repoint the descriptor index at `offset` and advance past it.
    fn descriptor_slot(&mut self, data: &mut [u8], offset: &mut usize) -> Result<()> {
        let mut slot = *offset;
        let index = read_be_at::<u16>(data, offset)?;
        let descriptor = self.pool.utf8(index)?.to_string();

        let mapped = self.mapper.map_descriptor(&descriptor)?;
        if mapped != descriptor.as_str() {
            let index = self.pool.intern_utf8(&mapped)?;
            write_be_at(data, &mut slot, index)?;
            self.stats.attributes += 1;
        }
        Ok(())
    }

    /// Repoint the signature index at `offset` and advance past it.
    fn signature_slot(
        &mut self,
        data: &mut [u8],
        offset: &mut usize,
        kind: SignatureKind,
    ) -> Result<()> {
        let mut slot = *offset;
        let index = read_be_at::<u16>(data, offset)?;
        let signature = self.pool.utf8(index)?.to_string();

        match self.mapper.map_signature(&signature, kind) {
            Ok(mapped) if mapped != signature.as_str() => {
                let index = self.pool.intern_utf8(&mapped)?;
                write_be_at(data, &mut slot, index)?;
                self.stats.signatures += 1;
            }
            Ok(_) => {}
            Err(e) => warn!(signature, error = %e, "Leaving malformed signature unchanged"),
        }
        Ok(())
    }
}

fn skip(data: &[u8], offset: &mut usize, len: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => {
            *offset = end;
            Ok(())
        }
        _ => Err(out_of_bounds_error!()),
    }
}

/// The new simple name of inner class `name` after it was mapped to `mapped`.
///
/// A simple name only follows the mapping when the binary name visibly changed its last
/// segment: it becomes the text after the last `$` of `mapped`, minus leading digits.
/// Returns `None` when `simple_name` stays.
fn inner_simple_name<'n>(name: &str, mapped: &'n str, simple_name: &str) -> Option<&'n str> {
    if mapped == name {
        return None;
    }
    if let (Some(split), Some(mapped_split)) = (name.rfind('/'), mapped.rfind('/')) {
        if name[split..] == mapped[mapped_split..] {
            return None;
        }
    }

    let (_, tail) = mapped.rsplit_once('$')?;
    let tail = tail.trim_start_matches(|c: char| c.is_ascii_digit());
    (!tail.is_empty() && tail != simple_name).then_some(tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classfile::{flags::MemberAccessFlags, ClassUnit},
        file::io::{append_be, read_be},
        remapper::rewriter::ClassRewriter,
        test::TableMapper,
    };

    fn mapper() -> TableMapper {
        TableMapper::classes([
            ("net/minecraft/class_1", "net/minecraft/Entity"),
            ("net/minecraft/class_2", "net/minecraft/World"),
            ("net/minecraft/class_2$class_3", "net/minecraft/World$Spawner"),
            ("net/minecraft/class_2$Inner", "net/minecraft/World$Inner"),
            ("net/minecraft/class_2$class_6", "net/minecraft/Flat"),
            ("net/minecraft/class_2$class_7", "net/minecraft/World$1Local"),
        ])
    }

    fn utf8(unit: &mut ClassUnit, value: &str) -> u16 {
        unit.pool.intern_utf8(value).unwrap()
    }

    /// The string behind the Utf8 index stored at `at`.
    fn slot<'u>(unit: &'u ClassUnit, data: &[u8], at: usize) -> &'u str {
        unit.pool.utf8(read_be::<u16>(&data[at..]).unwrap()).unwrap()
    }

    /// Append a nested attribute and return the offset of its payload.
    fn push_attribute(unit: &mut ClassUnit, out: &mut Vec<u8>, name: &str, payload: &[u8]) -> usize {
        append_be(out, utf8(unit, name));
        append_be(out, payload.len() as u32);
        let start = out.len();
        out.extend_from_slice(payload);
        start
    }

    fn rewrite(unit: &mut ClassUnit) -> RewriteStats {
        ClassRewriter::new(&mapper()).rewrite(unit).unwrap()
    }

    #[test]
    fn annotation_type_follows_class_mapping() {
        let mut unit = ClassUnit::new("net/minecraft/class_1", Some("java/lang/Object")).unwrap();
        let marker = utf8(&mut unit, "Lnet/minecraft/class_2;");
        let mut data = Vec::new();
        append_be(&mut data, 1_u16);
        append_be(&mut data, marker);
        append_be(&mut data, 0_u16);
        let attribute = unit.attribute(ATTR_RUNTIME_VISIBLE_ANNOTATIONS, data).unwrap();
        unit.attributes.push(attribute);

        let stats = rewrite(&mut unit);

        assert_eq!(slot(&unit, &unit.attributes[0].data, 2), "Lnet/minecraft/World;");
        assert_eq!(unit.pool.utf8(marker).unwrap(), "Lnet/minecraft/class_2;");
        assert_eq!(stats.attributes, 1);
    }

    #[test]
    fn annotation_element_values() {
        let mut unit = ClassUnit::new("net/minecraft/class_1", Some("java/lang/Object")).unwrap();
        let name = utf8(&mut unit, "value");

        let mut data = Vec::new();
        append_be(&mut data, 1_u16);
        let annotation_type = data.len();
        append_be(&mut data, utf8(&mut unit, "Lnet/minecraft/class_1;"));
        append_be(&mut data, 4_u16);

        append_be(&mut data, name);
        data.push(b'e');
        let enum_type = data.len();
        append_be(&mut data, utf8(&mut unit, "Lnet/minecraft/class_2;"));
        append_be(&mut data, utf8(&mut unit, "PRIMARY"));

        append_be(&mut data, name);
        data.push(b'c');
        let class_value = data.len();
        append_be(&mut data, utf8(&mut unit, "[Lnet/minecraft/class_2;"));

        append_be(&mut data, name);
        data.push(b'[');
        append_be(&mut data, 2_u16);
        data.push(b'c');
        let void = data.len();
        append_be(&mut data, utf8(&mut unit, "V"));
        data.push(b'@');
        let nested = data.len();
        append_be(&mut data, utf8(&mut unit, "Lnet/minecraft/class_2;"));
        append_be(&mut data, 0_u16);

        append_be(&mut data, name);
        data.push(b's');
        let literal = data.len();
        let literal_index = utf8(&mut unit, "Lnet/minecraft/class_2;");
        append_be(&mut data, literal_index);

        let attribute = unit.attribute(ATTR_RUNTIME_INVISIBLE_ANNOTATIONS, data).unwrap();
        unit.attributes.push(attribute);
        let stats = rewrite(&mut unit);

        let data = &unit.attributes[0].data;
        assert_eq!(slot(&unit, data, annotation_type), "Lnet/minecraft/Entity;");
        assert_eq!(slot(&unit, data, enum_type), "Lnet/minecraft/World;");
        assert_eq!(slot(&unit, data, enum_type + 2), "PRIMARY");
        assert_eq!(slot(&unit, data, class_value), "[Lnet/minecraft/World;");
        assert_eq!(slot(&unit, data, void), "V");
        assert_eq!(slot(&unit, data, nested), "Lnet/minecraft/World;");
        // String constants are literals, not type names
        assert_eq!(read_be::<u16>(&data[literal..]).unwrap(), literal_index);
        assert_eq!(stats.attributes, 4);
    }

    #[test]
    fn parameter_annotations() {
        let mut unit = ClassUnit::new("net/minecraft/class_1", Some("java/lang/Object")).unwrap();
        let method = unit
            .add_method(MemberAccessFlags::PUBLIC, "method_1", "(ILnet/minecraft/class_2;)V")
            .unwrap();

        let mut data = vec![2];
        append_be(&mut data, 0_u16);
        append_be(&mut data, 1_u16);
        let annotation_type = data.len();
        append_be(&mut data, utf8(&mut unit, "Lnet/minecraft/class_1;"));
        append_be(&mut data, 0_u16);
        let attribute = unit
            .attribute(ATTR_RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS, data)
            .unwrap();
        unit.methods[method].attributes.push(attribute);

        rewrite(&mut unit);
        assert_eq!(
            slot(&unit, &unit.methods[0].attributes[0].data, annotation_type),
            "Lnet/minecraft/Entity;"
        );
    }

    #[test]
    fn type_annotations() {
        let mut unit = ClassUnit::new("net/minecraft/class_1", Some("net/minecraft/class_2")).unwrap();

        let mut data = Vec::new();
        append_be(&mut data, 2_u16);
        // supertype target, no type path
        data.push(0x10);
        append_be(&mut data, 0xFFFF_u16);
        data.push(0);
        let supertype = data.len();
        append_be(&mut data, utf8(&mut unit, "Lnet/minecraft/class_1;"));
        append_be(&mut data, 0_u16);
        // type parameter target with a one step type path
        data.extend_from_slice(&[0x00, 0x00, 0x01, 0x03, 0x00]);
        let parameter = data.len();
        append_be(&mut data, utf8(&mut unit, "Lnet/minecraft/class_2;"));
        append_be(&mut data, 0_u16);

        let attribute = unit.attribute(ATTR_RUNTIME_INVISIBLE_TYPE_ANNOTATIONS, data).unwrap();
        unit.attributes.push(attribute);
        let stats = rewrite(&mut unit);

        let data = &unit.attributes[0].data;
        assert_eq!(slot(&unit, data, supertype), "Lnet/minecraft/Entity;");
        assert_eq!(slot(&unit, data, parameter), "Lnet/minecraft/World;");
        assert_eq!(stats.attributes, 2);
    }

    #[test]
    fn annotation_default() {
        let mut unit = ClassUnit::new("net/minecraft/class_3", Some("java/lang/Object")).unwrap();
        let method = unit
            .add_method(MemberAccessFlags::PUBLIC, "value", "()Ljava/lang/Class;")
            .unwrap();
        let mut data = vec![b'c'];
        append_be(&mut data, utf8(&mut unit, "Lnet/minecraft/class_2;"));
        let attribute = unit.attribute(ATTR_ANNOTATION_DEFAULT, data).unwrap();
        unit.methods[method].attributes.push(attribute);

        rewrite(&mut unit);
        assert_eq!(
            slot(&unit, &unit.methods[0].attributes[0].data, 1),
            "Lnet/minecraft/World;"
        );
    }

    #[test]
    fn code_local_variables() {
        let mut unit = ClassUnit::new("net/minecraft/class_1", Some("java/lang/Object")).unwrap();
        let method = unit
            .add_method(MemberAccessFlags::PUBLIC, "method_1", "(Lnet/minecraft/class_2;)V")
            .unwrap();

        let mut table = Vec::new();
        append_be(&mut table, 2_u16);
        for (name, descriptor, index) in [
            ("this", "Lnet/minecraft/class_1;", 0_u16),
            ("world", "Lnet/minecraft/class_2;", 1),
        ] {
            append_be(&mut table, 0_u16);
            append_be(&mut table, 1_u16);
            append_be(&mut table, utf8(&mut unit, name));
            append_be(&mut table, utf8(&mut unit, descriptor));
            append_be(&mut table, index);
        }

        let mut type_table = Vec::new();
        append_be(&mut type_table, 1_u16);
        append_be(&mut type_table, 0_u16);
        append_be(&mut type_table, 1_u16);
        append_be(&mut type_table, utf8(&mut unit, "items"));
        append_be(&mut type_table, utf8(&mut unit, "Ljava/util/List<Lnet/minecraft/class_2;>;"));
        append_be(&mut type_table, 2_u16);

        let mut type_annotations = Vec::new();
        append_be(&mut type_annotations, 1_u16);
        // local variable target covering one range, no type path
        type_annotations.push(0x40);
        append_be(&mut type_annotations, 1_u16);
        type_annotations.extend_from_slice(&[0, 0, 0, 1, 0, 1]);
        type_annotations.push(0);
        append_be(&mut type_annotations, utf8(&mut unit, "Lnet/minecraft/class_1;"));
        append_be(&mut type_annotations, 0_u16);

        let mut code = Vec::new();
        append_be(&mut code, 1_u16);
        append_be(&mut code, 3_u16);
        append_be(&mut code, 1_u32);
        code.push(0xB1);
        append_be(&mut code, 1_u16);
        code.extend_from_slice(&[0; 8]);
        append_be(&mut code, 3_u16);
        let table_at = push_attribute(&mut unit, &mut code, ATTR_LOCAL_VARIABLE_TABLE, &table);
        let type_table_at =
            push_attribute(&mut unit, &mut code, ATTR_LOCAL_VARIABLE_TYPE_TABLE, &type_table);
        let annotations_at = push_attribute(
            &mut unit,
            &mut code,
            ATTR_RUNTIME_VISIBLE_TYPE_ANNOTATIONS,
            &type_annotations,
        );
        let length = code.len();

        let attribute = unit.attribute(ATTR_CODE, code).unwrap();
        unit.methods[method].attributes.push(attribute);
        let stats = rewrite(&mut unit);

        let code = &unit.methods[0].attributes[0].data;
        assert_eq!(code.len(), length);
        assert_eq!(slot(&unit, code, table_at + 2 + 4), "this");
        assert_eq!(slot(&unit, code, table_at + 2 + 6), "Lnet/minecraft/Entity;");
        assert_eq!(slot(&unit, code, table_at + 12 + 6), "Lnet/minecraft/World;");
        assert_eq!(
            slot(&unit, code, type_table_at + 2 + 6),
            "Ljava/util/List<Lnet/minecraft/World;>;"
        );
        assert_eq!(slot(&unit, code, annotations_at + 12), "Lnet/minecraft/Entity;");
        assert_eq!(stats.attributes, 3);
        assert_eq!(stats.signatures, 1);
    }

    #[test]
    fn record_components() {
        let mut unit = ClassUnit::new("net/minecraft/class_4", Some("java/lang/Record")).unwrap();

        let mut signature = Vec::new();
        append_be(&mut signature, utf8(&mut unit, "Ljava/util/List<Lnet/minecraft/class_2;>;"));

        let mut data = Vec::new();
        append_be(&mut data, 2_u16);
        append_be(&mut data, utf8(&mut unit, "world"));
        let world = data.len();
        append_be(&mut data, utf8(&mut unit, "Lnet/minecraft/class_2;"));
        append_be(&mut data, 0_u16);
        append_be(&mut data, utf8(&mut unit, "items"));
        let items = data.len();
        append_be(&mut data, utf8(&mut unit, "Ljava/util/List;"));
        append_be(&mut data, 1_u16);
        let items_signature = push_attribute(&mut unit, &mut data, ATTR_SIGNATURE, &signature);

        let attribute = unit.attribute(ATTR_RECORD, data).unwrap();
        unit.attributes.push(attribute);
        let stats = rewrite(&mut unit);

        let data = &unit.attributes[0].data;
        assert_eq!(slot(&unit, data, world - 2), "world");
        assert_eq!(slot(&unit, data, world), "Lnet/minecraft/World;");
        assert_eq!(slot(&unit, data, items), "Ljava/util/List;");
        assert_eq!(
            slot(&unit, data, items_signature),
            "Ljava/util/List<Lnet/minecraft/World;>;"
        );
        assert_eq!(stats.attributes, 1);
        assert_eq!(stats.signatures, 1);
    }

    #[test]
    fn inner_class_simple_names() {
        let mut unit = ClassUnit::new("net/minecraft/class_2", Some("java/lang/Object")).unwrap();
        let outer = unit.this_class;

        let entries = [
            ("net/minecraft/class_2$class_3", Some("class_3")),
            ("net/minecraft/class_2$Inner", Some("Inner")),
            ("net/minecraft/class_2$1", None),
            ("net/minecraft/class_1$class_5", Some("class_5")),
            ("net/minecraft/class_2$class_6", Some("class_6")),
            ("net/minecraft/class_2$class_7", Some("class_7")),
        ];
        let mut data = Vec::new();
        append_be(&mut data, entries.len() as u16);
        for (name, simple_name) in entries {
            append_be(&mut data, unit.pool.intern_class(name).unwrap());
            append_be(&mut data, if simple_name.is_some() { outer } else { 0 });
            append_be(&mut data, simple_name.map_or(0, |simple| utf8(&mut unit, simple)));
            append_be(&mut data, 0x0009_u16);
        }
        let attribute = unit.attribute(ATTR_INNER_CLASSES, data).unwrap();
        unit.attributes.push(attribute);

        let stats = rewrite(&mut unit);
        let data = &unit.attributes[0].data;
        let simple_name = |entry: usize| slot(&unit, data, 2 + entry * 8 + 4);

        assert_eq!(simple_name(0), "Spawner");
        assert_eq!(simple_name(1), "Inner");
        assert_eq!(read_be::<u16>(&data[2 + 2 * 8 + 4..]).unwrap(), 0);
        assert_eq!(simple_name(3), "class_5");
        // Moved to the top level: the simple name stays
        assert_eq!(simple_name(4), "class_6");
        assert_eq!(simple_name(5), "Local");
        assert_eq!(stats.attributes, 2);

        let inner = read_be::<u16>(&data[2..]).unwrap();
        assert_eq!(unit.pool.class_name(inner).unwrap(), "net/minecraft/World$Spawner");

        assert!(rewrite(&mut unit).is_unchanged());
    }

    #[test]
    fn simple_name_rules() {
        assert_eq!(inner_simple_name("a/B$C", "a/B$C", "C"), None);
        assert_eq!(inner_simple_name("a/B$C", "x/B$C", "C"), None);
        assert_eq!(inner_simple_name("a/B$C", "a/D$E", "C"), Some("E"));
        assert_eq!(inner_simple_name("a/B$C", "a/D$12", "C"), None);
        assert_eq!(inner_simple_name("a/B$C", "a/D", "C"), None);
    }

    #[test]
    fn truncated_payloads_fail() {
        let mut unit = ClassUnit::new("net/minecraft/class_1", None).unwrap();
        let mut data = Vec::new();
        append_be(&mut data, 3_u16);
        append_be(&mut data, utf8(&mut unit, "Lnet/minecraft/class_2;"));
        let attribute = unit.attribute(ATTR_RUNTIME_VISIBLE_ANNOTATIONS, data).unwrap();
        unit.attributes.push(attribute);
        assert!(ClassRewriter::new(&mapper()).rewrite(&mut unit).is_err());

        let mut unit = ClassUnit::new("net/minecraft/class_1", None).unwrap();
        let mut data = Vec::new();
        append_be(&mut data, 1_u16);
        append_be(&mut data, utf8(&mut unit, "Lnet/minecraft/class_2;"));
        append_be(&mut data, 1_u16);
        append_be(&mut data, utf8(&mut unit, "value"));
        data.push(b'?');
        append_be(&mut data, 0_u16);
        let attribute = unit.attribute(ATTR_RUNTIME_VISIBLE_ANNOTATIONS, data).unwrap();
        unit.attributes.push(attribute);
        assert!(matches!(
            ClassRewriter::new(&mapper()).rewrite(&mut unit),
            Err(crate::Error::Malformed { .. })
        ));
    }

    #[test]
    fn deep_nesting_fails() {
        let mut unit = ClassUnit::new("net/minecraft/class_1", None).unwrap();
        let mut data = Vec::new();
        for _ in 0..=MAX_NESTING_DEPTH {
            data.push(b'[');
            append_be(&mut data, 1_u16);
        }
        data.push(b'I');
        append_be(&mut data, 0_u16);
        let attribute = unit.attribute(ATTR_ANNOTATION_DEFAULT, data).unwrap();
        unit.attributes.push(attribute);
        assert!(matches!(
            ClassRewriter::new(&mapper()).rewrite(&mut unit),
            Err(crate::Error::Malformed { .. })
        ));
    }
}
