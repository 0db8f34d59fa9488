//! The constant pool of a class file.
//!
//! Every symbolic reference a class makes (type names, member references, descriptors,
//! call-site descriptions) lives in the constant pool; bytecode and attributes only carry
//! indices into it. The pool is therefore the single place the rewriter has to edit.
//!
//! Entries are addressed by their 1-based class file index. `long` and `double` constants occupy
//! two slots; the second slot is held by [`Constant::Unusable`], as is slot 0.

use std::collections::HashMap;

use crate::{
    file::{io::append_be, parser::Parser},
    utils::mutf8,
    Error, Result,
};

/// Largest number of slots (including slot 0) a constant pool can hold.
pub const MAX_POOL_SLOTS: usize = u16::MAX as usize;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// The three flavours of member reference constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// `CONSTANT_Fieldref`
    Field,
    /// `CONSTANT_Methodref`
    Method,
    /// `CONSTANT_InterfaceMethodref`
    InterfaceMethod,
}

/// One constant pool entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    /// Slot 0 and the upper slot of `long`/`double` constants
    Unusable,
    /// `CONSTANT_Utf8` holding valid modified UTF-8
    Utf8(String),
    /// `CONSTANT_Utf8` whose bytes do not decode (for example a string literal with an unpaired
    /// surrogate); kept verbatim and never treated as a name
    RawUtf8(Vec<u8>),
    /// `CONSTANT_Integer`
    Integer(i32),
    /// `CONSTANT_Float`, as raw IEEE 754 bits
    Float(u32),
    /// `CONSTANT_Long`
    Long(i64),
    /// `CONSTANT_Double`, as raw IEEE 754 bits
    Double(u64),
    /// `CONSTANT_Class`
    Class {
        /// Utf8 index of the internal name (or array descriptor)
        name_index: u16,
    },
    /// `CONSTANT_String`
    String {
        /// Utf8 index of the literal
        string_index: u16,
    },
    /// `CONSTANT_Fieldref`, `CONSTANT_Methodref` or `CONSTANT_InterfaceMethodref`
    MemberRef {
        /// Which reference flavour this is
        kind: RefKind,
        /// Class index of the declaring type
        class_index: u16,
        /// NameAndType index of the member
        name_and_type_index: u16,
    },
    /// `CONSTANT_NameAndType`
    NameAndType {
        /// Utf8 index of the member name
        name_index: u16,
        /// Utf8 index of the descriptor
        descriptor_index: u16,
    },
    /// `CONSTANT_MethodHandle`
    MethodHandle {
        /// Bytecode behaviour kind (1..=9)
        reference_kind: u8,
        /// Index of the referenced member reference
        reference_index: u16,
    },
    /// `CONSTANT_MethodType`
    MethodType {
        /// Utf8 index of the method descriptor
        descriptor_index: u16,
    },
    /// `CONSTANT_Dynamic`
    Dynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method_attr_index: u16,
        /// NameAndType index of the computed constant
        name_and_type_index: u16,
    },
    /// `CONSTANT_InvokeDynamic`
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method_attr_index: u16,
        /// NameAndType index of the call site
        name_and_type_index: u16,
    },
    /// `CONSTANT_Module`
    Module {
        /// Utf8 index of the module name
        name_index: u16,
    },
    /// `CONSTANT_Package`
    Package {
        /// Utf8 index of the package name
        name_index: u16,
    },
}

impl Constant {
    /// Number of pool slots the constant occupies.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    fn decode(parser: &mut Parser) -> Result<Constant> {
        let tag = parser.read_be::<u8>()?;
        let constant = match tag {
            TAG_UTF8 => {
                let length = parser.read_be::<u16>()? as usize;
                let bytes = parser.read_bytes(length)?;
                match mutf8::decode(bytes) {
                    Ok(value) => Constant::Utf8(value),
                    Err(_) => Constant::RawUtf8(bytes.to_vec()),
                }
            }
            TAG_INTEGER => Constant::Integer(parser.read_be()?),
            TAG_FLOAT => Constant::Float(parser.read_be()?),
            TAG_LONG => Constant::Long(parser.read_be()?),
            TAG_DOUBLE => Constant::Double(parser.read_be()?),
            TAG_CLASS => Constant::Class {
                name_index: parser.read_be()?,
            },
            TAG_STRING => Constant::String {
                string_index: parser.read_be()?,
            },
            TAG_FIELDREF | TAG_METHODREF | TAG_INTERFACE_METHODREF => Constant::MemberRef {
                kind: match tag {
                    TAG_FIELDREF => RefKind::Field,
                    TAG_METHODREF => RefKind::Method,
                    _ => RefKind::InterfaceMethod,
                },
                class_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            TAG_NAME_AND_TYPE => Constant::NameAndType {
                name_index: parser.read_be()?,
                descriptor_index: parser.read_be()?,
            },
            TAG_METHOD_HANDLE => Constant::MethodHandle {
                reference_kind: parser.read_be()?,
                reference_index: parser.read_be()?,
            },
            TAG_METHOD_TYPE => Constant::MethodType {
                descriptor_index: parser.read_be()?,
            },
            TAG_DYNAMIC => Constant::Dynamic {
                bootstrap_method_attr_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            TAG_INVOKE_DYNAMIC => Constant::InvokeDynamic {
                bootstrap_method_attr_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            TAG_MODULE => Constant::Module {
                name_index: parser.read_be()?,
            },
            TAG_PACKAGE => Constant::Package {
                name_index: parser.read_be()?,
            },
            _ => {
                return Err(malformed_error!(
                    "Invalid constant pool tag {} at offset {}",
                    tag,
                    parser.pos() - 1
                ))
            }
        };

        Ok(constant)
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Constant::Unusable => {}
            Constant::Utf8(value) => write_utf8(out, &mutf8::encode(value))?,
            Constant::RawUtf8(bytes) => write_utf8(out, bytes)?,
            Constant::Integer(value) => {
                out.push(TAG_INTEGER);
                append_be(out, *value);
            }
            Constant::Float(bits) => {
                out.push(TAG_FLOAT);
                append_be(out, *bits);
            }
            Constant::Long(value) => {
                out.push(TAG_LONG);
                append_be(out, *value);
            }
            Constant::Double(bits) => {
                out.push(TAG_DOUBLE);
                append_be(out, *bits);
            }
            Constant::Class { name_index } => {
                out.push(TAG_CLASS);
                append_be(out, *name_index);
            }
            Constant::String { string_index } => {
                out.push(TAG_STRING);
                append_be(out, *string_index);
            }
            Constant::MemberRef {
                kind,
                class_index,
                name_and_type_index,
            } => {
                out.push(match kind {
                    RefKind::Field => TAG_FIELDREF,
                    RefKind::Method => TAG_METHODREF,
                    RefKind::InterfaceMethod => TAG_INTERFACE_METHODREF,
                });
                append_be(out, *class_index);
                append_be(out, *name_and_type_index);
            }
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => {
                out.push(TAG_NAME_AND_TYPE);
                append_be(out, *name_index);
                append_be(out, *descriptor_index);
            }
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => {
                out.push(TAG_METHOD_HANDLE);
                out.push(*reference_kind);
                append_be(out, *reference_index);
            }
            Constant::MethodType { descriptor_index } => {
                out.push(TAG_METHOD_TYPE);
                append_be(out, *descriptor_index);
            }
            Constant::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                out.push(TAG_DYNAMIC);
                append_be(out, *bootstrap_method_attr_index);
                append_be(out, *name_and_type_index);
            }
            Constant::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                out.push(TAG_INVOKE_DYNAMIC);
                append_be(out, *bootstrap_method_attr_index);
                append_be(out, *name_and_type_index);
            }
            Constant::Module { name_index } => {
                out.push(TAG_MODULE);
                append_be(out, *name_index);
            }
            Constant::Package { name_index } => {
                out.push(TAG_PACKAGE);
                append_be(out, *name_index);
            }
        }
        Ok(())
    }
}

fn write_utf8(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let Ok(length) = u16::try_from(bytes.len()) else {
        return Err(malformed_error!("Utf8 constant of {} bytes exceeds 65535", bytes.len()));
    };
    out.push(TAG_UTF8);
    append_be(out, length);
    out.extend_from_slice(bytes);
    Ok(())
}

/// A decoded constant pool with append-only interning.
///
/// Existing entries are never removed. New names are added through the `intern_*` methods,
/// which reuse an equal entry when one exists, so interning the same value twice yields the
/// same index. Lookups go through hash indices over Utf8 strings and over the Class,
/// NameAndType and member reference entries, so interning is constant time.
///
/// Two pools are equal when their entries are; the indices are derived state.
#[derive(Debug, Clone)]
pub struct ConstantPool {
    entries: Vec<Constant>,
    utf8_index: HashMap<String, u16>,
    symbol_index: HashMap<Constant, u16>,
}

impl PartialEq for ConstantPool {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for ConstantPool {}

/// Entries the `intern_*` methods look up by value.
fn is_symbol(constant: &Constant) -> bool {
    matches!(
        constant,
        Constant::Class { .. } | Constant::NameAndType { .. } | Constant::MemberRef { .. }
    )
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    /// An empty pool holding only the reserved slot 0.
    #[must_use]
    pub fn new() -> Self {
        ConstantPool {
            entries: vec![Constant::Unusable],
            utf8_index: HashMap::new(),
            symbol_index: HashMap::new(),
        }
    }

    /// Decode `constant_pool_count` and the following entries.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncation and [`crate::Error::Malformed`] for an
    /// invalid tag or a zero pool count.
    pub fn decode(parser: &mut Parser) -> Result<ConstantPool> {
        let count = parser.read_be::<u16>()? as usize;
        if count == 0 {
            return Err(malformed_error!("Constant pool count must be at least 1"));
        }

        let mut pool = ConstantPool::new();
        pool.entries.reserve(count);
        while pool.entries.len() < count {
            let constant = Constant::decode(parser)?;
            let width = constant.width();
            if pool.entries.len() + width > count {
                return Err(malformed_error!(
                    "8-byte constant at index {} overruns the pool",
                    pool.entries.len()
                ));
            }
            pool.append(constant);
        }

        Ok(pool)
    }

    /// Encode `constant_pool_count` and all entries.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a Utf8 constant is too long to encode.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        append_be(out, self.count());
        for constant in &self.entries {
            constant.encode(out)?;
        }
        Ok(())
    }

    /// `constant_pool_count` as stored in the class file (entries plus the reserved slot 0).
    #[must_use]
    pub fn count(&self) -> u16 {
        // push() keeps the pool within MAX_POOL_SLOTS
        self.entries.len() as u16
    }

    /// Number of slots including slot 0.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the pool holds no constants besides slot 0.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Iterate over all usable entries with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != Constant::Unusable)
            .map(|(i, c)| (i as u16, c))
    }

    /// The entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for index 0, an index past the end, or the upper
    /// slot of a `long`/`double`.
    pub fn get(&self, index: u16) -> Result<&Constant> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(malformed_error!(
                "Invalid constant pool index {} (pool has {} slots)",
                index,
                self.entries.len()
            )),
            Some(constant) => Ok(constant),
        }
    }

    /// Replace the entry at `index`.
    ///
    /// Only entries of the same width may be exchanged.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` is invalid or the widths differ.
    pub fn set(&mut self, index: u16, constant: Constant) -> Result<()> {
        let old = self.get(index)?;
        if old.width() != constant.width() {
            return Err(malformed_error!(
                "Cannot replace constant {} with one of a different width",
                index
            ));
        }

        if let Constant::Utf8(value) = old {
            if self.utf8_index.get(value) == Some(&index) {
                let value = value.clone();
                self.utf8_index.remove(&value);
            }
        } else if is_symbol(old) && self.symbol_index.get(old) == Some(&index) {
            let old = old.clone();
            self.symbol_index.remove(&old);
        }

        self.index(index, &constant);
        self.entries[index as usize] = constant;
        Ok(())
    }

    /// Append a constant and return its index.
    ///
    /// # Errors
    /// Returns [`crate::Error::PoolOverflow`] if the pool would exceed 65535 slots.
    pub fn push(&mut self, constant: Constant) -> Result<u16> {
        let required = self.entries.len() + constant.width();
        if required > MAX_POOL_SLOTS {
            return Err(Error::PoolOverflow(required));
        }

        Ok(self.append(constant))
    }

    fn append(&mut self, constant: Constant) -> u16 {
        let index = self.entries.len() as u16;
        self.index(index, &constant);
        let wide = constant.width() == 2;
        self.entries.push(constant);
        if wide {
            self.entries.push(Constant::Unusable);
        }
        index
    }

    fn index(&mut self, index: u16, constant: &Constant) {
        if let Constant::Utf8(value) = constant {
            self.utf8_index.entry(value.clone()).or_insert(index);
        } else if is_symbol(constant) {
            self.symbol_index.entry(constant.clone()).or_insert(index);
        }
    }

    /// The string of the Utf8 entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is missing or not a decodable Utf8.
    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value),
            other => Err(malformed_error!(
                "Constant {} is not a Utf8 name - {:?}",
                index,
                other
            )),
        }
    }

    /// The internal name (or array descriptor) of the Class entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is not a Class or its name is invalid.
    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            other => Err(malformed_error!(
                "Constant {} is not a Class - {:?}",
                index,
                other
            )),
        }
    }

    /// The `(name, descriptor)` pair of the NameAndType entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is not a NameAndType.
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            other => Err(malformed_error!(
                "Constant {} is not a NameAndType - {:?}",
                index,
                other
            )),
        }
    }

    /// The `(owner, name, descriptor)` triple of the member reference at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is not a member reference.
    pub fn member_ref(&self, index: u16) -> Result<(&str, &str, &str)> {
        match self.get(index)? {
            Constant::MemberRef {
                class_index,
                name_and_type_index,
                ..
            } => {
                let owner = self.class_name(*class_index)?;
                let (name, descriptor) = self.name_and_type(*name_and_type_index)?;
                Ok((owner, name, descriptor))
            }
            other => Err(malformed_error!(
                "Constant {} is not a member reference - {:?}",
                index,
                other
            )),
        }
    }

    /// Index of a Utf8 entry holding `value`, adding one if none exists.
    ///
    /// # Errors
    /// Returns [`crate::Error::PoolOverflow`] if a new entry does not fit.
    pub fn intern_utf8(&mut self, value: &str) -> Result<u16> {
        if let Some(index) = self.utf8_index.get(value) {
            return Ok(*index);
        }
        self.push(Constant::Utf8(value.to_string()))
    }

    /// Index of a Class entry naming `name`, adding entries as needed.
    ///
    /// # Errors
    /// Returns [`crate::Error::PoolOverflow`] if a new entry does not fit.
    pub fn intern_class(&mut self, name: &str) -> Result<u16> {
        let name_index = self.intern_utf8(name)?;
        self.intern(Constant::Class { name_index })
    }

    /// Index of a NameAndType entry for `(name, descriptor)`, adding entries as needed.
    ///
    /// # Errors
    /// Returns [`crate::Error::PoolOverflow`] if a new entry does not fit.
    pub fn intern_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name_index = self.intern_utf8(name)?;
        let descriptor_index = self.intern_utf8(descriptor)?;
        self.intern(Constant::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    /// Index of a member reference entry, adding entries as needed.
    ///
    /// # Errors
    /// Returns [`crate::Error::PoolOverflow`] if a new entry does not fit.
    pub fn intern_member_ref(
        &mut self,
        kind: RefKind,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16> {
        let class_index = self.intern_class(owner)?;
        let name_and_type_index = self.intern_name_and_type(name, descriptor)?;
        self.intern(Constant::MemberRef {
            kind,
            class_index,
            name_and_type_index,
        })
    }

    fn intern(&mut self, constant: Constant) -> Result<u16> {
        if let Some(index) = self.symbol_index.get(&constant) {
            return Ok(*index);
        }
        self.push(constant)
    }
}
