//! In-memory model of a JVM class unit.
//!
//! [`ClassUnit`] decodes a `.class` buffer into its constant pool, declared members and raw
//! attributes, and encodes it back. Only the parts that carry symbolic names are modelled in
//! detail; attribute payloads and bytecode stay opaque byte vectors. Since bytecode refers to
//! everything through constant pool indices, and the rewriter never renumbers existing entries,
//! method bodies survive a rewrite byte for byte.
//!
//! # Key Components
//!
//! - [`ClassUnit`] - The decoded unit with decode/encode and a small builder API
//! - [`MemberInfo`] - A declared field or method
//! - [`AttributeInfo`] - A named, opaque attribute payload
//! - [`constant::ConstantPool`] - The constant pool with append-only interning
//! - [`flags`] - Access flag sets
//!
//! # Usage Examples
//!
//! ```rust
//! use crossmap::classfile::{flags::MemberAccessFlags, ClassUnit};
//!
//! let mut unit = ClassUnit::new("net/minecraft/class_1", Some("java/lang/Object"))?;
//! unit.add_method(MemberAccessFlags::PUBLIC, "method_1", "()V")?;
//!
//! let bytes = unit.encode()?;
//! assert_eq!(ClassUnit::peek_name(&bytes)?, "net/minecraft/class_1");
//! assert_eq!(ClassUnit::decode(&bytes)?, unit);
//! # Ok::<(), crossmap::Error>(())
//! ```

pub mod constant;
pub mod flags;

use crate::{
    classfile::{
        constant::ConstantPool,
        flags::{ClassAccessFlags, MemberAccessFlags},
    },
    file::{io::append_be, parser::Parser},
    Error, Result,
};

/// The `0xCAFEBABE` class file magic.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Name of the attribute holding generic signatures.
pub const ATTR_SIGNATURE: &str = "Signature";
/// Name of the attribute naming the enclosing method of a local or anonymous class.
pub const ATTR_ENCLOSING_METHOD: &str = "EnclosingMethod";
/// Name of the attribute holding a method body.
pub const ATTR_CODE: &str = "Code";
/// Name of the attribute listing the nested classes a class refers to.
pub const ATTR_INNER_CLASSES: &str = "InnerClasses";
/// Name of the attribute listing the components of a record class.
pub const ATTR_RECORD: &str = "Record";
/// Name of the `Code` attribute mapping locals to descriptors.
pub const ATTR_LOCAL_VARIABLE_TABLE: &str = "LocalVariableTable";
/// Name of the `Code` attribute mapping locals to generic signatures.
pub const ATTR_LOCAL_VARIABLE_TYPE_TABLE: &str = "LocalVariableTypeTable";
/// Name of the attribute holding the default value of an annotation element.
pub const ATTR_ANNOTATION_DEFAULT: &str = "AnnotationDefault";
/// Name of the attribute holding annotations retained at run time.
pub const ATTR_RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
/// Name of the attribute holding annotations retained in the class file only.
pub const ATTR_RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";
/// Per-parameter form of [`ATTR_RUNTIME_VISIBLE_ANNOTATIONS`].
pub const ATTR_RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeVisibleParameterAnnotations";
/// Per-parameter form of [`ATTR_RUNTIME_INVISIBLE_ANNOTATIONS`].
pub const ATTR_RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &str =
    "RuntimeInvisibleParameterAnnotations";
/// Name of the attribute holding run time annotations on type uses.
pub const ATTR_RUNTIME_VISIBLE_TYPE_ANNOTATIONS: &str = "RuntimeVisibleTypeAnnotations";
/// Name of the attribute holding class-file-only annotations on type uses.
pub const ATTR_RUNTIME_INVISIBLE_TYPE_ANNOTATIONS: &str = "RuntimeInvisibleTypeAnnotations";

/// An attribute with its payload left undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    /// Utf8 index of the attribute name
    pub name_index: u16,
    /// Raw `info` bytes
    pub data: Vec<u8>,
}

impl AttributeInfo {
    fn decode(parser: &mut Parser) -> Result<AttributeInfo> {
        let name_index = parser.read_be::<u16>()?;
        let length = parser.read_be::<u32>()? as usize;
        let data = parser.read_bytes(length)?.to_vec();
        Ok(AttributeInfo { name_index, data })
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let Ok(length) = u32::try_from(self.data.len()) else {
            return Err(malformed_error!("Attribute payload of {} bytes", self.data.len()));
        };
        append_be(out, self.name_index);
        append_be(out, length);
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

/// A declared field or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// Access flags
    pub access: MemberAccessFlags,
    /// Utf8 index of the simple name
    pub name_index: u16,
    /// Utf8 index of the descriptor
    pub descriptor_index: u16,
    /// Member attributes (`Code`, `Signature`, ...)
    pub attributes: Vec<AttributeInfo>,
}

impl MemberInfo {
    fn decode(parser: &mut Parser) -> Result<MemberInfo> {
        let access = MemberAccessFlags::from_bits_retain(parser.read_be()?);
        let name_index = parser.read_be()?;
        let descriptor_index = parser.read_be()?;
        let attributes = decode_attributes(parser)?;
        Ok(MemberInfo {
            access,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        append_be(out, self.access.bits());
        append_be(out, self.name_index);
        append_be(out, self.descriptor_index);
        encode_attributes(&self.attributes, out)
    }
}

fn decode_attributes(parser: &mut Parser) -> Result<Vec<AttributeInfo>> {
    let count = parser.read_be::<u16>()?;
    (0..count).map(|_| AttributeInfo::decode(parser)).collect()
}

fn encode_attributes(attributes: &[AttributeInfo], out: &mut Vec<u8>) -> Result<()> {
    append_be(out, count_u16(attributes.len(), "attributes")?);
    for attribute in attributes {
        attribute.encode(out)?;
    }
    Ok(())
}

fn count_u16(count: usize, what: &str) -> Result<u16> {
    u16::try_from(count).map_err(|_| malformed_error!("Too many {} - {}", what, count))
}

/// A decoded class unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassUnit {
    /// `minor_version`
    pub minor_version: u16,
    /// `major_version`
    pub major_version: u16,
    /// The constant pool
    pub pool: ConstantPool,
    /// Class access flags
    pub access: ClassAccessFlags,
    /// Class index of this class
    pub this_class: u16,
    /// Class index of the superclass, 0 for `java/lang/Object` and `module-info`
    pub super_class: u16,
    /// Class indices of the direct superinterfaces
    pub interfaces: Vec<u16>,
    /// Declared fields
    pub fields: Vec<MemberInfo>,
    /// Declared methods
    pub methods: Vec<MemberInfo>,
    /// Class attributes
    pub attributes: Vec<AttributeInfo>,
}

impl ClassUnit {
    /// Decode a class file.
    ///
    /// Beyond the structural layout this checks that every index naming the class, its
    /// supertypes, its members and its attributes resolves to an entry of the right kind, so a
    /// unit that decodes can be rewritten without dangling references.
    ///
    /// # Errors
    /// - [`crate::Error::InvalidMagic`] if the buffer does not start with `0xCAFEBABE`
    /// - [`crate::Error::OutOfBounds`] if the buffer is truncated
    /// - [`crate::Error::Malformed`] for invalid structure or trailing bytes
    pub fn decode(data: &[u8]) -> Result<ClassUnit> {
        let mut parser = Parser::new(data);
        let (minor_version, major_version) = Self::decode_header(&mut parser)?;
        let pool = ConstantPool::decode(&mut parser)?;

        let access = ClassAccessFlags::from_bits_retain(parser.read_be()?);
        let this_class = parser.read_be()?;
        let super_class = parser.read_be()?;

        let interface_count = parser.read_be::<u16>()?;
        let interfaces = (0..interface_count)
            .map(|_| parser.read_be::<u16>())
            .collect::<Result<Vec<_>>>()?;

        let field_count = parser.read_be::<u16>()?;
        let fields = (0..field_count)
            .map(|_| MemberInfo::decode(&mut parser))
            .collect::<Result<Vec<_>>>()?;

        let method_count = parser.read_be::<u16>()?;
        let methods = (0..method_count)
            .map(|_| MemberInfo::decode(&mut parser))
            .collect::<Result<Vec<_>>>()?;

        let attributes = decode_attributes(&mut parser)?;

        if parser.has_more_data() {
            return Err(malformed_error!(
                "{} trailing bytes after class file end",
                parser.remaining()
            ));
        }

        let unit = ClassUnit {
            minor_version,
            major_version,
            pool,
            access,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        };
        unit.validate()?;
        Ok(unit)
    }

    fn decode_header(parser: &mut Parser) -> Result<(u16, u16)> {
        let magic = parser.read_be::<u32>()?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic(magic));
        }
        Ok((parser.read_be()?, parser.read_be()?))
    }

    fn validate(&self) -> Result<()> {
        self.name()?;
        self.super_name()?;
        self.interface_names()?;
        for member in self.fields.iter().chain(&self.methods) {
            self.member_name(member)?;
            self.member_descriptor(member)?;
            for attribute in &member.attributes {
                self.attribute_name(attribute)?;
            }
        }
        for attribute in &self.attributes {
            self.attribute_name(attribute)?;
        }
        Ok(())
    }

    /// Read only as far as `this_class` and return the unit's internal name.
    ///
    /// # Errors
    /// Same as [`ClassUnit::decode`], limited to the header and constant pool.
    pub fn peek_name(data: &[u8]) -> Result<String> {
        let mut parser = Parser::new(data);
        Self::decode_header(&mut parser)?;
        let pool = ConstantPool::decode(&mut parser)?;
        parser.advance_by(2)?;
        let this_class = parser.read_be::<u16>()?;
        Ok(pool.class_name(this_class)?.to_string())
    }

    /// Encode the unit back into class file bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a count or length no longer fits its field.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(1024);
        append_be(&mut out, MAGIC);
        append_be(&mut out, self.minor_version);
        append_be(&mut out, self.major_version);
        self.pool.encode(&mut out)?;

        append_be(&mut out, self.access.bits());
        append_be(&mut out, self.this_class);
        append_be(&mut out, self.super_class);

        append_be(&mut out, count_u16(self.interfaces.len(), "interfaces")?);
        for interface in &self.interfaces {
            append_be(&mut out, *interface);
        }

        append_be(&mut out, count_u16(self.fields.len(), "fields")?);
        for field in &self.fields {
            field.encode(&mut out)?;
        }

        append_be(&mut out, count_u16(self.methods.len(), "methods")?);
        for method in &self.methods {
            method.encode(&mut out)?;
        }

        encode_attributes(&self.attributes, &mut out)?;
        Ok(out)
    }

    /// Start an empty unit (Java 8 class file version, `public` with `ACC_SUPER`).
    ///
    /// # Errors
    /// Returns [`crate::Error::PoolOverflow`] only in theory; two names always fit.
    pub fn new(name: &str, super_name: Option<&str>) -> Result<ClassUnit> {
        let mut pool = ConstantPool::new();
        let this_class = pool.intern_class(name)?;
        let super_class = match super_name {
            Some(super_name) => pool.intern_class(super_name)?,
            None => 0,
        };

        Ok(ClassUnit {
            minor_version: 0,
            major_version: 52,
            pool,
            access: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        })
    }

    /// Add a direct superinterface.
    ///
    /// # Errors
    /// Returns [`crate::Error::PoolOverflow`] if the pool is full.
    pub fn add_interface(&mut self, name: &str) -> Result<()> {
        let index = self.pool.intern_class(name)?;
        self.interfaces.push(index);
        Ok(())
    }

    /// Declare a field and return its position in [`ClassUnit::fields`].
    ///
    /// # Errors
    /// Returns [`crate::Error::PoolOverflow`] if the pool is full.
    pub fn add_field(
        &mut self,
        access: MemberAccessFlags,
        name: &str,
        descriptor: &str,
    ) -> Result<usize> {
        let member = self.member(access, name, descriptor)?;
        self.fields.push(member);
        Ok(self.fields.len() - 1)
    }

    /// Declare a method and return its position in [`ClassUnit::methods`].
    ///
    /// # Errors
    /// Returns [`crate::Error::PoolOverflow`] if the pool is full.
    pub fn add_method(
        &mut self,
        access: MemberAccessFlags,
        name: &str,
        descriptor: &str,
    ) -> Result<usize> {
        let member = self.member(access, name, descriptor)?;
        self.methods.push(member);
        Ok(self.methods.len() - 1)
    }

    fn member(&mut self, access: MemberAccessFlags, name: &str, descriptor: &str) -> Result<MemberInfo> {
        Ok(MemberInfo {
            access,
            name_index: self.pool.intern_utf8(name)?,
            descriptor_index: self.pool.intern_utf8(descriptor)?,
            attributes: Vec::new(),
        })
    }

    /// Build an attribute named `name`, interning the name.
    ///
    /// # Errors
    /// Returns [`crate::Error::PoolOverflow`] if the pool is full.
    pub fn attribute(&mut self, name: &str, data: Vec<u8>) -> Result<AttributeInfo> {
        Ok(AttributeInfo {
            name_index: self.pool.intern_utf8(name)?,
            data,
        })
    }

    /// Build a `Signature` attribute holding `signature`.
    ///
    /// # Errors
    /// Returns [`crate::Error::PoolOverflow`] if the pool is full.
    pub fn signature_attribute(&mut self, signature: &str) -> Result<AttributeInfo> {
        let index = self.pool.intern_utf8(signature)?;
        self.attribute(ATTR_SIGNATURE, index.to_be_bytes().to_vec())
    }

    /// Internal name of this class.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `this_class` does not name a class.
    pub fn name(&self) -> Result<&str> {
        self.pool.class_name(self.this_class)
    }

    /// Internal name of the superclass, `None` if there is none.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `super_class` is set but does not name a class.
    pub fn super_name(&self) -> Result<Option<&str>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.pool.class_name(self.super_class).map(Some)
    }

    /// Internal names of the direct superinterfaces.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if an entry does not name a class.
    pub fn interface_names(&self) -> Result<Vec<&str>> {
        self.interfaces
            .iter()
            .map(|index| self.pool.class_name(*index))
            .collect()
    }

    /// Simple name of a member.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the index is not a Utf8 entry.
    pub fn member_name(&self, member: &MemberInfo) -> Result<&str> {
        self.pool.utf8(member.name_index)
    }

    /// Descriptor of a member.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the index is not a Utf8 entry.
    pub fn member_descriptor(&self, member: &MemberInfo) -> Result<&str> {
        self.pool.utf8(member.descriptor_index)
    }

    /// Name of an attribute.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the index is not a Utf8 entry.
    pub fn attribute_name(&self, attribute: &AttributeInfo) -> Result<&str> {
        self.pool.utf8(attribute.name_index)
    }

    /// The signature stored in the `Signature` attribute among `attributes`, if any.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the attribute payload is not a valid Utf8 index.
    pub fn signature<'a>(&'a self, attributes: &'a [AttributeInfo]) -> Result<Option<&'a str>> {
        for attribute in attributes {
            if self.attribute_name(attribute)? == ATTR_SIGNATURE {
                let &[high, low] = attribute.data.as_slice() else {
                    return Err(malformed_error!(
                        "Signature attribute of {} bytes",
                        attribute.data.len()
                    ));
                };
                return self.pool.utf8(u16::from_be_bytes([high, low])).map(Some);
            }
        }
        Ok(None)
    }
}
