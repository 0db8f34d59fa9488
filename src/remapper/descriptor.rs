//! Descriptor and generic signature remapping.
//!
//! Descriptors (`(ILnet/minecraft/class_1;)[J`) and generic signatures
//! (`<T:Ljava/lang/Object;>Ljava/util/List<TT;>;`) embed internal class names between an `L`
//! and the next delimiter. Both are rewritten by copying the input through and replacing only
//! those class names, so every byte outside a class name is preserved.
//!
//! Signatures are parsed with a small recursive-descent parser following the JVM grammar for
//! class, method and field signatures. Inner class suffixes (`Outer<TT;>.Inner`) are mapped
//! through their binary name (`Outer$Inner`) and re-split after translation.

use std::borrow::Cow;

use crate::{remapper::NameMapper, Result};

/// Remap every class name inside a field or method descriptor.
///
/// Returns the input unchanged (borrowed) when nothing maps to a different name.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if an object type is not terminated by `;`.
pub fn remap_descriptor<'a, M>(mapper: &M, descriptor: &'a str) -> Result<Cow<'a, str>>
where
    M: NameMapper + ?Sized,
{
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut search = 0;

    while let Some(found) = descriptor[search..].find('L') {
        let start = search + found + 1;
        let Some(length) = descriptor[start..].find(';') else {
            return Err(malformed_error!("Unterminated object type in descriptor '{}'", descriptor));
        };
        let end = start + length;
        let name = &descriptor[start..end];

        let mapped = mapper.map_class(name);
        if mapped != name {
            let buffer = out.get_or_insert_with(|| String::with_capacity(descriptor.len() + 16));
            buffer.push_str(&descriptor[copied..start]);
            buffer.push_str(&mapped);
            copied = end;
        }
        search = end + 1;
    }

    Ok(match out {
        Some(mut buffer) => {
            buffer.push_str(&descriptor[copied..]);
            Cow::Owned(buffer)
        }
        None => Cow::Borrowed(descriptor),
    })
}

/// The three shapes a `Signature` attribute can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    /// `ClassSignature`, found on classes
    Class,
    /// `MethodSignature`, found on methods
    Method,
    /// `FieldSignature` (a reference type signature), found on fields and record components
    Field,
}

/// Remap every class name inside a generic signature.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if `signature` does not follow the grammar for `kind`.
pub fn remap_signature<'a, M>(
    mapper: &M,
    signature: &'a str,
    kind: SignatureKind,
) -> Result<Cow<'a, str>>
where
    M: NameMapper + ?Sized,
{
    let mut remapper = SignatureRemapper {
        mapper,
        input: signature,
        bytes: signature.as_bytes(),
        pos: 0,
        out: String::with_capacity(signature.len() + 16),
        changed: false,
    };

    match kind {
        SignatureKind::Class => remapper.class_signature()?,
        SignatureKind::Method => remapper.method_signature()?,
        SignatureKind::Field => remapper.reference_type()?,
    }

    if remapper.pos != remapper.bytes.len() {
        return Err(malformed_error!(
            "Trailing characters at {} in signature '{}'",
            remapper.pos,
            signature
        ));
    }

    Ok(if remapper.changed {
        Cow::Owned(remapper.out)
    } else {
        Cow::Borrowed(signature)
    })
}

struct SignatureRemapper<'s, 'm, M: NameMapper + ?Sized> {
    mapper: &'m M,
    input: &'s str,
    bytes: &'s [u8],
    pos: usize,
    out: String,
    changed: bool,
}

impl<M: NameMapper + ?Sized> SignatureRemapper<'_, '_, M> {
    fn peek(&self) -> Result<u8> {
        self.bytes.get(self.pos).copied().ok_or_else(|| {
            malformed_error!("Unexpected end of signature '{}'", self.input)
        })
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        let found = self.peek()?;
        if found != byte {
            return Err(malformed_error!(
                "Expected '{}' at {} in signature '{}', found '{}'",
                byte as char,
                self.pos,
                self.input,
                found as char
            ));
        }
        self.out.push(byte as char);
        self.pos += 1;
        Ok(())
    }

    /// Consume an identifier up to (not including) the first byte in `delimiters`.
    fn identifier(&mut self, delimiters: &[u8]) -> Result<&str> {
        let start = self.pos;
        while !delimiters.contains(&self.peek()?) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(malformed_error!(
                "Empty identifier at {} in signature '{}'",
                start,
                self.input
            ));
        }
        Ok(&self.input[start..self.pos])
    }

    fn class_signature(&mut self) -> Result<()> {
        if self.peek()? == b'<' {
            self.type_parameters()?;
        }
        // superclass, then any number of superinterfaces
        self.class_type()?;
        while self.pos < self.bytes.len() {
            self.class_type()?;
        }
        Ok(())
    }

    fn method_signature(&mut self) -> Result<()> {
        if self.peek()? == b'<' {
            self.type_parameters()?;
        }
        self.expect(b'(')?;
        while self.peek()? != b')' {
            self.java_type()?;
        }
        self.expect(b')')?;

        if self.peek()? == b'V' {
            self.expect(b'V')?;
        } else {
            self.java_type()?;
        }

        while self.pos < self.bytes.len() {
            self.expect(b'^')?;
            if self.peek()? == b'T' {
                self.type_variable()?;
            } else {
                self.class_type()?;
            }
        }
        Ok(())
    }

    fn type_parameters(&mut self) -> Result<()> {
        self.expect(b'<')?;
        loop {
            let name = self.identifier(b":")?.to_string();
            self.out.push_str(&name);

            // class bound, possibly empty
            self.expect(b':')?;
            if matches!(self.peek()?, b'L' | b'[' | b'T') {
                self.reference_type()?;
            }
            // interface bounds
            while self.peek()? == b':' {
                self.expect(b':')?;
                self.reference_type()?;
            }

            if self.peek()? == b'>' {
                break;
            }
        }
        self.expect(b'>')
    }

    fn java_type(&mut self) -> Result<()> {
        match self.peek()? {
            base @ (b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => self.expect(base),
            _ => self.reference_type(),
        }
    }

    fn reference_type(&mut self) -> Result<()> {
        match self.peek()? {
            b'L' => self.class_type(),
            b'T' => self.type_variable(),
            b'[' => {
                self.expect(b'[')?;
                self.java_type()
            }
            other => Err(malformed_error!(
                "Unexpected '{}' at {} in signature '{}'",
                other as char,
                self.pos,
                self.input
            )),
        }
    }

    fn type_variable(&mut self) -> Result<()> {
        self.expect(b'T')?;
        let name = self.identifier(b";")?.to_string();
        self.out.push_str(&name);
        self.expect(b';')
    }

    fn class_type(&mut self) -> Result<()> {
        self.expect(b'L')?;

        let mut original = self.identifier(b"<.;")?.to_string();
        let mut mapped = self.map(&original);
        self.out.push_str(&mapped);

        loop {
            match self.peek()? {
                b'<' => self.type_arguments()?,
                b'.' => {
                    self.expect(b'.')?;
                    let inner = self.identifier(b"<.;")?.to_string();
                    let binary = format!("{original}${inner}");
                    let mapped_binary = self.map(&binary);

                    let outer_prefix = format!("{mapped}$");
                    let mapped_inner = match mapped_binary.strip_prefix(&outer_prefix) {
                        Some(suffix) if !suffix.is_empty() => suffix.to_string(),
                        _ => inner.clone(),
                    };
                    if mapped_inner != inner {
                        self.changed = true;
                    }
                    self.out.push_str(&mapped_inner);

                    mapped = format!("{mapped}${mapped_inner}");
                    original = binary;
                }
                _ => break,
            }
        }

        self.expect(b';')
    }

    fn type_arguments(&mut self) -> Result<()> {
        self.expect(b'<')?;
        while self.peek()? != b'>' {
            match self.peek()? {
                b'*' => self.expect(b'*')?,
                wildcard @ (b'+' | b'-') => {
                    self.expect(wildcard)?;
                    self.reference_type()?;
                }
                _ => self.reference_type()?,
            }
        }
        self.expect(b'>')
    }

    fn map(&mut self, name: &str) -> String {
        let mapped = self.mapper.map_class(name);
        if mapped != name {
            self.changed = true;
        }
        mapped.into_owned()
    }
}
