//! Cursor-based byte stream parser for class file decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a bounds-checked reader over a
//! byte slice. It is the only way the class file decoder touches raw bytes, so every truncated
//! or lying length field surfaces as [`crate::Error::OutOfBounds`] instead of a panic.
//!
//! # Key Components
//!
//! - [`crate::file::parser::Parser::read_be`] - Read primitive types (big-endian)
//! - [`crate::file::parser::Parser::read_bytes`] - Borrow a length-delimited slice
//! - [`crate::file::parser::Parser::read_mutf8`] - Read a `u2`-prefixed modified UTF-8 string
//! - [`crate::file::parser::Parser::transactional`] - Speculative parsing with rollback
//!
//! # Usage Examples
//!
//! ```rust
//! use crossmap::Parser;
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x03, b'F', b'o', b'o'];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_be::<u32>()?, 0xCAFEBABE);
//! assert_eq!(parser.read_mutf8()?, "Foo");
//! assert!(!parser.has_more_data());
//! # Ok::<(), crossmap::Error>(())
//! ```

use crate::{
    file::io::{read_be_at, ClassIO},
    utils::mutf8,
    Result,
};

/// A bounds-checked big-endian cursor over a byte slice.
///
/// The parser maintains an internal position and refuses every read that would run past the
/// end of the buffer.
///
/// # Examples
///
/// ```rust
/// use crossmap::Parser;
///
/// let data = [0x00, 0x02, 0xAA, 0xBB, 0xCC];
/// let mut parser = Parser::new(&data);
///
/// let len = parser.read_be::<u16>()? as usize;
/// assert_eq!(parser.read_bytes(len)?, &[0xAA, 0xBB]);
/// assert_eq!(parser.remaining(), 1);
/// # Ok::<(), crossmap::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Number of bytes left after the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if step > self.remaining() {
            return Err(out_of_bounds_error!());
        }

        self.position += step;
        Ok(())
    }

    /// Peek at the next byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is at or beyond the data length.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(out_of_bounds_error!());
        }
        Ok(self.data[self.position])
    }

    /// Execute a closure transactionally, rolling back on failure.
    ///
    /// The parser position is only committed if the closure succeeds; on `Err` it is
    /// restored to its value before the call.
    ///
    /// # Errors
    /// Returns any error produced by the closure `f`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use crossmap::Parser;
    ///
    /// let mut parser = Parser::new(&[0x01]);
    /// let result: crossmap::Result<u32> = parser.transactional(|p| p.read_be());
    /// assert!(result.is_err());
    /// assert_eq!(parser.pos(), 0);
    /// ```
    pub fn transactional<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let saved_position = self.position;
        let result = f(self);
        if result.is_err() {
            self.position = saved_position;
        }
        result
    }

    /// Read a type `T` from the current position in big-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_be<T: ClassIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `length` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        if length > self.remaining() {
            return Err(out_of_bounds_error!());
        }

        let start = self.position;
        self.position += length;
        Ok(&self.data[start..self.position])
    }

    /// Read a `u2` length-prefixed modified UTF-8 string, as stored in `CONSTANT_Utf8_info`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncation or [`crate::Error::Malformed`] if the
    /// bytes are not valid modified UTF-8.
    pub fn read_mutf8(&mut self) -> Result<String> {
        let length = self.read_be::<u16>()? as usize;
        let bytes = self.read_bytes(length)?;
        mutf8::decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_reads() {
        let data = [0x00, 0x10, 0x00, 0x00, 0x00, 0x20, 0x7F];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_be::<u16>().unwrap(), 0x10);
        assert_eq!(parser.read_be::<u32>().unwrap(), 0x20);
        assert_eq!(parser.peek_byte().unwrap(), 0x7F);
        assert_eq!(parser.pos(), 6);
        parser.advance_by(1).unwrap();
        assert!(!parser.has_more_data());
        assert!(parser.peek_byte().is_err());
    }

    #[test]
    fn read_bytes_bounds() {
        let data = [0x01, 0x02, 0x03];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_bytes(2).unwrap(), &[0x01, 0x02]);
        assert!(parser.read_bytes(2).is_err());
        assert_eq!(parser.pos(), 2);
        assert!(parser.advance_by(5).is_err());
    }

    #[test]
    fn mutf8_string() {
        let data = [0x00, 0x04, b'j', b'a', b'v', b'a', 0x00, 0x05, b'x'];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_mutf8().unwrap(), "java");
        assert!(parser.read_mutf8().is_err());
    }

    #[test]
    fn transactional_rollback() {
        let data = [0x00, 0x01, 0x02];
        let mut parser = Parser::new(&data);

        let ok: Result<u16> = parser.transactional(|p| p.read_be());
        assert_eq!(ok.unwrap(), 1);

        let failed: Result<u32> = parser.transactional(|p| p.read_be());
        assert!(failed.is_err());
        assert_eq!(parser.pos(), 2);
    }

    #[test]
    fn empty_parser() {
        let parser = Parser::new(&[]);
        assert!(parser.is_empty());
        assert_eq!(parser.len(), 0);
        assert_eq!(parser.remaining(), 0);
    }
}
