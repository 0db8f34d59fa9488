//! Big-endian reading and writing utilities for JVM class files.
//!
//! Every multi-byte quantity in a class file is stored big-endian. This module provides the
//! [`crate::file::io::ClassIO`] trait and a small set of bounds-checked helpers that the
//! [`crate::file::parser::Parser`] and the class file encoder build on.
//!
//! # Key Components
//!
//! - [`crate::file::io::ClassIO`] - Trait for primitive types that can be read and written
//! - [`crate::file::io::read_be`] / [`crate::file::io::read_be_at`] - Bounds-checked reads
//! - [`crate::file::io::write_be_at`] - Bounds-checked in-place writes (used to patch payloads)
//! - [`crate::file::io::append_be`] - Append a value to a growing output buffer
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use crossmap::file::io::{read_be_at, append_be};
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE];
//! let mut offset = 0;
//! let magic: u32 = read_be_at(&data, &mut offset)?;
//! assert_eq!(magic, 0xCAFEBABE);
//!
//! let mut out = Vec::new();
//! append_be(&mut out, magic);
//! assert_eq!(out, data);
//! # Ok::<(), crossmap::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// Trait for primitive types that can be decoded from and encoded to big-endian bytes.
///
/// Implemented for the unsigned and signed integer widths that appear in class files.
/// Floating point constants are carried as raw bits (`u32`/`u64`) so that NaN payloads
/// survive a decode / encode cycle unchanged.
pub trait ClassIO: Sized + Copy {
    /// Associated byte array type for this numeric type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in big-endian
    fn from_be_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in big-endian
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_class_io {
    ($($ty:ty => $n:expr),* $(,)?) => {
        $(
            impl ClassIO for $ty {
                type Bytes = [u8; $n];

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )*
    };
}

impl_class_io!(u8 => 1, i8 => 1, u16 => 2, i16 => 2, u32 => 4, i32 => 4, u64 => 8, i64 => 8);

/// Reads a value of type `T` in big-endian byte order from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_be<T: ClassIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_be_at(data, &mut offset)
}

/// Reads a value of type `T` in big-endian byte order at `offset`, advancing the offset.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_be_at<T: ClassIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_be_bytes(read))
}

/// Writes `value` in big-endian byte order at `offset`, advancing the offset.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit into `data`.
pub fn write_be_at<T: ClassIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let bytes = value.to_be_bytes();
    let bytes = bytes.as_ref();
    let Some(end) = offset.checked_add(bytes.len()) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    data[*offset..end].copy_from_slice(bytes);
    *offset = end;

    Ok(())
}

/// Appends `value` in big-endian byte order to `buffer`.
pub fn append_be<T: ClassIO>(buffer: &mut Vec<u8>, value: T) {
    buffer.extend_from_slice(value.to_be_bytes().as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_sequence() {
        let data = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0xFF];
        let mut offset = 0;

        let first: u16 = read_be_at(&data, &mut offset).unwrap();
        let second: u32 = read_be_at(&data, &mut offset).unwrap();
        let third: i8 = read_be_at(&data, &mut offset).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(third, -1);
        assert_eq!(offset, 7);
    }

    #[test]
    fn read_out_of_bounds() {
        let data = [0x01, 0x02, 0x03];
        let mut offset = 0;
        assert!(matches!(read_be_at::<u32>(&data, &mut offset), Err(OutOfBounds)));
        assert_eq!(offset, 0);

        let mut offset = usize::MAX;
        assert!(read_be_at::<u8>(&data, &mut offset).is_err());
    }

    #[test]
    fn write_patch() {
        let mut data = [0u8; 4];
        let mut offset = 2;
        write_be_at(&mut data, &mut offset, 0x1234_u16).unwrap();
        assert_eq!(data, [0x00, 0x00, 0x12, 0x34]);

        let mut offset = 3;
        assert!(write_be_at(&mut data, &mut offset, 0x1234_u16).is_err());
    }

    #[test]
    fn append_values() {
        let mut out = Vec::new();
        append_be(&mut out, 0xCAFE_BABE_u32);
        append_be(&mut out, -2_i64);
        assert_eq!(&out[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
        assert_eq!(read_be::<i64>(&out[4..]).unwrap(), -2);
    }
}
