//! Resource access and low-level binary parsing.
//!
//! Mapping files and class files reach the library either as paths on disk or as buffers
//! already held by the host. [`Resource`] hides that difference behind the [`Backend`] trait:
//! files are memory-mapped, buffers are owned.
//!
//! # Key Components
//!
//! - [`Resource`] - A named, read-only byte source
//! - [`Backend`] - Storage abstraction implemented by owned buffers and mapped files
//! - [`io`] - Big-endian primitive reading and writing
//! - [`parser::Parser`] - Bounds-checked cursor used by the class file decoder
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use crossmap::Resource;
//!
//! let tiny = Resource::from_path("mappings/1.16.3.tiny")?;
//! println!("{} is {} bytes", tiny.name(), tiny.len());
//!
//! let inline = Resource::from_mem("inline.tsrg", b"a net/minecraft/A\n".to_vec());
//! assert_eq!(inline.lines().count(), 1);
//! # Ok::<(), crossmap::Error>(())
//! ```

pub mod io;
pub mod parser;

mod physical;

use std::path::Path;

use crate::{Error, Result};
use physical::Physical;

/// UTF-8 byte order mark, dropped from the start of text resources.
const BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Storage abstraction for resource bytes.
///
/// Implementations must be `Send + Sync`; resources are read while tables are built and may be
/// shared with worker threads of a batch transformation.
pub trait Backend: Send + Sync {
    /// Returns a bounds-checked slice of the backing data.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset + len` exceeds the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the complete backing data.
    fn data(&self) -> &[u8];

    /// Returns the size of the backing data in bytes.
    fn len(&self) -> usize;
}

/// Bounds-checked `data[offset..offset + len]`, shared by the backends.
fn checked_slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let Some(offset_end) = offset.checked_add(len) else {
        return Err(out_of_bounds_error!());
    };

    data.get(offset..offset_end).ok_or(out_of_bounds_error!())
}

/// Buffers handed over by the host are their own backend.
impl Backend for Vec<u8> {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        checked_slice(self, offset, len)
    }

    fn data(&self) -> &[u8] {
        self
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// A named, read-only byte source (mapping file or class file).
pub struct Resource {
    name: String,
    data: Box<dyn Backend>,
}

impl Resource {
    /// Memory-map the file at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened (for example when it
    /// does not exist) or [`crate::Error::Error`] if mapping fails.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Resource> {
        let path = path.as_ref();
        let input = Physical::new(path)?;

        Ok(Resource {
            name: path.display().to_string(),
            data: Box::new(input),
        })
    }

    /// Wrap an owned buffer.
    #[must_use]
    pub fn from_mem(name: impl Into<String>, data: Vec<u8>) -> Resource {
        Resource {
            name: name.into(),
            data: Box::new(data),
        }
    }

    /// Name of the resource (the path for file-backed resources).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw resource bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Bounds-checked slice of the resource bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the resource.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// Size of the resource in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the resource holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The resource split into text lines, each paired with its 1-based line number.
    ///
    /// Lines end at `\n`; a trailing `\r` and a leading byte order mark are removed. Each line
    /// is decoded on its own, so one line of invalid UTF-8 does not hide the rest of the file.
    ///
    /// # Errors
    /// Yields [`crate::Error::MalformedMapping`] in place of a line that is not valid UTF-8.
    pub fn lines(&self) -> impl Iterator<Item = (usize, Result<&str>)> + '_ {
        let data = self.data();
        let data = data.strip_prefix(BOM).unwrap_or(data);

        data.split_inclusive(|byte| *byte == b'\n')
            .enumerate()
            .map(move |(index, line)| {
                let line = line.strip_suffix(b"\n").unwrap_or(line);
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                let text = std::str::from_utf8(line).map_err(|e| Error::MalformedMapping {
                    line: index + 1,
                    message: format!("{} - line is not valid UTF-8: {}", self.name, e),
                });
                (index + 1, text)
            })
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn collect(resource: &Resource) -> Vec<(usize, Option<&str>)> {
        resource
            .lines()
            .map(|(line_no, line)| (line_no, line.ok()))
            .collect()
    }

    #[test]
    fn memory_resource() {
        let resource = Resource::from_mem("test", b"abc".to_vec());
        assert_eq!(resource.name(), "test");
        assert_eq!(resource.len(), 3);
        assert!(!resource.is_empty());
        assert_eq!(resource.data_slice(1, 2).unwrap(), b"bc");
        assert!(resource.data_slice(2, 2).is_err());
        assert!(resource.data_slice(usize::MAX, 1).is_err());
        assert_eq!(resource.data_slice(3, 0).unwrap(), b"");

        let empty = Resource::from_mem("empty", Vec::new());
        assert!(empty.is_empty());
        assert!(empty.data_slice(0, 1).is_err());
        assert_eq!(empty.lines().count(), 0);
    }

    #[test]
    fn lines_strip_bom_and_line_endings() {
        let resource = Resource::from_mem("bom", b"\xEF\xBB\xBFv1\r\n\nCLASS\ta\tb".to_vec());
        assert_eq!(
            collect(&resource),
            [(1, Some("v1")), (2, Some("")), (3, Some("CLASS\ta\tb"))]
        );

        // A final newline does not open another line
        let resource = Resource::from_mem("trailing", b"a b\n".to_vec());
        assert_eq!(collect(&resource), [(1, Some("a b"))]);
    }

    #[test]
    fn invalid_utf8_is_reported_per_line() {
        let resource = Resource::from_mem("bad", b"first\n\xFF\xFE\nthird\n".to_vec());
        assert_eq!(
            collect(&resource),
            [(1, Some("first")), (2, None), (3, Some("third"))]
        );

        let (_, error) = resource.lines().nth(1).unwrap();
        assert!(matches!(error, Err(Error::MalformedMapping { line: 2, .. })));
    }

    #[test]
    fn file_resource() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"CLASS\ta\tb\n").unwrap();
        file.flush().unwrap();

        let resource = Resource::from_path(file.path()).unwrap();
        assert_eq!(collect(&resource), [(1, Some("CLASS\ta\tb"))]);
        assert_eq!(resource.name(), file.path().display().to_string());
    }

    #[test]
    fn missing_file() {
        let result = Resource::from_path("/nonexistent/path/to/mappings.tiny");
        assert!(matches!(result, Err(crate::Error::FileError(_))));
    }
}
