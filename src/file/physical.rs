//! Physical file backend for memory-mapped I/O.
//!
//! Mapping files for a full game version run to tens of megabytes; mapping them avoids copying
//! the whole file before the loaders walk it line by line.

use super::{checked_slice, Backend};
use crate::{
    Error::{Error, FileError},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that uses memory-mapped I/O.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// [`crate::Error::Error`] if memory mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        // The mapping is read-only; the file is not expected to change while it is mapped
        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        checked_slice(&self.data, offset, len)
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn physical() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"a net/minecraft/A\n\tb c\n").unwrap();
        file.flush().unwrap();

        let physical = Physical::new(file.path()).unwrap();

        assert_eq!(physical.len(), 23);
        assert_eq!(physical.data()[0], b'a');
        assert_eq!(physical.data_slice(19, 3).unwrap(), b"b c");
        assert!(physical.data_slice(usize::MAX, 1).is_err());
        assert!(physical.data_slice(0, 4096).is_err());
    }

    #[test]
    fn test_physical_invalid_file_path() {
        let result = Physical::new("/nonexistent/path/to/file.tsrg");
        match result {
            Err(FileError(io_error)) => {
                assert_eq!(io_error.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected FileError"),
        }
    }

    #[test]
    fn test_physical_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let physical = Physical::new(file.path()).unwrap();
        assert_eq!(physical.len(), 0);
        assert!(physical.data_slice(0, 1).is_err());
    }
}
