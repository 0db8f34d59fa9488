use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Only a few of these ever reach a caller. Mapping-file problems (missing resources,
/// malformed lines, orphaned join records) are absorbed by the loaders and only show up in the
/// log; the variants describing them exist so the line parsers can use `?` internally. Class
/// unit failures are the ones surfaced, wrapped in [`Error::UnitFailed`] by the pipeline so
/// the host knows which unit could not be transformed.
///
/// # Error Categories
///
/// ## Class File Errors
/// - [`Error::Malformed`] - Corrupted or invalid class file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of the class file
/// - [`Error::InvalidMagic`] - The buffer does not start with `0xCAFEBABE`
/// - [`Error::PoolOverflow`] - Rewriting needed more than 65535 constant pool slots
///
/// ## Mapping Errors
/// - [`Error::MalformedMapping`] - A single mapping line could not be parsed
///
/// ## I/O and Pipeline Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::UnitFailed`] - A class unit failed inside the transformation pipeline
///
/// # Examples
///
/// ```rust
/// use crossmap::{ClassUnit, Error};
///
/// match ClassUnit::decode(&[0xDE, 0xAD, 0xBE, 0xEF]) {
///     Err(Error::InvalidMagic(magic)) => assert_eq!(magic, 0xDEADBEEF),
///     other => panic!("unexpected result: {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The class file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the class file.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The input does not carry the class file magic number.
    #[error("Invalid class file magic - 0x{0:08X}")]
    InvalidMagic(u32),

    /// The constant pool would exceed its 16-bit index space.
    #[error("Constant pool overflow - {0} entries")]
    PoolOverflow(usize),

    /// A line of a mapping file could not be parsed.
    ///
    /// `line` is 1-based and refers to the physical line in the mapping resource.
    #[error("Malformed mapping at line {line}: {message}")]
    MalformedMapping {
        /// The line number within the mapping resource
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// A class unit could not be transformed.
    ///
    /// Produced by [`crate::pipeline::RemapTransformer`]; the failure is local to the named
    /// unit and never affects other units of the same batch.
    #[error("Failed to transform {unit} - {source}")]
    UnitFailed {
        /// Internal name of the class unit that failed
        unit: String,
        /// The underlying decode or encode error
        #[source]
        source: Box<Error>,
    },

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
