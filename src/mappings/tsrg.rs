//! TSRG v1 loader (pivot -> final names).
//!
//! TSRG has no header. Class lines start in column 0, member lines are indented by exactly one
//! tab and belong to the closest preceding class line:
//!
//! ```text
//! a net/minecraft/util/Direction
//! 	b field_176754_o
//! 	a (I)La; func_82600_a
//! ```
//!
//! A member line with two tokens is a field, one with three tokens is a method. Methods named
//! after the universal `java.lang.Object` identity methods are never recorded, so overrides of
//! `equals`, `hashCode` and `toString` keep working even if an entry for them slipped into the
//! file.

use tracing::{debug, error, trace, warn};

use crate::{
    file::Resource,
    mappings::MappingRecord,
    Error, Result,
};

/// Method names that are never captured from TSRG member lines.
pub const UNIVERSAL_METHODS: [&str; 3] = ["equals", "toString", "hashCode"];

/// Returns `true` for the universal object-identity method names.
#[must_use]
pub fn is_universal_method(name: &str) -> bool {
    UNIVERSAL_METHODS.contains(&name)
}

/// Load all records from a TSRG resource.
///
/// A missing resource (`None`) is logged at error level and yields no records. Lines that are
/// not valid UTF-8 are logged and skipped like any other malformed line.
pub fn load(resource: Option<&Resource>) -> Vec<MappingRecord> {
    let Some(resource) = resource else {
        error!("Srg mapping file not found!");
        return Vec::new();
    };

    debug!(resource = resource.name(), "Loading Srg mappings");
    read(resource.lines())
}

/// Parse TSRG v1 text into records.
#[must_use]
pub fn parse(text: &str) -> Vec<MappingRecord> {
    read(text.lines().enumerate().map(|(index, line)| (index + 1, Ok(line))))
}

fn read<'a>(lines: impl IntoIterator<Item = (usize, Result<&'a str>)>) -> Vec<MappingRecord> {
    let mut reader = TsrgReader::new();
    let mut records = Vec::new();

    for (line_no, line) in lines {
        match line.and_then(|line| reader.parse_line(line_no, line)) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => warn!(target: "crossmap::mappings", "{}", e),
        }
    }

    debug!(count = records.len(), "Loaded Srg records");
    records
}

/// Line-by-line TSRG parser.
///
/// Member lines are positional, so the reader keeps the pivot name of the most recent class
/// line as its only state.
#[derive(Debug, Default)]
pub struct TsrgReader {
    owner: Option<String>,
}

impl TsrgReader {
    /// Create a reader with no current owner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pivot name of the class that member lines are currently attributed to.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Parse a single line, updating the current owner on class lines.
    ///
    /// Returns `Ok(None)` for blank lines and excluded universal methods.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedMapping`] for lines that fit neither shape, member
    /// lines without a preceding class line, and lines nested deeper than one tab.
    pub fn parse_line(&mut self, line_no: usize, line: &str) -> Result<Option<MappingRecord>> {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            return Ok(None);
        }

        let malformed = |message: String| Error::MalformedMapping {
            line: line_no,
            message,
        };

        if let Some(member) = line.strip_prefix('\t') {
            if member.starts_with('\t') {
                return Err(malformed("member line nested deeper than one tab".into()));
            }
            let Some(owner) = self.owner.as_deref() else {
                return Err(malformed("member line before any class line".into()));
            };

            let tokens: Vec<&str> = member.split_whitespace().collect();
            return match tokens.as_slice() {
                [pivot, name] => Ok(Some(MappingRecord::field(owner, *pivot, *name))),
                [pivot, _, _] if is_universal_method(pivot) => {
                    trace!(owner, method = pivot, "Skipping universal method");
                    Ok(None)
                }
                [pivot, descriptor, name] => Ok(Some(MappingRecord::method(
                    owner,
                    *pivot,
                    *descriptor,
                    *name,
                ))),
                _ => Err(malformed(format!(
                    "member line has {} tokens, expected 2 or 3",
                    tokens.len()
                ))),
            };
        }

        if line.starts_with(char::is_whitespace) {
            self.owner = None;
            return Err(malformed("class line must not be indented".into()));
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [pivot, name] => {
                self.owner = Some((*pivot).to_string());
                Ok(Some(MappingRecord::class(*pivot, *name)))
            }
            _ => {
                self.owner = None;
                Err(malformed(format!(
                    "class line has {} tokens, expected 2",
                    tokens.len()
                )))
            }
        }
    }
}
