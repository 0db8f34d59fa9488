//! Tiny v1 loader (pivot -> intermediate names).
//!
//! A Tiny v1 file starts with a header line naming its namespaces, for example
//! `v1\tofficial\tintermediary`. Every following line is a tab separated record:
//!
//! ```text
//! CLASS   <pivot class>   <intermediate class>
//! FIELD   <owner>         <descriptor>          <pivot field>    <intermediate field>
//! METHOD  <owner>         <descriptor>          <pivot method>   <intermediate method>
//! ```
//!
//! Only the first target namespace is read; further columns are ignored. Lines with fewer than
//! two columns and lines with an unknown tag are skipped silently, a known tag with missing
//! columns is logged and skipped. Nothing in a single line can abort loading the file.

use tracing::{debug, error, warn};

use crate::{
    file::Resource,
    mappings::MappingRecord,
    Error, Result,
};

/// Tag of a class record.
pub const TAG_CLASS: &str = "CLASS";
/// Tag of a field record.
pub const TAG_FIELD: &str = "FIELD";
/// Tag of a method record.
pub const TAG_METHOD: &str = "METHOD";

/// Load all records from a Tiny resource.
///
/// A missing resource (`None`) is logged at error level and yields no records. Lines that are
/// not valid UTF-8 are logged and skipped like any other malformed line.
pub fn load(resource: Option<&Resource>) -> Vec<MappingRecord> {
    let Some(resource) = resource else {
        error!("Tiny mapping file not found!");
        return Vec::new();
    };

    debug!(resource = resource.name(), "Loading Tiny mappings");
    read(resource.lines())
}

/// Parse Tiny v1 text into records, skipping the header line.
#[must_use]
pub fn parse(text: &str) -> Vec<MappingRecord> {
    read(text.lines().enumerate().map(|(index, line)| (index + 1, Ok(line))))
}

fn read<'a>(lines: impl IntoIterator<Item = (usize, Result<&'a str>)>) -> Vec<MappingRecord> {
    let mut lines = lines.into_iter();

    match lines.next() {
        Some((_, Ok(header))) => {
            let header = header.trim_end_matches('\r');
            let mut columns = header.split('\t');
            match columns.next() {
                Some("v1") => debug!(
                    namespaces = ?columns.collect::<Vec<_>>(),
                    "Tiny v1 header"
                ),
                _ => warn!(header, "Tiny header does not declare v1, reading as v1 anyway"),
            }
        }
        Some((_, Err(e))) => warn!(target: "crossmap::mappings", "{}", e),
        None => {}
    }

    let mut records = Vec::new();
    for (line_no, line) in lines {
        match line.and_then(|line| parse_line(line_no, line)) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => warn!(target: "crossmap::mappings", "{}", e),
        }
    }

    debug!(count = records.len(), "Loaded Tiny records");
    records
}

/// Parse a single record line.
///
/// `line_no` is the 1-based physical line number and only used for error reporting.
///
/// # Errors
/// Returns [`crate::Error::MalformedMapping`] when a known record tag lacks required columns.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<MappingRecord>> {
    let columns: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
    if columns.len() < 2 {
        return Ok(None);
    }

    let required = match columns[0] {
        TAG_CLASS => 3,
        TAG_FIELD | TAG_METHOD => 5,
        _ => return Ok(None),
    };

    if columns.len() < required {
        return Err(Error::MalformedMapping {
            line: line_no,
            message: format!(
                "{} record needs {} columns, found {}",
                columns[0],
                required,
                columns.len()
            ),
        });
    }

    let record = match columns[0] {
        TAG_CLASS => MappingRecord::class(columns[1], columns[2]),
        TAG_FIELD => MappingRecord::field(columns[1], columns[3], columns[4]),
        _ => MappingRecord::method(columns[1], columns[3], columns[2], columns[4]),
    };

    Ok(Some(record))
}
