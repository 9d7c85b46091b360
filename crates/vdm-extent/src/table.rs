#![forbid(unsafe_code)]

//! Decoding the textual extent report into records.
//!
//! The report is the tab-separated output of a physical-mapping tool run
//! over one file. Parsing is strict but purely syntactic; semantic
//! invariants (continuity, grouping, device) belong to the validator.

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Column order of the report, fixed by the mapping tool. A header that
/// differs in any field means a wrong tool version or corrupted capture.
pub const REPORT_COLUMNS: [&str; 9] = [
    "FILE OFFSET",
    "FILE SIZE",
    "EXTENT OFFSET",
    "EXTENT TYPE",
    "LOGICAL SIZE",
    "LOGICAL OFFSET",
    "PHYSICAL SIZE",
    "DEVID",
    "PHYSICAL OFFSET",
];

/// [`REPORT_COLUMNS`] joined with tabs, as it appears on the wire.
pub const REPORT_HEADER: &str = "FILE OFFSET\tFILE SIZE\tEXTENT OFFSET\tEXTENT TYPE\t\
LOGICAL SIZE\tLOGICAL OFFSET\tPHYSICAL SIZE\tDEVID\tPHYSICAL OFFSET";

/// One row of the report, fields in wire order.
///
/// `extent_offset` is the byte offset of this file extent within its
/// logical extent; `0` marks the start of a new logical extent.
/// `extent_type` stays an opaque token here; the validator only accepts
/// `regular`, but the parser does not care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtentRecord {
    pub file_offset: u64,
    pub file_size: u64,
    pub extent_offset: u64,
    pub extent_type: String,
    pub logical_size: u64,
    pub logical_offset: u64,
    pub physical_size: u64,
    pub device_id: u64,
    pub physical_offset: u64,
}

/// Records in parse order. Validation re-sorts by `file_offset` without
/// touching the table itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtentTable {
    records: Vec<ExtentRecord>,
}

impl ExtentTable {
    #[must_use]
    pub fn from_records(records: Vec<ExtentRecord>) -> Self {
        Self { records }
    }

    /// Parse the raw report text.
    ///
    /// Exactly one trailing newline is stripped (matching what a shell
    /// `$()` capture would hold); any further blank line is a malformed
    /// row, not ignorable padding. Error lines are 1-based and count the
    /// header as line 1.
    pub fn parse(raw: &str) -> Result<Self, MapError> {
        let stripped = raw.strip_suffix('\n').unwrap_or(raw);
        let mut lines = stripped.split('\n');

        let header = lines.next().unwrap_or("");
        if header.split('\t').ne(REPORT_COLUMNS.iter().copied()) {
            return Err(MapError::Header {
                expected: REPORT_HEADER,
                actual: header.to_string(),
            });
        }

        let mut records = Vec::new();
        for (index, line) in lines.enumerate() {
            records.push(parse_record(index + 2, line)?);
        }
        Ok(Self { records })
    }

    #[must_use]
    pub fn records(&self) -> &[ExtentRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<ExtentRecord> {
        self.records
    }
}

fn parse_record(line: usize, text: &str) -> Result<ExtentRecord, MapError> {
    let fields: Vec<&str> = text.split('\t').collect();
    if fields.len() != REPORT_COLUMNS.len() {
        return Err(MapError::FieldCount {
            line,
            expected: REPORT_COLUMNS.len(),
            actual: fields.len(),
        });
    }

    let int_field = |index: usize| -> Result<u64, MapError> {
        fields[index].parse().map_err(|_| MapError::NonInteger {
            line,
            field: REPORT_COLUMNS[index],
            value: fields[index].to_string(),
        })
    };

    Ok(ExtentRecord {
        file_offset: int_field(0)?,
        file_size: int_field(1)?,
        extent_offset: int_field(2)?,
        extent_type: fields[3].to_string(),
        logical_size: int_field(4)?,
        logical_offset: int_field(5)?,
        physical_size: int_field(6)?,
        device_id: int_field(7)?,
        physical_offset: int_field(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(rows: &[&str]) -> String {
        let mut text = String::from(REPORT_HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text.push('\n');
        text
    }

    #[test]
    fn header_const_matches_columns() {
        assert_eq!(REPORT_HEADER, REPORT_COLUMNS.join("\t"));
    }

    #[test]
    fn parses_rows_in_wire_order() {
        let raw = report(&[
            "0\t134217728\t0\tregular\t268435456\t3116367872\t268435456\t1\t2186280960",
            "134217728\t134217728\t134217728\tregular\t268435456\t3116367872\t268435456\t1\t2186280960",
        ]);
        let table = ExtentTable::parse(&raw).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.records()[0],
            ExtentRecord {
                file_offset: 0,
                file_size: 134_217_728,
                extent_offset: 0,
                extent_type: "regular".to_string(),
                logical_size: 268_435_456,
                logical_offset: 3_116_367_872,
                physical_size: 268_435_456,
                device_id: 1,
                physical_offset: 2_186_280_960,
            }
        );
        assert_eq!(table.records()[1].extent_offset, 134_217_728);
    }

    #[test]
    fn accepts_report_without_trailing_newline() {
        let raw = report(&["0\t1\t0\tregular\t1\t0\t1\t1\t0"]);
        let table = ExtentTable::parse(raw.trim_end_matches('\n')).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn strips_exactly_one_trailing_newline() {
        let mut raw = report(&["0\t1\t0\tregular\t1\t0\t1\t1\t0"]);
        raw.push('\n');
        let err = ExtentTable::parse(&raw).unwrap_err();
        assert_eq!(
            err,
            MapError::FieldCount {
                line: 3,
                expected: 9,
                actual: 1,
            }
        );
    }

    #[test]
    fn header_only_report_is_empty_table() {
        let table = ExtentTable::parse(&report(&[])).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn rejects_unknown_header() {
        let short_header = REPORT_COLUMNS[..8].join("\t");
        for bad in [
            "",
            "file offset\tFILE SIZE",
            "FILE OFFSET,FILE SIZE,EXTENT OFFSET",
            short_header.as_str(),
        ] {
            let err = ExtentTable::parse(bad).unwrap_err();
            assert!(matches!(err, MapError::Header { .. }), "input {bad:?}");
        }
    }

    #[test]
    fn rejects_short_row() {
        let raw = report(&["0\t1\t0\tregular\t1\t0\t1\t1"]);
        let err = ExtentTable::parse(&raw).unwrap_err();
        assert_eq!(
            err,
            MapError::FieldCount {
                line: 2,
                expected: 9,
                actual: 8,
            }
        );
    }

    #[test]
    fn rejects_non_integer_field() {
        let raw = report(&[
            "0\t1\t0\tregular\t1\t0\t1\t1\t0",
            "zero\t1\t0\tregular\t1\t0\t1\t1\t0",
        ]);
        let err = ExtentTable::parse(&raw).unwrap_err();
        assert_eq!(
            err,
            MapError::NonInteger {
                line: 3,
                field: "FILE OFFSET",
                value: "zero".to_string(),
            }
        );
    }

    #[test]
    fn rejects_negative_and_fractional_fields() {
        for row in [
            "-1\t1\t0\tregular\t1\t0\t1\t1\t0",
            "0\t1.5\t0\tregular\t1\t0\t1\t1\t0",
        ] {
            let err = ExtentTable::parse(&report(&[row])).unwrap_err();
            assert!(matches!(err, MapError::NonInteger { .. }), "row {row:?}");
        }
    }

    #[test]
    fn extent_type_stays_opaque_at_parse() {
        let raw = report(&["0\t1\t0\tprealloc\t1\t0\t1\t1\t0"]);
        let table = ExtentTable::parse(&raw).unwrap();
        assert_eq!(table.records()[0].extent_type, "prealloc");
    }
}
