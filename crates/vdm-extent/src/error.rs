#![forbid(unsafe_code)]

//! Failure taxonomy for extent report parsing and virtual-data validation.
//!
//! Every variant is fatal to the call that produced it. A file that fails
//! any check is unusable as virtual data; callers must discard the whole
//! result, never salvage part of it. Variants carry the offending line,
//! offset, or totals so a failure can be diagnosed without re-running the
//! mapping tool.

use thiserror::Error;

use crate::contig::AddressSpace;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("bad extent report header: expected {expected:?}, got {actual:?}")]
    Header {
        expected: &'static str,
        actual: String,
    },

    #[error("line {line}: expected {expected} tab-separated fields, got {actual}")]
    FieldCount {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: {field} is not an unsigned integer: {value:?}")]
    NonInteger {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("overlapping {space} extents: [{prev_offset}, {prev_end}) runs past {offset}")]
    Overlap {
        space: AddressSpace,
        prev_offset: u64,
        prev_end: u64,
        offset: u64,
    },

    #[error("{space} offsets are not co-sorted with file offsets: row {index} has {next} after {prev}")]
    NotCoSorted {
        space: AddressSpace,
        index: usize,
        prev: u64,
        next: u64,
    },

    #[error("file extents are not one continuous run: {parts} disjoint parts")]
    Discontinuous { parts: usize },

    #[error(
        "file/logical/physical extents vary in total length: \
         contigs {file_contig}/{logical_contig}/{physical_contig}, \
         raw file {file_raw}, deduplicated {logical_dedup}/{physical_dedup}"
    )]
    LengthMismatch {
        file_contig: u64,
        logical_contig: u64,
        physical_contig: u64,
        file_raw: u64,
        logical_dedup: u64,
        physical_dedup: u64,
    },

    #[error(
        "file extent at {file_offset} has extent offset {extent_offset}, \
         expected {expected} to continue its logical extent"
    )]
    GroupOffset {
        file_offset: u64,
        extent_offset: u64,
        expected: u64,
    },

    #[error(
        "file extent group covering {covered} bytes did not map 1:1 onto \
         logical extent at {logical_offset} of size {logical_size}"
    )]
    GroupTiling {
        logical_offset: u64,
        logical_size: u64,
        covered: u64,
    },

    #[error("more file extent groups ({groups}) than logical extents ({extents})")]
    GroupCount { groups: usize, extents: usize },

    #[error("file extent at {file_offset} is on device {device_id}, expected the single device 1")]
    UnexpectedDevice { file_offset: u64, device_id: u64 },

    #[error("file extent at {file_offset} has type {extent_type:?}, only \"regular\" is supported")]
    UnsupportedExtentType {
        file_offset: u64,
        extent_type: String,
    },

    #[error(
        "physical size {physical_size} differs from logical size {logical_size} \
         at file offset {file_offset} (compressed or partially mapped extent)"
    )]
    PhysicalSizeMismatch {
        file_offset: u64,
        logical_size: u64,
        physical_size: u64,
    },

    #[error("no file extent references the chosen physical extent at {physical_offset}")]
    NoMatch { physical_offset: u64 },

    #[error(
        "chosen physical contig starts mid-extent: first matching file extent \
         at {file_offset} has extent offset {extent_offset}"
    )]
    MidExtentStart {
        file_offset: u64,
        extent_offset: u64,
    },

    #[error("{space} byte counts overflow u64: {lhs} + {rhs}")]
    Overflow {
        space: AddressSpace,
        lhs: u64,
        rhs: u64,
    },
}
