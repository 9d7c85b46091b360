#![forbid(unsafe_code)]
//! Extent-map parsing and virtual-data validation.
//!
//! Pure transform crate: no I/O, no side effects. Takes the tab-separated
//! report of a physical-mapping tool, parses it into typed records, checks
//! the structural invariants a virtual data file must satisfy (continuity,
//! monotonic file/logical/physical correspondence, exact extent tiling,
//! single uncompressed device), and locates the largest byte window where
//! file and physical offsets correspond 1:1.
//!
//! To understand the extent jargon, start with the `--help` of the mapping
//! tool (`btrfs_map_physical`); its report is what [`ExtentTable::parse`]
//! consumes.

pub mod contig;
pub mod error;
pub mod table;
pub mod validate;

pub use contig::{AddressSpace, Contig, contiguous_parts, largest_contig};
pub use error::MapError;
pub use table::{ExtentRecord, ExtentTable, REPORT_COLUMNS, REPORT_HEADER};
pub use validate::{VirtualDataWindow, validate_virtual_data};
