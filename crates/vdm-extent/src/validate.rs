#![forbid(unsafe_code)]

//! Certifying a file as virtual data.
//!
//! A virtual data file is only usable through a block shim if file,
//! logical, and physical bytes correspond 1:1 over one large window. The
//! filesystem does not guarantee that in general; this module checks the
//! conditions that make it true and finds the largest such window.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::contig::{contiguous_parts, largest_contig, AddressSpace, Contig};
use crate::error::MapError;
use crate::table::{ExtentRecord, ExtentTable};

/// The largest byte range over which file, logical, and physical offsets
/// correspond 1:1: where it starts in the file, where it starts on the
/// device, and its length.
///
/// With some ways of building virtual data (chunked `fallocate`), the
/// window is smaller than the file. Callers decide whether the size is
/// acceptable for their use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDataWindow {
    pub file_offset: u64,
    pub physical_offset: u64,
    pub size: u64,
}

/// Validate a file's extent map as virtual data and locate its window.
///
/// Checks, in order: logical and physical offsets co-sorted with file
/// offsets, file extents forming exactly one contiguous run, all six
/// total-length accountings equal, every logical extent exactly tiled by
/// its file extents in order, and every record regular / on device 1 /
/// uncompressed. Then picks the largest physical contig and resolves it
/// back to the file offset where it begins.
///
/// Any violation aborts with the first error encountered; nothing is
/// repaired or skipped.
pub fn validate_virtual_data(table: &ExtentTable) -> Result<VirtualDataWindow, MapError> {
    // The mapping tool appears to emit rows in file-offset order already,
    // but everything below assumes it, so establish it. The sort is
    // stable, keeping parse order among duplicate offsets.
    let mut rows: Vec<&ExtentRecord> = table.records().iter().collect();
    rows.sort_by_key(|row| row.file_offset);

    // If logical or physical offsets are not co-sorted with file offsets,
    // the file-logical-physical map is not monotonic and none of the
    // continuity reasoning below would mean anything.
    check_co_sorted(AddressSpace::Logical, &rows, |row| row.logical_offset)?;
    check_co_sorted(AddressSpace::Physical, &rows, |row| row.physical_offset)?;

    // A virtual data file has no holes and no inline extents; either one
    // splits the file-space coverage into multiple parts.
    let file_contigs = contiguous_parts(
        AddressSpace::File,
        rows.iter().map(|row| (row.file_offset, row.file_size)),
    )?;
    if file_contigs.len() != 1 {
        return Err(MapError::Discontinuous {
            parts: file_contigs.len(),
        });
    }

    let logical_contigs = contiguous_parts(
        AddressSpace::Logical,
        rows.iter().map(|row| (row.logical_offset, row.logical_size)),
    )?;
    let physical_contigs = contiguous_parts(
        AddressSpace::Physical,
        rows.iter().map(|row| (row.physical_offset, row.physical_size)),
    )?;

    // Several rows can reference one logical or physical extent, so
    // dedupe before summing.
    let logical_extents: BTreeSet<(u64, u64)> = rows
        .iter()
        .map(|row| (row.logical_offset, row.logical_size))
        .collect();
    let physical_extents: BTreeSet<(u64, u64)> = rows
        .iter()
        .map(|row| (row.physical_offset, row.physical_size))
        .collect();

    // The scans guarantee no overlap within each space; equal totals
    // across all six accountings upgrade that to a 1:1 byte
    // correspondence between the spaces.
    let file_contig = sum_sizes(AddressSpace::File, contig_sizes(&file_contigs))?;
    let logical_contig = sum_sizes(AddressSpace::Logical, contig_sizes(&logical_contigs))?;
    let physical_contig = sum_sizes(AddressSpace::Physical, contig_sizes(&physical_contigs))?;
    let file_raw = sum_sizes(AddressSpace::File, rows.iter().map(|row| row.file_size))?;
    let logical_dedup = sum_sizes(
        AddressSpace::Logical,
        logical_extents.iter().map(|&(_, size)| size),
    )?;
    let physical_dedup = sum_sizes(
        AddressSpace::Physical,
        physical_extents.iter().map(|&(_, size)| size),
    )?;
    let totals = [
        logical_contig,
        physical_contig,
        file_raw,
        logical_dedup,
        physical_dedup,
    ];
    if totals.iter().any(|&total| total != file_contig) {
        return Err(MapError::LengthMismatch {
            file_contig,
            logical_contig,
            physical_contig,
            file_raw,
            logical_dedup,
            physical_dedup,
        });
    }

    check_extent_grouping(&rows, &logical_extents)?;

    for row in &rows {
        if row.device_id != 1 {
            return Err(MapError::UnexpectedDevice {
                file_offset: row.file_offset,
                device_id: row.device_id,
            });
        }
        if row.extent_type != "regular" {
            return Err(MapError::UnsupportedExtentType {
                file_offset: row.file_offset,
                extent_type: row.extent_type.clone(),
            });
        }
        // Logical and physical bytes must correspond extent by extent,
        // which rules out inline compression. The block shim can serve
        // compressed data on its own, so nothing is lost.
        if row.physical_size != row.logical_size {
            return Err(MapError::PhysicalSizeMismatch {
                file_offset: row.file_offset,
                logical_size: row.logical_size,
                physical_size: row.physical_size,
            });
        }
    }

    // Everything above established: file extents continuously cover the
    // file, each logical extent is sequentially covered by file extents,
    // and logical extents map 1:1 to physical extents. So the largest
    // physical contig, resolved back to its file extents, is the window.
    let best = largest_contig(&physical_contigs).ok_or(MapError::Discontinuous { parts: 0 })?;

    let mut matches = rows.iter().filter(|row| row.physical_offset == best.offset);
    let Some(first) = matches.next() else {
        return Err(MapError::NoMatch {
            physical_offset: best.offset,
        });
    };
    if first.extent_offset != 0 {
        return Err(MapError::MidExtentStart {
            file_offset: first.file_offset,
            extent_offset: first.extent_offset,
        });
    }

    Ok(VirtualDataWindow {
        file_offset: first.file_offset,
        physical_offset: best.offset,
        size: best.size,
    })
}

fn check_co_sorted<F>(
    space: AddressSpace,
    rows: &[&ExtentRecord],
    offset: F,
) -> Result<(), MapError>
where
    F: Fn(&ExtentRecord) -> u64,
{
    for (index, pair) in rows.windows(2).enumerate() {
        let prev = offset(pair[0]);
        let next = offset(pair[1]);
        if prev > next {
            return Err(MapError::NotCoSorted {
                space,
                index: index + 1,
                prev,
                next,
            });
        }
    }
    Ok(())
}

/// Check that each logical extent is exactly covered by its own file
/// extents, in order, starting at extent offset 0.
///
/// For arbitrary files the filesystem only guarantees that a file extent
/// is a *subset* of its logical extent; hole punching, cloning, and
/// deduping all break exact coverage. A virtual data file never sees
/// those operations, so exact coverage is required here.
///
/// A group is only compared to its logical extent when the next group
/// starts, so the trailing group goes unchecked; the six-way length
/// cross-check has already bounded total coverage by then.
fn check_extent_grouping(
    rows: &[&ExtentRecord],
    logical_extents: &BTreeSet<(u64, u64)>,
) -> Result<(), MapError> {
    let logical_list: Vec<(u64, u64)> = logical_extents.iter().copied().collect();

    let mut group_total = 0u64;
    let mut closed_groups = 0usize;
    let mut in_group = false;

    for row in rows {
        if row.extent_offset == 0 {
            if in_group {
                let Some(&(logical_offset, logical_size)) = logical_list.get(closed_groups) else {
                    return Err(MapError::GroupCount {
                        groups: closed_groups + 1,
                        extents: logical_list.len(),
                    });
                };
                if group_total != logical_size {
                    return Err(MapError::GroupTiling {
                        logical_offset,
                        logical_size,
                        covered: group_total,
                    });
                }
                closed_groups += 1;
            }
            in_group = true;
            group_total = 0;
        }

        if row.extent_offset != group_total {
            return Err(MapError::GroupOffset {
                file_offset: row.file_offset,
                extent_offset: row.extent_offset,
                expected: group_total,
            });
        }
        group_total = group_total
            .checked_add(row.file_size)
            .ok_or(MapError::Overflow {
                space: AddressSpace::File,
                lhs: group_total,
                rhs: row.file_size,
            })?;
    }

    Ok(())
}

fn contig_sizes(contigs: &[Contig]) -> impl Iterator<Item = u64> + '_ {
    contigs.iter().map(|contig| contig.size)
}

fn sum_sizes<I>(space: AddressSpace, sizes: I) -> Result<u64, MapError>
where
    I: IntoIterator<Item = u64>,
{
    let mut total = 0u64;
    for size in sizes {
        total = total.checked_add(size).ok_or(MapError::Overflow {
            space,
            lhs: total,
            rhs: size,
        })?;
    }
    Ok(total)
}
