#![forbid(unsafe_code)]

//! Merging per-address-space intervals into maximal contigs.
//!
//! The same walk serves as the overlap check for each address space: a
//! consistent extent map never maps one byte twice within a space, so any
//! overlap aborts the scan.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Which column family of the report an interval came from. The scan runs
/// once per space; carrying the space in errors keeps a logical-extent
/// overlap distinguishable from a physical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AddressSpace {
    File,
    Logical,
    Physical,
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressSpace::File => "file",
            AddressSpace::Logical => "logical",
            AddressSpace::Physical => "physical",
        };
        f.write_str(name)
    }
}

/// A maximal merged half-open byte range `[offset, offset + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Contig {
    pub offset: u64,
    pub size: u64,
}

/// Merge `(offset, size)` pairs from one address space into maximal
/// non-overlapping contigs, ascending by offset.
///
/// Pairs may repeat (one logical extent can back several file extents);
/// duplicates collapse before merging, so the output sizes sum to the
/// deduplicated input total, not the raw one.
pub fn contiguous_parts<I>(space: AddressSpace, pairs: I) -> Result<Vec<Contig>, MapError>
where
    I: IntoIterator<Item = (u64, u64)>,
{
    let uniq: BTreeSet<(u64, u64)> = pairs.into_iter().collect();

    let mut contigs = Vec::new();
    // (run_start, prev_offset, prev_end); intervals are half-open.
    let mut state: Option<(u64, u64, u64)> = None;

    for (offset, size) in uniq {
        let end = offset.checked_add(size).ok_or(MapError::Overflow {
            space,
            lhs: offset,
            rhs: size,
        })?;

        state = match state {
            None => Some((offset, offset, end)),
            Some((run_start, prev_offset, prev_end)) => {
                if prev_end > offset {
                    return Err(MapError::Overlap {
                        space,
                        prev_offset,
                        prev_end,
                        offset,
                    });
                }
                if prev_end < offset {
                    contigs.push(Contig {
                        offset: run_start,
                        size: prev_end - run_start,
                    });
                    Some((offset, offset, end))
                } else {
                    Some((run_start, offset, end))
                }
            }
        };
    }

    if let Some((run_start, _, prev_end)) = state {
        contigs.push(Contig {
            offset: run_start,
            size: prev_end - run_start,
        });
    }

    Ok(contigs)
}

/// Largest contig by size, keeping the earliest one on ties.
///
/// The input comes out of [`contiguous_parts`] in ascending offset order,
/// so "earliest" is deterministic. `Iterator::max_by_key` keeps the last
/// equal element and must not be used here.
#[must_use]
pub fn largest_contig(contigs: &[Contig]) -> Option<Contig> {
    let mut best: Option<Contig> = None;
    for contig in contigs {
        match best {
            Some(current) if contig.size <= current.size => {}
            _ => best = Some(*contig),
        }
    }
    best
}
