#![forbid(unsafe_code)]

//! Rendering synthetic extent reports.
//!
//! Captures of interesting virtual-data layouts run to hundreds of
//! thousands of rows, so instead of shipping one, tests and benches
//! render the equivalent report from a compact description of its shape.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use vdm_extent::REPORT_HEADER;
use vdm_units::MIB;

/// One run of physically consecutive extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalRun {
    pub physical_start: u64,
    pub extents: u64,
}

/// Shape of a fallocated virtual-data file's extent map.
///
/// The file is a ladder of fixed-size extents: logically consecutive
/// throughout, physically allocated in one or more ascending runs. The
/// first `split_lead_extents` extents are each described by two
/// half-extent rows, the shape left behind when the head of the file is
/// written in smaller chunks than it was allocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticMap {
    pub extent_size: u64,
    pub logical_start: u64,
    pub split_lead_extents: u64,
    pub runs: Vec<PhysicalRun>,
}

impl SyntheticMap {
    /// The canonical 75 TiB fallocated layout: 301303 extents of 256 MiB
    /// in two disjoint physical runs, with the first three extents split.
    /// Its largest physical contig is the 300288-extent tail run.
    #[must_use]
    pub fn fallocated_75t() -> Self {
        Self {
            extent_size: 256 * MIB,
            logical_start: 3_116_367_872,
            split_lead_extents: 3,
            runs: vec![
                PhysicalRun {
                    physical_start: 2_186_280_960,
                    extents: 1015,
                },
                PhysicalRun {
                    physical_start: 274_916_704_256,
                    extents: 300_288,
                },
            ],
        }
    }

    /// A single mega-extent file: the simplest virtual-data layout, as
    /// produced by a modified `mkfs` that emits the whole file as one
    /// extent.
    #[must_use]
    pub fn mega_extent(size: u64, logical_offset: u64, physical_offset: u64) -> Self {
        Self {
            extent_size: size,
            logical_start: logical_offset,
            split_lead_extents: 0,
            runs: vec![PhysicalRun {
                physical_start: physical_offset,
                extents: 1,
            }],
        }
    }

    #[must_use]
    pub fn extent_count(&self) -> u64 {
        self.runs.iter().map(|run| run.extents).sum()
    }

    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.extent_count() + self.split_lead_extents
    }

    /// Render the tab-separated report for this shape, trailing newline
    /// included, exactly as the mapping tool would print it.
    #[must_use]
    pub fn render(&self) -> String {
        tracing::debug!(
            target: "vdm::synth",
            rows = self.row_count(),
            "render_report"
        );

        // Rows run a little over 80 bytes at 75T scale.
        let mut text = String::with_capacity(96 * (self.row_count() as usize + 1));
        text.push_str(REPORT_HEADER);
        text.push('\n');

        let mut extent_index = 0u64;
        for run in &self.runs {
            for run_index in 0..run.extents {
                let file_offset = extent_index * self.extent_size;
                let logical_offset = self.logical_start + file_offset;
                let physical_offset = run.physical_start + run_index * self.extent_size;

                if extent_index < self.split_lead_extents {
                    let head = self.extent_size / 2;
                    let tail = self.extent_size - head;
                    self.push_row(&mut text, file_offset, head, 0, logical_offset, physical_offset);
                    self.push_row(
                        &mut text,
                        file_offset + head,
                        tail,
                        head,
                        logical_offset,
                        physical_offset,
                    );
                } else {
                    self.push_row(
                        &mut text,
                        file_offset,
                        self.extent_size,
                        0,
                        logical_offset,
                        physical_offset,
                    );
                }
                extent_index += 1;
            }
        }
        text
    }

    fn push_row(
        &self,
        text: &mut String,
        file_offset: u64,
        file_size: u64,
        extent_offset: u64,
        logical_offset: u64,
        physical_offset: u64,
    ) {
        // Writing to a String cannot fail.
        let _ = writeln!(
            text,
            "{file_offset}\t{file_size}\t{extent_offset}\tregular\t{logical}\t{logical_offset}\t{physical}\t1\t{physical_offset}",
            logical = self.extent_size,
            physical = self.extent_size,
        );
    }
}
