#![forbid(unsafe_code)]

//! Acquiring the extent report from the external mapping tool.
//!
//! This is the workspace's one I/O boundary: run the tool over a file,
//! capture its stdout verbatim, and hand the text to `vdm-extent`.
//! Nothing here inspects the report.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to spawn {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{program:?} exited with {status}: {stderr}")]
    Failed {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{program:?} produced non-UTF-8 output")]
    NotUtf8 { program: PathBuf },
}

/// The external physical-mapping tool.
///
/// Defaults to `btrfs_map_physical` resolved via `PATH`; point `program`
/// at a full path when running against a source checkout of the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTool {
    pub program: PathBuf,
}

impl Default for MapTool {
    fn default() -> Self {
        Self {
            program: PathBuf::from("btrfs_map_physical"),
        }
    }
}

impl MapTool {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check whether the tool resolves on this system (CI-safe skip guard).
    #[must_use]
    pub fn available(&self) -> bool {
        Command::new("which")
            .arg(&self.program)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    /// Run the tool over `path` and return its stdout verbatim.
    ///
    /// CAUTION: the extent map of a recently written file may not be
    /// visible until after a remount.
    pub fn read_extent_report(&self, path: &Path) -> Result<String, ReportError> {
        tracing::info!(
            target: "vdm::report",
            tool = %self.program.display(),
            path = %path.display(),
            "read_extent_report"
        );

        let output = Command::new(&self.program)
            .arg(path)
            .output()
            .map_err(|source| ReportError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ReportError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ReportError::NotUtf8 {
            program: self.program.clone(),
        })
    }
}
