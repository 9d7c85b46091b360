#![forbid(unsafe_code)]
//! Scaffolding around the extent-map core: acquiring real reports from
//! the external mapping tool and rendering synthetic ones for tests and
//! benches. The validation itself lives in `vdm-extent`; nothing here
//! second-guesses it.

pub mod report;
pub mod synth;

pub use report::{MapTool, ReportError};
pub use synth::{PhysicalRun, SyntheticMap};
