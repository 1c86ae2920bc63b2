//! Alignment session: feeds frame bundles to the aligner and reports.

mod driver;
mod report;

pub use driver::{AlignmentSession, SessionConfig};
pub use report::{PeakReport, SessionReport, StopReason};
