//! ui::progress
//!
//! Console progress sink for mutation passes.
//!
//! # Design
//!
//! Bridges the mutator's best-effort [`ProgressSink`] seam onto the
//! console output helpers. Per-row progress lines respect the quiet
//! flag; errors are always shown. Console delivery never fails, so this
//! sink never contributes to `reporting_failures`.

use crate::mutator::{ProgressSink, ReportingError};
use crate::ui::output::{self, Verbosity};

/// Progress sink that prints one line per committed row.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleProgress {
    verbosity: Verbosity,
}

impl ConsoleProgress {
    /// Create a console sink at the given verbosity.
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

impl ProgressSink for ConsoleProgress {
    fn report_progress(
        &mut self,
        _step: u64,
        _total: u64,
        label: &str,
    ) -> Result<(), ReportingError> {
        output::print(label, self.verbosity);
        Ok(())
    }

    fn report_warning(&mut self, message: &str) -> Result<(), ReportingError> {
        output::warn(message, self.verbosity);
        Ok(())
    }

    fn report_error(&mut self, message: &str) -> Result<(), ReportingError> {
        output::error(message);
        Ok(())
    }
}
