//! mutator::progress
//!
//! Best-effort progress reporting seam.
//!
//! # Design
//!
//! The mutator narrates a pass through a [`ProgressSink`]: one progress
//! notification per committed row, warnings from the optional validation
//! hook, and the first row failure. Reporting is best-effort by contract.
//! A sink failure never aborts the mutation pass; the mutator counts
//! undelivered notifications in the outcome and continues.

use thiserror::Error;

/// A failed best-effort notification.
///
/// Never propagated past the mutator; surfaced only as a count in
/// `MutationOutcome.reporting_failures`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("reporting failed: {0}")]
pub struct ReportingError(pub String);

/// Sink for pass notifications.
///
/// All methods are best-effort: implementations may fail, and callers
/// must not let a failure alter the mutation pass.
pub trait ProgressSink {
    /// One row finished: 1-based `step` of `total`, with a display label.
    fn report_progress(&mut self, step: u64, total: u64, label: &str)
        -> Result<(), ReportingError>;

    /// A validation hook flagged a value before write.
    fn report_warning(&mut self, message: &str) -> Result<(), ReportingError>;

    /// The pass failed; surface the failure to a human operator.
    fn report_error(&mut self, message: &str) -> Result<(), ReportingError>;
}

/// Sink that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report_progress(&mut self, _: u64, _: u64, _: &str) -> Result<(), ReportingError> {
        Ok(())
    }

    fn report_warning(&mut self, _: &str) -> Result<(), ReportingError> {
        Ok(())
    }

    fn report_error(&mut self, _: &str) -> Result<(), ReportingError> {
        Ok(())
    }
}

/// A recorded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Progress { step: u64, total: u64, label: String },
    Warning(String),
    Error(String),
}

/// Sink that records every notification, for test verification.
///
/// With `failing()`, the sink still records but reports every delivery as
/// failed, exercising the never-abort contract.
#[derive(Debug, Clone, Default)]
pub struct CollectingProgress {
    /// Recorded notifications, in delivery order.
    pub events: Vec<ProgressEvent>,
    fail: bool,
}

impl CollectingProgress {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recording sink whose deliveries all fail.
    pub fn failing() -> Self {
        Self {
            events: Vec::new(),
            fail: true,
        }
    }

    /// Steps of the recorded progress notifications, in order.
    pub fn steps(&self) -> Vec<u64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { step, .. } => Some(*step),
                _ => None,
            })
            .collect()
    }

    /// Recorded warning messages, in order.
    pub fn warnings(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Warning(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    fn deliver(&mut self, event: ProgressEvent) -> Result<(), ReportingError> {
        self.events.push(event);
        if self.fail {
            Err(ReportingError("sink configured to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ProgressSink for CollectingProgress {
    fn report_progress(
        &mut self,
        step: u64,
        total: u64,
        label: &str,
    ) -> Result<(), ReportingError> {
        self.deliver(ProgressEvent::Progress {
            step,
            total,
            label: label.to_string(),
        })
    }

    fn report_warning(&mut self, message: &str) -> Result<(), ReportingError> {
        self.deliver(ProgressEvent::Warning(message.to_string()))
    }

    fn report_error(&mut self, message: &str) -> Result<(), ReportingError> {
        self.deliver(ProgressEvent::Error(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_progress_accepts_everything() {
        let mut sink = NullProgress;
        assert!(sink.report_progress(1, 3, "step 1 of 3").is_ok());
        assert!(sink.report_warning("odd value").is_ok());
        assert!(sink.report_error("row 2 failed").is_ok());
    }

    #[test]
    fn collecting_progress_records_in_order() {
        let mut sink = CollectingProgress::new();
        sink.report_progress(1, 2, "a").unwrap();
        sink.report_warning("w").unwrap();
        sink.report_progress(2, 2, "b").unwrap();

        assert_eq!(sink.steps(), vec![1, 2]);
        assert_eq!(sink.warnings(), vec!["w"]);
    }

    #[test]
    fn failing_sink_records_but_errors() {
        let mut sink = CollectingProgress::failing();
        assert!(sink.report_progress(1, 1, "a").is_err());
        assert_eq!(sink.steps(), vec![1]);
    }
}
