//! Common shape of quality-gate results.

/// Outcome of a validation gate: accepted, or rejected with the
/// accumulated error messages.
#[derive(Debug, Clone, Default)]
pub struct GateReport {
    pub errors: Vec<String>,
}

impl GateReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert to a worker error for the given stage if invalid.
    pub fn into_result(self, stage: &'static str) -> crate::WorkerResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(crate::WorkerError::gate_reject(stage, self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_valid() {
        assert!(GateReport::new().is_valid());
        assert!(GateReport::new().into_result("script").is_ok());
    }

    #[test]
    fn test_rejection_collects_errors() {
        let mut report = GateReport::new();
        report.reject("first");
        report.reject("second");
        assert!(!report.is_valid());

        let err = report.into_result("caption").unwrap_err();
        match err {
            crate::WorkerError::GateReject { stage, errors } => {
                assert_eq!(stage, "caption");
                assert_eq!(errors.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
