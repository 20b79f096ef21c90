//! Captures error reports for assertions.

use rendercore_core::error_reporter::{reset_error_reporter, set_error_reporter};
use rendercore_core::{ErrorReporterDelegate, LogLevel};
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};

static REPORTER_LOCK: Mutex<()> = Mutex::new(());

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedReport {
    pub level: LogLevel,
    pub category: String,
    pub message: String,
    pub cause: Option<String>,
    pub metadata: Vec<(String, String)>,
}

#[derive(Default)]
struct CapturingReporter {
    reports: Mutex<Vec<CapturedReport>>,
}

impl ErrorReporterDelegate for CapturingReporter {
    fn report(
        &self,
        level: LogLevel,
        category: &str,
        message: &str,
        cause: Option<&(dyn Error + 'static)>,
        _sampling_frequency: u32,
        metadata: &[(&str, String)],
    ) {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(CapturedReport {
                level,
                category: category.to_owned(),
                message: message.to_owned(),
                cause: cause.map(|cause| cause.to_string()),
                metadata: metadata
                    .iter()
                    .map(|(key, value)| ((*key).to_owned(), value.clone()))
                    .collect(),
            });
    }
}

/// Routes the process-wide error reporter into memory until dropped.
///
/// Guards are serialized across threads, so tests holding one never see
/// each other's reports.
pub struct ErrorReporterGuard {
    reporter: Arc<CapturingReporter>,
    _lock: MutexGuard<'static, ()>,
}

impl ErrorReporterGuard {
    pub fn install() -> Self {
        let lock = REPORTER_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let reporter = Arc::new(CapturingReporter::default());
        set_error_reporter(reporter.clone());
        Self {
            reporter,
            _lock: lock,
        }
    }

    pub fn reports(&self) -> Vec<CapturedReport> {
        self.reporter
            .reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Reports filed under `category`.
    pub fn reports_in(&self, category: &str) -> Vec<CapturedReport> {
        self.reports()
            .into_iter()
            .filter(|report| report.category == category)
            .collect()
    }
}

impl Drop for ErrorReporterGuard {
    fn drop(&mut self) {
        reset_error_reporter();
    }
}
