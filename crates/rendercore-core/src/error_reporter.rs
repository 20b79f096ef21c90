//! Process-wide sink for mount engine diagnostics.
//!
//! Embedders install their own [`ErrorReporterDelegate`] to route failures
//! into crash reporting. Until then everything goes to the `log` facade.

use std::error::Error;
use std::sync::{Arc, LazyLock, RwLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Warning,
    Error,
    /// Reporting at this level never returns.
    Fatal,
}

pub trait ErrorReporterDelegate: Send + Sync {
    fn report(
        &self,
        level: LogLevel,
        category: &str,
        message: &str,
        cause: Option<&(dyn Error + 'static)>,
        sampling_frequency: u32,
        metadata: &[(&str, String)],
    );
}

/// Default sink: forwards to `log` and panics on [`LogLevel::Fatal`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorReporter;

impl ErrorReporterDelegate for LogErrorReporter {
    fn report(
        &self,
        level: LogLevel,
        category: &str,
        message: &str,
        cause: Option<&(dyn Error + 'static)>,
        _sampling_frequency: u32,
        metadata: &[(&str, String)],
    ) {
        let cause = cause.map(|c| c.to_string()).unwrap_or_default();
        match level {
            LogLevel::Warning => {
                log::warn!("[{category}] {message} {cause} {metadata:?}")
            }
            LogLevel::Error => {
                log::error!("[{category}] {message} {cause} {metadata:?}")
            }
            LogLevel::Fatal => {
                log::error!("[{category}] fatal: {message} {cause} {metadata:?}");
                panic!("[{category}] {message}");
            }
        }
    }
}

static REPORTER: LazyLock<RwLock<Arc<dyn ErrorReporterDelegate>>> =
    LazyLock::new(|| RwLock::new(Arc::new(LogErrorReporter)));

/// Replaces the process-wide sink.
pub fn set_error_reporter(delegate: Arc<dyn ErrorReporterDelegate>) {
    let mut slot = REPORTER.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = delegate;
}

/// Restores the default [`LogErrorReporter`].
pub fn reset_error_reporter() {
    set_error_reporter(Arc::new(LogErrorReporter));
}

pub fn current() -> Arc<dyn ErrorReporterDelegate> {
    REPORTER
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Sends one report to the installed sink.
///
/// The sink is cloned out of the slot before it runs so a reporter may
/// itself replace the sink without deadlocking.
pub fn report(
    level: LogLevel,
    category: &str,
    message: &str,
    cause: Option<&(dyn Error + 'static)>,
    sampling_frequency: u32,
    metadata: &[(&str, String)],
) {
    current().report(level, category, message, cause, sampling_frequency, metadata);
}

#[cfg(test)]
#[path = "tests/error_reporter_tests.rs"]
mod tests;
