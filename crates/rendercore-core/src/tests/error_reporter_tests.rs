use super::*;
use std::sync::Mutex;

struct Collecting {
    seen: Mutex<Vec<(LogLevel, String, String)>>,
}

impl ErrorReporterDelegate for Collecting {
    fn report(
        &self,
        level: LogLevel,
        category: &str,
        message: &str,
        _cause: Option<&(dyn Error + 'static)>,
        _sampling_frequency: u32,
        _metadata: &[(&str, String)],
    ) {
        self.seen
            .lock()
            .unwrap()
            .push((level, category.to_string(), message.to_string()));
    }
}

#[test]
fn installed_reporter_receives_reports() {
    let collecting = Arc::new(Collecting {
        seen: Mutex::new(Vec::new()),
    });
    set_error_reporter(collecting.clone());
    report(
        LogLevel::Warning,
        "ErrorReporterTest",
        "something odd",
        None,
        0,
        &[],
    );
    reset_error_reporter();

    let seen = collecting.seen.lock().unwrap();
    assert!(seen.iter().any(|(level, category, message)| *level == LogLevel::Warning
        && category == "ErrorReporterTest"
        && message == "something odd"));
}

#[test]
#[should_panic(expected = "boom")]
fn fatal_level_panics_in_default_reporter() {
    LogErrorReporter.report(LogLevel::Fatal, "ErrorReporterTest", "boom", None, 0, &[]);
}
