use crate::ports::outbound::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// StderrProgressReporter adapter for reporting progress to stderr
///
/// Progress goes to stderr so it never mixes with the report on stdout.
/// The bar is shared behind a mutex because scan branches report
/// concurrently.
pub struct StderrProgressReporter {
    progress_bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl StderrProgressReporter {
    pub fn new() -> Self {
        Self {
            progress_bar: Mutex::new(None),
            quiet: false,
        }
    }

    /// Reporter that only prints errors
    pub fn quiet() -> Self {
        Self {
            progress_bar: Mutex::new(None),
            quiet: true,
        }
    }

    fn progress_bar(&self, total: usize) -> Option<ProgressBar> {
        let mut slot = self.progress_bar.lock().ok()?;
        let pb = slot.get_or_insert_with(|| {
            let pb = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("   {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) - {msg}")
            {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb
        });
        pb.set_length(total as u64);
        Some(pb.clone())
    }

    fn finish_progress(&self) {
        if let Ok(mut slot) = self.progress_bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Default for StderrProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for StderrProgressReporter {
    fn report(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    fn report_progress(&self, current: usize, total: usize, message: Option<&str>) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.progress_bar(total) {
            pb.set_position(current as u64);
            if let Some(msg) = message {
                pb.set_message(msg.to_string());
            }
        }
    }

    fn report_error(&self, message: &str) {
        self.finish_progress();
        eprintln!("{}", message);
    }

    fn report_completion(&self, message: &str) {
        self.finish_progress();
        if !self.quiet {
            eprintln!();
            eprintln!("{}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_reporter_is_thread_safe() {
        assert_send_sync::<StderrProgressReporter>();
    }

    #[test]
    fn test_progress_bar_is_cleared_on_completion() {
        let reporter = StderrProgressReporter::new();
        reporter.report("🔍 Scanning");
        reporter.report_progress(5, 10, Some("src/app.js"));
        assert!(reporter.progress_bar.lock().unwrap().is_some());
        reporter.report_completion("✅ done");
        assert!(reporter.progress_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_quiet_reporter_skips_progress() {
        let reporter = StderrProgressReporter::quiet();
        reporter.report_progress(1, 2, None);
        assert!(reporter.progress_bar.lock().unwrap().is_none());
    }
}
