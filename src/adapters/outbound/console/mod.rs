/// Console adapters for human-facing progress output
mod progress_reporter;

pub use progress_reporter::StderrProgressReporter;
