use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between different
/// types of failures and successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - no findings at or above the fail threshold
    Success = 0,
    /// Findings were detected at or above the configured threshold
    VulnerabilitiesDetected = 1,
    /// Invalid input (bad arguments, unparsable repository URL)
    InvalidArguments = 2,
    /// Application error (persistence failure, cancelled scan, I/O error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::VulnerabilitiesDetected => write!(f, "Vulnerabilities Detected (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Error taxonomy of the scan engine.
///
/// `InvalidInput` and `Persistence` on the initial records are fatal to a scan.
/// `UpstreamService` and `Parse` are degradations: the affected branch
/// contributes nothing and the scan carries on.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid input: {message}\n\n💡 Hint: {hint}")]
    InvalidInput { message: String, hint: String },

    #[error("Upstream service '{service}' failed: {details}")]
    UpstreamService { service: String, details: String },

    #[error("Failed to parse {path}: {details}")]
    Parse { path: String, details: String },

    #[error("Persistence failure during {operation}: {details}")]
    Persistence { operation: String, details: String },

    #[error("Scan was cancelled before completion")]
    Cancelled,

    #[error("Invalid configuration: {message}\n\n💡 Hint: Check the values in your reposcan.config.yml")]
    Config { message: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },
}

impl ScanError {
    pub fn invalid_input(message: impl Into<String>, hint: impl Into<String>) -> Self {
        ScanError::InvalidInput {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn upstream(service: impl Into<String>, details: impl fmt::Display) -> Self {
        ScanError::UpstreamService {
            service: service.into(),
            details: details.to_string(),
        }
    }

    pub fn persistence(operation: impl Into<String>, details: impl fmt::Display) -> Self {
        ScanError::Persistence {
            operation: operation.into(),
            details: details.to_string(),
        }
    }

    /// Maps the error onto the CLI exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ScanError::InvalidInput { .. } | ScanError::Config { .. } => {
                ExitCode::InvalidArguments
            }
            _ => ExitCode::ApplicationError,
        }
    }
}
