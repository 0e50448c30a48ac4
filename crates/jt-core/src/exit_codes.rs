//! Exit codes for the `jt` CLI.
//!
//! Codes are a stable contract for scripts:
//! - 0: success
//! - 10-19: input errors, fixable by the caller
//! - 20-29: internal errors and I/O failures

use jt_common::{Error, ErrorCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Clean = 0,

    /// Invalid arguments or a query the engine cannot answer as posed.
    ArgsError = 10,
    /// The network failed validation.
    NetworkError = 11,
    /// Evidence failed validation or is impossible.
    EvidenceError = 12,
    ConfigError = 13,
    LearningError = 14,

    /// Junction-tree invariant violated (bug, please report).
    InternalError = 20,
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Codes 10-19.
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&self.as_i32())
    }

    /// Name used in JSON error output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::NetworkError => "ERR_NETWORK",
            ExitCode::EvidenceError => "ERR_EVIDENCE",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::LearningError => "ERR_LEARNING",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        if err.is_internal() {
            return ExitCode::InternalError;
        }
        match err.category() {
            ErrorCategory::Structure => ExitCode::NetworkError,
            ErrorCategory::Evidence => ExitCode::EvidenceError,
            ErrorCategory::Invariant => ExitCode::ArgsError,
            ErrorCategory::Learning => ExitCode::LearningError,
            ErrorCategory::Io => ExitCode::IoError,
            ErrorCategory::Config => ExitCode::ConfigError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
