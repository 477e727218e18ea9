//! Error types for the MSAP engine and its collaborators.

use thiserror::Error;

use msap_protocol::{
    AppConfigReadResult, AppConfigWriteResult, AttributeResult, QueuingTimeResult,
    ScanNeighborsResult, SinkCostResult, SleepResult,
};

/// Failure reported by a network stack collaborator.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// Unspecified failure.
    #[error("unspecified stack error")]
    Unspecified,

    /// A value is out of range.
    #[error("invalid value")]
    InvalidValue,

    /// The node is configured in a way that forbids the operation.
    #[error("invalid configuration")]
    InvalidConfiguration,

    /// The stack is in the wrong state for the operation.
    #[error("invalid stack state")]
    InvalidStackState,

    /// The operation is not permitted.
    #[error("access denied")]
    AccessDenied,

    /// The operation is not implemented by this stack.
    #[error("not implemented")]
    NotImplemented,
}

/// Failure reported when reading or writing app config data.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppConfigError {
    /// Only sinks may write app config data.
    #[error("node role does not allow app config writes")]
    InvalidRole,

    /// Diagnostic interval is not supported.
    #[error("unsupported diagnostic interval")]
    InvalidInterval,

    /// Sequence number is reserved.
    #[error("invalid sequence number")]
    InvalidSeq,

    /// No app config data has been received or written yet.
    #[error("app config data not set")]
    NotSet,

    /// The data plane refused the operation.
    #[error("app config unavailable")]
    Unavailable,
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value parsed but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Wire Result Mapping
// ============================================================================

impl From<StackError> for AttributeResult {
    fn from(err: StackError) -> Self {
        match err {
            StackError::InvalidValue | StackError::InvalidConfiguration => {
                AttributeResult::InvalidValue
            }
            StackError::InvalidStackState => AttributeResult::InvalidStackState,
            StackError::AccessDenied => AttributeResult::AccessDenied,
            StackError::Unspecified | StackError::NotImplemented => {
                AttributeResult::UnsupportedAttribute
            }
        }
    }
}

impl From<StackError> for SinkCostResult {
    fn from(err: StackError) -> Self {
        match err {
            StackError::InvalidConfiguration => SinkCostResult::InvalidRole,
            _ => SinkCostResult::AccessDenied,
        }
    }
}

impl From<StackError> for ScanNeighborsResult {
    fn from(err: StackError) -> Self {
        match err {
            StackError::InvalidStackState => ScanNeighborsResult::InvalidState,
            _ => ScanNeighborsResult::AccessDenied,
        }
    }
}

impl From<StackError> for QueuingTimeResult {
    fn from(err: StackError) -> Self {
        match err {
            StackError::InvalidValue | StackError::InvalidConfiguration => {
                QueuingTimeResult::InvalidValue
            }
            StackError::InvalidStackState => QueuingTimeResult::InvalidStackState,
            _ => QueuingTimeResult::AccessDenied,
        }
    }
}

impl From<StackError> for SleepResult {
    fn from(err: StackError) -> Self {
        match err {
            StackError::InvalidStackState => SleepResult::InvalidState,
            StackError::InvalidConfiguration => SleepResult::InvalidRole,
            StackError::InvalidValue => SleepResult::InvalidValue,
            _ => SleepResult::AccessDenied,
        }
    }
}

impl From<AppConfigError> for AppConfigReadResult {
    fn from(err: AppConfigError) -> Self {
        match err {
            AppConfigError::NotSet => AppConfigReadResult::Failure,
            _ => AppConfigReadResult::AccessDenied,
        }
    }
}

impl From<AppConfigError> for AppConfigWriteResult {
    fn from(err: AppConfigError) -> Self {
        match err {
            AppConfigError::InvalidRole => AppConfigWriteResult::NotSink,
            AppConfigError::InvalidInterval => AppConfigWriteResult::InvalidInterval,
            AppConfigError::InvalidSeq => AppConfigWriteResult::InvalidSeq,
            _ => AppConfigWriteResult::AccessDenied,
        }
    }
}
