//! Parameter error types

/// Errors from parameter store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// Name longer than `PARAM_NAME_LEN`
    NameTooLong,
    /// No parameter registered under this name
    UnknownParameter,
    /// Store is full
    StoreFull,
    /// Read-only parameter cannot be modified
    ReadOnly,
}

impl core::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParameterError::NameTooLong => write!(f, "parameter name too long"),
            ParameterError::UnknownParameter => write!(f, "unknown parameter"),
            ParameterError::StoreFull => write!(f, "parameter store full"),
            ParameterError::ReadOnly => write!(f, "parameter is read-only"),
        }
    }
}
