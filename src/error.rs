use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Missing URL argument: {name}")]
    MissingArgument { name: String },

    #[error("Invalid value for `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Upstream rejected the credentials")]
    AuthenticationFailed,

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Operation not implemented: {operation}")]
    NotImplemented { operation: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn missing(name: &str) -> Self {
        GatewayError::MissingArgument {
            name: name.to_string(),
        }
    }

    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        GatewayError::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's arguments rather than the gateway.
    pub fn is_bad_argument(&self) -> bool {
        matches!(
            self,
            GatewayError::MissingArgument { .. } | GatewayError::InvalidArgument { .. }
        )
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            GatewayError::MissingArgument { .. } => ErrorCode::MissingArguments,
            GatewayError::InvalidArgument { .. } => ErrorCode::WrongArgumentValue,
            GatewayError::AuthenticationFailed => ErrorCode::InvalidCredentials,
            GatewayError::NotImplemented { .. } => ErrorCode::NotImplemented,
            GatewayError::UpstreamUnavailable(_)
            | GatewayError::Config { .. }
            | GatewayError::Io(_)
            | GatewayError::Serialization(_)
            | GatewayError::Csv(_) => ErrorCode::ServerError,
        }
    }
}

/// Machine-readable error catalog shared with the dashboard clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ServerError,
    NoData,
    MissingArguments,
    NotImplemented,
    InvalidCredentials,
    WrongArgumentValue,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ServerError => "0001",
            ErrorCode::NoData => "0002",
            ErrorCode::MissingArguments => "0003",
            ErrorCode::NotImplemented => "0004",
            ErrorCode::InvalidCredentials => "0005",
            ErrorCode::WrongArgumentValue => "0006",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::ServerError => "server error",
            ErrorCode::NoData => "no data",
            ErrorCode::MissingArguments => "missing url arguments",
            ErrorCode::NotImplemented => "not implemented",
            ErrorCode::InvalidCredentials => "invalid credentials",
            ErrorCode::WrongArgumentValue => "wrong url argument value",
        }
    }

    pub fn envelope(self) -> ErrorEnvelope {
        ErrorEnvelope {
            error_code: self.as_str(),
            message: self.message(),
        }
    }
}

/// The `{error_code, message}` body returned for every failed request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub error_code: &'static str,
    pub message: &'static str,
}
