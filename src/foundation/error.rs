use std::io;
use thiserror::Error;

/// Stable discriminant for every error variant, used by hosts that need to
/// branch on error kind without matching the full variant shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnknownSigner,
    ConfigError,
    WorkingSetOverflow,
    SigningFailed,
    SubmissionRejected,
    ConfirmationAmbiguous,
    ExecutionFailed,
    ReceiptMalformed,
    RpcError,
    SerializationError,
    Message,
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// A logical signer name could not be resolved. Raised before any
    /// network I/O; never worth retrying.
    #[error("unknown signer: {name}")]
    UnknownSigner { name: String },

    #[error("configuration error: {0}")]
    Config(String),

    /// The merged working set would exceed the per-call resource ceiling.
    /// Raised before submission instead of deferring to a remote rejection.
    #[error("working set holds {resources} resources, ceiling is {ceiling}")]
    WorkingSetOverflow { resources: usize, ceiling: usize },

    #[error("signing failed for {signer}: {details}")]
    Signing { signer: String, details: String },

    /// Transport-level rejection: the envelope never entered the remote's
    /// commitment pipeline.
    #[error("submission rejected: {details}")]
    Submission { details: String },

    /// The blockhash validity window elapsed before a confirmation was
    /// observed. The call may or may not have committed; callers must
    /// re-query remote state before retrying.
    #[error("confirmation window expired at height {expiry_height}")]
    ConfirmationExpired { expiry_height: u64 },

    /// The transaction confirmed and the remote reported a structured
    /// failure code. The code is carried unchanged.
    #[error("remote execution failed: code={code} label={}", .label.unwrap_or("unknown"))]
    Execution { code: u32, label: Option<&'static str> },

    /// A confirmed call whose receipt does not carry the data the engine
    /// depends on. Distinct from a remote failure.
    #[error("receipt malformed: {details}")]
    ReceiptMalformed { details: String },

    #[error("rpc error during {operation}: {details}")]
    Rpc { operation: String, details: String },

    #[error("{format} serialization error: {details}")]
    Serialization { format: String, details: String },

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::UnknownSigner { .. } => ErrorCode::UnknownSigner,
            EngineError::Config(_) => ErrorCode::ConfigError,
            EngineError::WorkingSetOverflow { .. } => ErrorCode::WorkingSetOverflow,
            EngineError::Signing { .. } => ErrorCode::SigningFailed,
            EngineError::Submission { .. } => ErrorCode::SubmissionRejected,
            EngineError::ConfirmationExpired { .. } => ErrorCode::ConfirmationAmbiguous,
            EngineError::Execution { .. } => ErrorCode::ExecutionFailed,
            EngineError::ReceiptMalformed { .. } => ErrorCode::ReceiptMalformed,
            EngineError::Rpc { .. } => ErrorCode::RpcError,
            EngineError::Serialization { .. } => ErrorCode::SerializationError,
            EngineError::Message(_) => ErrorCode::Message,
        }
    }

    /// True for errors raised before any network I/O; these are never
    /// resolved by retrying the same call.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::UnknownSigner | ErrorCode::ConfigError | ErrorCode::WorkingSetOverflow
        )
    }

    pub fn unknown_signer(name: impl Into<String>) -> Self {
        EngineError::UnknownSigner { name: name.into() }
    }

    pub fn config(details: impl Into<String>) -> Self {
        EngineError::Config(details.into())
    }

    pub fn signing(signer: impl Into<String>, details: impl Into<String>) -> Self {
        EngineError::Signing { signer: signer.into(), details: details.into() }
    }

    pub fn submission(details: impl Into<String>) -> Self {
        EngineError::Submission { details: details.into() }
    }

    pub fn rpc(operation: impl Into<String>, details: impl Into<String>) -> Self {
        EngineError::Rpc { operation: operation.into(), details: details.into() }
    }

    pub fn receipt_malformed(details: impl Into<String>) -> Self {
        EngineError::ReceiptMalformed { details: details.into() }
    }
}

impl From<hex::FromHexError> for EngineError {
    fn from(err: hex::FromHexError) -> Self {
        EngineError::Serialization { format: "hex".to_string(), details: err.to_string() }
    }
}

impl From<io::Error> for EngineError {
    fn from(err: io::Error) -> Self {
        EngineError::Serialization { format: "io".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<bincode::Error> for EngineError {
    fn from(err: bincode::Error) -> Self {
        EngineError::Serialization { format: "bincode".to_string(), details: err.to_string() }
    }
}

impl From<figment::Error> for EngineError {
    fn from(err: figment::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

// NOTE: no blanket string conversions; construct structured variants at the
// call site so the code/label survive to the caller.
