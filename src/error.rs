use thiserror::Error;

/// Why a single upstream endpoint could not answer.
///
/// Messages never carry request URLs: RPC and explorer URLs routinely embed
/// API keys.
#[derive(Debug, Clone, Error)]
pub enum EndpointError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("invalid JSON response: {0}")]
    Decode(String),
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("explorer error: {0}")]
    Explorer(String),
}

impl EndpointError {
    pub fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EndpointError::Transport("request timed out".to_string())
        } else {
            EndpointError::Transport(err.without_url().to_string())
        }
    }
}

/// A required fact could not be obtained from any configured endpoint.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("{operation} failed on all {attempts} endpoints (last error: {last})")]
    Exhausted {
        operation: String,
        attempts: usize,
        last: EndpointError,
    },
    #[error("{operation} has no endpoints configured")]
    NoEndpoints { operation: String },
}

impl FetchError {
    pub fn operation(&self) -> &str {
        match self {
            FetchError::Exhausted { operation, .. } | FetchError::NoEndpoints { operation } => {
                operation
            }
        }
    }
}
