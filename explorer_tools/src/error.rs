use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExplorerError {
    #[error("Could not initialize explorer client: {0}")]
    Initialization(String),
    #[error("Explorer request failed: {0}")]
    Transport(String),
    #[error("Explorer query failed. Error {status}. {message}")]
    HttpStatus { status: u16, message: String },
    #[error("Could not decode explorer response: {0}")]
    MalformedResponse(String),
}

impl ExplorerError {
    /// True for failures to reach the explorer or non-success HTTP responses; false for undecodable payloads.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::MalformedResponse(_))
    }
}
