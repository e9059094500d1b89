#[derive(Debug, thiserror::Error)]
pub enum ThingsBoardError {
    #[error("no ThingsBoard token configured (set THINGSBOARD_TOKEN or thingsboard.token)")]
    MissingToken,

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} failed with HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        source: serde_json::Error,
    },
}

impl ThingsBoardError {
    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ThingsBoardError::Status { status, .. } => Some(*status),
            ThingsBoardError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ThingsBoardError>;
