use pagegrid_query::QueryError;

/// Failures of the HTTP collaborator.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(String),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("request task failed: {0}")]
    Join(String),
}

impl From<ureq::Error> for TransportError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(code) => TransportError::Status(code),
            other => TransportError::Http(other.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl SourceError {
    /// Network or payload failures. The backing store keeps its previous
    /// contents when a load fails this way.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, SourceError::Transport(_) | SourceError::Decode(_))
    }
}
