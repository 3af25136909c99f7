use thiserror::Error;

/// Ошибки на границе REST API. Всё, что не прошло разбор, считается ошибкой (fail closed).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("http {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("response has no data")]
    MissingData,

    #[error("paged response has no total")]
    MissingTotal,

    #[error("server rejected request: {}", .0.as_deref().unwrap_or("no message"))]
    Rejected(Option<String>),
}

impl ApiError {
    /// True for errors that came back from the server as a well-formed `status: "error"` envelope.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected(_))
    }
}
