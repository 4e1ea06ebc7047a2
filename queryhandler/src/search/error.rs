/// Failures talking to the search backend.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request never got an answer.
    #[error("network error: {message}")]
    Network { message: String },

    /// The backend answered with a non-success status.
    #[error("search backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered 2xx but reported an error in the body.
    #[error("search backend error: {message}")]
    Backend { message: String },

    /// The body is not one of the known response shapes.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

pub type SearchResult<T> = Result<T, SearchError>;
