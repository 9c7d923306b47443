use thiserror::Error;

/// Errors surfaced by the movie database client and its post-processing helpers.
///
/// Views only need to tell `NotFound` apart from everything else, but the full
/// taxonomy is kept for callers that want to react to specific failures.
#[derive(Error, Debug)]
pub enum MovieApiError {
    #[error("Failed to authenticate with movie database API: {0}")]
    Authentication(String),
    #[error("Movie could not be found.")]
    NotFound,
    #[error("{0}")]
    Api(String),
    #[error("Network connection error occurred while accessing the movie database.")]
    Network,
    #[error("Request to the movie database timed out.")]
    Timeout,
    #[error("Invalid movie payload: {0}")]
    InvalidInput(String),
    #[error("{0} is not a valid attribute on a movie object.")]
    FieldNotFound(String),
}

pub const STATUS_ERROR_MESSAGE: &str = "Failed to retrieve data from the movie database.";
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request.";

impl MovieApiError {
    pub fn bad_status() -> Self {
        MovieApiError::Api(STATUS_ERROR_MESSAGE.to_string())
    }

    pub fn generic() -> Self {
        MovieApiError::Api(GENERIC_ERROR_MESSAGE.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MovieApiError::NotFound)
    }

    /// Classifies a transport failure the way the client reports it.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_connect() {
            MovieApiError::Network
        } else if err.is_timeout() {
            MovieApiError::Timeout
        } else {
            MovieApiError::generic()
        }
    }
}
