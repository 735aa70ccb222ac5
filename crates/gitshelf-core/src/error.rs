//! Failure taxonomy shared by every gitshelf component.
//!
//! Each component-level failure is classified into exactly one variant; the
//! proxy maps the variant to a response status. Nothing is retried
//! internally.

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing, malformed or unverifiable credential or preview token.
    #[error("Unauthorized")]
    Unauthorized,

    /// The backend reports the path absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The version token no longer matches the remote state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A required field is missing from the request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any other backend-reported failure, carried verbatim.
    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Unrecognized operation/method combination.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl Error {
    /// HTTP status the proxy responds with for this classification.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Unauthorized => 401,
            Error::NotFound(_) => 404,
            Error::Conflict(_) => 409,
            Error::Validation(_) => 400,
            Error::Upstream { status, .. } => *status,
            Error::BadRequest(_) => 400,
        }
    }

    /// Upstream error with the backend's own status and message.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
