use thiserror::Error;

/// Type alias for Result with CleanerError
pub type Result<T> = std::result::Result<T, CleanerError>;

/// Error types for the trash cleaner
#[derive(Error, Debug)]
pub enum CleanerError {
    /// A keyword entry failed validation or its pattern did not compile
    #[error("Invalid keyword: {0}")]
    InvalidKeyword(String),

    /// Retrieving unread emails from the provider failed
    #[error("Failed to get unread emails: {0}")]
    FetchFailed(#[source] Box<CleanerError>),

    /// The provider rejected the batch delete
    #[error("Failed to delete emails: {0}")]
    DeleteFailed(#[source] Box<CleanerError>),

    /// Mail provider API returned an error
    #[error("Mail API error: {0}")]
    ApiError(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Rate limit exceeded - should retry after specified seconds
    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Provider message could not be parsed
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CleanerError {
    /// Check if the error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CleanerError::RateLimitExceeded { .. }
                | CleanerError::ServerError { .. }
                | CleanerError::NetworkError(_)
        )
    }

    /// Check if the error is permanent and should not be retried
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Wrap as `FetchFailed` unless it already is one
    pub fn into_fetch_failed(self) -> Self {
        match self {
            CleanerError::FetchFailed(_) => self,
            other => CleanerError::FetchFailed(Box::new(other)),
        }
    }

    /// Wrap as `DeleteFailed` unless it already is one
    pub fn into_delete_failed(self) -> Self {
        match self {
            CleanerError::DeleteFailed(_) => self,
            other => CleanerError::DeleteFailed(Box::new(other)),
        }
    }
}

/// Parse the Retry-After header from an HTTP response
///
/// The Retry-After header can be specified in two formats:
/// 1. Delay-seconds: An integer indicating seconds to wait (e.g., "120")
/// 2. HTTP-date: An HTTP date format (e.g., "Wed, 21 Oct 2015 07:28:00 GMT")
///
/// Returns the number of seconds to wait. If the header is missing, invalid
/// or in the past, returns a default of 5 seconds.
fn parse_retry_after_header<B>(response: &hyper::Response<B>) -> u64 {
    const DEFAULT_RETRY_AFTER: u64 = 5;

    if let Some(retry_after_value) = response.headers().get("retry-after") {
        if let Ok(retry_after_str) = retry_after_value.to_str() {
            if let Ok(seconds) = retry_after_str.parse::<u64>() {
                return seconds;
            }

            if let Ok(http_date) = httpdate::parse_http_date(retry_after_str) {
                let now = std::time::SystemTime::now();
                if let Ok(duration) = http_date.duration_since(now) {
                    return duration.as_secs();
                }
            }
        }
    }

    DEFAULT_RETRY_AFTER
}

impl From<google_gmail1::Error> for CleanerError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let status_code = status.as_u16();
                let message = format!(
                    "HTTP {}: {}",
                    status_code,
                    status.canonical_reason().unwrap_or("Unknown")
                );

                match status_code {
                    429 => {
                        let retry_after = parse_retry_after_header(response);
                        CleanerError::RateLimitExceeded { retry_after }
                    }
                    404 => CleanerError::NotFound("Resource not found".to_string()),
                    400 => CleanerError::BadRequest(message),
                    401 => CleanerError::AuthError(message),
                    403 => CleanerError::Forbidden(message),
                    500..=599 => CleanerError::ServerError {
                        status: status_code,
                        message,
                    },
                    _ => CleanerError::ApiError(message),
                }
            }
            google_gmail1::Error::BadRequest(ref err) => {
                CleanerError::BadRequest(format!("{}", err))
            }
            google_gmail1::Error::HttpError(ref err) => {
                CleanerError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => CleanerError::NetworkError(err.to_string()),
            _ => CleanerError::ApiError(error.to_string()),
        }
    }
}
