use thiserror::Error;

/// Application-wide error types for Toko.
#[derive(Error, Debug)]
pub enum AppError {
    /// Pagination, sort or search parameters could not be parsed.
    #[error("Invalid query parameters: {0}")]
    InvalidQueryParameters(String),

    /// A request body failed field validation.
    #[error("Validation failed")]
    ValidationError(Vec<String>),

    /// The referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness constraint was violated (e.g. email already taken).
    #[error("{0}")]
    DuplicateKey(String),

    /// New password and its confirmation differ.
    #[error("{0}")]
    InvalidPassword(String),

    /// Email/password pair did not match a stored account.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Missing or invalid bearer token.
    #[error("{0}")]
    Unauthorized(String),

    /// Login attempt ceiling exceeded for this client.
    #[error("Too many failed login attempts.")]
    RateLimited,

    /// Password hashing or verification failed.
    #[error("Password hashing error: {0}")]
    HashError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Stable machine-readable code rendered as the `error` field of
    /// HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidQueryParameters(_) => "INVALID_QUERY_PARAMETERS",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DuplicateKey(_) => "DUPLICATE_KEY",
            AppError::InvalidPassword(_) => "INVALID_PASSWORD",
            AppError::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::RateLimited => "RATE_LIMITED",
            AppError::HashError(_)
            | AppError::DatabaseError(_)
            | AppError::ConfigError(_)
            | AppError::Generic(_) => "INTERNAL_ERROR",
        }
    }

    /// Short human-readable description of the error kind.
    pub fn description(&self) -> &'static str {
        match self {
            AppError::InvalidQueryParameters(_) => "Invalid query parameters",
            AppError::ValidationError(_) => "Invalid request body",
            AppError::NotFound(_) => "Record not found",
            AppError::DuplicateKey(_) => "Duplicate key",
            AppError::InvalidPassword(_) => "Invalid password",
            AppError::InvalidCredentials(_) => "Invalid credentials",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::RateLimited => "Too many requests",
            _ => "Internal server error",
        }
    }

    /// Returns true if the caller can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        self.code() != "INTERNAL_ERROR"
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::HashError(err.to_string())
    }
}
