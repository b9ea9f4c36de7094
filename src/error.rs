use thiserror::Error;

/// Input rejected before it reaches a calculator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be between 0 and 100, got {value}")]
    OutOfRange { field: String, value: i64 },

    #[error("unknown attendance status: {0}")]
    UnknownStatus(String),

    #[error("invalid period {0:?}: expected YYYY-MM")]
    BadPeriod(String),

    #[error("invalid date {0:?}: expected YYYY-MM-DD")]
    BadDate(String),

    #[error("invalid weights {0:?}: expected three comma-separated integers")]
    BadWeights(String),

    #[error("{0} must be an integer")]
    NotAnInteger(String),

    #[error("{0} must be greater than 0")]
    NotPositive(String),
}

impl ValidationError {
    pub fn out_of_range(field: impl Into<String>, value: i64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "out_of_range",
            Self::UnknownStatus(_) => "unknown_status",
            Self::BadPeriod(_)
            | Self::BadDate(_)
            | Self::BadWeights(_)
            | Self::NotAnInteger(_)
            | Self::NotPositive(_) => "bad_params",
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no authentication backend is configured; start with --auth-mode demo")]
    AuthUnavailable,

    #[error("login rejected: {0}")]
    AuthFailed(String),

    #[error("not signed in")]
    NotSignedIn,

    #[error("stored profile is unreadable: {0}")]
    CorruptProfile(#[from] serde_json::Error),

    #[error("session store failed: {0}")]
    Store(#[from] rusqlite::Error),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthUnavailable => "auth_unavailable",
            Self::AuthFailed(_) => "auth_failed",
            Self::NotSignedIn => "not_signed_in",
            Self::CorruptProfile(_) | Self::Store(_) => "db_query_failed",
        }
    }
}
