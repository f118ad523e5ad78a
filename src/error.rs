use warp::reject::Reject;

/// Outcome of a rejected gate. The offending value is carried verbatim so the
/// caller can see exactly what was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid {expected} format: {value}")]
    MalformedInput {
        expected: &'static str,
        value: String,
    },
}

impl ValidationError {
    pub fn malformed(expected: &'static str, value: &str) -> Self {
        ValidationError::MalformedInput {
            expected,
            value: value.to_owned(),
        }
    }

    /// The input that failed the check.
    pub fn value(&self) -> &str {
        match self {
            ValidationError::MalformedInput { value, .. } => value,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be a duration such as \"15m\" or \"7d\", got {value:?}")]
    InvalidDuration { key: &'static str, value: String },
    #[error("{key} has an invalid value {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("error during device token store operation")]
    StoreError {
        #[from]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Reject for ApiError {}
