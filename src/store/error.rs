//! Task store-specific error types.

/// Errors that can occur during task store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No endpoint or token configured; nothing was sent
    #[error("API not configured")]
    Unconfigured,

    /// The store rejected the bearer token
    #[error("Invalid API token")]
    Unauthorized,

    /// Transport failure, non-2xx response or undecodable body
    #[error("{}", describe_unavailable(*status, message))]
    Unavailable {
        status: Option<u16>,
        message: String,
    },
}

fn describe_unavailable(status: Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("Request failed: {}", status),
        None => format!("Request failed: {}", message),
    }
}

impl StoreError {
    /// Classify a non-2xx HTTP status.
    ///
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if status == 401 {
            StoreError::Unauthorized
        } else {
            StoreError::Unavailable {
                status: Some(status),
                message: message.into(),
            }
        }
    }

    /// Classify a failure that produced no HTTP status.
    ///
    pub fn transport(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Unauthorized => Some(401),
            StoreError::Unavailable { status, .. } => *status,
            StoreError::Unconfigured => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => StoreError::from_status(status.as_u16(), e.to_string()),
            None => StoreError::transport(e.to_string()),
        }
    }
}
