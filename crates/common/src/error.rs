/// StudyChat error types
///
/// Backend variants carry a message that can be shown to the user as-is,
/// plus optional raw details from the upstream service for logging.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Empty, oversized or otherwise unusable message
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model id not present in the catalog
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// 401 from the backend
    #[error("Invalid API token. Please check your Hugging Face token.")]
    Auth { details: Option<String> },

    /// 403 from the backend (missing scope or gated model)
    #[error(
        "Access forbidden. This could mean:\n\
         • Your API token doesn't have access to model \"{model}\"\n\
         • The model requires special permissions or is gated\n\
         • Try a different model or check your Hugging Face account permissions"
    )]
    Permission {
        model: String,
        details: Option<String>,
    },

    /// 404 from the backend
    #[error("Model {model} not found. Please try a different model.")]
    NotFound {
        model: String,
        details: Option<String>,
    },

    /// 429 from the backend
    #[error("Rate limit exceeded. Please wait a moment and try again.")]
    RateLimit { details: Option<String> },

    /// Network, transport or model loading failure
    #[error("{message}")]
    BackendUnavailable {
        message: String,
        details: Option<String>,
    },

    /// Any other non-2xx status
    #[error("API error: {status}")]
    GenericBackend {
        status: u16,
        details: Option<String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChatError {
    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create unknown model error
    pub fn unknown_model<S: Into<String>>(model: S) -> Self {
        Self::UnknownModel(model.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create backend unavailable error
    pub fn unavailable<S: Into<String>>(msg: S, details: Option<String>) -> Self {
        Self::BackendUnavailable {
            message: msg.into(),
            details,
        }
    }

    /// Map a non-2xx backend status to the matching error variant
    pub fn from_status(status: u16, model: &str, details: Option<String>) -> Self {
        match status {
            401 => Self::Auth { details },
            403 => Self::Permission {
                model: model.to_string(),
                details,
            },
            404 => Self::NotFound {
                model: model.to_string(),
                details,
            },
            429 => Self::RateLimit { details },
            _ => Self::GenericBackend { status, details },
        }
    }

    /// Message suitable for direct display
    pub fn user_message(&self) -> String {
        match self {
            Self::Io(_) | Self::Json(_) | Self::Other(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Raw diagnostic payload, if any
    pub fn details(&self) -> Option<String> {
        match self {
            Self::Auth { details }
            | Self::Permission { details, .. }
            | Self::NotFound { details, .. }
            | Self::RateLimit { details }
            | Self::BackendUnavailable { details, .. }
            | Self::GenericBackend { details, .. } => details.clone(),
            Self::Io(_) | Self::Json(_) | Self::Other(_) => Some(self.to_string()),
            _ => None,
        }
    }

    /// Whether the error came from the model backend rather than the caller
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            Self::Auth { .. }
                | Self::Permission { .. }
                | Self::NotFound { .. }
                | Self::RateLimit { .. }
                | Self::BackendUnavailable { .. }
                | Self::GenericBackend { .. }
        )
    }
}

// HTTP response conversion
impl ChatError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::UnknownModel(_) => 400,
            Self::Auth { .. } => 401,
            Self::Permission { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::RateLimit { .. } => 429,
            Self::BackendUnavailable { .. } => 503,
            Self::GenericBackend { status, .. } if (400..600).contains(status) => *status,
            Self::GenericBackend { .. } => 502,
            Self::Config(_) => 500,
            Self::Io(_) => 500,
            Self::Json(_) => 400,
            Self::Other(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(ChatError::from_status(401, "gpt2", None), ChatError::Auth { .. }));
        assert!(matches!(
            ChatError::from_status(403, "gpt2", None),
            ChatError::Permission { .. }
        ));
        assert!(matches!(
            ChatError::from_status(404, "gpt2", None),
            ChatError::NotFound { .. }
        ));
        assert!(matches!(
            ChatError::from_status(429, "gpt2", None),
            ChatError::RateLimit { .. }
        ));
        assert!(matches!(
            ChatError::from_status(500, "gpt2", None),
            ChatError::GenericBackend { status: 500, .. }
        ));
    }

    #[test]
    fn test_user_messages() {
        let err = ChatError::from_status(404, "facebook/opt-1.3b", None);
        assert_eq!(
            err.user_message(),
            "Model facebook/opt-1.3b not found. Please try a different model."
        );

        let err = ChatError::from_status(503, "gpt2", Some("Model is loading".to_string()));
        assert_eq!(err.user_message(), "API error: 503");
        assert_eq!(err.details().as_deref(), Some("Model is loading"));

        let err = ChatError::Other(anyhow::anyhow!("boom"));
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
        assert_eq!(err.details().as_deref(), Some("boom"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ChatError::invalid_input("empty").status_code(), 400);
        assert_eq!(ChatError::from_status(429, "gpt2", None).status_code(), 429);
        assert_eq!(ChatError::unavailable("offline", None).status_code(), 503);
        assert_eq!(ChatError::from_status(302, "gpt2", None).status_code(), 502);
        assert!(ChatError::from_status(401, "gpt2", None).is_backend_error());
        assert!(!ChatError::unknown_model("nope").is_backend_error());
    }
}
