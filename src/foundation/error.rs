pub type BoardResult<T> = Result<T, BoardError>;

#[derive(thiserror::Error, Debug)]
pub enum BoardError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

/// Failure of a single image load.
///
/// Cloneable so that every caller waiting on a shared in-flight load receives the same error.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("fetch failed for '{locator}': {reason}")]
    Fetch { locator: String, reason: String },

    #[error("decode failed for '{locator}': {reason}")]
    Decode { locator: String, reason: String },
}

impl LoadError {
    pub fn fetch(locator: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(locator: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    pub fn locator(&self) -> &str {
        match self {
            Self::Fetch { locator, .. } | Self::Decode { locator, .. } => locator,
        }
    }
}
