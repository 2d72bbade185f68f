use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChefError {
    /// Missing credentials or unusable settings. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failure, timeout or non-success status from an external API.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Well-formed but empty or unusable result.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ChefError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChefError::NotFound(_))
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, ChefError::Upstream(_))
    }
}

impl From<reqwest::Error> for ChefError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChefError::Upstream(format!("request timed out: {}", err))
        } else {
            ChefError::Upstream(err.to_string())
        }
    }
}

impl From<tokio::time::error::Elapsed> for ChefError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ChefError::Upstream("request timed out".to_string())
    }
}
