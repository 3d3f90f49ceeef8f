use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManabiError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("Gateway returned HTTP {0}")]
    GatewayStatus(u16),

    #[error("API key not configured for {0}")]
    MissingApiKey(&'static str),

    #[error("Table not found: {0}")]
    TableNotFound(uuid::Uuid),

    #[error("Item not found: {0}")]
    ItemNotFound(uuid::Uuid),

    #[error("Required field is empty: {0}")]
    EmptyField(&'static str),

    #[error("Workflow cancelled")]
    Cancelled,

    #[error("ManabiError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for ManabiError {
    fn from(error: std::io::Error) -> Self {
        ManabiError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for ManabiError {
    fn from(error: reqwest::Error) -> Self {
        ManabiError::Reqwest(Box::new(error))
    }
}
