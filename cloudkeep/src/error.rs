use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication failed (status {status})")]
    Auth { status: u16 },

    #[error("Network error: {0}")]
    Transient(#[from] reqwest::Error),

    #[error("Unexpected response from '{endpoint}': {reason}")]
    UnexpectedResponse { endpoint: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Token is not a valid header value: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;
