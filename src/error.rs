#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Gateway-reported failure (authorization, validation, constraint).
    /// The gateway reports these as undifferentiated message strings.
    #[error("{0}")]
    Gateway(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;
