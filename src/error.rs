use thiserror::Error;

use crate::directory::business::NormalizeError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Could not get database connection: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid business record: {0}")]
    Record(#[from] NormalizeError),

    #[error("Could not read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Could not bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("Invalid value for {key}: {message}")]
    Config { key: &'static str, message: String },
}
