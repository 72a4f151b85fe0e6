use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("validation error: {message}")]
    Validation { message: String },
    #[error("processing error: {message}")]
    Processing { message: String },
    #[error("config error: {message}")]
    Config { message: String },
}

impl InsightsError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type InsightsResult<T> = Result<T, InsightsError>;

impl From<sea_orm::DbErr> for InsightsError {
    fn from(value: sea_orm::DbErr) -> Self {
        InsightsError::storage(value.to_string())
    }
}
