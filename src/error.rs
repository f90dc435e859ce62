use thiserror::Error;

use crate::notify::NotificationKind;

/// Client-side validation failures. These never reach the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a search query.")]
    EmptyQuery,

    #[error("The query must be at least {min} characters long.")]
    QueryTooShort { min: usize },

    #[error("Select at least one dorking category.")]
    NoDorkCategories,
}

impl ValidationError {
    pub fn kind(&self) -> NotificationKind {
        match self {
            ValidationError::NoDorkCategories => NotificationKind::Warning,
            _ => NotificationKind::Error,
        }
    }

    /// Whether the query field should receive focus after this failure.
    pub fn focuses_query(&self) -> bool {
        !matches!(self, ValidationError::NoDorkCategories)
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Application(String),

    #[error("A search is already in progress. Please wait.")]
    Busy,

    #[error("No results to export")]
    NothingToExport,

    #[error("invalid api base url: {0}")]
    InvalidBaseUrl(String),

    #[error("history table: {0}")]
    History(String),
}

impl ClientError {
    /// Text shown to the user in error panels and notifications.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn from_envelope(error: Option<String>, message: Option<String>) -> Self {
        let text = error
            .or(message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Search failed".to_string());
        ClientError::Application(text)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
