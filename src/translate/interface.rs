//! Translate interface - request/response pair of `POST /translate`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NOT_FOUND_SENTINEL: &str = "Translation not found.";
pub const ERROR_PREFIX: &str = "Error: ";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
}

impl TranslationRequest {
    /// Reads `text` out of a JSON body.
    ///
    /// `None` when the body is not an object or has no `text` key. Strings pass
    /// through, numbers and bools are typed as their JSON text, and anything else
    /// (`null`, arrays, objects) is an `Err` describing the value.
    pub fn from_body(body: &Value) -> Option<Result<Self, String>> {
        let value = body.as_object()?.get("text")?;
        let text = match value {
            Value::String(text) => Ok(text.clone()),
            Value::Number(_) | Value::Bool(_) => Ok(value.to_string()),
            Value::Null => Err("cannot type null into the source field".to_string()),
            Value::Array(_) => Err("cannot type an array into the source field".to_string()),
            Value::Object(_) => Err("cannot type an object into the source field".to_string()),
        };
        Some(text.map(|text| Self { text }))
    }
}

/// Wire response. Success, not-found and failure all share `translated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated: String,
}

/// What a translation call actually produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(String),
    /// The output element rendered but stayed empty
    NotFound,
    Failed(String),
}

impl TranslationOutcome {
    pub fn into_result(self) -> TranslationResult {
        let translated = match self {
            Self::Translated(text) => text,
            Self::NotFound => NOT_FOUND_SENTINEL.to_string(),
            Self::Failed(description) => format!("{}{}", ERROR_PREFIX, description),
        };
        TranslationResult { translated }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Translated(_))
    }
}

/// Translate interface trait. Implementations never fail: errors become
/// [`TranslationOutcome::Failed`].
#[async_trait]
pub trait TranslateInterface: Send + Sync {
    async fn translate(&self, text: &str) -> TranslationOutcome;
}
