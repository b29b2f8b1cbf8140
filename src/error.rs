//! Errors surfaced by the browser binding layer and config parsing.
//! Gameplay transitions never fail; they are no-ops when invalid.

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("no window")]
    NoWindow,
    #[error("no document")]
    NoDocument,
    #[error("missing element #{0}")]
    MissingElement(String),
    #[error("javascript error: {0}")]
    Js(String),
    #[error("invalid config json: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("session already booted")]
    AlreadyBooted,
    #[error("audio unavailable: {0}")]
    AudioUnavailable(String),
}

impl From<JsValue> for GameError {
    fn from(value: JsValue) -> Self {
        GameError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<GameError> for JsValue {
    fn from(err: GameError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
