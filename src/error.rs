/// Error taxonomy for Tab Templates

use thiserror::Error;

/// Failure categories surfaced by the storage gateway, tab gateway and
/// template service. Validation and Capacity abort before any write;
/// Host wraps a failed browser API call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("template not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Capacity(String),

    #[error("browser API error: {0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Map a JS exception from the bridge into a Host error.
    pub fn from_js(context: &str, value: wasm_bindgen::JsValue) -> Error {
        Error::Host(format!("{}: {:?}", context, value))
    }
}
