use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// The `{ok, result, error_code, description}` wrapper around every Bot API
/// response body.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default, alias = "errorcode")]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Envelope {
    pub fn decode(status: StatusCode, body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|source| Error::MalformedResponse { status, source })
    }

    /// Reduces the envelope to its result payload, or the remote error.
    pub fn into_result(self) -> Result<Option<Value>> {
        if self.ok {
            return Ok(self.result);
        }
        Err(Error::Api {
            code: self.error_code.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        })
    }
}

/// Decodes and classifies a raw response body.
pub fn classify(status: StatusCode, body: &[u8]) -> Result<Option<Value>> {
    Envelope::decode(status, body)?.into_result()
}

/// Like [`classify`], but requires a result payload of type `T`.
pub fn classify_as<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T> {
    let result = classify(status, body)?.unwrap_or(Value::Null);
    serde_json::from_value(result).map_err(|source| Error::MalformedResponse { status, source })
}
