//! Wire types shared with the fetch executor

use crate::FetchError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// HTTP method for a retrieval request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Method {
    #[serde(rename = "GET")]
    Get,
}

/// Request handed to the fetch executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalRequest {
    /// Absolute URL to retrieve
    #[serde(rename = "URL")]
    pub url: String,

    #[serde(rename = "Method")]
    pub method: Method,
}

impl RetrievalRequest {
    /// Creates a GET request for the given URL
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
        }
    }
}

/// Response envelope returned by the fetch executor
///
/// Only `StatusCode` and `HTML` are relied upon; any other field the executor
/// sends is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetrievalResponse {
    /// HTTP status the executor received for the target URL
    #[serde(rename = "StatusCode")]
    pub status_code: u16,

    /// Body bytes, base64 encoded on the wire
    #[serde(rename = "HTML", default, deserialize_with = "decode_body")]
    pub body: Vec<u8>,

    #[serde(rename = "Headers", default)]
    pub headers: Option<HashMap<String, Vec<String>>>,
}

impl RetrievalResponse {
    pub fn new(status_code: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code,
            body: body.into(),
            headers: None,
        }
    }

    /// Decodes and validates an envelope received from the executor
    pub fn from_json(bytes: &[u8]) -> Result<Self, FetchError> {
        let response: Self =
            serde_json::from_slice(bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
        response.validate()?;
        Ok(response)
    }

    /// Rejects status codes no HTTP server can send
    pub fn validate(&self) -> Result<(), FetchError> {
        if !(100..=599).contains(&self.status_code) {
            return Err(FetchError::Decode(format!(
                "status code {} out of range",
                self.status_code
            )));
        }
        Ok(())
    }
}

fn decode_body<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(encoded) => STANDARD.decode(encoded).map_err(serde::de::Error::custom),
        None => Ok(Vec::new()),
    }
}
