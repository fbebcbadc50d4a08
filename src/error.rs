//! Error types for the Bot API client.
//!
//! Outbound failures fall into three groups: transport problems (network,
//! unreadable bodies, failed media fetches), remote API errors (`ok: false`)
//! and unsupported operations that are rejected before any network call.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response body (status {status}): {source}")]
    MalformedResponse {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    #[error("Fetch failed (errcode: {status}). Remote URL: '{url}'")]
    FetchFailed { status: StatusCode, url: String },

    /// The media URL could not be fetched at all (connection, body read).
    #[error("Fetch failed ({source}). Remote URL: '{url}'")]
    FetchUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote service answered with `ok: false`.
    #[error("{description} ({code})")]
    Api { code: i64, description: String },

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("unsupported file source: {0}")]
    UnsupportedSource(&'static str),

    #[error("failed to encode request field: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to bind webhook listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// True for requests rejected locally without touching the network.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::NotImplemented(_) | Error::UnsupportedSource(_))
    }

    /// True when fetching a remote media file failed, before any upload.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Error::FetchFailed { .. } | Error::FetchUnreachable { .. }
        )
    }

    /// True for failures reported by the remote service itself.
    pub fn is_api(&self) -> bool {
        matches!(self, Error::Api { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
