mod http;
pub use http::Http;

mod mock;
pub use mock::{MockSource, RecordedRequest};

use crate::types::{BlockNumber, FeeHistory};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Capability through which the suggester obtains `eth_feeHistory` data.
///
/// Implementations must format a numeric `newest_block` as a `0x`-prefixed hex
/// string on the wire and must return `block_count + 1` base fee entries, the
/// last one being the node's own projection for the next block.
///
/// # Example
///
/// ```no_run
/// use fee_suggester::{BlockNumber, FeeHistorySource, Http};
/// use std::str::FromStr;
///
/// # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
/// let source = Http::from_str("http://localhost:8545")?;
/// let history = source.fee_history(100, BlockNumber::Latest, None).await?;
/// # Ok(())
/// # }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait FeeHistorySource: Send + Sync + fmt::Debug {
    /// Fetches base fee, gas utilization, and (when `reward_percentiles` is
    /// set) effective priority fee history for the `block_count` blocks ending
    /// at `newest_block`.
    ///
    /// A call without percentiles is header-only and cheap even against light
    /// clients.
    async fn fee_history(
        &self,
        block_count: u64,
        newest_block: BlockNumber,
        reward_percentiles: Option<&[f64]>,
    ) -> Result<FeeHistory, SourceError>;
}

/// Error thrown when fetching data from a [`FeeHistorySource`]
#[derive(Error, Debug)]
pub enum SourceError {
    /// Thrown if the HTTP request failed
    #[error(transparent)]
    HttpError(#[from] reqwest::Error),

    /// Thrown if the upstream node returned a JSON-RPC error
    #[error("JSON-RPC error: {0}")]
    JsonRpcError(JsonRpcError),

    /// Thrown if the response could not be deserialized
    #[error("deserialization error: {err}. Response: {text}")]
    SerdeJson {
        /// Underlying error
        err: serde_json::Error,
        /// The contents of the HTTP response that could not be deserialized
        text: String,
    },

    /// Custom error from a bespoke source implementation
    #[error("{0}")]
    CustomError(String),
}

/// A JSON-RPC 2.0 error
#[derive(Deserialize, Debug, Clone, Error)]
pub struct JsonRpcError {
    /// The error code
    pub code: i64,
    /// The error message
    pub message: String,
    /// Additional data
    pub data: Option<Value>,
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(code: {}, message: {}, data: {:?})", self.code, self.message, self.data)
    }
}

fn is_zst<T>(_t: &T) -> bool {
    std::mem::size_of::<T>() == 0
}

/// A JSON-RPC request
#[derive(Serialize, Debug)]
pub(crate) struct Request<'a, T> {
    id: u64,
    jsonrpc: &'a str,
    method: &'a str,
    #[serde(skip_serializing_if = "is_zst")]
    params: T,
}

impl<'a, T> Request<'a, T> {
    /// Creates a new JSON RPC request
    pub fn new(id: u64, method: &'a str, params: T) -> Self {
        Self { id, jsonrpc: "2.0", method, params }
    }
}

/// A JSON-RPC response
#[derive(Deserialize, Debug)]
pub(crate) struct Response<R> {
    #[allow(dead_code)]
    pub id: u64,
    #[serde(default)]
    pub result: Option<R>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}
