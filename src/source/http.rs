use super::{FeeHistorySource, Request, Response, SourceError};
use crate::types::{BlockNumber, FeeHistory};
use async_trait::async_trait;
use reqwest::Client;
use std::{
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};
use tracing::trace;
use url::Url;

/// A [`FeeHistorySource`] speaking JSON-RPC over HTTP.
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
#[derive(Debug)]
pub struct Http {
    id: AtomicU64,
    client: Client,
    url: Url,
}

impl Http {
    /// Initializes a new HTTP source
    ///
    /// # Example
    ///
    /// ```
    /// use fee_suggester::Http;
    /// use url::Url;
    ///
    /// let url = Url::parse("http://localhost:8545").unwrap();
    /// let source = Http::new(url);
    /// ```
    pub fn new(url: impl Into<Url>) -> Self {
        Self::new_with_client(url, Client::new())
    }

    /// Allows to customize the source by providing your own http client
    ///
    /// # Example
    ///
    /// ```
    /// use fee_suggester::Http;
    /// use url::Url;
    ///
    /// let url = Url::parse("http://localhost:8545").unwrap();
    /// let client = reqwest::Client::builder().build().unwrap();
    /// let source = Http::new_with_client(url, client);
    /// ```
    pub fn new_with_client(url: impl Into<Url>, client: reqwest::Client) -> Self {
        Self { id: AtomicU64::new(1), client, url: url.into() }
    }

    /// The Url to which requests are made
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl FeeHistorySource for Http {
    async fn fee_history(
        &self,
        block_count: u64,
        newest_block: BlockNumber,
        reward_percentiles: Option<&[f64]>,
    ) -> Result<FeeHistory, SourceError> {
        let next_id = self.id.fetch_add(1, Ordering::SeqCst);
        // The blockCount param is hex encoded from geth v1.10.7 onwards.
        let params = (format!("0x{block_count:x}"), newest_block, reward_percentiles);
        let payload = Request::new(next_id, "eth_feeHistory", params);

        trace!(id = next_id, %newest_block, block_count, "sending eth_feeHistory request");
        let res = self.client.post(self.url.as_ref()).json(&payload).send().await?;
        let body = res.bytes().await?;

        let res: Response<FeeHistory> = serde_json::from_slice(&body).map_err(|err| {
            SourceError::SerdeJson { err, text: String::from_utf8_lossy(&body).to_string() }
        })?;
        match (res.result, res.error) {
            (Some(result), _) => Ok(result),
            (None, Some(error)) => Err(SourceError::JsonRpcError(error)),
            (None, None) => Err(SourceError::CustomError(
                "response contained neither a result nor an error".to_string(),
            )),
        }
    }
}

impl FromStr for Http {
    type Err = url::ParseError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(src)?;
        Ok(Http::new(url))
    }
}

impl Clone for Http {
    fn clone(&self) -> Self {
        Self { id: AtomicU64::new(1), client: self.client.clone(), url: self.url.clone() }
    }
}
