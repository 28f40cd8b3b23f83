use super::{FeeHistorySource, SourceError};
use crate::types::{BlockNumber, FeeHistory};
use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

/// A single `fee_history` call as seen by a [`MockSource`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    /// Requested window size
    pub block_count: u64,
    /// Requested newest block
    pub newest_block: BlockNumber,
    /// Requested reward percentiles, if any
    pub reward_percentiles: Option<Vec<f64>>,
}

/// Mock [`FeeHistorySource`] used in test environments.
///
/// Pushed responses are popped front-to-back, one per `fee_history` call, and
/// every call is recorded for later assertion.
///
/// # Example
///
/// ```
/// use fee_suggester::{BlockNumber, FeeHistory, FeeHistorySource, MockSource};
///
/// # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
/// let mock = MockSource::new();
/// mock.push(FeeHistory::default());
/// let history = mock.fee_history(100, BlockNumber::Latest, None).await?;
/// assert_eq!(mock.requests()[0].block_count, 100);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockSource {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responses: Arc<Mutex<VecDeque<Result<FeeHistory, SourceError>>>>,
}

impl MockSource {
    /// Instantiates a mock source with an empty response queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a successful response to the back of the queue
    pub fn push(&self, history: FeeHistory) {
        self.responses.lock().unwrap().push_back(Ok(history));
    }

    /// Pushes an error response to the back of the queue
    pub fn push_error(&self, error: SourceError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// All requests made against this source, in call order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl FeeHistorySource for MockSource {
    /// Records the call and pops the next canned response. Calling with an
    /// empty queue is a [`SourceError::CustomError`].
    async fn fee_history(
        &self,
        block_count: u64,
        newest_block: BlockNumber,
        reward_percentiles: Option<&[f64]>,
    ) -> Result<FeeHistory, SourceError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            block_count,
            newest_block,
            reward_percentiles: reward_percentiles.map(<[f64]>::to_vec),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::CustomError("empty response queue".to_string())))
    }
}
