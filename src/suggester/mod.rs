mod baseline;
use baseline::project_base_fee;

mod tip;
use tip::estimate_tip;

use crate::{
    source::{FeeHistorySource, SourceError},
    types::{BlockNumber, FeeHistory, FeeSuggestion},
};
use ethereum_types::U256;
use thiserror::Error;

pub(crate) const GWEI_TO_WEI: u64 = 1000000000;

/// Blocks of base fee history fetched per suggestion.
const FEE_HISTORY_BLOCKS: u64 = 100;

/// Most patient time factor; the ladder has one entry per factor in
/// `0..=MAX_TIME_FACTOR`.
const MAX_TIME_FACTOR: usize = 15;

/// Gas used ratio above which a block counts as full.
const FULL_BLOCK_RATIO: f64 = 0.9;

/// Open band of gas used ratios within which a block is healthy enough for
/// tip sampling.
pub(crate) const HEALTHY_RATIO_MIN: f64 = 0.1;
pub(crate) const HEALTHY_RATIO_MAX: f64 = 0.9;

pub type Result<T, E = SuggestError> = std::result::Result<T, E>;

/// Error thrown when building fee suggestions
#[derive(Error, Debug)]
pub enum SuggestError {
    /// An error in the underlying [`FeeHistorySource`] fetch
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The source returned a history with no base fees at all
    #[error("fee history is empty")]
    EmptyHistory,

    /// The base fee and gas ratio sequences are misaligned
    #[error("fee history returned {base_fees} base fees for {gas_ratios} gas ratios")]
    BaseFeeCount {
        /// Length of `baseFeePerGas`
        base_fees: usize,
        /// Length of `gasUsedRatio`
        gas_ratios: usize,
    },

    /// A gas used ratio lies outside `[0, 1]`
    #[error("gas used ratio {ratio} at block offset {index} is outside [0, 1]")]
    GasRatioOutOfRange {
        /// Offset of the offending block within the window
        index: usize,
        /// The offending ratio
        ratio: f64,
    },

    /// A reward row does not match the requested percentiles
    #[error("reward row at block offset {index} has {got} entries, expected {expected}")]
    RewardWidth {
        /// Offset of the offending block within the window
        index: usize,
        /// Entries in the row
        got: usize,
        /// Requested percentile count
        expected: usize,
    },
}

/// Builds ladders of EIP-1559 fee suggestions from an injected
/// [`FeeHistorySource`].
///
/// The suggester holds no state between invocations; two concurrent
/// [`suggest_fees`](Self::suggest_fees) calls share nothing but the source.
///
/// # Example
///
/// ```no_run
/// use fee_suggester::{FeeSuggester, Http};
/// use std::str::FromStr;
///
/// # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
/// let suggester = FeeSuggester::new(Http::from_str("http://localhost:8545")?);
/// let ladder = suggester.suggest_fees().await?;
/// println!("urgent: {:?}, patient: {:?}", ladder[0], ladder[15]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
#[must_use]
pub struct FeeSuggester<S> {
    source: S,
}

impl<S> FeeSuggester<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: FeeHistorySource> FeeSuggester<S> {
    /// Produces one fee suggestion per time factor from `0` (include in the
    /// next block) to `15` (include within ~15 blocks).
    ///
    /// The base fee ceiling priced into `max_fee_per_gas` is non-increasing
    /// along the ladder. The priority fee is the sampled tip, raised for the
    /// less patient entries whenever a base fee dip is detected.
    ///
    /// Every await point is a source fetch, so dropping the returned future
    /// cancels the in-flight request and no ladder is produced.
    pub async fn suggest_fees(&self) -> Result<Vec<FeeSuggestion>> {
        // A feeHistory call without reward percentiles is cheap even against a
        // light client backend because it only needs block headers, so a
        // hundred blocks of base fee history are affordable on every call.
        let history =
            self.source.fee_history(FEE_HISTORY_BLOCKS, BlockNumber::Latest, None).await?;
        validate_history(&history, None)?;

        let mut base_fees = history.base_fee_per_gas;

        // The pending block is assumed to end up fuller than the node
        // projected, giving urgent suggestions an upward bias.
        let newest = base_fees.len() - 1;
        base_fees[newest] = base_fees[newest] * 9 / 8;

        propagate_full_blocks(&mut base_fees, &history.gas_used_ratio);

        let mut order: Vec<usize> = (0..base_fees.len()).collect();
        order.sort_by(|&a, &b| base_fees[a].cmp(&base_fees[b]));

        let tip = estimate_tip(&self.source, history.oldest_block, &history.gas_used_ratio).await?;

        let mut max_base_fee = U256::zero();
        let mut ladder = vec![FeeSuggestion::default(); MAX_TIME_FACTOR + 1];
        for time_factor in (0..=MAX_TIME_FACTOR).rev() {
            let mut base_fee = project_base_fee(&base_fees, &order, time_factor as f64);
            let mut tip_out = tip;
            if base_fee > max_base_fee {
                max_base_fee = base_fee;
            } else {
                // A narrower time window yielding a lower base fee than a
                // wider one signals a price dip. Getting included on a low tip
                // is not guaranteed there, so keep the higher base fee and
                // shift a quarter of the dip into the tip instead.
                tip_out += (max_base_fee - base_fee) / 4;
                base_fee = max_base_fee;
            }
            ladder[time_factor] = FeeSuggestion {
                max_fee_per_gas: base_fee + tip_out,
                max_priority_fee_per_gas: tip_out,
            };
        }

        Ok(ladder)
    }
}

/// A full block's own base fee understates the market: the minimal tip might
/// not have been enough to get included. Its successor's base fee, already
/// adjusted upward by the protocol, stands in for it.
fn propagate_full_blocks(base_fees: &mut [U256], gas_used_ratio: &[f64]) {
    for i in (0..gas_used_ratio.len()).rev() {
        if gas_used_ratio[i] > FULL_BLOCK_RATIO {
            base_fees[i] = base_fees[i + 1];
        }
    }
}

/// Checks the shape invariants of a fetched history. `expected_reward_width`
/// is the requested percentile count, or `None` when no percentiles were
/// requested.
pub(crate) fn validate_history(
    history: &FeeHistory,
    expected_reward_width: Option<usize>,
) -> Result<()> {
    if history.base_fee_per_gas.is_empty() {
        return Err(SuggestError::EmptyHistory)
    }
    if history.base_fee_per_gas.len() != history.gas_used_ratio.len() + 1 {
        return Err(SuggestError::BaseFeeCount {
            base_fees: history.base_fee_per_gas.len(),
            gas_ratios: history.gas_used_ratio.len(),
        })
    }
    for (index, &ratio) in history.gas_used_ratio.iter().enumerate() {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(SuggestError::GasRatioOutOfRange { index, ratio })
        }
    }
    if let Some(expected) = expected_reward_width {
        for (index, row) in history.reward.iter().enumerate() {
            if row.len() != expected {
                return Err(SuggestError::RewardWidth { index, got: row.len(), expected })
            }
        }
    }
    Ok(())
}
