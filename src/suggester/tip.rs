use super::{validate_history, SuggestError, GWEI_TO_WEI, HEALTHY_RATIO_MAX, HEALTHY_RATIO_MIN};
use crate::{source::FeeHistorySource, types::BlockNumber};
use ethereum_types::U256;

/// Number of healthy blocks to sample rewards from.
const TIP_SAMPLE_BLOCKS: usize = 5;

/// Reward percentile requested per sampled block.
const REWARD_PERCENTILE: f64 = 10.0;

/// Tip returned when the window contains no healthy blocks.
const FALLBACK_TIP_GWEI: u64 = 5;

/// Suggests a priority tip from the 10th-percentile rewards of recent healthy
/// blocks.
///
/// Walks the window newest to oldest, fetching rewards for each maximal run of
/// healthy blocks until five blocks are sampled. A fetch returning fewer rows
/// than requested ends the walk. Fetches are serialized; each outcome decides
/// the next pointer position.
///
/// Returns the lower median of the sampled tips, or 5 gwei when no healthy
/// block was found.
pub(crate) async fn estimate_tip<S: FeeHistorySource>(
    source: &S,
    oldest_block: u64,
    gas_used_ratio: &[f64],
) -> Result<U256, SuggestError> {
    let mut ptr = gas_used_ratio.len() as isize - 1;
    let mut needed = TIP_SAMPLE_BLOCKS;
    let mut rewards: Vec<U256> = Vec::new();
    while needed > 0 && ptr >= 0 {
        let run = healthy_run(gas_used_ratio, ptr as usize, needed);
        if run > 0 {
            let newest = oldest_block + ptr as u64;
            let history = source
                .fee_history(run as u64, BlockNumber::Number(newest), Some(&[REWARD_PERCENTILE]))
                .await?;
            validate_history(&history, Some(1))?;
            rewards.extend(history.reward.iter().map(|row| row[0]));
            if history.reward.len() < run {
                break
            }
            needed -= run;
        }
        // run == 0 skips exactly one unhealthy block.
        ptr -= run as isize + 1;
    }

    if rewards.is_empty() {
        return Ok(U256::from(FALLBACK_TIP_GWEI * GWEI_TO_WEI))
    }

    // Sort the rewards as we take the (lower) median.
    rewards.sort();
    Ok(rewards[rewards.len() / 2])
}

/// Length of the longest run of consecutive healthy blocks ending at `ptr`,
/// capped at `needed`.
fn healthy_run(gas_used_ratio: &[f64], ptr: usize, needed: usize) -> usize {
    gas_used_ratio[..=ptr]
        .iter()
        .rev()
        .take(needed)
        .take_while(|ratio| **ratio > HEALTHY_RATIO_MIN && **ratio < HEALTHY_RATIO_MAX)
        .count()
}
