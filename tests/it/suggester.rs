use ethereum_types::U256;
use fee_suggester::{
    BlockNumber, FeeHistory, FeeSuggester, FeeSuggestion, JsonRpcError, MockSource, SourceError,
    SuggestError,
};

const GWEI: u64 = 1_000_000_000;
const OLDEST_BLOCK: u64 = 16_000_000;

fn history(base_fees: &[u64], gas_used_ratio: &[f64]) -> FeeHistory {
    FeeHistory {
        oldest_block: OLDEST_BLOCK,
        base_fee_per_gas: base_fees.iter().copied().map(U256::from).collect(),
        gas_used_ratio: gas_used_ratio.to_vec(),
        reward: vec![],
    }
}

fn reward_history(tips: &[u64]) -> FeeHistory {
    FeeHistory {
        oldest_block: OLDEST_BLOCK,
        base_fee_per_gas: vec![U256::from(100u64); tips.len() + 1],
        gas_used_ratio: vec![0.5; tips.len()],
        reward: tips.iter().map(|tip| vec![U256::from(*tip)]).collect(),
    }
}

/// The base fee ceiling a suggestion prices in, beyond the tip.
fn ceiling(suggestion: &FeeSuggestion) -> U256 {
    suggestion.max_fee_per_gas - suggestion.max_priority_fee_per_gas
}

/// The invariants every well-formed ladder upholds: sixteen entries, tip never
/// above the total, and a base fee ceiling that never increases with patience.
fn assert_ladder_shape(ladder: &[FeeSuggestion]) {
    assert_eq!(ladder.len(), 16);
    for suggestion in ladder {
        assert!(suggestion.max_fee_per_gas >= suggestion.max_priority_fee_per_gas);
    }
    for window in ladder.windows(2) {
        assert!(
            ceiling(&window[0]) >= ceiling(&window[1]),
            "base fee ceiling must not increase with patience: {window:?}"
        );
    }
}

fn assert_max_fee_monotone(ladder: &[FeeSuggestion]) {
    for window in ladder.windows(2) {
        assert!(
            window[0].max_fee_per_gas >= window[1].max_fee_per_gas,
            "max fee must not increase with patience: {window:?}"
        );
    }
}

#[tokio::test]
async fn flat_history_uses_the_fallback_tip() {
    let mock = MockSource::new();
    mock.push(history(&[100; 101], &[0.5; 100]));
    // The tip sampler asks for rewards but gets none back.
    mock.push(history(&[100, 100], &[0.5]));

    let ladder = FeeSuggester::new(mock.clone()).suggest_fees().await.unwrap();
    assert_ladder_shape(&ladder);
    assert_max_fee_monotone(&ladder);

    let fallback_tip = U256::from(5 * GWEI);
    // 100 * 9 / 8 = 112: the augmented pending fee prices the urgent entry.
    assert_eq!(ladder[0].max_fee_per_gas, U256::from(112u64) + fallback_tip);
    for suggestion in &ladder[1..] {
        assert_eq!(suggestion.max_fee_per_gas, U256::from(100u64) + fallback_tip);
        assert_eq!(suggestion.max_priority_fee_per_gas, fallback_tip);
    }

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].block_count, 100);
    assert_eq!(requests[0].newest_block, BlockNumber::Latest);
    assert_eq!(requests[0].reward_percentiles, None);
    assert_eq!(requests[1].block_count, 5);
    assert_eq!(requests[1].newest_block, BlockNumber::Number(OLDEST_BLOCK + 99));
    assert_eq!(requests[1].reward_percentiles, Some(vec![10.0]));
}

#[tokio::test]
async fn congested_window_falls_back_without_sampling() {
    let mock = MockSource::new();
    // Every block full: no healthy block to sample tips from, and every base
    // fee is replaced by its successor, cascading from the augmented pending
    // value.
    mock.push(history(&[100; 101], &[0.95; 100]));

    let ladder = FeeSuggester::new(mock.clone()).suggest_fees().await.unwrap();
    assert_ladder_shape(&ladder);
    assert_max_fee_monotone(&ladder);

    let fallback_tip = U256::from(5 * GWEI);
    for suggestion in &ladder {
        assert_eq!(suggestion.max_fee_per_gas, U256::from(112u64) + fallback_tip);
        assert_eq!(suggestion.max_priority_fee_per_gas, fallback_tip);
    }

    // The outer fetch is the only request made.
    assert_eq!(mock.requests().len(), 1);
}

#[tokio::test]
async fn dip_compensation_shifts_fees_into_the_tip() {
    let mock = MockSource::new();
    // The market dropped a few blocks ago: a long expensive past with a short
    // cheap tail. Patient horizons draw from the expensive past and promise a
    // higher ceiling than narrower ones, which is exactly the dip
    // configuration.
    let mut base_fees = [2_000_000u64; 101];
    for fee in base_fees.iter_mut().skip(97) {
        *fee = 1_000_000;
    }
    mock.push(history(&base_fees, &[0.5; 100]));
    mock.push(reward_history(&[GWEI; 5]));

    let ladder = FeeSuggester::new(mock.clone()).suggest_fees().await.unwrap();
    assert_ladder_shape(&ladder);

    let tip = U256::from(GWEI);
    assert_eq!(ladder[15].max_priority_fee_per_gas, tip);

    // Some narrower horizon saw a lower base fee and was compensated.
    let compensated: Vec<usize> =
        (0..16).filter(|&t| ladder[t].max_priority_fee_per_gas > tip).collect();
    assert!(!compensated.is_empty(), "expected at least one dip-compensated entry: {ladder:?}");

    // Wherever the dip fired, the base fee ceiling of the more patient
    // neighbor is inherited.
    for &t in &compensated {
        assert_eq!(ceiling(&ladder[t]), ceiling(&ladder[t + 1]));
    }
}

#[tokio::test]
async fn short_reward_fetch_stops_sampling() {
    let mock = MockSource::new();
    mock.push(history(&[100; 101], &[0.5; 100]));
    // Five blocks requested, two rows returned: the walk must end here, with
    // the median taken over exactly the returned rewards.
    mock.push(reward_history(&[3 * GWEI, GWEI]));

    let ladder = FeeSuggester::new(mock.clone()).suggest_fees().await.unwrap();
    assert_ladder_shape(&ladder);
    assert_eq!(mock.requests().len(), 2);
    assert_eq!(ladder[15].max_priority_fee_per_gas, U256::from(3 * GWEI));
}

#[tokio::test]
async fn transport_errors_propagate_unchanged() {
    let mock = MockSource::new();
    mock.push_error(SourceError::JsonRpcError(JsonRpcError {
        code: -32000,
        message: "header not found".to_string(),
        data: None,
    }));

    let err = FeeSuggester::new(mock).suggest_fees().await.unwrap_err();
    match err {
        SuggestError::Source(SourceError::JsonRpcError(err)) => {
            assert_eq!(err.code, -32000);
            assert_eq!(err.message, "header not found");
        }
        other => panic!("expected the JSON-RPC error back, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_history_is_rejected() {
    let mock = MockSource::new();
    mock.push(history(&[100; 101], &[0.5; 99]));
    let err = FeeSuggester::new(mock).suggest_fees().await.unwrap_err();
    assert!(matches!(err, SuggestError::BaseFeeCount { base_fees: 101, gas_ratios: 99 }));

    let mock = MockSource::new();
    mock.push(history(&[100; 101], &[1.5; 100]));
    let err = FeeSuggester::new(mock).suggest_fees().await.unwrap_err();
    assert!(matches!(err, SuggestError::GasRatioOutOfRange { index: 0, .. }));
}

#[tokio::test]
async fn identical_histories_produce_identical_ladders() {
    let mut base_fees = [0u64; 101];
    let mut ratios = [0.0f64; 100];
    // A deterministic sawtooth with a couple of full blocks thrown in.
    for (i, fee) in base_fees.iter_mut().enumerate() {
        *fee = 1_000_000 + 40_000 * ((i as u64 * 7) % 13);
    }
    for (i, ratio) in ratios.iter_mut().enumerate() {
        *ratio = if i % 9 == 0 { 0.93 } else { 0.2 + 0.07 * (i % 10) as f64 };
    }

    let mut ladders = Vec::new();
    for _ in 0..2 {
        let mock = MockSource::new();
        mock.push(history(&base_fees, &ratios));
        mock.push(reward_history(&[GWEI, 2 * GWEI, GWEI / 2, GWEI, 3 * GWEI]));
        let ladder = FeeSuggester::new(mock).suggest_fees().await.unwrap();
        assert_ladder_shape(&ladder);
        ladders.push(ladder);
    }
    assert_eq!(ladders[0], ladders[1]);
}
