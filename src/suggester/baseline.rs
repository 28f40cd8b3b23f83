use ethereum_types::{U256, U512};
use std::f64::consts::PI;

/// Cumulative-weight band that contributes to the projection. Fees below the
/// 10th percentile of weighted mass from the cheap end carry no weight, fees
/// above the 30th carry full weight.
const SAMPLE_MIN: f64 = 0.1;
const SAMPLE_MAX: f64 = 0.3;

/// Time factors below this collapse onto the pending block fee.
const MIN_TIME_FACTOR: f64 = 1e-6;

/// Fixed-point denominator for curve values carried into wei arithmetic.
const WEIGHT_SCALE: u64 = 1_000_000_000_000_000_000;

/// Maps cumulative sample weight to percentile mass.
///
/// Zero below [`SAMPLE_MIN`], one above [`SAMPLE_MAX`], a full-period raised
/// cosine in between: the curve rises to 1 at the midpoint of the band and
/// falls back toward 0 before the clamp. It is not monotone, so consecutive
/// curve values can decrease.
pub(crate) fn sampling_curve(sum_weight: f64) -> f64 {
    if sum_weight <= SAMPLE_MIN {
        return 0.0
    }
    if sum_weight >= SAMPLE_MAX {
        return 1.0
    }
    (1.0 - ((sum_weight - SAMPLE_MIN) * 2.0 * PI / (SAMPLE_MAX - SAMPLE_MIN)).cos()) / 2.0
}

/// Projects the base fee for one time factor from the augmented history.
///
/// `base_fees` holds the window plus the projected pending block as its last
/// entry; `order` is a stable ascending argsort of `base_fees`. Walking the
/// sorted fees, each contributes the exponential weight of its original
/// position (age), gated through [`sampling_curve`] so only the cheap band of
/// weighted mass enters the average. Larger time factors flatten the decay and
/// draw from a wider horizon.
///
/// Curve values are scaled to integers over a `10^18` denominator and fees are
/// accumulated through 512-bit products, so the result is wei-exact up to the
/// `f64` resolution of the weights themselves.
pub(crate) fn project_base_fee(base_fees: &[U256], order: &[usize], time_factor: f64) -> U256 {
    let newest = base_fees.len() - 1;
    if time_factor < MIN_TIME_FACTOR {
        return base_fees[newest]
    }

    // Per-element coefficient normalizing the total exponential mass of the
    // window to 1.
    let pending_weight = (1.0 - (-1.0 / time_factor).exp()) /
        (1.0 - (-(base_fees.len() as f64) / time_factor).exp());

    let mut sum_weight = 0.0;
    let mut last_scaled = 0u128;
    // Curve deltas can be negative, so positive and negative contributions
    // accumulate separately. The walk always terminates on a curve value of 1,
    // where the signed sum is bounded below by the cheapest fee.
    let mut added = U512::zero();
    let mut removed = U512::zero();
    for &idx in order {
        sum_weight += pending_weight * ((idx as f64 - newest as f64) / time_factor).exp();
        let curve = sampling_curve(sum_weight);
        // Scaled cumulative values telescope, so the admitted mass is exact
        // even though each curve value is rounded individually.
        let curve_scaled = (curve * WEIGHT_SCALE as f64).round() as u128;
        if curve_scaled >= last_scaled {
            added += base_fees[idx].full_mul(U256::from(curve_scaled - last_scaled));
        } else {
            removed += base_fees[idx].full_mul(U256::from(last_scaled - curve_scaled));
        }
        if curve >= 1.0 {
            break
        }
        last_scaled = curve_scaled;
    }

    // The admitted mass never exceeds WEIGHT_SCALE, so the quotient fits.
    U256::try_from((added - removed) / U512::from(WEIGHT_SCALE)).expect("weighted base fee overflow")
}
