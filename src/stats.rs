/**
Statistics computed on top of the confusion matrix and the aligned records: chance-corrected
agreement (Cohen's kappa), the Wilson score interval of a proportion and McNemar's exact test
comparing two predictors on the same gold records.
*/
use crate::align::{align, check_consistent_length, PredictionRecord, SizeMismatchError};
use crate::label::representative;
use crate::metrics::ConfusionMatrix;
use crate::reporter::McNemarResult;
use crate::store::RecordStore;
use itertools::multizip;
use num::ToPrimitive;
use tracing::debug;

/// Cohen's kappa of a confusion matrix. Returns 0 for an empty matrix, and 1 when the expected
/// agreement is already perfect.
pub fn cohen_kappa(matrix: &ConfusionMatrix) -> f64 {
    let n = matrix.total();
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    let observed = matrix.trace() as f64 / n;
    let expected = matrix
        .gold_totals()
        .iter()
        .zip(matrix.predicted_totals().iter())
        .map(|(row, col)| (*row as f64) * (*col as f64))
        .sum::<f64>()
        / (n * n);
    if expected == 1.0 {
        return 1.0;
    }
    (observed - expected) / (1.0 - expected)
}

/// Wilson score interval of the proportion `p` observed over `n` trials, at the confidence given
/// by the normal quantile `z`. The bounds are clamped to `[0, 1]`; `[0, 0]` is returned when
/// `n` is 0.
///
/// ```rust
/// use nereval::wilson_interval;
///
/// let [lo, hi] = wilson_interval(0.8, 100, 1.96);
/// assert!(lo < 0.8 && 0.8 < hi);
/// assert_eq!(wilson_interval(0.5, 0, 1.96), [0.0, 0.0]);
/// ```
pub fn wilson_interval<N: ToPrimitive>(p: f64, n: N, z: f64) -> [f64; 2] {
    let n = n.to_f64().unwrap_or(0.0);
    if n <= 0.0 {
        return [0.0, 0.0];
    }
    let z2 = z * z;
    let denominator = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denominator;
    let margin = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denominator;
    [
        (center - margin).clamp(0.0, 1.0),
        (center + margin).clamp(0.0, 1.0),
    ]
}

/// Natural logarithm of the binomial coefficient `C(n, k)`, as a sum of log ratios. Returns
/// negative infinity when `k > n`.
pub fn log_choose(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    let k = k.min(n - k);
    (1..=k)
        .map(|i| ((n - k + i) as f64 / i as f64).ln())
        .sum()
}

/// `ln(sum(exp(x)))` without overflow. Returns negative infinity for an empty input.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// Two-sided exact p-value of McNemar's test for the discordant counts `n01` and `n10`:
/// `min(1, 2 * P(X <= min(n01, n10)))` with `X ~ Binomial(n01 + n10, 1/2)`.
pub fn mcnemar_p_value(n01: u64, n10: u64) -> f64 {
    let n = n01 + n10;
    if n == 0 {
        return 1.0;
    }
    let b = n01.min(n10);
    // log C(n, k + 1) = log C(n, k) + ln((n - k) / (k + 1))
    let log_terms: Vec<f64> = std::iter::once(0.0)
        .chain((0..b).scan(0.0, |log_term, k| {
            *log_term += ((n - k) as f64 / (k + 1) as f64).ln();
            Some(*log_term)
        }))
        .collect();
    let log_tail = log_sum_exp(&log_terms) - n as f64 * std::f64::consts::LN_2;
    (2.0 * log_tail.exp()).min(1.0)
}

/// Compares two predictors on the gold records of `store`. Both prediction lists must hold
/// exactly one prediction per gold record. Records are reduced to their representative label;
/// only the records on which exactly one predictor is right are counted.
pub fn mcnemar(
    store: &RecordStore,
    predictions_a: &[PredictionRecord],
    predictions_b: &[PredictionRecord],
) -> Result<McNemarResult, SizeMismatchError> {
    check_consistent_length(store, predictions_a)?;
    check_consistent_length(store, predictions_b)?;
    let aligned_a = align(store, predictions_a);
    let aligned_b = align(store, predictions_b);
    let (mut n01, mut n10) = (0u64, 0u64);
    for (gold, a, b) in multizip((store.iter(), aligned_a.iter(), aligned_b.iter())) {
        let gold = representative(gold.labels);
        let correct_a = representative(a.predicted) == gold;
        let correct_b = representative(b.predicted) == gold;
        match (correct_a, correct_b) {
            (true, false) => n01 += 1,
            (false, true) => n10 += 1,
            _ => {}
        }
    }
    let result = McNemarResult {
        n01,
        n10,
        p_value: mcnemar_p_value(n01, n10),
    };
    debug!(n01, n10, p_value = result.p_value, "computed McNemar test");
    Ok(result)
}
