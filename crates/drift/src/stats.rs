//! Statistical primitives for drift detection.
//!
//! Deterministic, fixed-bin implementations: no randomness, no unbounded
//! loops.

/// Bin count shared by ECE and PSI (fixed-width histograms).
pub const HISTOGRAM_BINS: usize = 10;

/// Percentage floor applied to PSI histogram bins to avoid `ln(0)`.
pub const PSI_PCT_FLOOR: f64 = 0.0001;

/// Expected Calibration Error over `(predicted probability, was_correct)`
/// samples.
///
/// Bins predictions into `bins` equal-width bins on [0, 1]; each non-empty bin
/// contributes `|mean confidence − empirical accuracy| × (bin size / total)`.
/// Returns `None` for an empty sample set.
pub fn expected_calibration_error(samples: &[(f64, bool)], bins: usize) -> Option<f64> {
    if samples.is_empty() || bins == 0 {
        return None;
    }

    let mut bin_confidence = vec![0.0f64; bins];
    let mut bin_correct = vec![0usize; bins];
    let mut bin_count = vec![0usize; bins];

    for &(confidence, correct) in samples {
        let clamped = confidence.clamp(0.0, 1.0);
        let idx = ((clamped * bins as f64) as usize).min(bins - 1);
        bin_confidence[idx] += clamped;
        bin_count[idx] += 1;
        if correct {
            bin_correct[idx] += 1;
        }
    }

    let total = samples.len() as f64;
    let mut ece = 0.0;
    for i in 0..bins {
        if bin_count[i] == 0 {
            continue;
        }
        let n = bin_count[i] as f64;
        let mean_confidence = bin_confidence[i] / n;
        let accuracy = bin_correct[i] as f64 / n;
        ece += (mean_confidence - accuracy).abs() * (n / total);
    }
    Some(ece)
}

/// Population Stability Index between a baseline and a current sample of the
/// same feature.
///
/// Histograms use `bins` equal-width bins spanning `[min, max]` of the pooled
/// values; per-bin percentages are floored at [`PSI_PCT_FLOOR`]. Returns
/// `None` when either sample is empty.
pub fn population_stability_index(baseline: &[f64], current: &[f64], bins: usize) -> Option<f64> {
    if baseline.is_empty() || current.is_empty() || bins == 0 {
        return None;
    }

    let pooled = baseline.iter().chain(current.iter());
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in pooled {
        min = min.min(v);
        max = max.max(v);
    }

    let width = (max - min) / bins as f64;
    let bin_index = |v: f64| -> usize {
        if width <= 0.0 {
            return 0;
        }
        (((v - min) / width) as usize).min(bins - 1)
    };

    let mut baseline_counts = vec![0usize; bins];
    for &v in baseline {
        baseline_counts[bin_index(v)] += 1;
    }
    let mut current_counts = vec![0usize; bins];
    for &v in current {
        current_counts[bin_index(v)] += 1;
    }

    let baseline_total = baseline.len() as f64;
    let current_total = current.len() as f64;
    let mut psi = 0.0;
    for i in 0..bins {
        let baseline_pct = (baseline_counts[i] as f64 / baseline_total).max(PSI_PCT_FLOOR);
        let current_pct = (current_counts[i] as f64 / current_total).max(PSI_PCT_FLOOR);
        psi += (current_pct - baseline_pct) * (current_pct / baseline_pct).ln();
    }
    Some(psi)
}
