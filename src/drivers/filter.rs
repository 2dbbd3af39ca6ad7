// src/drivers/filter.rs

/// σ-filter over the tail window of `history`.
///
/// `history` is the accepted values of the active experiment with the new
/// candidate appended as the last element. The last `window_size` values
/// (fewer while the experiment is young) form the window; if the candidate
/// deviates from the window mean by more than `k` standard deviations it is
/// replaced by that mean, otherwise it passes through unchanged.
///
/// The deviation uses the population standard deviation (divisor = window
/// length) and is recomputed from scratch on every call. This is the classic
/// 3σ rule in a sliding window, not an incremental or exponential filter.
pub fn sigma_filter(history: &[f64], window_size: usize, k: f64) -> f64 {
    let Some(&candidate) = history.last() else {
        return f64::NAN;
    };

    let w = window_size.min(history.len());
    let window = &history[history.len() - w..];
    if window.len() < 2 {
        return candidate;
    }

    let mean = window.iter().sum::<f64>() / window.len() as f64;
    let variance = window
        .iter()
        .map(|v| {
            let delta = v - mean;
            delta * delta
        })
        .sum::<f64>()
        / window.len() as f64;
    let std = variance.sqrt();

    if std == 0.0 {
        return candidate;
    }
    if (candidate - mean).abs() > k * std {
        mean
    } else {
        candidate
    }
}

/// Centered moving average used for the display overlay.
///
/// Output has the same length as the input; at the edges the window is
/// clipped to the sequence bounds rather than padded.
pub fn moving_average(data: &[f64], window_size: usize) -> Vec<f64> {
    if data.len() <= 1 {
        return data.to_vec();
    }

    let half = window_size / 2;
    let mut result = Vec::with_capacity(data.len());
    for i in 0..data.len() {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(data.len());
        let window = &data[start..end];
        result.push(window.iter().sum::<f64>() / window.len() as f64);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn constant_window_passes_candidate_through() {
        // std == 0 must never divide; the candidate comes back untouched.
        let history = [5.0, 5.0, 5.0, 5.0, 5.0];
        assert_eq!(sigma_filter(&history, 10, 3.0), 5.0);
    }

    #[test]
    fn single_value_history_is_returned_unchanged() {
        assert_eq!(sigma_filter(&[42.0], 10, 3.0), 42.0);
    }

    #[test]
    fn spike_is_clamped_to_window_mean() {
        // mean = 25, population std = sqrt(1125) ~ 33.54, |100 - 25| = 75.
        // With k = 2 the spike exceeds 2 std and is replaced by the mean.
        let history = [10.0, 10.0, 10.0, 10.0, 10.0, 100.0];
        let filtered = sigma_filter(&history, 10, 2.0);
        assert!((filtered - 25.0).abs() < EPS);
    }

    #[test]
    fn spike_within_threshold_is_kept() {
        // Same data, k = 3: 75 < 3 * 33.54, so the candidate survives.
        let history = [10.0, 10.0, 10.0, 10.0, 10.0, 100.0];
        assert_eq!(sigma_filter(&history, 10, 3.0), 100.0);
    }

    #[test]
    fn window_is_limited_to_the_tail() {
        // Only the last 3 values count: [20, 20, 20] has std 0.
        let history = [1000.0, 1000.0, 20.0, 20.0, 20.0];
        assert_eq!(sigma_filter(&history, 3, 3.0), 20.0);
    }

    #[test]
    fn moving_average_identity_on_tiny_inputs() {
        assert_eq!(moving_average(&[], 5), Vec::<f64>::new());
        assert_eq!(moving_average(&[7.5], 5), vec![7.5]);
    }

    #[test]
    fn moving_average_centered_window() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let smoothed = moving_average(&data, 3);
        assert_eq!(smoothed.len(), data.len());
        // Interior points average their neighbors, edges clip.
        assert!((smoothed[0] - 1.5).abs() < EPS);
        assert!((smoothed[2] - 3.0).abs() < EPS);
        assert!((smoothed[4] - 4.5).abs() < EPS);
    }

    #[test]
    fn moving_average_stays_within_input_bounds() {
        let data = [3.0, -1.0, 8.0, 2.0, 2.5, -0.5, 6.0];
        for w in 1..=9 {
            let smoothed = moving_average(&data, w);
            assert_eq!(smoothed.len(), data.len());
            for v in smoothed {
                assert!((-1.0..=8.0).contains(&v));
            }
        }
    }
}
