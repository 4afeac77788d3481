// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rolling maximum average power over fixed-length windows.
//!
//! Samples are one reading per second. The best `D`-second average is found
//! with a prefix-sum array: every window sum is `prefix[i + D] - prefix[i]`,
//! so each duration costs O(n) regardless of `D`.

use crate::models::DURATIONS;

/// Prefix sums of a power series; `prefix[i]` is the sum of the first `i`
/// samples.
#[derive(Debug, Clone)]
pub struct PrefixSums {
    prefix: Vec<f64>,
}

impl PrefixSums {
    pub fn new(samples: &[f64]) -> Self {
        let mut prefix = Vec::with_capacity(samples.len() + 1);
        let mut total = 0.0;
        prefix.push(total);
        for &watts in samples {
            total += watts;
            prefix.push(total);
        }
        Self { prefix }
    }

    /// Number of samples covered.
    pub fn len(&self) -> usize {
        self.prefix.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Best average over any window of `duration` samples, or `None` when
    /// the series is shorter than the window (or the window is empty).
    pub fn max_average(&self, duration: usize) -> Option<f64> {
        if duration == 0 || self.len() < duration {
            return None;
        }

        let best_sum = self
            .prefix
            .iter()
            .zip(self.prefix.iter().skip(duration))
            .map(|(start, end)| end - start)
            .fold(f64::NEG_INFINITY, f64::max);

        Some(best_sum / duration as f64)
    }
}

/// Best sustained average power for one duration (seconds).
///
/// Returns `None` if `samples.len() < duration_secs`. No rounding is applied.
pub fn rolling_max_average(samples: &[f64], duration_secs: u32) -> Option<f64> {
    PrefixSums::new(samples).max_average(duration_secs as usize)
}

/// Best sustained average for every configured duration, sharing one
/// prefix-sum pass. Entries are `(duration, None)` where the series is too
/// short.
pub fn best_efforts(samples: &[f64]) -> Vec<(u32, Option<f64>)> {
    let sums = PrefixSums::new(samples);
    DURATIONS
        .iter()
        .map(|&d| (d, sums.max_average(d as usize)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_series_equals_value() {
        let samples = vec![250.0; 3600];
        for &d in DURATIONS.iter() {
            assert_eq!(rolling_max_average(&samples, d), Some(250.0), "{}s", d);
        }
    }

    #[test]
    fn test_too_short_is_undefined() {
        let samples = vec![300.0; 19];
        assert_eq!(rolling_max_average(&samples, 20), None);
        assert_eq!(rolling_max_average(&samples, 10), Some(300.0));
    }

    #[test]
    fn test_empty_series_undefined_for_every_duration() {
        assert!(best_efforts(&[]).iter().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn test_exact_length_has_one_window() {
        let samples = [100.0, 200.0, 300.0, 400.0, 500.0];
        assert_eq!(rolling_max_average(&samples, 5), Some(300.0));
    }

    #[test]
    fn test_finds_best_window_not_first() {
        // A 1000 W spike averages to 280 W over 5s; the later 400 W run wins.
        let mut samples = vec![100.0; 30];
        for s in samples.iter_mut().skip(20).take(5) {
            *s = 400.0;
        }
        samples[3] = 1000.0;

        assert_eq!(rolling_max_average(&samples, 5), Some(400.0));
        assert_eq!(rolling_max_average(&samples, 1), Some(1000.0));
    }

    #[test]
    fn test_zero_duration_undefined() {
        assert_eq!(rolling_max_average(&[100.0, 200.0], 0), None);
    }

    #[test]
    fn test_no_rounding_inside_calculator() {
        let samples = [100.0, 100.0, 101.0];
        let avg = rolling_max_average(&samples, 3).unwrap();
        assert!((avg - 100.333_333_333).abs() < 1e-6);
    }

    #[test]
    fn test_best_efforts_covers_configured_durations() {
        let samples = vec![200.0; 45];
        let efforts = best_efforts(&samples);
        assert_eq!(efforts.len(), DURATIONS.len());
        assert_eq!(efforts[0], (5, Some(200.0)));
        assert_eq!(efforts[3], (30, Some(200.0)));
        assert_eq!(efforts[4], (60, None));
    }

    #[test]
    fn test_prefix_sums_len() {
        let sums = PrefixSums::new(&[1.0, 2.0, 3.0]);
        assert_eq!(sums.len(), 3);
        assert!(!sums.is_empty());
        assert!(PrefixSums::new(&[]).is_empty());
    }
}
