// src/scales/spacing.rs
//! Deterministic scale grids.

use super::range::ScaleRange;

/// Converts Hz to Mel.
pub fn hz_to_mel(frequency: f64) -> f64 {
    1127.01048 * (1.0 + frequency / 700.0).ln()
}

/// Converts Mel to Hz.
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * ((mel / 1127.01048).exp() - 1.0)
}

/// `count` scales in arithmetic progression, endpoints exact.
pub fn linear_scales(range: ScaleRange, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![range.min];
    }
    let step = (range.max - range.min) / (count - 1) as f64;
    let mut scales: Vec<f64> = (0..count).map(|i| range.min + i as f64 * step).collect();
    scales[count - 1] = range.max;
    scales
}

/// `count` scales in geometric progression, endpoints exact.
pub fn logarithmic_scales(range: ScaleRange, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![range.min];
    }
    let log_min = range.min.ln();
    let step = (range.max.ln() - log_min) / (count - 1) as f64;
    let mut scales: Vec<f64> = (0..count).map(|i| (log_min + i as f64 * step).exp()).collect();
    scales[0] = range.min;
    scales[count - 1] = range.max;
    scales
}

/// `2^(k/voices)` for every `k` from `ceil(voices·log2 min)` to
/// `ceil(voices·log2 max)`: nothing below the smallest usable scale, and
/// the top of the range is covered. Always at least two scales.
pub fn dyadic_scales(range: ScaleRange, voices: usize) -> Vec<f64> {
    let v = voices.max(1) as f64;
    let mut first = (v * range.min.log2()).ceil() as i64;
    // log2 rounding can push an exact grid point such as 2.0 one step up
    if 2f64.powf((first - 1) as f64 / v) >= range.min {
        first -= 1;
    }
    let last = (v * range.max.log2()).ceil() as i64;
    (first..=last.max(first + 1))
        .map(|k| 2f64.powf(k as f64 / v))
        .collect()
}

/// `count` scales whose frequencies `fc·fs/s` are uniform in Mel, returned
/// in ascending scale order with exact endpoints.
pub fn mel_scales(range: ScaleRange, count: usize, center_frequency: f64, sampling_rate: f64) -> Vec<f64> {
    if count < 2 {
        return vec![range.min];
    }
    let to_freq = |s: f64| center_frequency * sampling_rate / s;
    let mel_high = hz_to_mel(to_freq(range.min));
    let mel_low = hz_to_mel(to_freq(range.max));
    let step = (mel_high - mel_low) / (count - 1) as f64;

    // Highest frequency first gives ascending scales
    let mut scales: Vec<f64> = (0..count)
        .map(|i| center_frequency * sampling_rate / mel_to_hz(mel_high - i as f64 * step))
        .collect();
    scales[0] = range.min;
    scales[count - 1] = range.max;
    scales
}

/// Sorts ascending and drops entries within `tolerance` (relative) of their
/// predecessor.
pub fn sort_dedup(scales: &mut Vec<f64>, tolerance: f64) {
    scales.retain(|s| s.is_finite() && *s > 0.0);
    scales.sort_by(f64::total_cmp);
    scales.dedup_by(|next, prev| (*next - *prev) <= tolerance * *prev);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn is_strictly_ascending(scales: &[f64]) -> bool {
        scales.windows(2).all(|w| w[0] < w[1])
    }

    #[test]
    fn test_linear_and_log() {
        let range = ScaleRange { min: 2.0, max: 32.0 };
        assert_eq!(linear_scales(range, 4), vec![2.0, 12.0, 22.0, 32.0]);
        let log = logarithmic_scales(range, 5);
        assert_eq!(log.len(), 5);
        assert_relative_eq!(log[1], 4.0, epsilon = 1e-12);
        assert_relative_eq!(log[2], 8.0, epsilon = 1e-12);
        assert_eq!((log[0], log[4]), (2.0, 32.0));
    }

    #[test]
    fn test_dyadic_brackets_range() {
        let range = ScaleRange { min: 3.0, max: 20.0 };
        let scales = dyadic_scales(range, 1);
        let expected = [4.0, 8.0, 16.0, 32.0];
        assert_eq!(scales.len(), expected.len());
        for (s, e) in scales.iter().zip(expected) {
            assert_relative_eq!(*s, e, epsilon = 1e-12);
        }
        let finer = dyadic_scales(range, 4);
        assert!(finer[0] >= 3.0 && finer[0] < 3.0 * 2f64.powf(0.25));
        assert!(*finer.last().unwrap() >= 20.0);
        assert!(is_strictly_ascending(&finer));

        // An exact power of two starts the grid; nothing falls below it
        let exact = dyadic_scales(ScaleRange { min: 2.0, max: 9.0 }, 2);
        assert_relative_eq!(exact[0], 2.0, epsilon = 1e-12);
        for min in [0.7, 1.1, 2.9, 5.0, 33.3] {
            let grid = dyadic_scales(ScaleRange { min, max: min * 3.0 }, 3);
            assert!(grid[0] >= min, "{} below {min}", grid[0]);
            assert!(grid.len() >= 2);
        }
    }

    #[test]
    fn test_mel_ascending_with_exact_endpoints() {
        let range = ScaleRange { min: 2.0, max: 200.0 };
        let scales = mel_scales(range, 20, 1.0, 8000.0);
        assert_eq!(scales.len(), 20);
        assert_eq!((scales[0], scales[19]), (2.0, 200.0));
        assert!(is_strictly_ascending(&scales));
        // uniform in Mel
        let mels: Vec<f64> = scales.iter().map(|s| hz_to_mel(8000.0 / s)).collect();
        let step = mels[0] - mels[1];
        for w in mels.windows(2) {
            assert_relative_eq!(w[0] - w[1], step, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mel_round_trip() {
        for f in [0.0, 100.0, 1000.0, 7999.0] {
            assert_relative_eq!(mel_to_hz(hz_to_mel(f)), f, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_sort_dedup() {
        let mut scales = vec![4.0, 1.0, 2.0, 2.0005, 8.0, 1.0];
        sort_dedup(&mut scales, 1e-3);
        assert_eq!(scales, vec![1.0, 2.0, 4.0, 8.0]);
    }
}
