// src/utils/array.rs
use ndarray::Array1;

/// Smallest power of two `≥ n`; zero rounds up to 1.
pub fn next_power_of_2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// How samples outside `[0, len)` are synthesised.
///
/// Every convolution path (padded, inline, FFT buffer fill) resolves
/// out-of-range indices through [`BoundaryMode::resolve`], so the four modes
/// behave identically everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoundaryMode {
    /// Outside samples are zero.
    Zero,
    /// Mirror about the edge sample without repeating it: `-k -> k`,
    /// `len-1+k -> len-1-k`.
    Reflect,
    /// Mirror about the boundary, repeating the edge sample: `-k-1 -> k`,
    /// `len+k -> len-1-k`.
    Symmetric,
    /// Wrap modulo the length.
    #[default]
    Periodic,
}

impl BoundaryMode {
    /// Maps a possibly out-of-range index onto the signal, or `None` when
    /// the sample is zero. Works for indices any distance from the signal.
    #[inline]
    pub fn resolve(self, idx: isize, len: usize) -> Option<usize> {
        let n = len as isize;
        if n == 0 {
            return None;
        }
        if (0..n).contains(&idx) {
            return Some(idx as usize);
        }
        match self {
            BoundaryMode::Zero => None,
            BoundaryMode::Periodic => Some(idx.rem_euclid(n) as usize),
            BoundaryMode::Reflect => {
                if n == 1 {
                    return Some(0);
                }
                let period = 2 * (n - 1);
                let m = idx.rem_euclid(period);
                Some((if m >= n { period - m } else { m }) as usize)
            }
            BoundaryMode::Symmetric => {
                let period = 2 * n;
                let m = idx.rem_euclid(period);
                Some((if m >= n { period - 1 - m } else { m }) as usize)
            }
        }
    }

    /// Sample value at `idx` under this boundary mode.
    #[inline]
    pub fn value_at(self, signal: &[f64], idx: isize) -> f64 {
        match self.resolve(idx, signal.len()) {
            Some(i) => signal[i],
            None => 0.0,
        }
    }

    /// Parses the names used by the Python binding.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "zero" | "zeros" => Some(BoundaryMode::Zero),
            "reflect" => Some(BoundaryMode::Reflect),
            "symmetric" => Some(BoundaryMode::Symmetric),
            "periodic" | "wrap" => Some(BoundaryMode::Periodic),
            _ => None,
        }
    }
}

/// Pad signal by `left` and `right` samples according to `mode`
pub fn pad_signal(x: &[f64], left: usize, right: usize, mode: BoundaryMode) -> Array1<f64> {
    let n = x.len();
    Array1::from_shape_fn(left + n + right, |i| {
        mode.value_at(x, i as isize - left as isize)
    })
}

/// Fill a circular buffer with the signal followed by its extension: indices
/// `[0, n + right)` hold `x[i]`, indices `[len - left, len)` hold `x[i - len]`.
/// Remaining slots are zero.
pub fn fill_circular(x: &[f64], buffer: &mut [f64], left: usize, right: usize, mode: BoundaryMode) {
    let len = buffer.len();
    let n = x.len();
    debug_assert!(n + left + right <= len);

    buffer.iter_mut().for_each(|v| *v = 0.0);
    for (i, slot) in buffer.iter_mut().take(n + right).enumerate() {
        *slot = mode.value_at(x, i as isize);
    }
    for k in 1..=left {
        buffer[len - k] = mode.value_at(x, -(k as isize));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_next_power_of_2() {
        assert_eq!(next_power_of_2(0), 1);
        assert_eq!(next_power_of_2(1), 1);
        assert_eq!(next_power_of_2(5), 8);
        assert_eq!(next_power_of_2(64), 64);
        assert_eq!(next_power_of_2(65), 128);
    }

    #[test]
    fn test_reflect_does_not_repeat_edge() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let padded = pad_signal(&x, 3, 3, BoundaryMode::Reflect);
        assert_eq!(
            padded.to_vec(),
            vec![4.0, 3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0]
        );
    }

    #[test]
    fn test_symmetric_repeats_edge() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let padded = pad_signal(&x, 3, 3, BoundaryMode::Symmetric);
        assert_eq!(
            padded.to_vec(),
            vec![3.0, 2.0, 1.0, 1.0, 2.0, 3.0, 4.0, 4.0, 3.0, 2.0]
        );
    }

    #[test]
    fn test_zero_and_periodic() {
        let x = [1.0, 2.0, 3.0];
        assert_eq!(
            pad_signal(&x, 2, 2, BoundaryMode::Zero).to_vec(),
            vec![0.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0]
        );
        assert_eq!(
            pad_signal(&x, 2, 4, BoundaryMode::Periodic).to_vec(),
            vec![2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]
        );
    }

    #[test]
    fn test_single_sample_signal() {
        for mode in [BoundaryMode::Reflect, BoundaryMode::Symmetric, BoundaryMode::Periodic] {
            assert_eq!(mode.resolve(-7, 1), Some(0));
            assert_eq!(mode.resolve(9, 1), Some(0));
        }
        assert_eq!(BoundaryMode::Zero.resolve(-1, 1), None);
    }

    #[test]
    fn test_fill_circular_layout() {
        let x = [1.0, 2.0, 3.0];
        let mut buffer = vec![9.0; 8];
        fill_circular(&x, &mut buffer, 2, 1, BoundaryMode::Periodic);
        assert_eq!(buffer, vec![1.0, 2.0, 3.0, 1.0, 0.0, 0.0, 2.0, 3.0]);
    }

    proptest! {
        #[test]
        fn prop_resolved_index_in_range(idx in -10_000isize..10_000, len in 1usize..64) {
            for mode in [BoundaryMode::Reflect, BoundaryMode::Symmetric, BoundaryMode::Periodic] {
                let resolved = mode.resolve(idx, len);
                prop_assert!(matches!(resolved, Some(i) if i < len));
            }
        }

        #[test]
        fn prop_periodic_matches_rem_euclid(idx in -10_000isize..10_000, len in 1usize..64) {
            prop_assert_eq!(
                BoundaryMode::Periodic.resolve(idx, len),
                Some(idx.rem_euclid(len as isize) as usize)
            );
        }
    }
}
