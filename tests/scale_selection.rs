// tests/scale_selection.rs
use std::f64::consts::PI;

use cwt_rs::{
    frequency_range, select_scales, select_scales_for_rate, ComplexMorlet, Morlet, Paul, ScaleSelectionConfig,
    ScaleSelector, ScaleSpacing, Shannon,
};
use proptest::prelude::*;

fn tone(n: usize, freq: f64, fs: f64) -> Vec<f64> {
    (0..n).map(|i| (2.0 * PI * freq * i as f64 / fs).sin()).collect()
}

#[test]
fn rate_based_selection_covers_the_tone() {
    let fs = 500.0;
    let wavelet = Morlet::default();
    let scales = select_scales_for_rate(&tone(1000, 25.0, fs), &wavelet, fs).unwrap();
    let (f_lo, f_hi) = frequency_range(&scales, &wavelet, fs).unwrap();
    assert!(f_lo < 25.0 && 25.0 < f_hi);
}

#[test]
fn adaptive_grid_is_denser_than_logarithmic_near_the_peak() {
    let fs = 1000.0;
    let signal = tone(2048, 40.0, fs);
    let wavelet = ComplexMorlet::new(1.0, 1.0).unwrap();
    let base = ScaleSelectionConfig::new().with_sampling_rate(fs);
    let log = select_scales(&signal, &wavelet, &base.clone().with_spacing(ScaleSpacing::Logarithmic)).unwrap();
    let adaptive = select_scales(&signal, &wavelet, &base.with_spacing(ScaleSpacing::Adaptive)).unwrap();

    let peak_scale = 1000.0 / 40.0;
    let near = |scales: &[f64]| scales.iter().filter(|&&s| (s / peak_scale).ln().abs() < 0.3).count();
    assert!(near(&adaptive) > near(&log));
}

#[test]
fn dyadic_scales_are_powers_of_two_subdivisions() {
    let config = ScaleSelectionConfig::new()
        .with_spacing(ScaleSpacing::Dyadic)
        .with_voices_per_octave(2);
    let scales = select_scales(&tone(512, 0.05, 1.0), &Paul::default(), &config).unwrap();
    for s in scales {
        let v = 2.0 * s.log2();
        assert!((v - v.round()).abs() < 1e-9, "{s} is not on the half-octave grid");
    }
}

#[test]
fn selector_is_reusable_across_signals() {
    let selector = ScaleSelector::new(ScaleSelectionConfig::new().with_spacing(ScaleSpacing::MelScale)).unwrap();
    let wavelet = Shannon::new(1.0, 1.5).unwrap();
    let a = selector.select(&tone(400, 0.1, 1.0), &wavelet).unwrap();
    let b = selector.select(&tone(400, 0.3, 1.0), &wavelet).unwrap();
    // Mel spacing depends only on the length
    assert_eq!(a, b);
}

#[test]
fn invalid_configuration_is_rejected() {
    assert!(ScaleSelector::new(ScaleSelectionConfig::new().with_voices_per_octave(0)).is_err());
    assert!(ScaleSelector::new(ScaleSelectionConfig::new().with_frequency_range(50.0, 10.0)).is_err());
    assert!(ScaleSelector::new(ScaleSelectionConfig::new().with_sampling_rate(-1.0)).is_err());
}

proptest! {
    #[test]
    fn explicit_frequency_range_round_trips(
        low in 1.0f64..50.0,
        width in 1.5f64..20.0,
        fs in 200.0f64..2000.0,
    ) {
        let high = (low * width).min(fs / 2.0 - 1.0);
        prop_assume!(high > low);
        let wavelet = Morlet::default();
        let config = ScaleSelectionConfig::new().with_sampling_rate(fs).with_frequency_range(low, high);
        let scales = select_scales(&tone(256, low, fs), &wavelet, &config).unwrap();
        let (f_lo, f_hi) = frequency_range(&scales, &wavelet, fs).unwrap();
        prop_assert!((f_lo - low).abs() <= 1e-9 * low);
        prop_assert!((f_hi - high).abs() <= 1e-9 * high);
    }
}
