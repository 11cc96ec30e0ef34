// src/scales/mod.rs
//! Automatic scale selection.
//!
//! A [`ScaleSelector`] turns a signal, a wavelet and a
//! [`ScaleSelectionConfig`] into a strictly increasing list of positive
//! scales ready for [`CwtTransform::analyze`](crate::CwtTransform::analyze).

pub mod adaptive;
pub mod config;
pub mod range;
pub mod spacing;

use log::debug;

pub use adaptive::{adaptive_scales, detect_peaks, SpectralPeak};
pub use config::{ScaleSelectionConfig, ScaleSpacing, AUTO_ADAPTIVE_MIN_LEN};
pub use range::{
    critical_ratio, frequency_range, frequency_to_scale, scale_range, scale_to_frequency, ScaleRange,
};
pub use spacing::{dyadic_scales, linear_scales, logarithmic_scales, mel_scales};

use crate::error::{ensure_positive, validate_signal, CwtError, Result};
use crate::spectral::fft::SpectralKernel;
use crate::wavelets::ContinuousWavelet;

/// Chooses scales for a signal according to a validated configuration.
#[derive(Debug, Clone)]
pub struct ScaleSelector {
    config: ScaleSelectionConfig,
    kernel: SpectralKernel,
}

impl ScaleSelector {
    pub fn new(config: ScaleSelectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(ScaleSelector {
            config,
            kernel: SpectralKernel::new(),
        })
    }

    /// Shares an FFT plan cache with other components.
    pub fn with_spectral_kernel(mut self, kernel: SpectralKernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn config(&self) -> &ScaleSelectionConfig {
        &self.config
    }

    /// Strategy actually used for a signal of `len` samples.
    pub fn resolve_spacing(&self, len: usize) -> ScaleSpacing {
        match self.config.spacing() {
            ScaleSpacing::Auto if len >= AUTO_ADAPTIVE_MIN_LEN => ScaleSpacing::Adaptive,
            ScaleSpacing::Auto => ScaleSpacing::Logarithmic,
            other => other,
        }
    }

    /// Selects scales for `signal`.
    ///
    /// # Returns
    /// Strictly increasing positive scales, at least two and at most
    /// `max_scales` of them.
    pub fn select(&self, signal: &[f64], wavelet: &dyn ContinuousWavelet) -> Result<Vec<f64>> {
        validate_signal(signal)?;
        let range = scale_range(wavelet, signal.len(), &self.config)?;
        let spacing = self.resolve_spacing(signal.len());
        debug!(
            "selecting scales for {} samples: {:?} over [{:.4}, {:.4}]",
            signal.len(),
            spacing,
            range.min,
            range.max
        );

        let count = range::scale_count(range, wavelet, &self.config);
        let mut scales = match spacing {
            ScaleSpacing::Linear => linear_scales(range, count),
            ScaleSpacing::Logarithmic | ScaleSpacing::Auto => logarithmic_scales(range, count),
            ScaleSpacing::Dyadic => self.dyadic(range),
            ScaleSpacing::MelScale => mel_scales(
                range,
                count,
                wavelet.center_frequency(),
                self.config.sampling_rate(),
            ),
            ScaleSpacing::Adaptive => {
                adaptive_scales(signal, wavelet, &self.config, range, &self.kernel)?
            }
        };
        spacing::sort_dedup(&mut scales, 0.0);

        if scales.len() < 2 {
            return Err(CwtError::InvalidParameter(format!(
                "scale selection produced {} scale(s)",
                scales.len()
            )));
        }
        Ok(scales)
    }

    /// Dyadic grid, thinning voices until it fits `max_scales`.
    fn dyadic(&self, range: ScaleRange) -> Vec<f64> {
        let mut voices = self.config.voices_per_octave();
        loop {
            let scales = dyadic_scales(range, voices);
            if scales.len() <= self.config.max_scales() || voices == 1 {
                return scales;
            }
            voices /= 2;
        }
    }
}

/// Selects scales for `signal` with an explicit configuration.
pub fn select_scales(
    signal: &[f64],
    wavelet: &dyn ContinuousWavelet,
    config: &ScaleSelectionConfig,
) -> Result<Vec<f64>> {
    ScaleSelector::new(config.clone())?.select(signal, wavelet)
}

/// Selects scales with default settings at the given sampling rate.
pub fn select_scales_for_rate(
    signal: &[f64],
    wavelet: &dyn ContinuousWavelet,
    sampling_rate: f64,
) -> Result<Vec<f64>> {
    ensure_positive("sampling rate", sampling_rate)?;
    let config = ScaleSelectionConfig::new().with_sampling_rate(sampling_rate);
    select_scales(signal, wavelet, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelets::{DerivativeOfGaussian, Morlet, Paul};
    use proptest::prelude::*;
    use std::f64::consts::PI;

    const SPACINGS: [ScaleSpacing; 6] = [
        ScaleSpacing::Linear,
        ScaleSpacing::Logarithmic,
        ScaleSpacing::Dyadic,
        ScaleSpacing::MelScale,
        ScaleSpacing::Adaptive,
        ScaleSpacing::Auto,
    ];

    fn tone(n: usize, freq: f64, fs: f64) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / fs).sin()).collect()
    }

    #[test]
    fn test_auto_resolution() {
        let selector = ScaleSelector::new(ScaleSelectionConfig::new().with_spacing(ScaleSpacing::Auto)).unwrap();
        assert_eq!(selector.resolve_spacing(255), ScaleSpacing::Logarithmic);
        assert_eq!(selector.resolve_spacing(256), ScaleSpacing::Adaptive);
    }

    #[test]
    fn test_frequency_range_is_bracketed() {
        let fs = 1000.0;
        let wavelet = Morlet::default();
        let config = ScaleSelectionConfig::new()
            .with_sampling_rate(fs)
            .with_frequency_range(10.0, 100.0);
        let scales = select_scales(&tone(512, 40.0, fs), &wavelet, &config).unwrap();
        let (f_lo, f_hi) = frequency_range(&scales, &wavelet, fs).unwrap();
        assert!((f_lo - 10.0).abs() < 1e-9);
        assert!((f_hi - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_critical_sampling_uses_fewer_scales() {
        let wavelet = Morlet::default();
        let signal = tone(1024, 5.0, 100.0);
        let dense = select_scales(&signal, &wavelet, &ScaleSelectionConfig::new()).unwrap();
        let sparse = select_scales(
            &signal,
            &wavelet,
            &ScaleSelectionConfig::new().with_critical_sampling(true),
        )
        .unwrap();
        assert!(sparse.len() < dense.len());
    }

    #[test]
    fn test_max_scales_is_respected() {
        let config = ScaleSelectionConfig::new().with_voices_per_octave(64).with_max_scales(20);
        for spacing in SPACINGS {
            let scales = select_scales(&tone(2048, 3.0, 100.0), &Morlet::default(), &config.clone().with_spacing(spacing)).unwrap();
            assert!(scales.len() <= 20, "{spacing:?} produced {}", scales.len());
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        let wavelet = Morlet::default();
        assert_eq!(
            select_scales_for_rate(&[], &wavelet, 1.0),
            Err(CwtError::EmptyInput("signal"))
        );
        assert!(select_scales_for_rate(&[1.0, f64::NAN], &wavelet, 1.0).is_err());
        assert!(select_scales_for_rate(&[1.0; 64], &wavelet, 0.0).is_err());
    }

    proptest! {
        #[test]
        fn prop_scales_positive_and_ascending(
            len in 16usize..600,
            spacing_index in 0usize..6,
            family in 0usize..3,
            freq in 0.01f64..0.4,
        ) {
            let wavelet: Box<dyn ContinuousWavelet> = match family {
                0 => Box::new(Morlet::default()),
                1 => Box::new(DerivativeOfGaussian::mexican_hat()),
                _ => Box::new(Paul::default()),
            };
            let config = ScaleSelectionConfig::new().with_spacing(SPACINGS[spacing_index]);
            let scales = select_scales(&tone(len, freq, 1.0), wavelet.as_ref(), &config).unwrap();
            prop_assert!(scales.len() >= 2);
            prop_assert!(scales.len() <= config.max_scales());
            prop_assert!(scales.iter().all(|s| s.is_finite() && *s > 0.0));
            prop_assert!(scales.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
