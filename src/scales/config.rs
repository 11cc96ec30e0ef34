// src/scales/config.rs
use crate::error::{ensure_positive, CwtError, Result};

/// How consecutive scales are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleSpacing {
    /// Arithmetic progression.
    Linear,
    /// Geometric progression.
    #[default]
    Logarithmic,
    /// Powers of two, subdivided by the voices per octave.
    Dyadic,
    /// Uniform in Mel frequency.
    MelScale,
    /// Densified around the signal's dominant spectral peaks.
    Adaptive,
    /// Adaptive for signals of at least [`AUTO_ADAPTIVE_MIN_LEN`] samples,
    /// logarithmic otherwise.
    Auto,
}

/// Shortest signal for which [`ScaleSpacing::Auto`] picks adaptive spacing.
pub const AUTO_ADAPTIVE_MIN_LEN: usize = 256;

impl ScaleSpacing {
    /// Parses the names used by the Python binding.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "linear" | "lin" => Some(ScaleSpacing::Linear),
            "log" | "logarithmic" => Some(ScaleSpacing::Logarithmic),
            "dyadic" => Some(ScaleSpacing::Dyadic),
            "mel" | "mel_scale" => Some(ScaleSpacing::MelScale),
            "adaptive" => Some(ScaleSpacing::Adaptive),
            "auto" => Some(ScaleSpacing::Auto),
            _ => None,
        }
    }
}

/// Parameters for [`ScaleSelector`](crate::ScaleSelector).
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleSelectionConfig {
    sampling_rate: f64,
    spacing: ScaleSpacing,
    voices_per_octave: usize,
    max_scales: usize,
    frequency_range: Option<(f64, f64)>,
    critical_sampling: bool,
    peak_threshold: f64,
    energy_coverage: f64,
}

impl ScaleSelectionConfig {
    /// Defaults: unit sampling rate, logarithmic spacing, 8 voices per
    /// octave, at most 200 scales, 2% peak threshold, 90% energy coverage.
    pub fn new() -> Self {
        ScaleSelectionConfig {
            sampling_rate: 1.0,
            spacing: ScaleSpacing::Logarithmic,
            voices_per_octave: 8,
            max_scales: 200,
            frequency_range: None,
            critical_sampling: false,
            peak_threshold: 0.02,
            energy_coverage: 0.9,
        }
    }

    pub fn with_sampling_rate(mut self, sampling_rate: f64) -> Self {
        self.sampling_rate = sampling_rate;
        self
    }

    pub fn with_spacing(mut self, spacing: ScaleSpacing) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_voices_per_octave(mut self, voices: usize) -> Self {
        self.voices_per_octave = voices;
        self
    }

    pub fn with_max_scales(mut self, max_scales: usize) -> Self {
        self.max_scales = max_scales;
        self
    }

    /// Restricts the analysis to `[min_freq, max_freq]` in the units of the
    /// sampling rate. The selected scales bracket this range.
    pub fn with_frequency_range(mut self, min_freq: f64, max_freq: f64) -> Self {
        self.frequency_range = Some((min_freq, max_freq));
        self
    }

    /// Derives the scale ratio from the wavelet's Q-factor instead of the
    /// voices per octave.
    pub fn with_critical_sampling(mut self, enabled: bool) -> Self {
        self.critical_sampling = enabled;
        self
    }

    /// Relative power (to the strongest bin) a spectral peak must reach.
    pub fn with_peak_threshold(mut self, threshold: f64) -> Self {
        self.peak_threshold = threshold;
        self
    }

    /// Share of detected peak energy the kept peaks must explain.
    pub fn with_energy_coverage(mut self, coverage: f64) -> Self {
        self.energy_coverage = coverage;
        self
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn spacing(&self) -> ScaleSpacing {
        self.spacing
    }

    pub fn voices_per_octave(&self) -> usize {
        self.voices_per_octave
    }

    pub fn max_scales(&self) -> usize {
        self.max_scales
    }

    pub fn frequency_range(&self) -> Option<(f64, f64)> {
        self.frequency_range
    }

    pub fn critical_sampling(&self) -> bool {
        self.critical_sampling
    }

    pub fn peak_threshold(&self) -> f64 {
        self.peak_threshold
    }

    pub fn energy_coverage(&self) -> f64 {
        self.energy_coverage
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("sampling rate", self.sampling_rate)?;
        if self.voices_per_octave == 0 {
            return Err(CwtError::InvalidParameter(
                "voices per octave must be at least 1".to_string(),
            ));
        }
        if self.max_scales < 2 {
            return Err(CwtError::InvalidParameter(format!(
                "max scales must be at least 2, got {}",
                self.max_scales
            )));
        }
        if let Some((min, max)) = self.frequency_range {
            ensure_positive("minimum frequency", min)?;
            ensure_positive("maximum frequency", max)?;
            if min >= max {
                return Err(CwtError::InvalidRange { min, max });
            }
        }
        if !(self.peak_threshold > 0.0 && self.peak_threshold < 1.0) {
            return Err(CwtError::InvalidParameter(format!(
                "peak threshold must lie in (0, 1), got {}",
                self.peak_threshold
            )));
        }
        if !(self.energy_coverage > 0.0 && self.energy_coverage <= 1.0) {
            return Err(CwtError::InvalidParameter(format!(
                "energy coverage must lie in (0, 1], got {}",
                self.energy_coverage
            )));
        }
        Ok(())
    }
}

impl Default for ScaleSelectionConfig {
    fn default() -> Self {
        Self::new()
    }
}
