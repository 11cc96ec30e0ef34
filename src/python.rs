// src/python.rs
use numpy::{IntoPyArray, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::{PyNotImplementedError, PyValueError};
use pyo3::prelude::*;

use crate::config::CwtConfig;
use crate::error::CwtError;
use crate::scales::{ScaleSelectionConfig, ScaleSelector, ScaleSpacing};
use crate::spectral::{CwtResult, CwtTransform, InverseCwt};
use crate::utils::array::BoundaryMode;
use crate::wavelets::wavelet_from_name;

impl From<CwtError> for PyErr {
    fn from(err: CwtError) -> PyErr {
        match err {
            CwtError::Unsupported(_) => PyNotImplementedError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

fn parse_boundary(name: &str) -> PyResult<BoundaryMode> {
    BoundaryMode::from_name(name)
        .ok_or_else(|| PyValueError::new_err(format!("unknown boundary mode: {name}")))
}

/// Forward CWT. Returns `(coefficients, scales)`; coefficients are complex
/// for complex wavelets.
#[pyfunction]
#[pyo3(signature = (x, scales=None, wavelet="morlet", fs=1.0, boundary="periodic"))]
fn cwt<'py>(
    py: Python<'py>,
    x: PyReadonlyArray1<'py, f64>,
    scales: Option<PyReadonlyArray1<'py, f64>>,
    wavelet: &str,
    fs: f64,
    boundary: &str,
) -> PyResult<(PyObject, PyObject)> {
    let signal = x.as_array().to_vec();
    let wavelet = wavelet_from_name(wavelet)?;
    let config = CwtConfig::new().with_boundary(parse_boundary(boundary)?);

    let scales = match scales {
        Some(scales) => scales.as_array().to_vec(),
        None => {
            let selector = ScaleSelector::new(ScaleSelectionConfig::new().with_sampling_rate(fs))?;
            selector.select(&signal, wavelet.as_ref())?
        }
    };

    let transform = CwtTransform::new(wavelet, config)?;
    let result = py.allow_threads(|| transform.analyze(&signal, &scales))?;

    let coefficients = if result.is_complex() {
        result.complex_coefficients().into_pyarray(py).into_any().unbind()
    } else {
        result.coefficients().into_pyarray(py).into_any().unbind()
    };
    Ok((coefficients, scales.into_pyarray(py).into_any().unbind()))
}

/// Inverse CWT of real coefficients.
#[pyfunction]
#[pyo3(signature = (coefficients, scales, wavelet="morlet"))]
fn icwt<'py>(
    py: Python<'py>,
    coefficients: PyReadonlyArray2<'py, f64>,
    scales: PyReadonlyArray1<'py, f64>,
    wavelet: &str,
) -> PyResult<PyObject> {
    let result = CwtResult::real(coefficients.as_array().to_owned(), scales.as_array().to_vec())?;
    let inverse = InverseCwt::new(wavelet_from_name(wavelet)?)?;
    let signal = py.allow_threads(|| inverse.reconstruct(&result))?;
    Ok(signal.into_pyarray(py).into_any().unbind())
}

/// Automatic scale selection.
#[pyfunction]
#[pyo3(signature = (x, wavelet="morlet", fs=1.0, spacing="log", voices_per_octave=8, max_scales=200))]
fn select_scales<'py>(
    py: Python<'py>,
    x: PyReadonlyArray1<'py, f64>,
    wavelet: &str,
    fs: f64,
    spacing: &str,
    voices_per_octave: usize,
    max_scales: usize,
) -> PyResult<PyObject> {
    let spacing = ScaleSpacing::from_name(spacing)
        .ok_or_else(|| PyValueError::new_err(format!("unknown scale spacing: {spacing}")))?;
    let config = ScaleSelectionConfig::new()
        .with_sampling_rate(fs)
        .with_spacing(spacing)
        .with_voices_per_octave(voices_per_octave)
        .with_max_scales(max_scales);
    let wavelet = wavelet_from_name(wavelet)?;
    let signal = x.as_array().to_vec();
    let scales = ScaleSelector::new(config)?.select(&signal, wavelet.as_ref())?;
    Ok(scales.into_pyarray(py).into_any().unbind())
}

/// Python module entry point
#[pymodule]
fn cwt_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(cwt, m)?)?;
    m.add_function(wrap_pyfunction!(icwt, m)?)?;
    m.add_function(wrap_pyfunction!(select_scales, m)?)?;
    Ok(())
}
