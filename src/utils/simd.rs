// src/utils/simd.rs
//! Lane-parallel element-wise kernels built on `wide`.
//!
//! Each kernel processes four lanes at a time and finishes the tail with the
//! scalar expression, so results match a plain loop bit for bit.

use num_complex::Complex64;
use wide::f64x4;

const LANES: usize = 4;

#[inline]
fn load(values: &[f64], start: usize) -> f64x4 {
    f64x4::from([
        values[start],
        values[start + 1],
        values[start + 2],
        values[start + 3],
    ])
}

/// `sqrt(re² + im²)` element-wise.
pub fn magnitude(re: &[f64], im: &[f64]) -> Vec<f64> {
    debug_assert_eq!(re.len(), im.len());
    let n = re.len();
    let mut out = Vec::with_capacity(n);
    let main = n - n % LANES;

    for start in (0..main).step_by(LANES) {
        let r = load(re, start);
        let i = load(im, start);
        out.extend_from_slice(&(r * r + i * i).sqrt().to_array());
    }
    for k in main..n {
        out.push((re[k] * re[k] + im[k] * im[k]).sqrt());
    }
    out
}

/// `re² + im²` element-wise.
pub fn power(re: &[f64], im: &[f64]) -> Vec<f64> {
    debug_assert_eq!(re.len(), im.len());
    let n = re.len();
    let mut out = Vec::with_capacity(n);
    let main = n - n % LANES;

    for start in (0..main).step_by(LANES) {
        let r = load(re, start);
        let i = load(im, start);
        out.extend_from_slice(&(r * r + i * i).to_array());
    }
    for k in main..n {
        out.push(re[k] * re[k] + im[k] * im[k]);
    }
    out
}

/// `x²` element-wise.
pub fn square(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut out = Vec::with_capacity(n);
    let main = n - n % LANES;

    for start in (0..main).step_by(LANES) {
        let v = load(values, start);
        out.extend_from_slice(&(v * v).to_array());
    }
    for k in main..n {
        out.push(values[k] * values[k]);
    }
    out
}

/// `acc[k] *= conj(kernel[k])`.
pub fn mul_conj_in_place(acc: &mut [Complex64], kernel: &[Complex64]) {
    debug_assert_eq!(acc.len(), kernel.len());
    let n = acc.len();
    let main = n - n % LANES;

    for start in (0..main).step_by(LANES) {
        let a = &acc[start..start + LANES];
        let b = &kernel[start..start + LANES];
        let ar = f64x4::from([a[0].re, a[1].re, a[2].re, a[3].re]);
        let ai = f64x4::from([a[0].im, a[1].im, a[2].im, a[3].im]);
        let br = f64x4::from([b[0].re, b[1].re, b[2].re, b[3].re]);
        let bi = f64x4::from([b[0].im, b[1].im, b[2].im, b[3].im]);

        let re = (ar * br + ai * bi).to_array();
        let im = (ai * br - ar * bi).to_array();
        for lane in 0..LANES {
            acc[start + lane] = Complex64::new(re[lane], im[lane]);
        }
    }
    for k in main..n {
        let (a, b) = (acc[k], kernel[k]);
        acc[k] = Complex64::new(a.re * b.re + a.im * b.im, a.im * b.re - a.re * b.im);
    }
}

/// `acc[k] += weight * values[k]`.
pub fn axpy(acc: &mut [f64], weight: f64, values: &[f64]) {
    debug_assert_eq!(acc.len(), values.len());
    let n = acc.len();
    let main = n - n % LANES;
    let w = f64x4::splat(weight);

    for start in (0..main).step_by(LANES) {
        let sum = load(acc, start) + w * load(values, start);
        acc[start..start + LANES].copy_from_slice(&sum.to_array());
    }
    for k in main..n {
        acc[k] += weight * values[k];
    }
}
