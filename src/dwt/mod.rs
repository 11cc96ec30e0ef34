// src/dwt/mod.rs
//! Orthogonal discrete transforms used as reconstruction aids.

pub mod filter;
pub mod modwt;
pub mod transform;

pub use filter::WaveletFilter;
pub use modwt::{imodwt, modwt, ModwtCoeffs};
pub use transform::{dwt_multilevel, idwt_multilevel, DwtCoeffs};
