// src/utils/mod.rs
pub mod array;
pub mod math;
pub mod simd;
