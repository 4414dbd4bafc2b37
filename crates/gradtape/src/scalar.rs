//! Scalar trait for tensor element types.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Trait for scalar types supported by gradtape.
///
/// Bundles the arithmetic and the handful of transcendental functions the
/// built-in forward ops and gradient rules need. Implemented for `f32` and
/// `f64`.
pub trait Scalar:
    Copy
    + Debug
    + Default
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Returns the additive identity (zero).
    fn zero() -> Self {
        Self::default()
    }

    /// Returns the multiplicative identity (one).
    fn one() -> Self;

    /// e^x.
    fn exp(self) -> Self;

    /// Square root.
    fn sqrt(self) -> Self;

    /// ln(1 + x), computed accurately for small x.
    fn ln_1p(self) -> Self;

    /// Convert from f64 (used for seeding and numeric comparisons).
    fn from_f64(v: f64) -> Self;

    /// Convert to f64.
    fn to_f64(self) -> f64;
}

impl Scalar for f64 {
    fn one() -> Self {
        1.0
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn ln_1p(self) -> Self {
        f64::ln_1p(self)
    }

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl Scalar for f32 {
    fn one() -> Self {
        1.0
    }

    fn exp(self) -> Self {
        f32::exp(self)
    }

    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    fn ln_1p(self) -> Self {
        f32::ln_1p(self)
    }

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}
