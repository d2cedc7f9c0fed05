//! Numeric tower
//!
//! A Number is one of three representations: 64-bit signed integer, 64-bit
//! float, or Cartesian complex. Arithmetic dispatches pairwise on the operand
//! tags: Int stays Int (wrapping on overflow), Int mixes with Float to Float,
//! and anything touching Complex is lifted to Complex. A complex with zero
//! imaginary part collapses to its real form at construction.

use std::fmt;
use std::hash::{Hash, Hasher};

use num_complex::Complex64;
use num_traits::Zero;

use crate::error::{Error, Result};

// ============================================================================
// Number
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// 64-bit signed integer; arithmetic wraps two's-complement on overflow
    Int(i64),

    /// IEEE 754 double precision floating point
    Float(f64),

    /// Cartesian complex of two doubles; imaginary part is never zero
    Complex(Complex64),
}

impl Number {
    /// Canonicalizing constructor: a zero imaginary part collapses the
    /// value to its real form.
    pub fn complex(re: f64, im: f64) -> Number {
        if im == 0.0 {
            Number::Float(re)
        } else {
            Number::Complex(Complex64::new(re, im))
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Number::Complex(_))
    }

    /// True for Int, for a finite Float equal to its truncation, and for a
    /// Complex whose imaginary part is zero and whose real part passes the
    /// Float rule.
    pub fn is_integer(&self) -> bool {
        match self {
            Number::Int(_) => true,
            Number::Float(x) => x.is_finite() && x.trunc() == *x,
            Number::Complex(z) => z.im == 0.0 && z.re.is_finite() && z.re.trunc() == z.re,
        }
    }

    pub fn is_odd(&self) -> Result<bool> {
        if !self.is_integer() {
            return Err(Error::mismatch("integer", self));
        }
        Ok(match self {
            Number::Int(n) => n % 2 != 0,
            Number::Float(x) => x % 2.0 != 0.0,
            Number::Complex(z) => z.re % 2.0 != 0.0,
        })
    }

    pub fn is_even(&self) -> Result<bool> {
        Ok(!self.is_odd()?)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(n) => *n == 0,
            Number::Float(x) => *x == 0.0,
            Number::Complex(z) => z.is_zero(),
        }
    }

    pub fn is_positive(&self) -> Result<bool> {
        Number::Int(0).lt(self)
    }

    pub fn is_negative(&self) -> Result<bool> {
        self.lt(&Number::Int(0))
    }

    /// The value as a double. A Complex converts to its magnitude.
    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Int(n) => *n as f64,
            Number::Float(x) => *x,
            Number::Complex(z) => z.norm(),
        }
    }

    /// Lift the value onto the complex plane.
    pub fn to_complex(&self) -> Complex64 {
        match self {
            Number::Int(n) => Complex64::new(*n as f64, 0.0),
            Number::Float(x) => Complex64::new(*x, 0.0),
            Number::Complex(z) => *z,
        }
    }

    /// Real part as a double, or None for a Complex.
    fn real(&self) -> Option<f64> {
        match self {
            Number::Int(n) => Some(*n as f64),
            Number::Float(x) => Some(*x),
            Number::Complex(_) => None,
        }
    }

    /// Representation-level equality: same tag and equal components. This is
    /// the `eqv?` notion; `==` is total numeric equality.
    pub fn eq_repr(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b,
            (Number::Complex(a), Number::Complex(b)) => a.re == b.re && a.im == b.im,
            _ => false,
        }
    }

    /// Force the inexact representation: an Int becomes the equal Float.
    pub fn inexact(&self) -> Number {
        match self {
            Number::Int(n) => Number::Float(*n as f64),
            other => *other,
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Number {
        Number::Int(n)
    }
}

impl From<f64> for Number {
    fn from(x: f64) -> Number {
        Number::Float(x)
    }
}

impl From<Complex64> for Number {
    fn from(z: Complex64) -> Number {
        Number::complex(z.re, z.im)
    }
}

// ============================================================================
// Equality and Hashing
// ============================================================================

// Total numeric equality under promotion: Int lifts to Float, anything
// lifts to Complex. IEEE comparison for the float parts, so -0.0 == 0.0
// and NaN is unequal to itself.
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        use Number::*;

        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => (*a as f64) == *b,
            (Float(a), Float(b)) => a == b,
            _ => self.to_complex() == other.to_complex(),
        }
    }
}

impl Eq for Number {}

fn hash_real<H: Hasher>(x: f64, state: &mut H) {
    // Integral values hash as i64 so Int(1), Float(1.0) and a collapsed
    // 1+0i all land in the same bucket.
    if (x as i64) as f64 == x {
        0u8.hash(state);
        (x as i64).hash(state);
    } else if x.is_nan() {
        1u8.hash(state);
        u64::MAX.hash(state);
    } else {
        1u8.hash(state);
        x.to_bits().hash(state);
    }
}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Number::Int(n) => {
                0u8.hash(state);
                n.hash(state);
            }
            Number::Float(x) => hash_real(*x, state),
            Number::Complex(z) => {
                if z.im == 0.0 {
                    hash_real(z.re, state);
                } else {
                    2u8.hash(state);
                    z.re.to_bits().hash(state);
                    z.im.to_bits().hash(state);
                }
            }
        }
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

impl Number {
    pub fn add(&self, other: &Number) -> Number {
        use Number::*;

        match (self, other) {
            (Int(a), Int(b)) => Int(a.wrapping_add(*b)),
            (Int(a), Float(b)) => Float(*a as f64 + b),
            (Float(a), Int(b)) => Float(a + *b as f64),
            (Float(a), Float(b)) => Float(a + b),
            _ => Number::from(self.to_complex() + other.to_complex()),
        }
    }

    pub fn sub(&self, other: &Number) -> Number {
        use Number::*;

        match (self, other) {
            (Int(a), Int(b)) => Int(a.wrapping_sub(*b)),
            (Int(a), Float(b)) => Float(*a as f64 - b),
            (Float(a), Int(b)) => Float(a - *b as f64),
            (Float(a), Float(b)) => Float(a - b),
            _ => Number::from(self.to_complex() - other.to_complex()),
        }
    }

    pub fn mul(&self, other: &Number) -> Number {
        use Number::*;

        match (self, other) {
            (Int(a), Int(b)) => Int(a.wrapping_mul(*b)),
            (Int(a), Float(b)) => Float(*a as f64 * b),
            (Float(a), Int(b)) => Float(a * *b as f64),
            (Float(a), Float(b)) => Float(a * b),
            _ => Number::from(self.to_complex() * other.to_complex()),
        }
    }

    /// Division. Dividing by exact zero is an error; float division by zero
    /// yields IEEE infinities or NaN.
    pub fn div(&self, other: &Number) -> Result<Number> {
        use Number::*;

        if matches!(other, Int(0)) {
            return Err(Error::Arithmetic("division by zero"));
        }
        Ok(match (self, other) {
            (Int(a), Int(b)) => Int(a.wrapping_div(*b)),
            (Int(a), Float(b)) => Float(*a as f64 / b),
            (Float(a), Int(b)) => Float(a / *b as f64),
            (Float(a), Float(b)) => Float(a / b),
            _ => Number::from(self.to_complex() / other.to_complex()),
        })
    }

    pub fn neg(&self) -> Number {
        match self {
            Number::Int(n) => Number::Int(n.wrapping_neg()),
            Number::Float(x) => Number::Float(-x),
            Number::Complex(z) => Number::Complex(-z),
        }
    }

    /// Reciprocal.
    pub fn inv(&self) -> Result<Number> {
        Number::Int(1).div(self)
    }

    /// Truncated-division remainder; the sign follows the dividend.
    pub fn rem(&self, other: &Number) -> Result<Number> {
        use Number::*;

        match (self, other) {
            (_, Int(0)) => Err(Error::Arithmetic("division by zero")),
            (Int(a), Int(b)) => Ok(Int(a.wrapping_rem(*b))),
            (Complex(_), _) => Err(Error::mismatch("real number", self)),
            (_, Complex(_)) => Err(Error::mismatch("real number", other)),
            _ => Ok(Float(self.to_f64() % other.to_f64())),
        }
    }

    /// Truncated-division quotient.
    pub fn quotient(&self, other: &Number) -> Result<Number> {
        use Number::*;

        match (self, other) {
            (_, Int(0)) => Err(Error::Arithmetic("division by zero")),
            (Int(a), Int(b)) => Ok(Int(a.wrapping_div(*b))),
            (Complex(_), _) => Err(Error::mismatch("real number", self)),
            (_, Complex(_)) => Err(Error::mismatch("real number", other)),
            _ => Ok(Float((self.to_f64() / other.to_f64()).trunc())),
        }
    }
}

// ============================================================================
// Comparisons
// ============================================================================

impl Number {
    fn cmp_real(&self, other: &Number) -> Result<(f64, f64)> {
        let a = self.real().ok_or_else(|| Error::mismatch("real number", self))?;
        let b = other
            .real()
            .ok_or_else(|| Error::mismatch("real number", other))?;
        Ok((a, b))
    }

    pub fn lt(&self, other: &Number) -> Result<bool> {
        if let (Number::Int(a), Number::Int(b)) = (self, other) {
            return Ok(a < b);
        }
        let (a, b) = self.cmp_real(other)?;
        Ok(a < b)
    }

    pub fn le(&self, other: &Number) -> Result<bool> {
        if let (Number::Int(a), Number::Int(b)) = (self, other) {
            return Ok(a <= b);
        }
        let (a, b) = self.cmp_real(other)?;
        Ok(a <= b)
    }

    pub fn gt(&self, other: &Number) -> Result<bool> {
        other.lt(self)
    }

    pub fn ge(&self, other: &Number) -> Result<bool> {
        other.le(self)
    }

    pub fn min(&self, other: &Number) -> Result<Number> {
        Ok(if other.lt(self)? { *other } else { *self })
    }

    pub fn max(&self, other: &Number) -> Result<Number> {
        Ok(if self.lt(other)? { *other } else { *self })
    }
}

// ============================================================================
// Rounding
// ============================================================================

fn collapse_integral(x: f64) -> Number {
    if (x as i64) as f64 == x {
        Number::Int(x as i64)
    } else {
        Number::Float(x)
    }
}

impl Number {
    /// Truncate toward zero. A Float in i64 range collapses to Int; this is
    /// the `#e` reader path.
    pub fn trunc(&self) -> Number {
        match self {
            Number::Int(n) => Number::Int(*n),
            Number::Float(x) => collapse_integral(x.trunc()),
            Number::Complex(z) => match Number::complex(z.re.trunc(), z.im.trunc()) {
                Number::Float(x) => collapse_integral(x),
                other => other,
            },
        }
    }

    pub fn floor(&self) -> Result<Number> {
        match self {
            Number::Int(n) => Ok(Number::Int(*n)),
            Number::Float(x) => Ok(Number::Float(x.floor())),
            Number::Complex(_) => Err(Error::mismatch("real number", self)),
        }
    }

    pub fn ceil(&self) -> Result<Number> {
        match self {
            Number::Int(n) => Ok(Number::Int(*n)),
            Number::Float(x) => Ok(Number::Float(x.ceil())),
            Number::Complex(_) => Err(Error::mismatch("real number", self)),
        }
    }

    pub fn round(&self) -> Result<Number> {
        match self {
            Number::Int(n) => Ok(Number::Int(*n)),
            Number::Float(x) => Ok(Number::Float(x.round())),
            Number::Complex(_) => Err(Error::mismatch("real number", self)),
        }
    }
}

// ============================================================================
// Transcendental functions
//
// Real operands stay on the Float leg; a Complex operand, or a real operand
// outside the real domain of the function, moves to the Complex leg.
// ============================================================================

impl Number {
    pub fn sin(&self) -> Number {
        match self {
            Number::Complex(z) => Number::from(z.sin()),
            _ => Number::Float(self.to_f64().sin()),
        }
    }

    pub fn cos(&self) -> Number {
        match self {
            Number::Complex(z) => Number::from(z.cos()),
            _ => Number::Float(self.to_f64().cos()),
        }
    }

    pub fn tan(&self) -> Number {
        match self {
            Number::Complex(z) => Number::from(z.tan()),
            _ => Number::Float(self.to_f64().tan()),
        }
    }

    pub fn atan(&self) -> Number {
        match self {
            Number::Complex(z) => Number::from(z.atan()),
            _ => Number::Float(self.to_f64().atan()),
        }
    }

    pub fn sinh(&self) -> Number {
        match self {
            Number::Complex(z) => Number::from(z.sinh()),
            _ => Number::Float(self.to_f64().sinh()),
        }
    }

    pub fn cosh(&self) -> Number {
        match self {
            Number::Complex(z) => Number::from(z.cosh()),
            _ => Number::Float(self.to_f64().cosh()),
        }
    }

    pub fn tanh(&self) -> Number {
        match self {
            Number::Complex(z) => Number::from(z.tanh()),
            _ => Number::Float(self.to_f64().tanh()),
        }
    }

    pub fn asinh(&self) -> Number {
        match self {
            Number::Complex(z) => Number::from(z.asinh()),
            _ => Number::Float(self.to_f64().asinh()),
        }
    }

    pub fn exp(&self) -> Number {
        match self {
            Number::Complex(z) => Number::from(z.exp()),
            _ => Number::Float(self.to_f64().exp()),
        }
    }

    pub fn cbrt(&self) -> Number {
        match self {
            Number::Complex(z) => Number::from(z.cbrt()),
            _ => Number::Float(self.to_f64().cbrt()),
        }
    }

    pub fn sqrt(&self) -> Number {
        match self.real() {
            Some(x) if x >= 0.0 => Number::Float(x.sqrt()),
            _ => Number::from(self.to_complex().sqrt()),
        }
    }

    pub fn log(&self) -> Number {
        match self.real() {
            Some(x) if x >= 0.0 => Number::Float(x.ln()),
            _ => Number::from(self.to_complex().ln()),
        }
    }

    pub fn log10(&self) -> Number {
        match self.real() {
            Some(x) if x >= 0.0 => Number::Float(x.log10()),
            _ => Number::from(self.to_complex().log(10.0)),
        }
    }

    pub fn asin(&self) -> Number {
        match self.real() {
            Some(x) if (-1.0..=1.0).contains(&x) => Number::Float(x.asin()),
            _ => Number::from(self.to_complex().asin()),
        }
    }

    pub fn acos(&self) -> Number {
        match self.real() {
            Some(x) if (-1.0..=1.0).contains(&x) => Number::Float(x.acos()),
            _ => Number::from(self.to_complex().acos()),
        }
    }

    pub fn acosh(&self) -> Number {
        match self.real() {
            Some(x) if x >= 1.0 => Number::Float(x.acosh()),
            _ => Number::from(self.to_complex().acosh()),
        }
    }

    pub fn atanh(&self) -> Number {
        match self.real() {
            Some(x) if (-1.0..=1.0).contains(&x) => Number::Float(x.atanh()),
            _ => Number::from(self.to_complex().atanh()),
        }
    }

    pub fn pow(&self, other: &Number) -> Number {
        match (self.real(), other.real()) {
            (Some(x), Some(y)) => {
                if x < 0.0 && y.fract() != 0.0 {
                    Number::from(Complex64::new(x, 0.0).powf(y))
                } else {
                    Number::Float(x.powf(y))
                }
            }
            _ => Number::from(self.to_complex().powc(other.to_complex())),
        }
    }

    pub fn square(&self) -> Number {
        self.mul(self)
    }
}

// ============================================================================
// Complex algebra
// ============================================================================

impl Number {
    /// Magnitude; for a Complex this is its modulus as Float.
    pub fn abs(&self) -> Number {
        match self {
            Number::Int(n) => Number::Int(n.wrapping_abs()),
            Number::Float(x) => Number::Float(x.abs()),
            Number::Complex(z) => Number::Float(z.norm()),
        }
    }

    pub fn real_part(&self) -> Number {
        match self {
            Number::Complex(z) => Number::Float(z.re),
            other => *other,
        }
    }

    pub fn imag_part(&self) -> Number {
        match self {
            Number::Int(_) => Number::Int(0),
            Number::Float(_) => Number::Float(0.0),
            Number::Complex(z) => Number::Float(z.im),
        }
    }

    pub fn arg(&self) -> Number {
        match self {
            Number::Complex(z) => Number::Float(z.arg()),
            _ => Number::Float(0.0f64.atan2(self.to_f64())),
        }
    }

    pub fn conj(&self) -> Number {
        match self {
            Number::Complex(z) => Number::Complex(z.conj()),
            other => *other,
        }
    }

    /// Build a number from Cartesian parts; both must be real.
    pub fn rect(re: &Number, im: &Number) -> Result<Number> {
        let x = re.real().ok_or_else(|| Error::mismatch("real number", re))?;
        let y = im.real().ok_or_else(|| Error::mismatch("real number", im))?;
        Ok(Number::complex(x, y))
    }

    /// Build a number from polar parts; both must be real.
    pub fn polar(r: &Number, theta: &Number) -> Result<Number> {
        let r = r.real().ok_or_else(|| Error::mismatch("real number", r))?;
        let t = theta
            .real()
            .ok_or_else(|| Error::mismatch("real number", theta))?;
        Ok(Number::from(Complex64::from_polar(r, t)))
    }

    /// sqrt(x² + y²), defined through the tower so complex operands work.
    pub fn hypot(&self, other: &Number) -> Number {
        self.square().add(&other.square()).sqrt()
    }
}

// ============================================================================
// Display
// ============================================================================

fn fmt_complex(f: &mut fmt::Formatter<'_>, z: &Complex64) -> fmt::Result {
    let (re, im) = (z.re, z.im);

    if im == 0.0 {
        write!(f, "{re:e}")
    } else if re == 0.0 && im == 1.0 {
        write!(f, "i")
    } else if re == 0.0 && im == -1.0 {
        write!(f, "-i")
    } else if im == 1.0 {
        write!(f, "{re:e}+i")
    } else if im == -1.0 {
        write!(f, "{re:e}-i")
    } else if im < 0.0 {
        write!(f, "{re:e}-{:e}i", -im)
    } else {
        write!(f, "{re:e}+{im:e}i")
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(x) => write!(f, "{x:e}"),
            Number::Complex(z) => fmt_complex(f, z),
        }
    }
}
