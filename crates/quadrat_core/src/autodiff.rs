use num_traits::{Float, FromPrimitive, Num, NumCast, One, ToPrimitive, Zero};
use std::num::FpCategory;
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

/// Forward-mode dual number: `val` carries the value, `eps` the derivative.
///
/// Implementing `num_traits::Float` lets any `VectorField<Dual>` be evaluated
/// with a unit perturbation in one coordinate, yielding one column of the
/// Jacobian exactly (no finite-difference truncation error).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Dual {
    pub val: f64,
    pub eps: f64,
}

impl Dual {
    pub fn new(val: f64, eps: f64) -> Self {
        Self { val, eps }
    }

    /// A constant: zero derivative.
    pub fn constant(val: f64) -> Self {
        Self { val, eps: 0.0 }
    }

    /// The differentiation variable: unit derivative.
    pub fn variable(val: f64) -> Self {
        Self { val, eps: 1.0 }
    }
}

impl Add for Dual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.val + rhs.val, self.eps + rhs.eps)
    }
}

impl Sub for Dual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.val - rhs.val, self.eps - rhs.eps)
    }
}

impl Mul for Dual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.val * rhs.val, self.val * rhs.eps + self.eps * rhs.val)
    }
}

impl Div for Dual {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        Self::new(
            self.val / rhs.val,
            (self.eps * rhs.val - self.val * rhs.eps) / (rhs.val * rhs.val),
        )
    }
}

impl Neg for Dual {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.val, -self.eps)
    }
}

impl Rem for Dual {
    type Output = Self;
    fn rem(self, rhs: Self) -> Self {
        // Piecewise constant shift; the derivative passes through.
        Self::new(self.val % rhs.val, self.eps)
    }
}

impl AddAssign for Dual {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl SubAssign for Dual {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl MulAssign for Dual {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}
impl DivAssign for Dual {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}
impl RemAssign for Dual {
    fn rem_assign(&mut self, rhs: Self) {
        *self = *self % rhs;
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Self::constant(0.0)
    }
    fn is_zero(&self) -> bool {
        self.val == 0.0 && self.eps == 0.0
    }
}

impl One for Dual {
    fn one() -> Self {
        Self::constant(1.0)
    }
}

impl Num for Dual {
    type FromStrRadixErr = ();
    fn from_str_radix(str: &str, radix: u32) -> Result<Self, Self::FromStrRadixErr> {
        f64::from_str_radix(str, radix)
            .map(Self::constant)
            .map_err(|_| ())
    }
}

impl ToPrimitive for Dual {
    fn to_i64(&self) -> Option<i64> {
        self.val.to_i64()
    }
    fn to_u64(&self) -> Option<u64> {
        self.val.to_u64()
    }
    fn to_f64(&self) -> Option<f64> {
        Some(self.val)
    }
}

impl FromPrimitive for Dual {
    fn from_i64(n: i64) -> Option<Self> {
        Some(Self::constant(n as f64))
    }
    fn from_u64(n: u64) -> Option<Self> {
        Some(Self::constant(n as f64))
    }
    fn from_f64(n: f64) -> Option<Self> {
        Some(Self::constant(n))
    }
}

impl NumCast for Dual {
    fn from<T: ToPrimitive>(n: T) -> Option<Self> {
        n.to_f64().map(Self::constant)
    }
}

/// Methods with no sensible dual-number rule in this crate's domain.
macro_rules! dual_unsupported {
    ($($name:ident),* $(,)?) => {
        $(
            fn $name(self) -> Self {
                unimplemented!(concat!("Dual::", stringify!($name)))
            }
        )*
    };
}

impl Float for Dual {
    fn nan() -> Self {
        Self::constant(f64::NAN)
    }
    fn infinity() -> Self {
        Self::constant(f64::INFINITY)
    }
    fn neg_infinity() -> Self {
        Self::constant(f64::NEG_INFINITY)
    }
    fn neg_zero() -> Self {
        Self::constant(-0.0)
    }
    fn min_value() -> Self {
        Self::constant(f64::MIN)
    }
    fn min_positive_value() -> Self {
        Self::constant(f64::MIN_POSITIVE)
    }
    fn max_value() -> Self {
        Self::constant(f64::MAX)
    }

    fn is_nan(self) -> bool {
        self.val.is_nan()
    }
    fn is_infinite(self) -> bool {
        self.val.is_infinite()
    }
    fn is_finite(self) -> bool {
        self.val.is_finite()
    }
    fn is_normal(self) -> bool {
        self.val.is_normal()
    }
    fn classify(self) -> FpCategory {
        self.val.classify()
    }
    fn is_sign_positive(self) -> bool {
        self.val.is_sign_positive()
    }
    fn is_sign_negative(self) -> bool {
        self.val.is_sign_negative()
    }
    fn integer_decode(self) -> (u64, i16, i8) {
        self.val.integer_decode()
    }

    fn floor(self) -> Self {
        Self::constant(self.val.floor())
    }
    fn ceil(self) -> Self {
        Self::constant(self.val.ceil())
    }
    fn round(self) -> Self {
        Self::constant(self.val.round())
    }
    fn trunc(self) -> Self {
        Self::constant(self.val.trunc())
    }
    fn fract(self) -> Self {
        Self::new(self.val.fract(), self.eps)
    }
    fn signum(self) -> Self {
        Self::constant(self.val.signum())
    }

    fn abs(self) -> Self {
        if self.val >= 0.0 {
            self
        } else {
            -self
        }
    }

    fn mul_add(self, a: Self, b: Self) -> Self {
        self * a + b
    }

    fn recip(self) -> Self {
        Self::one() / self
    }

    fn powi(self, n: i32) -> Self {
        Self::new(
            self.val.powi(n),
            <f64 as From<i32>>::from(n) * self.val.powi(n - 1) * self.eps,
        )
    }

    fn powf(self, n: Self) -> Self {
        let value = self.val.powf(n.val);
        let eps = value * (n.eps * self.val.ln() + n.val * self.eps / self.val);
        Self::new(value, eps)
    }

    fn sqrt(self) -> Self {
        let root = self.val.sqrt();
        Self::new(root, self.eps / (2.0 * root))
    }

    fn exp(self) -> Self {
        let e = self.val.exp();
        Self::new(e, e * self.eps)
    }

    fn ln(self) -> Self {
        Self::new(self.val.ln(), self.eps / self.val)
    }

    fn log(self, base: Self) -> Self {
        self.ln() / base.ln()
    }

    fn log2(self) -> Self {
        self.ln() / Self::constant(std::f64::consts::LN_2)
    }

    fn log10(self) -> Self {
        self.ln() / Self::constant(std::f64::consts::LN_10)
    }

    fn ln_1p(self) -> Self {
        Self::new(self.val.ln_1p(), self.eps / (1.0 + self.val))
    }

    fn exp_m1(self) -> Self {
        Self::new(self.val.exp_m1(), self.val.exp() * self.eps)
    }

    fn sin(self) -> Self {
        Self::new(self.val.sin(), self.val.cos() * self.eps)
    }

    fn cos(self) -> Self {
        Self::new(self.val.cos(), -self.val.sin() * self.eps)
    }

    fn tan(self) -> Self {
        let t = self.val.tan();
        Self::new(t, (1.0 + t * t) * self.eps)
    }

    fn asin(self) -> Self {
        Self::new(self.val.asin(), self.eps / (1.0 - self.val * self.val).sqrt())
    }

    fn acos(self) -> Self {
        Self::new(
            self.val.acos(),
            -self.eps / (1.0 - self.val * self.val).sqrt(),
        )
    }

    fn atan(self) -> Self {
        Self::new(self.val.atan(), self.eps / (1.0 + self.val * self.val))
    }

    fn atan2(self, other: Self) -> Self {
        let denom = self.val * self.val + other.val * other.val;
        Self::new(
            self.val.atan2(other.val),
            (self.eps * other.val - self.val * other.eps) / denom,
        )
    }

    fn sin_cos(self) -> (Self, Self) {
        (self.sin(), self.cos())
    }

    fn sinh(self) -> Self {
        Self::new(self.val.sinh(), self.val.cosh() * self.eps)
    }

    fn cosh(self) -> Self {
        Self::new(self.val.cosh(), self.val.sinh() * self.eps)
    }

    fn tanh(self) -> Self {
        let t = self.val.tanh();
        Self::new(t, (1.0 - t * t) * self.eps)
    }

    fn max(self, other: Self) -> Self {
        if self.val > other.val {
            self
        } else {
            other
        }
    }

    fn min(self, other: Self) -> Self {
        if self.val < other.val {
            self
        } else {
            other
        }
    }

    fn hypot(self, other: Self) -> Self {
        (self * self + other * other).sqrt()
    }

    fn abs_sub(self, other: Self) -> Self {
        if self.val > other.val {
            self - other
        } else {
            Self::zero()
        }
    }

    dual_unsupported!(exp2, cbrt, asinh, acosh, atanh);
}

#[cfg(test)]
mod tests {
    use super::Dual;
    use num_traits::Float;

    #[test]
    fn product_rule_holds() {
        // d/dx [x * (x + 2)] at x = 3 is 2x + 2 = 8
        let x = Dual::variable(3.0);
        let two = Dual::constant(2.0);
        let y = x * (x + two);
        assert!((y.val - 15.0).abs() < 1e-12);
        assert!((y.eps - 8.0).abs() < 1e-12);
    }

    #[test]
    fn quotient_rule_holds() {
        // d/dx [1 / x] at x = 2 is -1/4
        let x = Dual::variable(2.0);
        let y = Dual::constant(1.0) / x;
        assert!((y.val - 0.5).abs() < 1e-12);
        assert!((y.eps + 0.25).abs() < 1e-12);
    }

    #[test]
    fn chain_rule_through_exp_and_ln() {
        // d/dx [ln(exp(x))] = 1 everywhere
        let x = Dual::variable(1.7);
        let y = x.exp().ln();
        assert!((y.val - 1.7).abs() < 1e-12);
        assert!((y.eps - 1.0).abs() < 1e-12);
    }

    #[test]
    fn powi_matches_polynomial_derivative() {
        // d/dx [x^3] at x = 2 is 12
        let y = Dual::variable(2.0).powi(3);
        assert!((y.val - 8.0).abs() < 1e-12);
        assert!((y.eps - 12.0).abs() < 1e-12);
    }

    #[test]
    fn constants_carry_no_derivative() {
        let c = Dual::constant(4.0);
        assert_eq!(c.eps, 0.0);
        assert_eq!((c * c).eps, 0.0);
    }
}
