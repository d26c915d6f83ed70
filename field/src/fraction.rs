//! The fraction field of `F`: pairs `(numerator, denominator)` with
//! arithmetic that defers division. AIR constraint evaluators return these so
//! the composition layer can batch-invert denominators once per coset.

use crate::traits::Field;

#[derive(Copy, Clone, Debug, Eq)]
pub struct FractionField<F: Field> {
    numerator: F,
    denominator: F,
}

impl<F: Field> FractionField<F> {
    pub fn new(numerator: F, denominator: F) -> Self {
        debug_assert!(!denominator.is_zero(), "denominator must be nonzero");
        Self { numerator, denominator }
    }

    pub fn zero() -> Self {
        Self { numerator: F::zero(), denominator: F::one() }
    }

    pub fn one() -> Self {
        Self { numerator: F::one(), denominator: F::one() }
    }

    pub fn from_field(value: F) -> Self {
        Self { numerator: value, denominator: F::one() }
    }

    pub fn numerator(&self) -> F {
        self.numerator
    }

    pub fn denominator(&self) -> F {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    pub fn inverse(&self) -> Option<Self> {
        if self.numerator.is_zero() {
            return None;
        }
        Some(Self { numerator: self.denominator, denominator: self.numerator })
    }

    /// Collapses to a field element; one inversion.
    pub fn to_field(&self) -> F {
        self.numerator * self.denominator.inverse()
    }
}

impl<F: Field> core::ops::Add for FractionField<F> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            numerator: self.numerator * rhs.denominator + rhs.numerator * self.denominator,
            denominator: self.denominator * rhs.denominator,
        }
    }
}

impl<F: Field> core::ops::Sub for FractionField<F> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl<F: Field> core::ops::Mul for FractionField<F> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self {
            numerator: self.numerator * rhs.numerator,
            denominator: self.denominator * rhs.denominator,
        }
    }
}

impl<F: Field> core::ops::Neg for FractionField<F> {
    type Output = Self;
    fn neg(self) -> Self {
        Self { numerator: -self.numerator, denominator: self.denominator }
    }
}

impl<F: Field> core::ops::AddAssign for FractionField<F> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<F: Field> core::ops::MulAssign for FractionField<F> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<F: Field> PartialEq for FractionField<F> {
    fn eq(&self, other: &Self) -> bool {
        // a/b == c/d iff ad == cb; denominators are nonzero by construction.
        self.numerator * other.denominator == other.numerator * self.denominator
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::test_field::TestField;
    use crate::traits::Field;

    type Frac = FractionField<TestField>;

    fn frac(n: u64, d: u64) -> Frac {
        Frac::new(TestField::from_u64(n), TestField::from_u64(d))
    }

    #[test]
    fn arithmetic_matches_rationals() {
        // 1/2 + 1/3 = 5/6
        assert_eq!(frac(1, 2) + frac(1, 3), frac(5, 6));
        // 1/2 * 2/3 = 1/3
        assert_eq!(frac(1, 2) * frac(2, 3), frac(1, 3));
        // 1/2 - 1/2 = 0
        assert!((frac(1, 2) - frac(1, 2)).is_zero());
    }

    #[test]
    fn to_field_agrees_with_division() {
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..50 {
            let n = TestField::random(&mut rng);
            let d = TestField::random(&mut rng);
            if d.is_zero() {
                continue;
            }
            assert_eq!(Frac::new(n, d).to_field(), n * d.inverse());
        }
    }

    #[test]
    fn inverse_swaps() {
        let x = frac(3, 7);
        assert_eq!(x.inverse().unwrap() * x, Frac::one());
        assert!(Frac::zero().inverse().is_none());
    }

    #[test]
    fn equality_cross_multiplies() {
        assert_eq!(frac(2, 4), frac(1, 2));
        assert_ne!(frac(2, 4), frac(1, 3));
    }
}
