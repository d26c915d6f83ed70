//! A quadratic extension `F[w] / (w^2 - phi)` with `phi = F::generator()`.
//!
//! The generator of a 2-adic field's multiplicative group is always a
//! quadratic non-residue, so `w^2 - phi` is irreducible over every provided
//! base field.

use rand::RngCore;

use quarry_util::{Error, Result};

use crate::traits::{Field, FftField};

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionField<F: Field> {
    c0: F,
    c1: F,
}

impl<F: Field> ExtensionField<F> {
    pub fn new(c0: F, c1: F) -> Self {
        Self { c0, c1 }
    }

    /// Embeds a base-field element.
    pub fn from_base(c0: F) -> Self {
        Self { c0, c1: F::zero() }
    }

    pub fn coefficients(&self) -> (F, F) {
        (self.c0, self.c1)
    }

    fn non_residue() -> F {
        F::generator()
    }
}

impl<F: Field> core::ops::Add for ExtensionField<F> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.c0 + rhs.c0, self.c1 + rhs.c1)
    }
}

impl<F: Field> core::ops::Sub for ExtensionField<F> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.c0 - rhs.c0, self.c1 - rhs.c1)
    }
}

impl<F: Field> core::ops::Mul for ExtensionField<F> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        // (a0 + a1 w)(b0 + b1 w) = a0 b0 + phi a1 b1 + (a0 b1 + a1 b0) w.
        Self::new(
            self.c0 * rhs.c0 + Self::non_residue() * self.c1 * rhs.c1,
            self.c0 * rhs.c1 + self.c1 * rhs.c0,
        )
    }
}

impl<F: Field> core::ops::Neg for ExtensionField<F> {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.c0, -self.c1)
    }
}

impl<F: Field> core::ops::AddAssign for ExtensionField<F> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl<F: Field> core::ops::SubAssign for ExtensionField<F> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl<F: Field> core::ops::MulAssign for ExtensionField<F> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<F: Field> core::fmt::Display for ExtensionField<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} + {}*w", self.c0, self.c1)
    }
}

impl<F: Field> core::fmt::Debug for ExtensionField<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

impl<F: Field> Field for ExtensionField<F> {
    const SIZE_IN_BYTES: usize = 2 * F::SIZE_IN_BYTES;

    fn zero() -> Self {
        Self::from_base(F::zero())
    }

    fn one() -> Self {
        Self::from_base(F::one())
    }

    fn from_u64(val: u64) -> Self {
        Self::from_base(F::from_u64(val))
    }

    fn try_inverse(&self) -> Option<Self> {
        // (a0 + a1 w)^-1 = (a0 - a1 w) / (a0^2 - phi a1^2); the norm is zero
        // only for the zero element since phi is a non-residue.
        let norm = self.c0.square() - Self::non_residue() * self.c1.square();
        let norm_inv = norm.try_inverse()?;
        Some(Self::new(self.c0 * norm_inv, -(self.c1 * norm_inv)))
    }

    /// The base-field generator embedded. Not a generator of the extension's
    /// multiplicative group, but sufficient for the coset offsets this core
    /// derives from it.
    fn generator() -> Self {
        Self::from_base(F::generator())
    }

    fn two_adicity() -> u32 {
        F::two_adicity()
    }

    fn subgroup_generator(log2_size: u32) -> Result<Self> {
        Ok(Self::from_base(F::subgroup_generator(log2_size)?))
    }

    fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        Self::new(F::random(rng), F::random(rng))
    }

    fn to_bytes(&self, out: &mut [u8], big_endian: bool) {
        assert_eq!(out.len(), Self::SIZE_IN_BYTES);
        let (first, second) = out.split_at_mut(F::SIZE_IN_BYTES);
        self.c0.to_bytes(first, big_endian);
        self.c1.to_bytes(second, big_endian);
    }

    fn from_bytes(bytes: &[u8], big_endian: bool) -> Result<Self> {
        if bytes.len() != Self::SIZE_IN_BYTES {
            return Err(Error::InvalidParameter(format!(
                "expected {} bytes, got {}",
                Self::SIZE_IN_BYTES,
                bytes.len()
            )));
        }
        let (first, second) = bytes.split_at(F::SIZE_IN_BYTES);
        Ok(Self::new(
            F::from_bytes(first, big_endian)?,
            F::from_bytes(second, big_endian)?,
        ))
    }

    fn from_hex(s: &str) -> Result<Self> {
        Ok(Self::from_base(F::from_hex(s)?))
    }
}

impl<F: FftField> FftField for ExtensionField<F> {}
