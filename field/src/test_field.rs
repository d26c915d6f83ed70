//! A small field for tests: `p = 3 * 2^30 + 1`, held in a `u32` with plain
//! modular arithmetic. Chosen for FFT considerations (2-adicity 30).

use rand::RngCore;

use quarry_util::{Error, Result};

use crate::traits::{Field, FftField};

const MODULUS: u64 = 3 * (1 << 30) + 1;
/// Largest multiple of the modulus below 2^32; the rejection window for
/// uniform sampling from 4 random bytes.
const MAX_DIVISIBLE: u64 = (u32::MAX as u64 / MODULUS) * MODULUS;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct TestField(u32);

impl TestField {
    pub const MODULUS: u64 = MODULUS;

    const fn new(val: u64) -> Self {
        Self((val % MODULUS) as u32)
    }

    pub fn as_u64(&self) -> u64 {
        self.0 as u64
    }
}

impl core::ops::Add for TestField {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.0 as u64 + rhs.0 as u64)
    }
}

impl core::ops::Sub for TestField {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.0 as u64 + MODULUS - rhs.0 as u64)
    }
}

impl core::ops::Mul for TestField {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.0 as u64 * rhs.0 as u64)
    }
}

impl core::ops::Neg for TestField {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(MODULUS - self.0 as u64)
    }
}

impl core::ops::AddAssign for TestField {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl core::ops::SubAssign for TestField {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl core::ops::MulAssign for TestField {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl core::fmt::Display for TestField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl core::fmt::Debug for TestField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

impl Field for TestField {
    const SIZE_IN_BYTES: usize = 4;

    fn zero() -> Self {
        Self(0)
    }

    fn one() -> Self {
        Self(1)
    }

    fn from_u64(val: u64) -> Self {
        Self::new(val)
    }

    fn try_inverse(&self) -> Option<Self> {
        if self.0 == 0 {
            None
        } else {
            Some(self.pow_u64(MODULUS - 2))
        }
    }

    fn generator() -> Self {
        Self(5)
    }

    fn two_adicity() -> u32 {
        30
    }

    fn subgroup_generator(log2_size: u32) -> Result<Self> {
        if log2_size > Self::two_adicity() {
            return Err(Error::ArithmeticDomain(format!(
                "no multiplicative subgroup of size 2^{log2_size}"
            )));
        }
        Ok(Self::generator().pow_u64((MODULUS - 1) >> log2_size))
    }

    fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        loop {
            let candidate = rng.next_u32() as u64;
            if candidate < MAX_DIVISIBLE {
                return Self::new(candidate);
            }
        }
    }

    fn to_bytes(&self, out: &mut [u8], big_endian: bool) {
        assert_eq!(out.len(), Self::SIZE_IN_BYTES);
        out.copy_from_slice(&if big_endian {
            self.0.to_be_bytes()
        } else {
            self.0.to_le_bytes()
        });
    }

    fn from_bytes(bytes: &[u8], big_endian: bool) -> Result<Self> {
        if bytes.len() != Self::SIZE_IN_BYTES {
            return Err(Error::InvalidParameter(format!(
                "expected 4 bytes, got {}",
                bytes.len()
            )));
        }
        let arr: [u8; 4] = bytes.try_into().unwrap();
        let val = if big_endian {
            u32::from_be_bytes(arr)
        } else {
            u32::from_le_bytes(arr)
        } as u64;
        if val >= MODULUS {
            return Err(Error::InvalidParameter(
                "field element encoding is not reduced".to_string(),
            ));
        }
        Ok(Self(val as u32))
    }

    fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let val = u64::from_str_radix(digits, 16)
            .map_err(|_| Error::InvalidParameter(format!("bad hex literal: {s:?}")))?;
        if val >= MODULUS {
            return Err(Error::InvalidParameter(
                "field element literal is not reduced".to_string(),
            ));
        }
        Ok(Self(val as u32))
    }
}

impl FftField for TestField {}
