//! A single-limb Montgomery field: `p = 2^61 + 20 * 2^32 + 1` (2-adicity 34).
//! The simplified one-limb variant of `PrimeField`.

use rand::RngCore;

use quarry_util::{Error, Result};

use crate::traits::{Field, FftField};

const MODULUS: u64 = 0x2000001400000001;
/// 2^64 mod p.
const MONTGOMERY_R: u64 = 0x1fffff73fffffff9;
const MONTGOMERY_R_SQUARED: u64 = 0x1fc18a13fffce041;
/// (-p^-1) mod 2^64.
const M_PRIME: u64 = 0x20000013ffffffff;
const MAX_DIVISIBLE: u64 = (u64::MAX / MODULUS) * MODULUS;
const TWO_ADICITY: u32 = 34;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct LongField(u64);

#[inline]
const fn reduce_if_needed(val: u64, target: u64) -> u64 {
    let alt = val.wrapping_sub(target);
    if (alt as i64) < 0 {
        val
    } else {
        alt
    }
}

/// `x * y / 2^64 mod p`; the one-round Montgomery reduction.
#[inline]
const fn montgomery_mul(x: u64, y: u64) -> u64 {
    let mul_res = x as u128 * y as u128;
    let u = (mul_res as u64).wrapping_mul(M_PRIME);
    let res = (MODULUS as u128 * u as u128).wrapping_add(mul_res);
    reduce_if_needed((res >> 64) as u64, MODULUS)
}

impl LongField {
    pub const MODULUS: u64 = MODULUS;

    pub fn from_montgomery_form(val: u64) -> Self {
        Self(val)
    }

    pub fn to_standard_form(&self) -> u64 {
        montgomery_mul(self.0, 1)
    }
}

impl core::ops::Add for LongField {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(reduce_if_needed(self.0 + rhs.0, MODULUS))
    }
}

impl core::ops::Sub for LongField {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let val = self.0.wrapping_sub(rhs.0);
        Self(if (val as i64) < 0 { val.wrapping_add(MODULUS) } else { val })
    }
}

impl core::ops::Mul for LongField {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(montgomery_mul(self.0, rhs.0))
    }
}

impl core::ops::Neg for LongField {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::zero() - self
    }
}

impl core::ops::AddAssign for LongField {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl core::ops::SubAssign for LongField {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl core::ops::MulAssign for LongField {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl core::fmt::Display for LongField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:x}", self.to_standard_form())
    }
}

impl core::fmt::Debug for LongField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

impl Field for LongField {
    const SIZE_IN_BYTES: usize = 8;

    fn zero() -> Self {
        Self(0)
    }

    fn one() -> Self {
        Self(MONTGOMERY_R)
    }

    fn from_u64(val: u64) -> Self {
        Self(montgomery_mul(val % MODULUS, MONTGOMERY_R_SQUARED))
    }

    fn try_inverse(&self) -> Option<Self> {
        if self.0 == 0 {
            None
        } else {
            Some(self.pow_u64(MODULUS - 2))
        }
    }

    fn generator() -> Self {
        Self::from_u64(3)
    }

    fn two_adicity() -> u32 {
        TWO_ADICITY
    }

    fn subgroup_generator(log2_size: u32) -> Result<Self> {
        if log2_size > TWO_ADICITY {
            return Err(Error::ArithmeticDomain(format!(
                "no multiplicative subgroup of size 2^{log2_size}"
            )));
        }
        Ok(Self::generator().pow_u64((MODULUS - 1) >> log2_size))
    }

    fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        loop {
            let candidate = rng.next_u64();
            if candidate < MAX_DIVISIBLE {
                return Self::from_u64(candidate);
            }
        }
    }

    fn to_bytes(&self, out: &mut [u8], big_endian: bool) {
        assert_eq!(out.len(), Self::SIZE_IN_BYTES);
        let std_form = self.to_standard_form();
        out.copy_from_slice(&if big_endian {
            std_form.to_be_bytes()
        } else {
            std_form.to_le_bytes()
        });
    }

    fn from_bytes(bytes: &[u8], big_endian: bool) -> Result<Self> {
        if bytes.len() != Self::SIZE_IN_BYTES {
            return Err(Error::InvalidParameter(format!(
                "expected 8 bytes, got {}",
                bytes.len()
            )));
        }
        let arr: [u8; 8] = bytes.try_into().unwrap();
        let val = if big_endian {
            u64::from_be_bytes(arr)
        } else {
            u64::from_le_bytes(arr)
        };
        if val >= MODULUS {
            return Err(Error::InvalidParameter(
                "field element encoding is not reduced".to_string(),
            ));
        }
        Ok(Self::from_u64(val))
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
        Ok(Self::from_u64(val))
    }
}

impl FftField for LongField {}
