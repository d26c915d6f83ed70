//! Montgomery-form prime fields over `BigInt` limbs.
//!
//! Each supported prime is a `PrimeFieldParams` impl carrying the modulus and
//! its Montgomery companions; `PrimeField<P, N>` monomorphizes the arithmetic
//! per prime. Elements are stored in Montgomery form; comparison works on it
//! directly (the map is a bijection), serialization and ordering-sensitive
//! operations go through the standard form.

use core::fmt::Debug;
use core::marker::PhantomData;

use rand::RngCore;

use quarry_util::{Error, Result};

use crate::big_int::BigInt;
use crate::traits::{Field, FftField};

/// The constants that go along with one prime. `MAX_DIVISIBLE` is the
/// largest multiple of the modulus representable in `N` limbs; it bounds the
/// rejection-sampling window used by `random` and the channel.
pub trait PrimeFieldParams<const N: usize>:
    'static + Copy + Clone + Eq + PartialEq + Debug + Send + Sync
{
    const MODULUS: BigInt<N>;
    /// `2^(64N) mod MODULUS`.
    const MONTGOMERY_R: BigInt<N>;
    const MONTGOMERY_R_SQUARED: BigInt<N>;
    const MONTGOMERY_R_CUBED: BigInt<N>;
    /// `(-MODULUS^-1) mod 2^64`.
    const M_PRIME: u64;
    const GENERATOR: u64;
    const MAX_DIVISIBLE: BigInt<N>;
}

pub struct PrimeField<P, const N: usize> {
    value: BigInt<N>,
    _params: PhantomData<P>,
}

impl<P, const N: usize> Clone for PrimeField<P, N> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<P, const N: usize> Copy for PrimeField<P, N> {}
impl<P, const N: usize> PartialEq for PrimeField<P, N> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
impl<P, const N: usize> Eq for PrimeField<P, N> {}
impl<P, const N: usize> core::hash::Hash for PrimeField<P, N> {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<P: PrimeFieldParams<N>, const N: usize> PrimeField<P, N> {
    const fn from_montgomery(value: BigInt<N>) -> Self {
        Self { value, _params: PhantomData }
    }

    fn mont_mul_value(x: &BigInt<N>, y: &BigInt<N>) -> BigInt<N> {
        BigInt::reduce_if_needed(&BigInt::mont_mul(x, y, &P::MODULUS, P::M_PRIME), &P::MODULUS)
    }

    pub fn modulus() -> BigInt<N> {
        P::MODULUS
    }

    /// The largest `N`-limb multiple of the modulus; integers below it reduce
    /// to uniform field elements.
    pub fn max_divisible() -> BigInt<N> {
        P::MAX_DIVISIBLE
    }

    /// Builds an element from an arbitrary integer, reducing mod p.
    pub fn from_bigint(val: &BigInt<N>) -> Self {
        let reduced = if *val < P::MODULUS {
            *val
        } else {
            val.rem(&P::MODULUS).expect("modulus is nonzero")
        };
        // Multiplying by R^2 compensates for the division by R inside the
        // Montgomery product.
        Self::from_montgomery(Self::mont_mul_value(&reduced, &P::MONTGOMERY_R_SQUARED))
    }

    pub fn from_montgomery_form(val: BigInt<N>) -> Self {
        Self::from_montgomery(val)
    }

    /// The reduced non-Montgomery representation.
    pub fn to_standard_form(&self) -> BigInt<N> {
        Self::mont_mul_value(&self.value, &BigInt::one())
    }

    pub fn montgomery_form(&self) -> &BigInt<N> {
        &self.value
    }
}

impl<P: PrimeFieldParams<N>, const N: usize> core::ops::Add for PrimeField<P, N> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::from_montgomery(BigInt::add_mod(&self.value, &rhs.value, &P::MODULUS))
    }
}

impl<P: PrimeFieldParams<N>, const N: usize> core::ops::Sub for PrimeField<P, N> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::from_montgomery(BigInt::sub_mod(&self.value, &rhs.value, &P::MODULUS))
    }
}

impl<P: PrimeFieldParams<N>, const N: usize> core::ops::Mul for PrimeField<P, N> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::from_montgomery(Self::mont_mul_value(&self.value, &rhs.value))
    }
}

impl<P: PrimeFieldParams<N>, const N: usize> core::ops::Neg for PrimeField<P, N> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::zero() - self
    }
}

impl<P: PrimeFieldParams<N>, const N: usize> core::ops::AddAssign for PrimeField<P, N> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl<P: PrimeFieldParams<N>, const N: usize> core::ops::SubAssign for PrimeField<P, N> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl<P: PrimeFieldParams<N>, const N: usize> core::ops::MulAssign for PrimeField<P, N> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<P: PrimeFieldParams<N>, const N: usize> core::fmt::Display for PrimeField<P, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.to_standard_form())
    }
}

impl<P: PrimeFieldParams<N>, const N: usize> core::fmt::Debug for PrimeField<P, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.to_standard_form())
    }
}

impl<P: PrimeFieldParams<N>, const N: usize> Field for PrimeField<P, N> {
    const SIZE_IN_BYTES: usize = 8 * N;

    fn zero() -> Self {
        Self::from_montgomery(BigInt::ZERO)
    }

    fn one() -> Self {
        Self::from_montgomery(P::MONTGOMERY_R)
    }

    fn from_u64(val: u64) -> Self {
        Self::from_montgomery(Self::mont_mul_value(
            &BigInt::from_u64(val),
            &P::MONTGOMERY_R_SQUARED,
        ))
    }

    fn try_inverse(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        // The inverse of a*R is a^-1 * R^-1; one product with R^3 restores
        // Montgomery form.
        let inv = BigInt::inverse_mod(&self.value, &P::MODULUS).ok()?;
        Some(Self::from_montgomery(Self::mont_mul_value(
            &inv,
            &P::MONTGOMERY_R_CUBED,
        )))
    }

    fn generator() -> Self {
        Self::from_u64(P::GENERATOR)
    }

    fn two_adicity() -> u32 {
        P::MODULUS.wrapping_sub(&BigInt::one()).num_trailing_zeros()
    }

    fn subgroup_generator(log2_size: u32) -> Result<Self> {
        if log2_size > Self::two_adicity() {
            return Err(Error::ArithmeticDomain(format!(
                "no multiplicative subgroup of size 2^{log2_size}"
            )));
        }
        let exponent = P::MODULUS.wrapping_sub(&BigInt::one()).shr(log2_size);
        Ok(Self::generator().pow(exponent.limbs()))
    }

    fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = vec![0u8; 8 * N];
        loop {
            rng.fill_bytes(&mut bytes);
            let candidate = BigInt::<N>::from_bytes(&bytes, true).unwrap();
            if candidate < P::MAX_DIVISIBLE {
                return Self::from_bigint(&candidate);
            }
        }
    }

    fn to_bytes(&self, out: &mut [u8], big_endian: bool) {
        self.to_standard_form().to_bytes(out, big_endian);
    }

    fn from_bytes(bytes: &[u8], big_endian: bool) -> Result<Self> {
        let val = BigInt::<N>::from_bytes(bytes, big_endian)?;
        if val >= P::MODULUS {
            return Err(Error::InvalidParameter(
                "field element encoding is not reduced".to_string(),
            ));
        }
        Ok(Self::from_bigint(&val))
    }

    fn from_hex(s: &str) -> Result<Self> {
        let val = BigInt::<N>::from_hex(s)?;
        if val >= P::MODULUS {
            return Err(Error::InvalidParameter(
                "field element literal is not reduced".to_string(),
            ));
        }
        Ok(Self::from_bigint(&val))
    }
}

impl<P: PrimeFieldParams<N>, const N: usize> FftField for PrimeField<P, N> {}

/// The default STARK field: `p = 2^251 + 17 * 2^192 + 1`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Stark252Params;

impl PrimeFieldParams<4> for Stark252Params {
    const MODULUS: BigInt<4> =
        BigInt::from_limbs([0x1, 0x0, 0x0, 0x0800000000000011]);
    const MONTGOMERY_R: BigInt<4> = BigInt::from_limbs([
        0xffffffffffffffe1,
        0xffffffffffffffff,
        0xffffffffffffffff,
        0x07fffffffffffdf0,
    ]);
    const MONTGOMERY_R_SQUARED: BigInt<4> = BigInt::from_limbs([
        0xfffffd737e000401,
        0x00000001330fffff,
        0xffffffffff6f8000,
        0x07ffd4ab5e008810,
    ]);
    const MONTGOMERY_R_CUBED: BigInt<4> = BigInt::from_limbs([
        0xcc7177d1406df18e,
        0x7545706677ffcc06,
        0xf47d84f836300018,
        0x038e5f79873c0a6d,
    ]);
    const M_PRIME: u64 = 0xffffffffffffffff;
    const GENERATOR: u64 = 3;
    const MAX_DIVISIBLE: BigInt<4> =
        BigInt::from_limbs([0x1f, 0x0, 0x0, 0xf80000000000020f]);
}

pub type Stark252 = PrimeField<Stark252Params, 4>;

/// A 254-bit prime with a 2-adicity of 1; usable for arithmetic but not as
/// an FFT domain.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Prime254AParams;

impl PrimeFieldParams<4> for Prime254AParams {
    const MODULUS: BigInt<4> = BigInt::from_limbs([
        0x3c208c16d87cfd47,
        0x97816a916871ca8d,
        0xb85045b68181585d,
        0x30644e72e131a029,
    ]);
    const MONTGOMERY_R: BigInt<4> = BigInt::from_limbs([
        0xd35d438dc58f0d9d,
        0x0a78eb28f5c70b3d,
        0x666ea36f7879462c,
        0x0e0a77c19a07df2f,
    ]);
    const MONTGOMERY_R_SQUARED: BigInt<4> = BigInt::from_limbs([
        0xf32cfc5b538afa89,
        0xb5e71911d44501fb,
        0x47ab1eff0a417ff6,
        0x06d89f71cab8351f,
    ]);
    const MONTGOMERY_R_CUBED: BigInt<4> = BigInt::from_limbs([
        0xb1cd6dafda1530df,
        0x62f210e6a7283db6,
        0xef7f0b0c0ada0afb,
        0x20fd6e902d592544,
    ]);
    const M_PRIME: u64 = 0x87d20782e4866389;
    const GENERATOR: u64 = 3;
    const MAX_DIVISIBLE: BigInt<4> = BigInt::from_limbs([
        0x2ca2bc723a70f263,
        0xf58714d70a38f4c2,
        0x99915c908786b9d3,
        0xf1f5883e65f820d0,
    ]);
}

pub type Prime254A = PrimeField<Prime254AParams, 4>;

/// A 254-bit FFT-friendly prime (2-adicity 28).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Prime254BParams;

impl PrimeFieldParams<4> for Prime254BParams {
    const MODULUS: BigInt<4> = BigInt::from_limbs([
        0x43e1f593f0000001,
        0x2833e84879b97091,
        0xb85045b68181585d,
        0x30644e72e131a029,
    ]);
    const MONTGOMERY_R: BigInt<4> = BigInt::from_limbs([
        0xac96341c4ffffffb,
        0x36fc76959f60cd29,
        0x666ea36f7879462e,
        0x0e0a77c19a07df2f,
    ]);
    const MONTGOMERY_R_SQUARED: BigInt<4> = BigInt::from_limbs([
        0x1bb8e645ae216da7,
        0x53fe3ab1e35c59e3,
        0x8c49833d53bb8085,
        0x0216d0b17f4e44a5,
    ]);
    const MONTGOMERY_R_CUBED: BigInt<4> = BigInt::from_limbs([
        0x5e94d8e1b4bf0040,
        0x2a489cbe1cfbb6b8,
        0x893cc664a19fcfed,
        0x0cf8594b7fcc657c,
    ]);
    const M_PRIME: u64 = 0xc2e1f593efffffff;
    const GENERATOR: u64 = 5;
    const MAX_DIVISIBLE: BigInt<4> = BigInt::from_limbs([
        0x5369cbe3b0000005,
        0xc903896a609f32d6,
        0x99915c908786b9d1,
        0xf1f5883e65f820d0,
    ]);
}

pub type Prime254B = PrimeField<Prime254BParams, 4>;

/// A sparse 252-bit prime, `2^251 + 2^78 + 1` shaped (2-adicity 78).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Prime252SparseParams;

impl PrimeFieldParams<4> for Prime252SparseParams {
    const MODULUS: BigInt<4> =
        BigInt::from_limbs([0x1, 0x4000, 0x0, 0x0800000000000000]);
    const MONTGOMERY_R: BigInt<4> = BigInt::from_limbs([
        0xffffffffffffffe1,
        0xfffffffffff83fff,
        0xffffffffffffffff,
        0x07ffffffffffffff,
    ]);
    const MONTGOMERY_R_SQUARED: BigInt<4> =
        BigInt::from_limbs([0x400, 0x2000000, 0x4000000000, 0x0]);
    const MONTGOMERY_R_CUBED: BigInt<4> = BigInt::from_limbs([
        0xffffffffffff8001,
        0xffffffffa0003fff,
        0xffffe7ffffffffff,
        0x05ffffffffffffff,
    ]);
    const M_PRIME: u64 = 0xffffffffffffffff;
    const GENERATOR: u64 = 7;
    const MAX_DIVISIBLE: BigInt<4> =
        BigInt::from_limbs([0x1f, 0x7c000, 0x0, 0xf800000000000000]);
}

pub type Prime252Sparse = PrimeField<Prime252SparseParams, 4>;

/// The 255-bit scalar-field prime (2-adicity 32).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Prime255Params;

impl PrimeFieldParams<4> for Prime255Params {
    const MODULUS: BigInt<4> = BigInt::from_limbs([
        0xffffffff00000001,
        0x53bda402fffe5bfe,
        0x3339d80809a1d805,
        0x73eda753299d7d48,
    ]);
    const MONTGOMERY_R: BigInt<4> = BigInt::from_limbs([
        0x00000001fffffffe,
        0x5884b7fa00034802,
        0x998c4fefecbc4ff5,
        0x1824b159acc5056f,
    ]);
    const MONTGOMERY_R_SQUARED: BigInt<4> = BigInt::from_limbs([
        0xc999e990f3f29c6d,
        0x2b6cedcb87925c23,
        0x05d314967254398f,
        0x0748d9d99f59ff11,
    ]);
    const MONTGOMERY_R_CUBED: BigInt<4> = BigInt::from_limbs([
        0xc62c1807439b73af,
        0x1b3e0d188cf06990,
        0x73d13c71c7b5f418,
        0x6e2a5bb9c8db33e9,
    ]);
    const M_PRIME: u64 = 0xfffffffeffffffff;
    const GENERATOR: u64 = 7;
    const MAX_DIVISIBLE: BigInt<4> = BigInt::from_limbs([
        0xfffffffe00000002,
        0xa77b4805fffcb7fd,
        0x6673b0101343b00a,
        0xe7db4ea6533afa90,
    ]);
}

pub type Prime255 = PrimeField<Prime255Params, 4>;

/// A two-limb 124-bit prime (2-adicity 65).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Prime124Params;

impl PrimeFieldParams<2> for Prime124Params {
    const MODULUS: BigInt<2> = BigInt::from_limbs([0x1, 0x08000000000000aa]);
    const MONTGOMERY_R: BigInt<2> =
        BigInt::from_limbs([0xffffffffffffffe1, 0x07ffffffffffeb69]);
    const MONTGOMERY_R_SQUARED: BigInt<2> =
        BigInt::from_limbs([0xffffffffc78e0401, 0x07ffffda845150a9]);
    const MONTGOMERY_R_CUBED: BigInt<2> =
        BigInt::from_limbs([0xff9c6f7f0abf8009, 0x05e20f0c990105f9]);
    const M_PRIME: u64 = 0xffffffffffffffff;
    const GENERATOR: u64 = 6;
    const MAX_DIVISIBLE: BigInt<2> =
        BigInt::from_limbs([0x1f, 0xf800000000001496]);
}

pub type Prime124 = PrimeField<Prime124Params, 2>;
