//! The field capability traits. Hot loops are generic over these and
//! monomorphize per concrete field; the closed set of field variants is
//! resolved once at configuration time (see `quarry-stark`).

use core::fmt::{Debug, Display};
use core::hash::Hash;
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use rand::RngCore;

use quarry_util::Result;

pub trait Field:
    'static
    + Copy
    + Clone
    + Eq
    + PartialEq
    + Hash
    + Debug
    + Display
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
{
    /// Serialized width of one element, in bytes.
    const SIZE_IN_BYTES: usize;

    fn zero() -> Self;
    fn one() -> Self;
    fn from_u64(val: u64) -> Self;

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn square(&self) -> Self {
        *self * *self
    }

    fn double(&self) -> Self {
        *self + *self
    }

    /// `None` for zero.
    fn try_inverse(&self) -> Option<Self>;

    /// Panics on zero; zero inputs are logic errors on every call path that
    /// uses this form. Fallible callers go through `try_inverse` or
    /// `batch_inverse`.
    fn inverse(&self) -> Self {
        self.try_inverse().expect("zero does not have an inverse")
    }

    /// `self^exponent` with the exponent given as little-endian 64-bit
    /// limbs, square-and-multiply from the most significant bit.
    fn pow(&self, exponent: &[u64]) -> Self {
        let mut result = Self::one();
        for &limb in exponent.iter().rev() {
            for bit in (0..64).rev() {
                result = result.square();
                if (limb >> bit) & 1 == 1 {
                    result *= *self;
                }
            }
        }
        result
    }

    fn pow_u64(&self, exponent: u64) -> Self {
        self.pow(&[exponent])
    }

    /// A fixed generator of the multiplicative group.
    fn generator() -> Self;

    /// The number of times 2 divides the multiplicative group order.
    fn two_adicity() -> u32;

    /// A primitive `2^log2_size`-th root of unity, or `ArithmeticDomain`
    /// when the group has no subgroup of that size.
    fn subgroup_generator(log2_size: u32) -> Result<Self>;

    /// A uniform element, by rejection sampling from the source's bytes.
    fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self;

    /// Serializes the standard (non-Montgomery, reduced) form.
    fn to_bytes(&self, out: &mut [u8], big_endian: bool);

    /// Deserializes; rejects encodings that are not reduced.
    fn from_bytes(bytes: &[u8], big_endian: bool) -> Result<Self>;

    /// Parses a `"0x..."` standard-form literal.
    fn from_hex(s: &str) -> Result<Self>;

    fn to_bytes_vec(&self, big_endian: bool) -> Vec<u8> {
        let mut out = vec![0u8; Self::SIZE_IN_BYTES];
        self.to_bytes(&mut out, big_endian);
        out
    }
}

/// Fields usable as FFT domains. The butterfly hooks exist so a field with
/// spare high bits can keep inputs in a redundant range across a whole
/// transform; the defaults compute exactly and make `fft_normalize` a no-op.
pub trait FftField: Field {
    /// `(in1 + t*in2, in1 - t*in2)` for `t = twiddle`.
    #[inline]
    fn fft_butterfly(in1: Self, in2: Self, twiddle: Self) -> (Self, Self) {
        let t = in2 * twiddle;
        (in1 + t, in1 - t)
    }

    /// The inverse butterfly: `(in1 + in2, (in1 - in2) * twiddle_inv)`.
    #[inline]
    fn fft_ibutterfly(in1: Self, in2: Self, twiddle_inv: Self) -> (Self, Self) {
        (in1 + in2, (in1 - in2) * twiddle_inv)
    }

    /// Restores the canonical range after a transform that used a redundant
    /// representation.
    #[inline]
    fn fft_normalize(_val: &mut Self) {}
}
