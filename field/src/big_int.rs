//! Fixed-width unsigned integers made of `N` 64-bit limbs, little-endian.
//!
//! These back the Montgomery prime fields: the limb count is a compile-time
//! constant so arithmetic monomorphizes into straight-line carry chains.

use rand::RngCore;

use quarry_util::{Error, Result};

/// `a + b * c + carry` as a (low, high) limb pair. Never overflows: the
/// result of the u128 expression is at most `2^128 - 1`.
#[inline(always)]
const fn mac(a: u64, b: u64, c: u64, carry: u64) -> (u64, u64) {
    let t = a as u128 + (b as u128) * (c as u128) + carry as u128;
    (t as u64, (t >> 64) as u64)
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct BigInt<const N: usize>([u64; N]);

impl<const N: usize> BigInt<N> {
    pub const LIMBS: usize = N;
    pub const BITS: u32 = 64 * N as u32;
    pub const ZERO: Self = Self([0; N]);

    pub const fn one() -> Self {
        let mut limbs = [0u64; N];
        limbs[0] = 1;
        Self(limbs)
    }

    pub const fn from_limbs(limbs: [u64; N]) -> Self {
        Self(limbs)
    }

    pub const fn from_u64(val: u64) -> Self {
        let mut limbs = [0u64; N];
        limbs[0] = val;
        Self(limbs)
    }

    pub const fn limbs(&self) -> &[u64; N] {
        &self.0
    }

    /// The low limb. The rest of the number must be zero when this is used
    /// as a narrowing conversion; callers check `fits_u64` first.
    pub const fn as_u64(&self) -> u64 {
        self.0[0]
    }

    pub fn fits_u64(&self) -> bool {
        self.0[1..].iter().all(|&l| l == 0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&l| l == 0)
    }

    pub const fn size_in_bytes() -> usize {
        8 * N
    }

    /// Returns `(self + other, carry_out)`.
    pub fn add_with_carry(&self, other: &Self) -> (Self, bool) {
        let mut out = [0u64; N];
        let mut carry = 0u64;
        for i in 0..N {
            let t = self.0[i] as u128 + other.0[i] as u128 + carry as u128;
            out[i] = t as u64;
            carry = (t >> 64) as u64;
        }
        (Self(out), carry != 0)
    }

    /// Returns `(self - other, borrow_out)`.
    pub fn sub_with_borrow(&self, other: &Self) -> (Self, bool) {
        let mut out = [0u64; N];
        let mut borrow = 0u64;
        for i in 0..N {
            let t = (self.0[i] as u128)
                .wrapping_sub(other.0[i] as u128)
                .wrapping_sub(borrow as u128);
            out[i] = t as u64;
            borrow = ((t >> 64) as u64 != 0) as u64;
        }
        (Self(out), borrow != 0)
    }

    pub fn wrapping_add(&self, other: &Self) -> Self {
        self.add_with_carry(other).0
    }

    pub fn wrapping_sub(&self, other: &Self) -> Self {
        self.sub_with_borrow(other).0
    }

    /// Schoolbook product, truncated to `M` limbs. Callers use `M = 2 * N`
    /// for the full double-width product.
    pub fn widening_mul<const M: usize>(&self, other: &Self) -> BigInt<M> {
        let mut out = [0u64; M];
        for i in 0..N {
            let mut carry = 0u64;
            for j in 0..N {
                if i + j >= M {
                    break;
                }
                let (lo, hi) = mac(out[i + j], self.0[i], other.0[j], carry);
                out[i + j] = lo;
                carry = hi;
            }
            if i + N < M {
                out[i + N] = carry;
            }
        }
        BigInt(out)
    }

    /// Widens (or narrows, asserting no data loss) to `M` limbs.
    pub fn resize<const M: usize>(&self) -> BigInt<M> {
        let mut out = [0u64; M];
        for i in 0..N {
            if i < M {
                out[i] = self.0[i];
            } else {
                assert_eq!(self.0[i], 0, "value does not fit in the narrower width");
            }
        }
        BigInt(out)
    }

    pub const fn bit(&self, index: u32) -> bool {
        (self.0[(index / 64) as usize] >> (index % 64)) & 1 == 1
    }

    fn set_bit(&mut self, index: u32) {
        self.0[(index / 64) as usize] |= 1 << (index % 64);
    }

    pub fn is_msb_set(&self) -> bool {
        self.bit(Self::BITS - 1)
    }

    pub fn is_even(&self) -> bool {
        self.0[0] & 1 == 0
    }

    pub fn num_leading_zeros(&self) -> u32 {
        let mut total = 0;
        for &limb in self.0.iter().rev() {
            if limb == 0 {
                total += 64;
            } else {
                return total + limb.leading_zeros();
            }
        }
        total
    }

    pub fn num_trailing_zeros(&self) -> u32 {
        let mut total = 0;
        for &limb in self.0.iter() {
            if limb == 0 {
                total += 64;
            } else {
                return total + limb.trailing_zeros();
            }
        }
        total
    }

    /// `floor(log2(self))`; panics on zero.
    pub fn log2_floor(&self) -> u32 {
        assert!(!self.is_zero(), "log2 of 0 is undefined");
        Self::BITS - 1 - self.num_leading_zeros()
    }

    pub fn log2_ceil(&self) -> u32 {
        self.log2_floor() + if self.is_power_of_two() { 0 } else { 1 }
    }

    pub fn is_power_of_two(&self) -> bool {
        !self.is_zero() && self.num_trailing_zeros() == self.log2_floor()
    }

    pub fn shl(&self, shift: u32) -> Self {
        assert!(shift < Self::BITS);
        let (words, bits) = ((shift / 64) as usize, shift % 64);
        let mut out = [0u64; N];
        for i in (words..N).rev() {
            out[i] = self.0[i - words] << bits;
            if bits > 0 && i > words {
                out[i] |= self.0[i - words - 1] >> (64 - bits);
            }
        }
        Self(out)
    }

    pub fn shr(&self, shift: u32) -> Self {
        assert!(shift < Self::BITS);
        let (words, bits) = ((shift / 64) as usize, shift % 64);
        let mut out = [0u64; N];
        for i in 0..N - words {
            out[i] = self.0[i + words] >> bits;
            if bits > 0 && i + words + 1 < N {
                out[i] |= self.0[i + words + 1] << (64 - bits);
            }
        }
        Self(out)
    }

    /// `(self << 1) | bit`, with the shifted-out bit.
    fn shl1_with_bit(&self, bit: bool) -> (Self, bool) {
        let carry_out = self.is_msb_set();
        let mut out = self.shl(1);
        if bit {
            out.0[0] |= 1;
        }
        (out, carry_out)
    }

    /// `(q, r)` such that `self = q * divisor + r` and `r < divisor`.
    pub fn div_rem(&self, divisor: &Self) -> Result<(Self, Self)> {
        if divisor.is_zero() {
            return Err(Error::ArithmeticDomain("division by zero".to_string()));
        }
        let mut q = Self::ZERO;
        let mut r = Self::ZERO;
        for i in (0..Self::BITS).rev() {
            let (shifted, overflow) = r.shl1_with_bit(self.bit(i));
            if overflow || shifted >= *divisor {
                // When the shift overflowed, the true remainder exceeds the
                // representable range by exactly the wrapped amount, so the
                // wrapping subtraction is the correct reduction.
                r = shifted.wrapping_sub(divisor);
                q.set_bit(i);
            } else {
                r = shifted;
            }
        }
        Ok((q, r))
    }

    /// `self % 2^64 == self mod modulus` style helper: `(x % modulus)`.
    pub fn rem(&self, modulus: &Self) -> Result<Self> {
        Ok(self.div_rem(modulus)?.1)
    }

    /// `(x % target)` assuming `x < 2 * target`; a single conditional
    /// subtraction, as used after Montgomery reduction.
    pub fn reduce_if_needed(x: &Self, target: &Self) -> Self {
        let (reduced, borrow) = x.sub_with_borrow(target);
        if borrow {
            *x
        } else {
            reduced
        }
    }

    /// `(a + b) mod modulus`, for `a, b < modulus`.
    pub fn add_mod(a: &Self, b: &Self, modulus: &Self) -> Self {
        let (sum, carry) = a.add_with_carry(b);
        if carry || sum >= *modulus {
            sum.wrapping_sub(modulus)
        } else {
            sum
        }
    }

    /// `(a - b) mod modulus`, for `a, b < modulus`.
    pub fn sub_mod(a: &Self, b: &Self, modulus: &Self) -> Self {
        let (diff, borrow) = a.sub_with_borrow(b);
        if borrow {
            diff.wrapping_add(modulus)
        } else {
            diff
        }
    }

    /// `(a * b) mod modulus` by shift-and-add, for `a, b < modulus`. Not for
    /// hot paths; Montgomery multiplication covers those.
    pub fn mul_mod(a: &Self, b: &Self, modulus: &Self) -> Self {
        let mut acc = Self::ZERO;
        for i in (0..Self::BITS).rev() {
            acc = Self::add_mod(&acc, &acc, modulus);
            if b.bit(i) {
                acc = Self::add_mod(&acc, a, modulus);
            }
        }
        acc
    }

    /// The inverse of `value` modulo `modulus`, by the extended Euclidean
    /// algorithm with the Bezout coefficient tracked modulo `modulus`.
    pub fn inverse_mod(value: &Self, modulus: &Self) -> Result<Self> {
        if value.is_zero() {
            return Err(Error::ArithmeticDomain(
                "zero does not have an inverse".to_string(),
            ));
        }
        let mut r0 = *modulus;
        let mut r1 = value.rem(modulus)?;
        let mut t0 = Self::ZERO;
        let mut t1 = Self::one();
        while !r1.is_zero() {
            let (q, r2) = r0.div_rem(&r1)?;
            let qt1 = Self::mul_mod(&q.rem(modulus)?, &t1, modulus);
            let t2 = Self::sub_mod(&t0, &qt1, modulus);
            r0 = r1;
            r1 = r2;
            t0 = t1;
            t1 = t2;
        }
        if r0 != Self::one() {
            return Err(Error::ArithmeticDomain(
                "value is not invertible modulo the given modulus".to_string(),
            ));
        }
        Ok(t0)
    }

    /// `x * y / 2^(64N) mod modulus` (CIOS), where `m_prime` is
    /// `(-modulus^-1) mod 2^64`. Requires the modulus msb to be clear; the
    /// result is in `[0, 2 * modulus)` and callers finish with
    /// `reduce_if_needed`.
    pub fn mont_mul(x: &Self, y: &Self, modulus: &Self, m_prime: u64) -> Self {
        debug_assert!(!modulus.is_msb_set());
        let mut t = [0u64; N];
        let mut t_n: u64 = 0;
        let mut t_n1: u64 = 0;
        for i in 0..N {
            let mut carry = 0u64;
            for j in 0..N {
                let (lo, hi) = mac(t[j], x.0[i], y.0[j], carry);
                t[j] = lo;
                carry = hi;
            }
            let (s, c) = t_n.overflowing_add(carry);
            t_n = s;
            t_n1 = c as u64;

            // Add the multiple of the modulus that zeroes the low limb, then
            // shift one limb right.
            let u = t[0].wrapping_mul(m_prime);
            let (_, mut carry) = mac(t[0], u, modulus.0[0], 0);
            for j in 1..N {
                let (lo, hi) = mac(t[j], u, modulus.0[j], carry);
                t[j - 1] = lo;
                carry = hi;
            }
            let (s, c) = t_n.overflowing_add(carry);
            t[N - 1] = s;
            t_n = t_n1 + c as u64;
            t_n1 = 0;
        }
        debug_assert_eq!(t_n, 0);
        Self(t)
    }

    pub fn to_bytes(&self, out: &mut [u8], big_endian: bool) {
        assert_eq!(out.len(), Self::size_in_bytes());
        if big_endian {
            for (i, limb) in self.0.iter().rev().enumerate() {
                out[8 * i..8 * (i + 1)].copy_from_slice(&limb.to_be_bytes());
            }
        } else {
            for (i, limb) in self.0.iter().enumerate() {
                out[8 * i..8 * (i + 1)].copy_from_slice(&limb.to_le_bytes());
            }
        }
    }

    pub fn from_bytes(bytes: &[u8], big_endian: bool) -> Result<Self> {
        if bytes.len() != Self::size_in_bytes() {
            return Err(Error::InvalidParameter(format!(
                "expected {} bytes, got {}",
                Self::size_in_bytes(),
                bytes.len()
            )));
        }
        let mut limbs = [0u64; N];
        for i in 0..N {
            let chunk = &bytes[8 * i..8 * (i + 1)];
            limbs[if big_endian { N - 1 - i } else { i }] = if big_endian {
                u64::from_be_bytes(chunk.try_into().unwrap())
            } else {
                u64::from_le_bytes(chunk.try_into().unwrap())
            };
        }
        Ok(Self(limbs))
    }

    /// Parses a hexadecimal string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        if digits.is_empty() || digits.len() > 16 * N {
            return Err(Error::InvalidParameter(format!("bad hex literal: {s:?}")));
        }
        let mut out = Self::ZERO;
        for c in digits.chars() {
            let d = c
                .to_digit(16)
                .ok_or_else(|| Error::InvalidParameter(format!("bad hex literal: {s:?}")))?;
            if out.num_leading_zeros() < 4 {
                return Err(Error::InvalidParameter(format!("hex literal overflows: {s:?}")));
            }
            out = out.shl(4);
            out.0[0] |= d as u64;
        }
        Ok(out)
    }

    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = vec![0u8; Self::size_in_bytes()];
        rng.fill_bytes(&mut bytes);
        Self::from_bytes(&bytes, false).unwrap()
    }
}

impl<const N: usize> PartialOrd for BigInt<N> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<const N: usize> Ord for BigInt<N> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        for i in (0..N).rev() {
            match self.0[i].cmp(&other.0[i]) {
                core::cmp::Ordering::Equal => continue,
                ord => return ord,
            }
        }
        core::cmp::Ordering::Equal
    }
}

impl<const N: usize> core::fmt::Display for BigInt<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let top = self.0.iter().rposition(|&l| l != 0);
        match top {
            None => write!(f, "0x0"),
            Some(top) => {
                write!(f, "0x{:x}", self.0[top])?;
                for i in (0..top).rev() {
                    write!(f, "{:016x}", self.0[i])?;
                }
                Ok(())
            }
        }
    }
}

impl<const N: usize> core::fmt::Debug for BigInt<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

impl<const N: usize> Default for BigInt<N> {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use proptest::prelude::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    type B4 = BigInt<4>;

    fn b4(s: &str) -> B4 {
        B4::from_hex(s).unwrap()
    }

    #[test]
    fn add_sub_round_trip() {
        let a = b4("0x123456789abcdef0fedcba9876543210");
        let b = b4("0xffffffffffffffffffffffffffffffffffffffff");
        let (sum, carry) = a.add_with_carry(&b);
        assert!(!carry);
        let (diff, borrow) = sum.sub_with_borrow(&b);
        assert!(!borrow);
        assert_eq!(diff, a);
    }

    #[test]
    fn sub_underflow_reported() {
        let (_, borrow) = B4::ZERO.sub_with_borrow(&B4::one());
        assert!(borrow);
    }

    #[test]
    fn widening_mul_known_value() {
        // (2^64 - 1)^2 = 2^128 - 2^65 + 1.
        let a = B4::from_u64(u64::MAX);
        let prod: BigInt<8> = a.widening_mul(&a);
        assert_eq!(prod.limbs()[0], 1);
        assert_eq!(prod.limbs()[1], u64::MAX - 1);
        assert!(prod.limbs()[2..].iter().all(|&l| l == 0));
    }

    #[test]
    fn div_rem_recombines() {
        let a = b4("0x7ffd4ab5e008810ffffffffff6f800000000001330ffffffffffd737e000401");
        let d = b4("0x123456789abcdef01");
        let (q, r) = a.div_rem(&d).unwrap();
        assert!(r < d);
        let qd: BigInt<8> = q.widening_mul(&d);
        let back = qd.resize::<4>().wrapping_add(&r);
        assert_eq!(back, a);
    }

    #[test]
    fn div_by_zero_is_an_error() {
        assert!(B4::one().div_rem(&B4::ZERO).is_err());
    }

    #[test]
    fn inverse_mod_known_prime() {
        let p = b4("0x800000000000011000000000000000000000000000000000000000000000001");
        let x = b4("0x1234567890abcdef1234567890abcdef");
        let inv = B4::inverse_mod(&x, &p).unwrap();
        assert_eq!(B4::mul_mod(&x, &inv, &p), B4::one());
    }

    #[test]
    fn inverse_of_zero_fails() {
        let p = b4("0x800000000000011000000000000000000000000000000000000000000000001");
        assert!(B4::inverse_mod(&B4::ZERO, &p).is_err());
    }

    #[test]
    fn mont_mul_matches_mul_mod() {
        // Stark prime parameters.
        let p = b4("0x800000000000011000000000000000000000000000000000000000000000001");
        let r2 = b4("0x7ffd4ab5e008810ffffffffff6f800000000001330ffffffffffd737e000401");
        let m_prime = u64::MAX;
        let mut rng = SmallRng::seed_from_u64(17);
        for _ in 0..50 {
            let a = B4::random(&mut rng).rem(&p).unwrap();
            let b = B4::random(&mut rng).rem(&p).unwrap();
            // mont_mul(mont_mul(a, b), R^2) == a * b mod p, since the two
            // divisions by R cancel against R^2.
            let ab_over_r = B4::reduce_if_needed(&B4::mont_mul(&a, &b, &p, m_prime), &p);
            let ab = B4::reduce_if_needed(&B4::mont_mul(&ab_over_r, &r2, &p, m_prime), &p);
            assert_eq!(ab, B4::mul_mod(&a, &b, &p));
        }
    }

    #[test]
    fn big_endian_serialization_vector() {
        let x = b4("0x37ffd4ab5e008810ffffffffff6f800000000001330ffffffffffd737e000401");
        let mut out = [0u8; 32];
        x.to_bytes(&mut out, true);
        assert_eq!(
            out,
            hex!("37ffd4ab5e008810ffffffffff6f800000000001330ffffffffffd737e000401")
        );
        assert_eq!(B4::from_bytes(&out, true).unwrap(), x);
    }

    #[test]
    fn display_round_trips() {
        let x = b4("0x37ffd4ab5e008810ffffffffff6f800000000001330ffffffffffd737e000401");
        assert_eq!(
            x.to_string(),
            "0x37ffd4ab5e008810ffffffffff6f800000000001330ffffffffffd737e000401"
        );
        assert_eq!(B4::ZERO.to_string(), "0x0");
    }

    #[test]
    fn shifts() {
        let x = b4("0x1f0000000000000003");
        assert_eq!(x.shr(1), b4("0xf8000000000000001"));
        assert_eq!(x.shl(4), b4("0x1f00000000000000030"));
        assert_eq!(x.shr(64), b4("0x1f"));
    }

    #[test]
    fn log2_and_pow2_checks() {
        assert_eq!(b4("0x1").log2_floor(), 0);
        assert_eq!(b4("0x10000000000000000").log2_floor(), 64);
        assert!(b4("0x10000000000000000").is_power_of_two());
        assert!(!b4("0x10000000000000001").is_power_of_two());
        assert_eq!(b4("0x5").log2_ceil(), 3);
    }

    proptest! {
        #[test]
        fn bytes_round_trip(a in any::<u64>(), b in any::<u64>(), c in any::<u64>(), d in any::<u64>()) {
            let x = B4::from_limbs([a, b, c, d]);
            let mut be = [0u8; 32];
            let mut le = [0u8; 32];
            x.to_bytes(&mut be, true);
            x.to_bytes(&mut le, false);
            prop_assert_eq!(B4::from_bytes(&be, true).unwrap(), x);
            prop_assert_eq!(B4::from_bytes(&le, false).unwrap(), x);
            let mut le_rev = le;
            le_rev.reverse();
            prop_assert_eq!(le_rev, be);
        }

        #[test]
        fn add_mod_sub_mod_inverse(a in any::<u64>(), b in any::<u64>()) {
            let p = b4("0x800000000000011000000000000000000000000000000000000000000000001");
            let a = B4::from_u64(a);
            let b = B4::from_u64(b);
            let s = B4::add_mod(&a, &b, &p);
            prop_assert_eq!(B4::sub_mod(&s, &b, &p), a);
        }
    }
}
