//! Batched and vectorized field operations shared by the FFT, LDE and
//! composition layers.

use quarry_util::{Error, Result};

use crate::traits::Field;

/// Inverts every element of `input` with a single field inversion
/// (prefix-product trick). Fails on any zero input.
pub fn batch_inverse<F: Field>(input: &[F]) -> Result<Vec<F>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let mut prefix = Vec::with_capacity(input.len());
    let mut acc = F::one();
    for &x in input {
        if x.is_zero() {
            return Err(Error::ArithmeticDomain(
                "batch inverse of a vector containing zero".to_string(),
            ));
        }
        acc *= x;
        prefix.push(acc);
    }
    let mut inv = prefix[input.len() - 1].inverse();
    let mut out = vec![F::zero(); input.len()];
    for i in (1..input.len()).rev() {
        out[i] = inv * prefix[i - 1];
        inv *= input[i];
    }
    out[0] = inv;
    Ok(out)
}

/// In-place variant of `batch_inverse`.
pub fn batch_inverse_in_place<F: Field>(values: &mut [F]) -> Result<()> {
    let inverses = batch_inverse(values)?;
    values.copy_from_slice(&inverses);
    Ok(())
}

/// `sum_i coefs[i] * point^i`, coefficients in natural order.
pub fn horner_eval<F: Field>(point: F, coefs: &[F]) -> F {
    let mut result = F::zero();
    for &c in coefs.iter().rev() {
        result = result * point + c;
    }
    result
}

/// Horner evaluation of a coefficient vector stored in bit-reversed order.
/// The first half of such a vector holds the even coefficients (themselves
/// bit-reversed), the second half the odd ones, so
/// `f(x) = E(x^2) + x * O(x^2)` recurses in linear time.
pub fn horner_eval_bit_reversed<F: Field>(point: F, coefs: &[F]) -> F {
    assert!(coefs.len().is_power_of_two(), "length must be a power of two");
    if coefs.len() == 1 {
        return coefs[0];
    }
    let (even, odd) = coefs.split_at(coefs.len() / 2);
    let point_squared = point.square();
    horner_eval_bit_reversed(point_squared, even)
        + point * horner_eval_bit_reversed(point_squared, odd)
}

/// `[1, base, base^2, ..., base^(n-1)]`.
pub fn powers<F: Field>(base: F, n: usize) -> Vec<F> {
    let mut out = Vec::with_capacity(n);
    let mut acc = F::one();
    for _ in 0..n {
        out.push(acc);
        acc *= base;
    }
    out
}

/// `[x, x^2, x^4, ..., x^(2^(n-1))]`.
pub fn squares<F: Field>(x: F, n: usize) -> Vec<F> {
    let mut out = Vec::with_capacity(n);
    let mut acc = x;
    for _ in 0..n {
        out.push(acc);
        acc = acc.square();
    }
    out
}

/// `sum_i coefficients[i] * values[i]`.
pub fn inner_product<F: Field>(coefficients: &[F], values: &[F]) -> F {
    assert_eq!(coefficients.len(), values.len());
    coefficients
        .iter()
        .zip(values.iter())
        .fold(F::zero(), |acc, (&c, &v)| acc + c * v)
}
