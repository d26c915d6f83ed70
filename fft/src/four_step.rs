//! The four-step ("Bailey") FFT for large bit-reversed transforms:
//! transpose, column FFTs over the coset-offsets domain, a twiddle pass,
//! transpose back, and per-coset row FFTs. Each pass is cache-friendly and
//! embarrassingly parallel; the split-to-cosets identity of the bases makes
//! the index bookkeeping exact.

use tracing::info_span;

use quarry_field::{FftField, Field};
use quarry_util::task;

use crate::bases::{MultiplicativeFftBases, MultiplicativeGroupOrdering};
use crate::fft::FftPrecompute;

/// Transforms at or above this size go through the four-step path when no
/// precompute is supplied.
pub const FOUR_STEP_MIN_LOG_SIZE: usize = 18;

/// Forward FFT over bit-reversed bases (natural coefficients in,
/// bit-reversed evaluations out), decomposed as `2^log_cosets` transforms
/// of the small subgroup.
///
/// Writing `n = 2^k * 2^c` with coset offsets `o_s`, the coefficient of
/// `x^(j2 * 2^k + m)` contributes to coset `s` as
/// `o_s^m * C_m(o_s^(2^k)) * G^(t m)`: the inner evaluations are `2^k`
/// column FFTs of size `2^c`, the outer ones `2^c` row FFTs of size `2^k`.
pub fn fft_four_step<F: FftField>(
    bases: &MultiplicativeFftBases<F>,
    src: &[F],
    dst: &mut [F],
) {
    assert_eq!(bases.order(), MultiplicativeGroupOrdering::BitReversed);
    let log_n = bases.log_size();
    assert_eq!(src.len(), 1 << log_n);
    assert_eq!(src.len(), dst.len());
    let _span = info_span!("fft_four_step", log_n).entered();

    let log_cosets = log_n / 2;
    let log_rows = log_n - log_cosets;
    let n_cosets = 1usize << log_cosets;
    let row_len = 1usize << log_rows;

    let (row_bases, offsets) = bases.split_to_cosets(log_cosets).expect("split fits");

    // The column polynomials C_m are evaluated at o_s^(2^k); those points
    // form the bit-reversed domain generated by g^(2^k) at offset
    // h^(2^k).
    let mut column_offset = bases.first_layer().offset();
    for _ in 0..log_rows {
        column_offset = column_offset.square();
    }
    // In the bit-reversed basis [g^(2^(n-1)), ..., g], the generator of the
    // order-2^c subgroup sits at index log_cosets - 1.
    let column_generator = bases.first_layer().basis()[log_cosets - 1];
    let column_bases = MultiplicativeFftBases::from_generator(
        column_generator,
        log_cosets,
        column_offset,
        MultiplicativeGroupOrdering::BitReversed,
    )
    .expect("subgroup generator has the right order");

    // Step 1: transpose so each column polynomial is contiguous.
    let mut columns = vec![F::zero(); src.len()];
    transpose::transpose(src, &mut columns, row_len, n_cosets);

    // Step 2: column FFTs.
    let column_pre = FftPrecompute::new(&column_bases);
    task::parallel_for_each_chunk(&mut columns, n_cosets, |_, column| {
        column_pre.fft_in_place(column);
    });

    // Step 3: twiddle by offset powers, column m scaled by o_s^m.
    let mut offset_powers = vec![F::one(); n_cosets];
    for m in 0..row_len {
        let column = &mut columns[m * n_cosets..(m + 1) * n_cosets];
        for (value, power) in column.iter_mut().zip(offset_powers.iter_mut()) {
            if m > 0 {
                *value *= *power;
            }
        }
        for (power, &offset) in offset_powers.iter_mut().zip(offsets.iter()) {
            *power *= offset;
        }
    }

    // Step 4: transpose back and run the per-coset row FFTs; the offsets
    // are already folded into the coefficients, so the row bases carry no
    // offset.
    transpose::transpose(&columns, dst, n_cosets, row_len);
    let row_pre = FftPrecompute::new(&row_bases);
    task::parallel_for_each_chunk(dst, row_len, |_, row| {
        row_pre.fft_in_place(row);
    });
}
