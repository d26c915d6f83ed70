//! Measures the actual degree of a composition polynomial by evaluating it
//! over several trace-sized cosets and interpolating. Satisfied constraint
//! systems come out below the declared bound; violated ones saturate the
//! sampled domain.

use quarry_air::{Air, Trace};
use quarry_fft::{MultiplicativeFftBases, MultiplicativeGroupOrdering};
use quarry_field::{FftField, Field};
use quarry_lde::LdeManager;
use quarry_util::math::safe_log2;
use quarry_util::Result;

use crate::composition::CompositionPolynomial;

/// Interpolates `C` over `n_cosets` cosets (offset by the field generator)
/// and returns its exact degree.
pub fn compute_composition_degree<F: FftField, A: Air<F>>(
    air: &A,
    trace: Trace<F>,
    random_coefficients: &[F],
    n_cosets: usize,
) -> Result<i64> {
    let trace_length = air.trace_length();
    let log_length = safe_log2(trace_length as u64) as usize;
    let log_cosets = safe_log2(n_cosets as u64) as usize;
    let trace_generator = F::subgroup_generator(log_length as u32)?;

    // The evaluation domain: n_cosets trace-sized cosets of one large
    // coset, offset by the field generator to avoid the trace domain.
    let big_bases = MultiplicativeFftBases::<F>::new(
        log_length + log_cosets,
        F::generator(),
        MultiplicativeGroupOrdering::BitReversed,
    )?;
    let (_, coset_offsets) = big_bases.split_to_cosets(log_cosets)?;

    let trace_bases = MultiplicativeFftBases::new(
        log_length,
        F::one(),
        MultiplicativeGroupOrdering::Natural,
    )?;
    let mut lde = LdeManager::new(trace_bases);
    for column in trace.columns() {
        lde.add_evaluation(column);
    }

    let composition =
        CompositionPolynomial::new(air, trace_generator, random_coefficients.to_vec())?;

    // Bit-reversed big-domain enumeration is the concatenation of the
    // per-coset bit-reversed evaluations.
    let mut big_evaluation = vec![F::zero(); trace_length << log_cosets];
    let mut trace_evaluations = vec![vec![F::zero(); trace_length]; trace.width()];
    for (coset_index, &offset) in coset_offsets.iter().enumerate() {
        lde.eval_on_coset(offset, &mut trace_evaluations);
        let column_views: Vec<&[F]> =
            trace_evaluations.iter().map(|column| column.as_slice()).collect();
        let block =
            &mut big_evaluation[coset_index * trace_length..(coset_index + 1) * trace_length];
        composition.eval_on_coset_bit_reversed(offset, &column_views, block)?;
    }

    let mut big_lde = LdeManager::new(big_bases);
    big_lde.add_evaluation(&big_evaluation);
    Ok(big_lde.get_evaluation_degree(0))
}
