//! Splits a polynomial of degree below `d * 2^log_breaks` into
//! `2^log_breaks` polynomials of degree below `d`, with
//! `f(x) = sum_i x^i * h_i(x^(2^log_breaks))`. The split applies
//! `log_breaks` inverse-FFT layers to an evaluation of `f`, yielding each
//! `h_i` evaluated on the `log_breaks`-th layer domain.

use quarry_fft::{FftPrecompute, MultiplicativeFftBases, MultiplicativeGroupOrdering};
use quarry_field::{ops, FftField, Field};
use quarry_util::task;
use quarry_util::{Error, Result};

pub struct PolynomialBreak<F: FftField> {
    bases: MultiplicativeFftBases<F>,
    log_breaks: usize,
    ifft_precompute: FftPrecompute<F>,
}

impl<F: FftField> PolynomialBreak<F> {
    pub fn new(bases: MultiplicativeFftBases<F>, log_breaks: usize) -> Result<Self> {
        if log_breaks > bases.num_layers() {
            return Err(Error::InvalidParameter(
                "number of breaks cannot exceed the coset size".to_string(),
            ));
        }
        let ifft_precompute = FftPrecompute::inverse(&bases);
        Ok(Self { bases, log_breaks, ifft_precompute })
    }

    pub fn n_breaks(&self) -> usize {
        1 << self.log_breaks
    }

    /// The domain each broken-out `h_i` is evaluated on.
    pub fn broken_domain(&self) -> &quarry_fft::FftDomain<F> {
        self.bases.at(self.log_breaks)
    }

    /// Splits an evaluation of `f` on the bases' first layer into the
    /// `h_i` evaluations, chunk `i` holding `h_i` in bit-reversed bases
    /// (the natural-order chunks are indexed by bit-reversed `i`; the
    /// matching `eval_from_samples` pairing makes that transparent).
    pub fn break_evaluation(&self, evaluation: &[F]) -> Vec<Vec<F>> {
        assert_eq!(evaluation.len() as u64, self.bases.size(), "wrong evaluation size");
        let n_breaks = self.n_breaks();
        let chunk_size = evaluation.len() >> self.log_breaks;
        let correction = F::from_u64(n_breaks as u64).inverse();

        let mut temp = vec![F::zero(); evaluation.len()];
        self.ifft_precompute
            .ifft_layers(evaluation, &mut temp, self.log_breaks);

        if self.bases.is_natural_order() {
            // Sub-polynomial evaluations land in contiguous blocks.
            let mut chunks: Vec<Vec<F>> = temp
                .chunks(chunk_size)
                .map(|chunk| chunk.to_vec())
                .collect();
            for chunk in &mut chunks {
                for value in chunk.iter_mut() {
                    *value *= correction;
                }
            }
            chunks
        } else {
            // Bit-reversed layers interleave the sub-polynomials; gather
            // every n_breaks-th element.
            task::parallel_map(n_breaks, |break_idx| {
                (0..chunk_size)
                    .map(|i| temp[i * n_breaks + break_idx] * correction)
                    .collect()
            })
        }
    }

    /// Reassembles `f(x) = sum_i x^i * h_i(x^(2^log_breaks))` from the
    /// per-chunk values at a single position.
    pub fn eval_from_samples(&self, samples: &[F], point: F) -> F {
        assert_eq!(samples.len(), self.n_breaks(), "wrong number of samples");
        eval_from_samples_with_order(self.bases.order(), samples, point)
    }
}

/// The reassembly sum without a breaker instance; the chunk-to-exponent
/// pairing only depends on the ordering.
pub fn eval_from_samples_with_order<F: FftField>(
    order: MultiplicativeGroupOrdering,
    samples: &[F],
    point: F,
) -> F {
    match order {
        MultiplicativeGroupOrdering::Natural => ops::horner_eval_bit_reversed(point, samples),
        MultiplicativeGroupOrdering::BitReversed => ops::horner_eval(point, samples),
    }
}
