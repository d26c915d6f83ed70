//! The low-degree extension manager: interpolates added evaluations once
//! (one inverse FFT each) and evaluates the stored polynomials on any coset
//! of the source subgroup or at arbitrary points.
//!
//! The inverse FFT treats the source coset `c * <g>` as the unit coset, so
//! the stored coefficients describe `p(c * x)`. Evaluating on `d * <g>`
//! therefore uses the offset `d / c`, and point evaluation maps `x` to
//! `x / c`. This compensation is internal.

use tracing::debug_span;

use quarry_fft::{normalize, FftDomain, FftPrecompute, MultiplicativeFftBases};
use quarry_field::{ops, FftField, Field};
use quarry_util::bit_reversal::bit_reverse;
use quarry_util::task;

pub struct LdeManager<F: FftField> {
    bases: MultiplicativeFftBases<F>,
    /// The source coset offset `c`.
    offset_compensation: F,
    /// Forward/inverse tables over the offset-free source bases.
    forward_precompute: FftPrecompute<F>,
    inverse_precompute: FftPrecompute<F>,
    columns: Vec<Vec<F>>,
}

impl<F: FftField> LdeManager<F> {
    pub fn new(bases: MultiplicativeFftBases<F>) -> Self {
        let offset_compensation = bases.first_layer().offset();
        let unit_bases = bases.shifted(F::one());
        Self {
            forward_precompute: FftPrecompute::new(&unit_bases),
            inverse_precompute: FftPrecompute::inverse(&unit_bases),
            bases,
            offset_compensation,
            columns: Vec::new(),
        }
    }

    pub fn bases(&self) -> &MultiplicativeFftBases<F> {
        &self.bases
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn lde_size(&self) -> usize {
        1 << self.bases.log_size()
    }

    /// Interpolates an evaluation given on the source coset and stores the
    /// coefficients. Future `eval_on_coset` calls extend this polynomial.
    pub fn add_evaluation(&mut self, evaluation: &[F]) {
        assert_eq!(evaluation.len(), self.lde_size(), "wrong evaluation size");
        let _span = debug_span!("lde_add_evaluation").entered();
        let mut coefficients = vec![F::zero(); evaluation.len()];
        self.inverse_precompute.ifft(evaluation, &mut coefficients);
        normalize(&mut coefficients, self.bases.log_size());
        self.columns.push(coefficients);
    }

    /// Stores coefficients directly, in the order `get_coefficients` uses:
    /// bit-reversed for natural-order bases and vice versa.
    pub fn add_from_coefficients(&mut self, coefficients: &[F]) {
        assert_eq!(coefficients.len(), self.lde_size(), "wrong coefficient count");
        self.columns.push(coefficients.to_vec());
    }

    /// Twiddle tables for evaluating on the coset at `coset_offset`,
    /// reusable across columns and calls.
    pub fn fft_precompute(&self, coset_offset: F) -> FftPrecompute<F> {
        self.forward_precompute
            .shifted(coset_offset * self.offset_compensation.inverse())
    }

    /// Evaluates every stored polynomial on the coset at `coset_offset`,
    /// in the order the polynomials were added.
    pub fn eval_on_coset(&self, coset_offset: F, outputs: &mut [Vec<F>]) {
        let precompute = self.fft_precompute(coset_offset);
        self.eval_on_coset_with_precompute(&precompute, outputs);
    }

    pub fn eval_on_coset_with_precompute(
        &self,
        precompute: &FftPrecompute<F>,
        outputs: &mut [Vec<F>],
    ) {
        assert_eq!(outputs.len(), self.columns.len(), "one output per polynomial");
        let _span = debug_span!("lde_eval_on_coset", columns = self.columns.len()).entered();
        for (column, output) in self.columns.iter().zip(outputs.iter_mut()) {
            assert_eq!(output.len(), column.len());
            precompute.fft(column, output);
        }
    }

    /// Evaluates polynomial `evaluation_idx` at arbitrary points.
    pub fn eval_at_points(&self, evaluation_idx: usize, points: &[F], outputs: &mut [F]) {
        assert_eq!(points.len(), outputs.len());
        let column = &self.columns[evaluation_idx];
        let compensation_inv = self.offset_compensation.inverse();
        let natural_order = self.bases.is_natural_order();
        let results = task::parallel_map(points.len(), |i| {
            let point = points[i] * compensation_inv;
            if natural_order {
                ops::horner_eval_bit_reversed(point, column)
            } else {
                ops::horner_eval(point, column)
            }
        });
        outputs.copy_from_slice(&results);
    }

    /// The degree of stored polynomial `evaluation_idx`; -1 for zero.
    pub fn get_evaluation_degree(&self, evaluation_idx: usize) -> i64 {
        let column = &self.columns[evaluation_idx];
        let log_n = self.bases.log_size() as u32;
        let natural_order = self.bases.is_natural_order();
        let mut degree: i64 = -1;
        for (i, coefficient) in column.iter().enumerate() {
            if !coefficient.is_zero() {
                let exponent = if natural_order {
                    bit_reverse(i as u64, log_n)
                } else {
                    i as u64
                };
                degree = degree.max(exponent as i64);
            }
        }
        degree
    }

    /// Stored coefficients of polynomial `evaluation_idx`. For natural-order
    /// bases they are in bit-reversed order, and vice versa.
    pub fn get_coefficients(&self, evaluation_idx: usize) -> &[F] {
        &self.columns[evaluation_idx]
    }

    /// The enumeration domain of a single coset evaluation.
    pub fn get_domain(&self, coset_offset: F) -> FftDomain<F> {
        self.bases.first_layer().shifted(coset_offset)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use quarry_fft::MultiplicativeGroupOrdering::{BitReversed, Natural};
    use quarry_util::bit_reversal::bit_reversed;

    use super::*;

    type F = quarry_field::TestField;

    fn random_vec(rng: &mut SmallRng, n: usize) -> Vec<F> {
        (0..n).map(|_| F::random(rng)).collect()
    }

    #[test]
    fn eval_on_source_coset_is_identity() {
        let mut rng = SmallRng::seed_from_u64(1);
        for order in [Natural, BitReversed] {
            let offset = F::from_u64(13);
            let bases = MultiplicativeFftBases::new(6, offset, order).unwrap();
            let mut manager = LdeManager::new(bases);
            let evaluation = random_vec(&mut rng, 64);
            manager.add_evaluation(&evaluation);
            let mut outputs = vec![vec![F::zero(); 64]];
            manager.eval_on_coset(offset, &mut outputs);
            assert_eq!(outputs[0], evaluation);
        }
    }

    #[test]
    fn eval_at_points_matches_interpolant() {
        let mut rng = SmallRng::seed_from_u64(2);
        for order in [Natural, BitReversed] {
            let offset = F::from_u64(13);
            let bases = MultiplicativeFftBases::new(5, offset, order).unwrap();
            let domain = bases.first_layer().clone();
            let mut manager = LdeManager::new(bases);

            // A known polynomial evaluated on the source domain.
            let coefs = random_vec(&mut rng, 8);
            let evaluation: Vec<F> =
                (0..32).map(|i| ops::horner_eval(domain.at(i), &coefs)).collect();
            manager.add_evaluation(&evaluation);

            let points = random_vec(&mut rng, 7);
            let mut outputs = vec![F::zero(); 7];
            manager.eval_at_points(0, &points, &mut outputs);
            for (point, value) in points.iter().zip(&outputs) {
                assert_eq!(*value, ops::horner_eval(*point, &coefs));
            }
        }
    }

    #[test]
    fn eval_on_other_coset_matches_horner() {
        let mut rng = SmallRng::seed_from_u64(3);
        let source_offset = F::from_u64(7);
        let target_offset = F::from_u64(29);
        let bases = MultiplicativeFftBases::new(5, source_offset, BitReversed).unwrap();
        let source_domain = bases.first_layer().clone();
        let mut manager = LdeManager::new(bases);

        let coefs = random_vec(&mut rng, 32);
        let evaluation: Vec<F> =
            (0..32).map(|i| ops::horner_eval(source_domain.at(i), &coefs)).collect();
        manager.add_evaluation(&evaluation);

        let mut outputs = vec![vec![F::zero(); 32]];
        manager.eval_on_coset(target_offset, &mut outputs);
        let target_domain = manager.get_domain(target_offset);
        for i in 0..32u64 {
            assert_eq!(outputs[0][i as usize], ops::horner_eval(target_domain.at(i), &coefs));
        }
    }

    #[test]
    fn degree_scan_accounts_for_coefficient_order() {
        let mut rng = SmallRng::seed_from_u64(4);
        for order in [Natural, BitReversed] {
            let bases = MultiplicativeFftBases::new(6, F::from_u64(3), order).unwrap();
            let domain = bases.first_layer().clone();
            let mut manager = LdeManager::new(bases);

            for degree in [0usize, 1, 17, 63] {
                let mut coefs = random_vec(&mut rng, degree + 1);
                if coefs[degree].is_zero() {
                    coefs[degree] = F::one();
                }
                let evaluation: Vec<F> =
                    (0..64).map(|i| ops::horner_eval(domain.at(i), &coefs)).collect();
                manager.add_evaluation(&evaluation);
                assert_eq!(
                    manager.get_evaluation_degree(manager.len() - 1),
                    degree as i64
                );
            }
            // The zero polynomial reports -1.
            manager.add_evaluation(&vec![F::zero(); 64]);
            assert_eq!(manager.get_evaluation_degree(manager.len() - 1), -1);
        }
    }

    #[test]
    fn coefficients_round_trip_through_add_from_coefficients() {
        let mut rng = SmallRng::seed_from_u64(5);
        let bases = MultiplicativeFftBases::new(5, F::from_u64(11), Natural).unwrap();
        let mut manager = LdeManager::new(bases);
        let evaluation = random_vec(&mut rng, 32);
        manager.add_evaluation(&evaluation);
        let coefficients = manager.get_coefficients(0).to_vec();

        let bases2 = MultiplicativeFftBases::new(5, F::from_u64(11), Natural).unwrap();
        let mut manager2 = LdeManager::new(bases2);
        manager2.add_from_coefficients(&coefficients);
        let mut outputs = vec![vec![F::zero(); 32]];
        manager2.eval_on_coset(F::from_u64(11), &mut outputs);
        assert_eq!(outputs[0], evaluation);
    }

    #[test]
    fn natural_order_coefficients_are_bit_reversed() {
        // Interpolating x^3 on a natural-order domain must place the
        // coefficient of x^3 at the bit-reversed index.
        let bases = MultiplicativeFftBases::new(4, F::one(), Natural).unwrap();
        let domain = bases.first_layer().clone();
        let mut manager = LdeManager::new(bases);
        let evaluation: Vec<F> = (0..16).map(|i| domain.at(i).pow_u64(3)).collect();
        manager.add_evaluation(&evaluation);
        let mut expected = vec![F::zero(); 16];
        expected[3] = F::one();
        assert_eq!(manager.get_coefficients(0), &bit_reversed(&expected)[..]);
    }
}
