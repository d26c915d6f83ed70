//! Evaluates the composition polynomial
//! `C(x) = sum_j alpha_j * num_j(mask(x), periodic(x), x) / denom_j(x)`
//! on trace-sized cosets. Mask reads are index shifts on the evaluated
//! coset; denominators accumulate as fractions and are inverted in one
//! batch per coset.

use tracing::info_span;

use quarry_air::Air;
use quarry_field::{ops, FftField, Field, FractionField};
use quarry_lde::{CosetEvaluation, PeriodicColumn};
use quarry_util::bit_reversal::bit_reverse;
use quarry_util::math::safe_log2;
use quarry_util::{task, Error, Result};

/// Rows per parallel work item.
const ROW_CHUNK: usize = 256;

pub struct CompositionPolynomial<'a, F: FftField, A: Air<F>> {
    air: &'a A,
    trace_generator: F,
    random_coefficients: Vec<F>,
    periodic_columns: Vec<PeriodicColumn<F>>,
}

impl<'a, F: FftField, A: Air<F>> CompositionPolynomial<'a, F, A> {
    pub fn new(air: &'a A, trace_generator: F, random_coefficients: Vec<F>) -> Result<Self> {
        if random_coefficients.len() != air.num_random_coefficients() {
            return Err(Error::InvalidParameter(format!(
                "expected {} random coefficients, got {}",
                air.num_random_coefficients(),
                random_coefficients.len()
            )));
        }
        Ok(Self {
            air,
            trace_generator,
            random_coefficients,
            periodic_columns: air.periodic_columns(),
        })
    }

    pub fn degree_bound(&self) -> usize {
        self.air.composition_polynomial_degree_bound()
    }

    pub fn trace_generator(&self) -> F {
        self.trace_generator
    }

    /// One point, given the mask values around it.
    pub fn eval_at_point(&self, point: F, neighbors: &[F]) -> F {
        let periodic_values: Vec<F> = self
            .periodic_columns
            .iter()
            .map(|column| column.eval_at_point(point))
            .collect();
        self.air
            .constraints_eval(neighbors, &periodic_values, &self.random_coefficients, &point)
            .to_field()
    }

    /// Evaluates `C` on the coset `coset_offset * <g>`, writing results in
    /// bit-reversed order. `trace_evaluations` holds each column's
    /// evaluation on the same coset in natural order; mask row offsets
    /// become cyclic index shifts.
    pub fn eval_on_coset_bit_reversed(
        &self,
        coset_offset: F,
        trace_evaluations: &[&[F]],
        output: &mut [F],
    ) -> Result<()> {
        let trace_length = self.air.trace_length();
        let log_length = safe_log2(trace_length as u64);
        assert_eq!(output.len(), trace_length);
        assert_eq!(trace_evaluations.len(), self.air.num_columns());
        let _span = info_span!("composition_eval_on_coset", trace_length).entered();

        let mask = self.air.mask();
        let periodic_cosets: Vec<CosetEvaluation<F>> = self
            .periodic_columns
            .iter()
            .map(|column| column.get_coset(coset_offset, trace_length as u64))
            .collect::<Result<_>>()?;

        // Per-point fractions, chunked across workers; points advance
        // multiplicatively inside a chunk.
        let n_chunks = trace_length.div_ceil(ROW_CHUNK);
        let fractions: Vec<Vec<FractionField<F>>> = task::parallel_map(n_chunks, |chunk_index| {
            let start = chunk_index * ROW_CHUNK;
            let end = (start + ROW_CHUNK).min(trace_length);
            let mut point = coset_offset * self.trace_generator.pow_u64(start as u64);
            let mut neighbors = vec![F::zero(); mask.len()];
            let mut periodic_values = vec![F::zero(); periodic_cosets.len()];
            let mut local = Vec::with_capacity(end - start);
            for row in start..end {
                for (slot, &(row_offset, column)) in neighbors.iter_mut().zip(mask.iter()) {
                    *slot = trace_evaluations[column][(row + row_offset) & (trace_length - 1)];
                }
                for (slot, coset) in periodic_values.iter_mut().zip(periodic_cosets.iter()) {
                    *slot = coset.at(row as u64);
                }
                local.push(self.air.constraints_eval(
                    &neighbors,
                    &periodic_values,
                    &self.random_coefficients,
                    &point,
                ));
                point *= self.trace_generator;
            }
            local
        });

        // One inversion for the whole coset.
        let denominators: Vec<F> = fractions
            .iter()
            .flatten()
            .map(|fraction| fraction.denominator())
            .collect();
        let inverses = ops::batch_inverse(&denominators)?;
        for (row, (fraction, inverse)) in
            fractions.iter().flatten().zip(inverses.iter()).enumerate()
        {
            output[bit_reverse(row as u64, log_length) as usize] =
                fraction.numerator() * *inverse;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use quarry_air::{BoundaryAir, BoundaryCondition};
    use quarry_fft::{MultiplicativeFftBases, MultiplicativeGroupOrdering};
    use quarry_lde::LdeManager;

    use super::*;

    type F = quarry_field::TestField;

    #[test]
    fn coset_evaluation_matches_pointwise() {
        let mut rng = SmallRng::seed_from_u64(1);
        let trace_length = 32usize;
        let g = F::subgroup_generator(5).unwrap();

        let conditions = vec![
            BoundaryCondition {
                column_index: 0,
                point_x: F::from_u64(3),
                value_y: F::from_u64(17),
            },
            BoundaryCondition {
                column_index: 1,
                point_x: F::from_u64(11),
                value_y: F::from_u64(23),
            },
        ];
        let air = BoundaryAir::new(trace_length, 2, conditions);
        let coefficients = vec![F::random(&mut rng), F::random(&mut rng)];
        let composition = CompositionPolynomial::new(&air, g, coefficients).unwrap();

        // Random trace columns, extended to an off-domain coset.
        let bases = MultiplicativeFftBases::new(
            5,
            F::one(),
            MultiplicativeGroupOrdering::Natural,
        )
        .unwrap();
        let mut lde = LdeManager::new(bases);
        for _ in 0..2 {
            let column: Vec<F> = (0..trace_length).map(|_| F::random(&mut rng)).collect();
            lde.add_evaluation(&column);
        }
        let coset_offset = F::generator();
        let mut trace_evaluations = vec![vec![F::zero(); trace_length]; 2];
        lde.eval_on_coset(coset_offset, &mut trace_evaluations);

        let mut output = vec![F::zero(); trace_length];
        let column_views: Vec<&[F]> =
            trace_evaluations.iter().map(|column| column.as_slice()).collect();
        composition
            .eval_on_coset_bit_reversed(coset_offset, &column_views, &mut output)
            .unwrap();

        for row in 0..trace_length {
            let point = coset_offset * g.pow_u64(row as u64);
            let neighbors = [trace_evaluations[0][row], trace_evaluations[1][row]];
            let expected = composition.eval_at_point(point, &neighbors);
            let log_length = 5;
            assert_eq!(
                output[bit_reverse(row as u64, log_length) as usize],
                expected,
                "row {row}"
            );
        }
    }

    #[test]
    fn coefficient_count_is_validated() {
        let air: BoundaryAir<F> = BoundaryAir::new(8, 1, vec![]);
        let g = F::subgroup_generator(3).unwrap();
        assert!(CompositionPolynomial::new(&air, g, vec![F::one()]).is_err());
    }

    /// An AIR whose single constraint compares the trace column against a
    /// periodic column, exercising the periodic wiring of both evaluation
    /// paths.
    struct PeriodicMatchAir {
        trace_length: usize,
        values: Vec<F>,
        mask: Vec<(usize, usize)>,
    }

    impl quarry_air::Air<F> for PeriodicMatchAir {
        fn trace_length(&self) -> usize {
            self.trace_length
        }
        fn num_columns(&self) -> usize {
            1
        }
        fn num_constraints(&self) -> usize {
            1
        }
        fn num_random_coefficients(&self) -> usize {
            1
        }
        fn composition_polynomial_degree_bound(&self) -> usize {
            self.trace_length
        }
        fn mask(&self) -> &[(usize, usize)] {
            &self.mask
        }
        fn periodic_columns(&self) -> Vec<quarry_lde::PeriodicColumn<F>> {
            let g = F::subgroup_generator(5).unwrap();
            vec![quarry_lde::PeriodicColumn::new(
                &self.values,
                g,
                F::one(),
                self.trace_length as u64,
                1,
            )
            .unwrap()]
        }
        fn constraints_eval(
            &self,
            neighbors: &[F],
            periodic_values: &[F],
            random_coefficients: &[F],
            point: &F,
        ) -> FractionField<F> {
            // (column(x) - periodic(x)) / (x^L - 1).
            FractionField::new(
                random_coefficients[0] * (neighbors[0] - periodic_values[0]),
                point.pow_u64(self.trace_length as u64) - F::one(),
            )
        }
    }

    #[test]
    fn periodic_columns_reach_the_constraint_evaluator() {
        let mut rng = SmallRng::seed_from_u64(3);
        let trace_length = 32usize;
        let values: Vec<F> = (0..8).map(|_| F::random(&mut rng)).collect();
        let air = PeriodicMatchAir {
            trace_length,
            values: values.clone(),
            mask: vec![(0, 0)],
        };

        // A trace repeating the periodic values satisfies the constraint.
        let matching: Vec<F> =
            (0..trace_length).map(|i| values[i % values.len()]).collect();
        let satisfied =
            crate::compute_composition_degree(&air, quarry_air::Trace::new(vec![matching]), &[F::from_u64(7)], 2)
                .unwrap();
        assert!(satisfied < trace_length as i64, "degree {satisfied}");

        // A mismatching trace saturates the sampled domain.
        let broken: Vec<F> = (0..trace_length).map(|_| F::random(&mut rng)).collect();
        let unsatisfied =
            crate::compute_composition_degree(&air, quarry_air::Trace::new(vec![broken]), &[F::from_u64(7)], 2)
                .unwrap();
        assert_eq!(unsatisfied, 2 * trace_length as i64 - 1);
    }
}
