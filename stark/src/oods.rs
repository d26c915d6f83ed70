//! Out-of-domain sampling: the DEEP combination
//! `sum_j gamma_j (f_cj(x) - f_cj(z g^rj)) / (x - z g^rj)
//!  + sum_i gamma'_i (h_i(x) - h_i(z^(2^b))) / (x - z^(2^b))`,
//! which is low-degree exactly when the transmitted out-of-domain values
//! are the committed polynomials' true evaluations.

use quarry_field::{FftField, Field};
use quarry_util::{Error, Result};

/// The DEEP combination's fixed data: the sampled point, the claimed
/// out-of-domain values and the channel-drawn coefficients.
pub struct DeepComposition<F: FftField> {
    mask: Vec<(usize, usize)>,
    /// `z * g^r` per mask entry.
    mask_points: Vec<F>,
    /// `z^(2^log_breaks)`, the point the broken columns are quotiented at.
    break_point: F,
    mask_values: Vec<F>,
    break_values: Vec<F>,
    coefficients: Vec<F>,
}

impl<F: FftField> DeepComposition<F> {
    pub fn new(
        mask: &[(usize, usize)],
        trace_generator: F,
        oods_point: F,
        log_breaks: usize,
        mask_values: Vec<F>,
        break_values: Vec<F>,
        coefficients: Vec<F>,
    ) -> Self {
        assert_eq!(mask.len(), mask_values.len());
        assert_eq!(coefficients.len(), mask.len() + break_values.len());
        let mask_points = mask
            .iter()
            .map(|&(row_offset, _)| oods_point * trace_generator.pow_u64(row_offset as u64))
            .collect();
        let mut break_point = oods_point;
        for _ in 0..log_breaks {
            break_point = break_point.square();
        }
        Self {
            mask: mask.to_vec(),
            mask_points,
            break_point,
            mask_values,
            break_values,
            coefficients,
        }
    }

    pub fn mask_points(&self) -> &[F] {
        &self.mask_points
    }

    pub fn break_point(&self) -> F {
        self.break_point
    }

    pub fn n_terms(&self) -> usize {
        self.coefficients.len()
    }

    /// The combination at `x`, with denominator inverses supplied by the
    /// caller (batched by the prover, per-query by the verifier).
    pub fn combine(
        &self,
        trace_row: &[F],
        break_row: &[F],
        mask_denominator_inverses: &[F],
        break_denominator_inverse: F,
    ) -> F {
        debug_assert_eq!(break_row.len(), self.break_values.len());
        let mut result = F::zero();
        for (j, &(_, column)) in self.mask.iter().enumerate() {
            result += self.coefficients[j]
                * (trace_row[column] - self.mask_values[j])
                * mask_denominator_inverses[j];
        }
        let offset = self.mask.len();
        for (i, &value) in self.break_values.iter().enumerate() {
            result += self.coefficients[offset + i]
                * (break_row[i] - value)
                * break_denominator_inverse;
        }
        result
    }

    /// Single-point evaluation for the verifier's query checks. Fails if
    /// `x` collides with a sampled point.
    pub fn eval_at_row(&self, x: F, trace_row: &[F], break_row: &[F]) -> Result<F> {
        let mask_inverses: Vec<F> = self
            .mask_points
            .iter()
            .map(|&point| {
                (x - point).try_inverse().ok_or_else(|| {
                    Error::ArithmeticDomain(
                        "query point collides with the out-of-domain sample".to_string(),
                    )
                })
            })
            .collect::<Result<_>>()?;
        let break_inverse = (x - self.break_point).try_inverse().ok_or_else(|| {
            Error::ArithmeticDomain(
                "query point collides with the out-of-domain sample".to_string(),
            )
        })?;
        Ok(self.combine(trace_row, break_row, &mask_inverses, break_inverse))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    type F = quarry_field::TestField;

    #[test]
    fn zero_differences_give_zero() {
        // When the claimed values equal the row values, every quotient
        // numerator vanishes.
        let mut rng = SmallRng::seed_from_u64(1);
        let mask = [(0usize, 0usize), (1, 1)];
        let g = F::subgroup_generator(4).unwrap();
        let z = F::random(&mut rng);
        let trace_row = vec![F::random(&mut rng), F::random(&mut rng)];
        let break_row = vec![F::random(&mut rng)];
        let deep = DeepComposition::new(
            &mask,
            g,
            z,
            1,
            vec![trace_row[0], trace_row[1]],
            break_row.clone(),
            vec![F::random(&mut rng); 3],
        );
        let x = F::from_u64(12345);
        assert_eq!(deep.eval_at_row(x, &trace_row, &break_row).unwrap(), F::zero());
    }

    #[test]
    fn linear_in_the_coefficients() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mask = [(0usize, 0usize)];
        let g = F::subgroup_generator(4).unwrap();
        let z = F::random(&mut rng);
        let trace_row = vec![F::random(&mut rng)];
        let break_row = vec![F::random(&mut rng)];
        let mask_value = F::random(&mut rng);
        let break_value = F::random(&mut rng);
        let x = F::from_u64(999);

        let eval_with = |coefficients: Vec<F>| {
            DeepComposition::new(
                &mask,
                g,
                z,
                0,
                vec![mask_value],
                vec![break_value],
                coefficients,
            )
            .eval_at_row(x, &trace_row, &break_row)
            .unwrap()
        };
        let a = eval_with(vec![F::one(), F::zero()]);
        let b = eval_with(vec![F::zero(), F::one()]);
        let c1 = F::random(&mut rng);
        let c2 = F::random(&mut rng);
        assert_eq!(eval_with(vec![c1, c2]), c1 * a + c2 * b);
    }

    #[test]
    fn break_point_is_iterated_square() {
        let mask: [(usize, usize); 0] = [];
        let z = F::from_u64(3);
        let deep = DeepComposition::new(
            &mask,
            F::one(),
            z,
            3,
            vec![],
            vec![F::zero()],
            vec![F::one()],
        );
        assert_eq!(deep.break_point(), z.pow_u64(8));
    }
}
