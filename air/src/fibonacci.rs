//! A two-column Fibonacci AIR, the standard smoke-test constraint system:
//! each row holds `(a, b)` and the next row must be `(b, a + b)`, with
//! boundary conditions pinning the first row and the claimed result.

use quarry_field::{FftField, Field, FractionField};
use quarry_util::math::safe_log2;
use quarry_util::Result;

use crate::air::{degree_adjustment_factor, Air};
use crate::trace::Trace;

pub struct FibonacciAir<F: FftField> {
    trace_length: usize,
    initial_a: F,
    initial_b: F,
    claimed_value: F,
    last_point: F,
    mask: Vec<(usize, usize)>,
}

impl<F: FftField> FibonacciAir<F> {
    pub fn new(trace_length: usize, initial_a: F, initial_b: F, claimed_value: F) -> Result<Self> {
        let log_length = safe_log2(trace_length as u64);
        let generator = F::subgroup_generator(log_length)?;
        Ok(Self {
            trace_length,
            initial_a,
            initial_b,
            claimed_value,
            last_point: generator.pow_u64(trace_length as u64 - 1),
            mask: vec![(0, 0), (0, 1), (1, 0), (1, 1)],
        })
    }

    /// The honest trace for the declared boundary values.
    pub fn generate_trace(&self) -> Trace<F> {
        let mut a_column = Vec::with_capacity(self.trace_length);
        let mut b_column = Vec::with_capacity(self.trace_length);
        let (mut a, mut b) = (self.initial_a, self.initial_b);
        for _ in 0..self.trace_length {
            a_column.push(a);
            b_column.push(b);
            let next = a + b;
            a = b;
            b = next;
        }
        Trace::new(vec![a_column, b_column])
    }

    /// The value an honest trace reaches in its final row.
    pub fn expected_claim(trace_length: usize, initial_a: F, initial_b: F) -> F {
        let (mut a, mut b) = (initial_a, initial_b);
        for _ in 0..trace_length - 1 {
            let next = a + b;
            a = b;
            b = next;
        }
        b
    }
}

impl<F: FftField> Air<F> for FibonacciAir<F> {
    fn trace_length(&self) -> usize {
        self.trace_length
    }

    fn num_columns(&self) -> usize {
        2
    }

    fn num_constraints(&self) -> usize {
        5
    }

    fn num_random_coefficients(&self) -> usize {
        2 * self.num_constraints()
    }

    fn composition_polynomial_degree_bound(&self) -> usize {
        self.trace_length
    }

    fn mask(&self) -> &[(usize, usize)] {
        &self.mask
    }

    fn constraints_eval(
        &self,
        neighbors: &[F],
        _periodic_values: &[F],
        random_coefficients: &[F],
        point: &F,
    ) -> FractionField<F> {
        let [a, b, a_next, b_next] = [neighbors[0], neighbors[1], neighbors[2], neighbors[3]];
        let length = self.trace_length as u64;
        let x_pow_length = point.pow_u64(length);
        let vanishing = x_pow_length - F::one();
        let except_last = *point - self.last_point;
        // Degree-lift factors saturating degree_bound - 1.
        let adjust_transition = point.pow_u64(length - 1);
        let adjust_boundary = *point;

        let mut result = FractionField::zero();
        // Transitions hold everywhere but the last row.
        result += FractionField::new(
            degree_adjustment_factor(random_coefficients, 0, adjust_transition)
                * (a_next - b)
                * except_last,
            vanishing,
        );
        result += FractionField::new(
            degree_adjustment_factor(random_coefficients, 1, adjust_transition)
                * (b_next - a - b)
                * except_last,
            vanishing,
        );
        // First row boundary.
        result += FractionField::new(
            degree_adjustment_factor(random_coefficients, 2, adjust_boundary)
                * (a - self.initial_a),
            *point - F::one(),
        );
        result += FractionField::new(
            degree_adjustment_factor(random_coefficients, 3, adjust_boundary)
                * (b - self.initial_b),
            *point - F::one(),
        );
        // Claimed result in the last row.
        result += FractionField::new(
            degree_adjustment_factor(random_coefficients, 4, adjust_boundary)
                * (b - self.claimed_value),
            except_last,
        );
        result
    }
}
