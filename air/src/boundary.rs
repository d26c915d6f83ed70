//! The boundary AIR: asserts `column(x0) = y0` for a list of conditions by
//! exposing the constraints `(column(x) - y0) / (x - x0)`. Each condition
//! gets one random coefficient; the combined composition has degree
//! `trace_length - 2` exactly when every condition holds.

use quarry_field::{FftField, FractionField};

use crate::air::Air;

#[derive(Clone, Debug)]
pub struct BoundaryCondition<F: FftField> {
    pub column_index: usize,
    pub point_x: F,
    pub value_y: F,
}

pub struct BoundaryAir<F: FftField> {
    trace_length: usize,
    n_columns: usize,
    conditions: Vec<BoundaryCondition<F>>,
    mask: Vec<(usize, usize)>,
}

impl<F: FftField> BoundaryAir<F> {
    pub fn new(
        trace_length: usize,
        n_columns: usize,
        conditions: Vec<BoundaryCondition<F>>,
    ) -> Self {
        assert!(conditions.iter().all(|c| c.column_index < n_columns));
        // Row offset zero for every column; conditions only look at x.
        let mask = (0..n_columns).map(|c| (0, c)).collect();
        Self { trace_length, n_columns, conditions, mask }
    }
}

impl<F: FftField> Air<F> for BoundaryAir<F> {
    fn trace_length(&self) -> usize {
        self.trace_length
    }

    fn num_columns(&self) -> usize {
        self.n_columns
    }

    fn num_constraints(&self) -> usize {
        self.conditions.len()
    }

    fn num_random_coefficients(&self) -> usize {
        self.conditions.len()
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
        let mut result = FractionField::zero();
        for (condition, &coefficient) in self.conditions.iter().zip(random_coefficients) {
            let numerator = coefficient * (neighbors[condition.column_index] - condition.value_y);
            let denominator = *point - condition.point_x;
            result += FractionField::new(numerator, denominator);
        }
        result
    }
}
