//! The execution trace: an ordered tuple of equal-length columns of field
//! values. Owned by the prover during generation and consumed by the LDE
//! once committed.

use quarry_field::Field;
use quarry_util::math::is_power_of_two;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trace<F: Field> {
    columns: Vec<Vec<F>>,
}

impl<F: Field> Trace<F> {
    pub fn new(columns: Vec<Vec<F>>) -> Self {
        assert!(!columns.is_empty(), "trace must have at least one column");
        let length = columns[0].len();
        assert!(is_power_of_two(length as u64), "trace length must be a power of two");
        assert!(
            columns.iter().all(|c| c.len() == length),
            "all columns must have the same length"
        );
        Self { columns }
    }

    /// An all-zero trace, for incremental generation through virtual
    /// columns.
    pub fn zeroed(n_columns: usize, length: usize) -> Self {
        Self::new(vec![vec![F::zero(); length]; n_columns])
    }

    pub fn length(&self) -> usize {
        self.columns[0].len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> &[F] {
        &self.columns[index]
    }

    pub fn columns(&self) -> &[Vec<F>] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Vec<F>] {
        &mut self.columns
    }

    pub fn get(&self, column: usize, row: usize) -> F {
        self.columns[column][row]
    }

    pub fn set(&mut self, column: usize, row: usize, value: F) {
        self.columns[column][row] = value;
    }

    pub fn into_columns(self) -> Vec<Vec<F>> {
        self.columns
    }

    /// Appends the columns of `other`; lengths must agree.
    pub fn append_columns(&mut self, other: Trace<F>) {
        assert_eq!(self.length(), other.length(), "column length mismatch");
        self.columns.extend(other.columns);
    }
}
