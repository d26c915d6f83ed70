//! The constraint-system interface the core is written against. An AIR
//! declares its trace shape, the neighborhood its constraints read (the
//! mask), and a combined fraction-valued constraint evaluator; the
//! composition layer turns that into a low-degree polynomial claim.

use quarry_field::{FftField, FractionField};
use quarry_lde::PeriodicColumn;

use crate::context::TraceGenerationContext;
use crate::trace::Trace;

/// Shape of an AIR's optional second (interaction) trace.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InteractionParams {
    /// Challenges drawn from the channel after the first trace commitment.
    pub n_interaction_elements: usize,
    pub n_columns_first: usize,
    pub n_columns_total: usize,
}

impl InteractionParams {
    pub fn n_interaction_columns(&self) -> usize {
        self.n_columns_total - self.n_columns_first
    }
}

pub trait Air<F: FftField>: Send + Sync {
    /// Must be a power of two.
    fn trace_length(&self) -> usize;

    /// Total number of columns, interaction columns included.
    fn num_columns(&self) -> usize;

    fn num_constraints(&self) -> usize;

    /// The number of random coefficients `constraints_eval` consumes.
    fn num_random_coefficients(&self) -> usize;

    /// Strict upper bound on the composition polynomial's degree when the
    /// trace satisfies every constraint. A power-of-two multiple of the
    /// trace length.
    fn composition_polynomial_degree_bound(&self) -> usize;

    /// `(row_offset, column_index)` pairs: constraint `j` may read column
    /// `c` at `x * g^r` exactly when `(r, c)` is in the mask.
    fn mask(&self) -> &[(usize, usize)];

    /// `sum_j alpha_j * numerator_j / denominator_j` evaluated at `point`,
    /// with `neighbors` in mask order and `periodic_values` in
    /// `periodic_columns` order.
    fn constraints_eval(
        &self,
        neighbors: &[F],
        periodic_values: &[F],
        random_coefficients: &[F],
        point: &F,
    ) -> FractionField<F>;

    fn periodic_columns(&self) -> Vec<PeriodicColumn<F>> {
        Vec::new()
    }

    fn interaction_params(&self) -> Option<InteractionParams> {
        None
    }

    /// Builds the second trace from the first and the channel-drawn
    /// interaction elements. Only called when `interaction_params` is
    /// `Some`.
    fn build_interaction_trace(&self, _first: &Trace<F>, _interaction_elements: &[F]) -> Trace<F> {
        panic!("this AIR declares no interaction");
    }

    /// A copy of this AIR with the interaction elements bound, so its
    /// constraints can reference them. Only called when
    /// `interaction_params` is `Some`.
    fn with_interaction_elements(&self, _elements: &[F]) -> Self
    where
        Self: Sized,
    {
        panic!("this AIR declares no interaction");
    }

    fn trace_generation_context(&self) -> TraceGenerationContext {
        TraceGenerationContext::new()
    }
}

/// `alpha_{2j} * x^adjustment + alpha_{2j+1}`: lifts constraint `j` so the
/// combined composition saturates `degree_bound - 1` regardless of the
/// constraint's own degree.
pub fn degree_adjustment_factor<F: FftField>(
    random_coefficients: &[F],
    constraint_index: usize,
    point_pow_adjustment: F,
) -> F {
    random_coefficients[2 * constraint_index] * point_pow_adjustment
        + random_coefficients[2 * constraint_index + 1]
}
