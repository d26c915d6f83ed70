//! The composition layer: random linear combination of AIR constraints
//! divided by their vanishing polynomials, evaluated over cosets, plus the
//! polynomial breaker that splits it for commitment.

mod breaker;
mod composition;
mod degree;

pub use breaker::{eval_from_samples_with_order, PolynomialBreak};
pub use composition::CompositionPolynomial;
pub use degree::compute_composition_degree;
