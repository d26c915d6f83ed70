//! Prime-field arithmetic for Quarry.
//!
//! The crate provides fixed-width `BigInt` limbs, the `Field`/`FftField`
//! capability traits, a family of Montgomery prime fields sharing one
//! generic implementation, two small single-limb fields, a quadratic
//! extension, the fraction field used by constraint evaluators, and batched
//! helpers (batch inverse, Horner evaluation in both coefficient orders).

mod big_int;
mod extension;
mod fraction;
mod long_field;
mod prime_field;
mod test_field;
mod traits;

pub mod ops;

pub use big_int::BigInt;
pub use extension::ExtensionField;
pub use fraction::FractionField;
pub use long_field::LongField;
pub use prime_field::{
    Prime124, Prime124Params, Prime252Sparse, Prime252SparseParams, Prime254A, Prime254AParams,
    Prime254B, Prime254BParams, Prime255, Prime255Params, PrimeField, PrimeFieldParams, Stark252,
    Stark252Params,
};
pub use test_field::TestField;
pub use traits::{FftField, Field};
