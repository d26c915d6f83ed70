//! Shared utilities for the Quarry workspace: integer math helpers,
//! bit-reversal permutations, the common error type and the task layer that
//! all parallel loops go through.

mod error;

pub mod bit_reversal;
pub mod math;
pub mod task;

pub use error::{Error, Result};
