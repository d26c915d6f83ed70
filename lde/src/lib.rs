//! Low-degree extension: interpolate once, evaluate anywhere. Includes the
//! caching layer used by committed traces and the compact periodic columns
//! consumed by composition polynomials.

mod cached;
mod lde;
mod periodic;

pub use cached::CachedLdeManager;
pub use lde::LdeManager;
pub use periodic::{CosetEvaluation, CosetEvaluationIter, PeriodicColumn};
