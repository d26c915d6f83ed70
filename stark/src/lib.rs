//! The STARK orchestrator: wires field, FFT, LDE, composition, channel,
//! commitment and FRI into a prover that emits a proof byte stream and a
//! verifier that accepts or rejects it.

mod committed_trace;
mod config;
mod oods;
mod parameters;
mod prover;
mod verifier;

#[cfg(test)]
mod tests;

pub use committed_trace::CommittedTraceProver;
pub use config::{FieldId, FriConfig, HashId, StarkConfig};
pub use oods::DeepComposition;
pub use parameters::StarkParameters;
pub use prover::prove_stark;
pub use verifier::verify_stark;
