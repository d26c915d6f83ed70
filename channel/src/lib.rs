//! The Fiat-Shamir transcript: a hash-chain PRNG and the prover/verifier
//! channels that absorb messages and emit challenges deterministically.

mod channel;
mod hash_chain;
mod prng;

pub use channel::{Channel, ProverChannel, VerifierChannel};
pub use hash_chain::HashChain;
pub use prng::Prng;
