//! FRI: the Fast Reed-Solomon IOP of proximity. A committed evaluation is
//! folded through `fri_step`-ary rounds down to an explicitly transmitted
//! low-degree polynomial; queries spot-check every fold against per-round
//! table commitments.

mod details;
mod folder;
mod parameters;
mod prover;
mod verifier;


pub use details::{
    apply_fri_layers, draw_query_indices, next_layer_data_and_integrity_queries,
    second_layer_queries_to_first_layer_queries,
};
pub use folder::{fold_layer, fold_pair};
pub use parameters::FriParameters;
pub use prover::prove_fri;
pub use verifier::verify_fri;
