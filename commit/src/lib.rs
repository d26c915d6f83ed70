//! Table commitments: Merkle trees over field-element rows, with
//! channel-streamed multi-query decommitments. The core consumes this
//! through `TableProver`/`TableVerifier`; the tree itself is an internal
//! detail other schemes could replace.

mod merkle;
mod table;

pub use merkle::{verify_decommitment, MerkleTree};
pub use table::{RowCol, TableProver, TableVerifier};
