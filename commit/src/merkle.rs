//! A binary Merkle tree over row digests with shared-path multi-query
//! decommitments. Prover and verifier walk the query set in the same
//! (descending node index) order, so the path nodes stream through the
//! channel without any position metadata.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use quarry_channel::{ProverChannel, VerifierChannel};
use quarry_hash::{Digest, Hasher};
use quarry_util::math::is_power_of_two;
use quarry_util::{Error, Result};

pub struct MerkleTree<H: Hasher> {
    /// Heap layout, 1-indexed: node 1 is the root, leaves occupy
    /// `n_leaves..2 * n_leaves`.
    nodes: Vec<Digest>,
    n_leaves: usize,
    _hasher: core::marker::PhantomData<H>,
}

impl<H: Hasher> MerkleTree<H> {
    pub fn build(leaves: Vec<Digest>) -> Self {
        let n_leaves = leaves.len();
        assert!(
            is_power_of_two(n_leaves as u64),
            "number of leaves must be a power of two"
        );
        let mut nodes = vec![Digest::default(); 2 * n_leaves];
        nodes[n_leaves..].copy_from_slice(&leaves);
        for i in (1..n_leaves).rev() {
            nodes[i] = H::hash_pair(&nodes[2 * i], &nodes[2 * i + 1]);
        }
        Self { nodes, n_leaves, _hasher: core::marker::PhantomData }
    }

    pub fn root(&self) -> Digest {
        self.nodes[1]
    }

    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// Sends the authentication nodes for `leaf_indices` (deduplicated,
    /// any order) through the channel.
    pub fn decommit(&self, leaf_indices: &[u64], channel: &mut ProverChannel<H>) {
        let mut pending: BTreeSet<usize> = leaf_indices
            .iter()
            .map(|&i| {
                assert!((i as usize) < self.n_leaves, "leaf index out of range");
                i as usize + self.n_leaves
            })
            .collect();
        while let Some(&node) = pending.iter().next_back() {
            if node == 1 {
                break;
            }
            pending.remove(&node);
            let sibling = node ^ 1;
            if pending.contains(&sibling) {
                pending.remove(&sibling);
            } else {
                channel.send_decommitment_node(&self.nodes[sibling]);
            }
            pending.insert(node / 2);
        }
    }
}

/// Recomputes the root from known leaf digests plus path nodes read from
/// the channel, in the prover's emission order.
pub fn verify_decommitment<H: Hasher>(
    root: &Digest,
    n_leaves: usize,
    leaf_digests: &BTreeMap<u64, Digest>,
    channel: &mut VerifierChannel<H>,
) -> Result<bool> {
    if leaf_digests.is_empty() {
        return Err(Error::InvalidParameter("no leaves to verify".to_string()));
    }
    let mut pending: BTreeMap<usize, Digest> = leaf_digests
        .iter()
        .map(|(&i, &digest)| (i as usize + n_leaves, digest))
        .collect();
    loop {
        let (&node, &digest) = pending.iter().next_back().unwrap();
        if node == 1 {
            return Ok(digest == *root);
        }
        pending.remove(&node);
        let sibling = node ^ 1;
        let sibling_digest = match pending.remove(&sibling) {
            Some(known) => known,
            None => channel.receive_decommitment_node()?,
        };
        let (left, right) = if node % 2 == 0 {
            (digest, sibling_digest)
        } else {
            (sibling_digest, digest)
        };
        pending.insert(node / 2, H::hash_pair(&left, &right));
    }
}

#[cfg(test)]
mod tests {
    use quarry_channel::VerifierChannel;
    use quarry_hash::{Blake3Hasher, Hasher};

    use super::*;

    type H = Blake3Hasher;

    fn leaves(n: usize) -> Vec<Digest> {
        (0..n).map(|i| H::hash_bytes(&(i as u64).to_be_bytes())).collect()
    }

    fn round_trip(n: usize, queries: &[u64]) -> bool {
        let tree = MerkleTree::<H>::build(leaves(n));
        let mut prover = ProverChannel::<H>::new_with_seed(&[0; 4]);
        tree.decommit(queries, &mut prover);

        let leaf_digests: BTreeMap<u64, Digest> = queries
            .iter()
            .map(|&i| (i, H::hash_bytes(&i.to_be_bytes())))
            .collect();
        let mut verifier = VerifierChannel::<H>::new_with_seed(&[0; 4], prover.proof().to_vec());
        verify_decommitment(&tree.root(), n, &leaf_digests, &mut verifier).unwrap()
    }

    #[test]
    fn single_query() {
        assert!(round_trip(16, &[5]));
    }

    #[test]
    fn multiple_queries_share_paths() {
        assert!(round_trip(64, &[0, 1, 2, 3, 40, 41, 63]));
    }

    #[test]
    fn all_leaves_no_path_needed() {
        let queries: Vec<u64> = (0..8).collect();
        let tree = MerkleTree::<H>::build(leaves(8));
        let mut prover = ProverChannel::<H>::new_with_seed(&[0; 4]);
        tree.decommit(&queries, &mut prover);
        // Every sibling is known; the proof carries no nodes.
        assert!(prover.proof().is_empty());
        assert!(round_trip(8, &queries));
    }

    #[test]
    fn wrong_leaf_rejected() {
        let tree = MerkleTree::<H>::build(leaves(16));
        let mut prover = ProverChannel::<H>::new_with_seed(&[0; 4]);
        tree.decommit(&[3], &mut prover);

        let mut bad_leaves = BTreeMap::new();
        bad_leaves.insert(3u64, H::hash_bytes(b"tampered"));
        let mut verifier = VerifierChannel::<H>::new_with_seed(&[0; 4], prover.proof().to_vec());
        assert!(!verify_decommitment(&tree.root(), 16, &bad_leaves, &mut verifier).unwrap());
    }

    #[test]
    fn truncated_path_is_proof_too_short() {
        let tree = MerkleTree::<H>::build(leaves(16));
        let mut prover = ProverChannel::<H>::new_with_seed(&[0; 4]);
        tree.decommit(&[3], &mut prover);
        let mut truncated = prover.proof().to_vec();
        truncated.truncate(32);

        let mut leaf_digests = BTreeMap::new();
        leaf_digests.insert(3u64, H::hash_bytes(&3u64.to_be_bytes()));
        let mut verifier = VerifierChannel::<H>::new_with_seed(&[0; 4], truncated);
        assert!(matches!(
            verify_decommitment(&tree.root(), 16, &leaf_digests, &mut verifier),
            Err(Error::ProofTooShort { .. })
        ));
    }
}
