//! A committed table of field-element rows: the prover accumulates rows
//! (from any thread), commits a Merkle root over the row digests, and later
//! decommits individual cells. The verifier reconstructs queried rows from
//! decommitted cells plus values it already derived itself, and checks them
//! against the root.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use tracing::instrument;

use quarry_channel::{ProverChannel, VerifierChannel};
use quarry_field::Field;
use quarry_hash::{Digest, Hasher};
use quarry_util::{task, Error, Result};

use crate::merkle::{verify_decommitment, MerkleTree};

/// A cell address inside a committed table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RowCol {
    pub row: u64,
    pub col: u64,
}

impl RowCol {
    pub fn new(row: u64, col: u64) -> Self {
        Self { row, col }
    }
}

fn hash_row<F: Field, H: Hasher>(row: &[F]) -> Digest {
    let mut bytes = Vec::with_capacity(row.len() * F::SIZE_IN_BYTES);
    for value in row {
        bytes.extend_from_slice(&value.to_bytes_vec(true));
    }
    H::hash_bytes(&bytes)
}

pub struct TableProver<F: Field, H: Hasher> {
    n_rows: usize,
    n_columns: usize,
    rows: Mutex<Vec<Option<Vec<F>>>>,
    tree: Option<MerkleTree<H>>,
    data: Vec<Vec<F>>,
}

impl<F: Field, H: Hasher> TableProver<F, H> {
    pub fn new(n_rows: usize, n_columns: usize) -> Self {
        Self {
            n_rows,
            n_columns,
            rows: Mutex::new(vec![None; n_rows]),
            tree: None,
            data: Vec::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    /// Adds one row. Thread-safe; rows may arrive in any order, each
    /// exactly once.
    pub fn add_row(&self, row_index: usize, values: &[F]) {
        assert_eq!(values.len(), self.n_columns, "wrong row width");
        let mut rows = self.rows.lock().unwrap();
        assert!(rows[row_index].is_none(), "row {row_index} written twice");
        rows[row_index] = Some(values.to_vec());
    }

    /// Seals the table, builds the tree and sends the root.
    #[instrument(skip_all)]
    pub fn commit(&mut self, channel: &mut ProverChannel<H>) -> Result<Digest> {
        let rows = std::mem::take(&mut *self.rows.lock().unwrap());
        let mut data = Vec::with_capacity(self.n_rows);
        for (i, row) in rows.into_iter().enumerate() {
            data.push(row.ok_or_else(|| {
                Error::InvalidParameter(format!("row {i} was never added"))
            })?);
        }
        let leaves = task::parallel_map(data.len(), |i| hash_row::<F, H>(&data[i]));
        let tree = MerkleTree::<H>::build(leaves);
        let root = tree.root();
        channel.send_commitment_hash(&root);
        self.tree = Some(tree);
        self.data = data;
        Ok(root)
    }

    pub fn value_at(&self, row: usize, col: usize) -> F {
        self.data[row][col]
    }

    /// Sends the queried cells followed by the Merkle authentication nodes.
    /// `queries` must be sorted and duplicate-free; only cells the verifier
    /// cannot derive itself belong here.
    pub fn decommit_queries(&self, queries: &[RowCol], channel: &mut ProverChannel<H>) {
        let tree = self.tree.as_ref().expect("decommit before commit");
        for query in queries {
            let value = self.data[query.row as usize][query.col as usize];
            channel.send_decommitment_field_elements(&[value]);
        }
        let rows: BTreeSet<u64> = queries.iter().map(|q| q.row).collect();
        let rows: Vec<u64> = rows.into_iter().collect();
        tree.decommit(&rows, channel);
    }
}

pub struct TableVerifier<F: Field, H: Hasher> {
    n_rows: usize,
    n_columns: usize,
    root: Digest,
    _marker: core::marker::PhantomData<(F, H)>,
}

impl<F: Field, H: Hasher> TableVerifier<F, H> {
    /// Reads the commitment root from the channel.
    pub fn new(n_rows: usize, n_columns: usize, channel: &mut VerifierChannel<H>) -> Result<Self> {
        Ok(Self {
            n_rows,
            n_columns,
            root: channel.receive_commitment_hash()?,
            _marker: core::marker::PhantomData,
        })
    }

    pub fn root(&self) -> Digest {
        self.root
    }

    /// Reads the cells for `data_queries` from the channel, merges them
    /// with `integrity_values` (cells whose values the verifier computed on
    /// its own), and checks the decommitment. Every touched row must be
    /// fully covered by the union. Returns the merged cell map.
    pub fn verify_decommitment(
        &self,
        data_queries: &[RowCol],
        integrity_values: &BTreeMap<RowCol, F>,
        channel: &mut VerifierChannel<H>,
    ) -> Result<BTreeMap<RowCol, F>> {
        let mut cells = integrity_values.clone();
        for query in data_queries {
            let value = channel.receive_decommitment_field_elements::<F>(1)?[0];
            cells.insert(*query, value);
        }

        let mut row_values: BTreeMap<u64, Vec<F>> = BTreeMap::new();
        for (cell, value) in &cells {
            row_values.entry(cell.row).or_default().push(*value);
        }
        let mut leaf_digests = BTreeMap::new();
        for (row, values) in &row_values {
            if values.len() != self.n_columns {
                return Err(Error::ProofInvalid(format!(
                    "row {row} is not fully covered by queries"
                )));
            }
            leaf_digests.insert(*row, hash_row::<F, H>(values));
        }

        if !verify_decommitment::<H>(&self.root, self.n_rows, &leaf_digests, channel)? {
            return Err(Error::ProofInvalid("table decommitment mismatch".to_string()));
        }
        Ok(cells)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use quarry_field::TestField;
    use quarry_hash::Blake3Hasher;

    use super::*;

    type F = TestField;
    type H = Blake3Hasher;

    fn build_table(rng: &mut SmallRng, n_rows: usize, n_columns: usize) -> Vec<Vec<F>> {
        (0..n_rows)
            .map(|_| (0..n_columns).map(|_| F::random(rng)).collect())
            .collect()
    }

    fn commit_table(
        data: &[Vec<F>],
        channel: &mut ProverChannel<H>,
    ) -> TableProver<F, H> {
        let mut prover = TableProver::<F, H>::new(data.len(), data[0].len());
        for (i, row) in data.iter().enumerate() {
            prover.add_row(i, row);
        }
        prover.commit(channel).unwrap();
        prover
    }

    #[test]
    fn full_row_decommit_round_trip() {
        let mut rng = SmallRng::seed_from_u64(1);
        let data = build_table(&mut rng, 16, 3);
        let mut prover_channel = ProverChannel::<H>::new_with_seed(&[0; 4]);
        let prover = commit_table(&data, &mut prover_channel);

        let queries: Vec<RowCol> = (0..3).map(|c| RowCol::new(5, c)).collect();
        prover.decommit_queries(&queries, &mut prover_channel);

        let mut verifier_channel =
            VerifierChannel::<H>::new_with_seed(&[0; 4], prover_channel.proof().to_vec());
        let verifier = TableVerifier::<F, H>::new(16, 3, &mut verifier_channel).unwrap();
        let cells = verifier
            .verify_decommitment(&queries, &BTreeMap::new(), &mut verifier_channel)
            .unwrap();
        for query in &queries {
            assert_eq!(cells[query], data[5][query.col as usize]);
        }
    }

    #[test]
    fn integrity_values_fill_rows() {
        let mut rng = SmallRng::seed_from_u64(2);
        let data = build_table(&mut rng, 8, 4);
        let mut prover_channel = ProverChannel::<H>::new_with_seed(&[1; 4]);
        let prover = commit_table(&data, &mut prover_channel);

        // The verifier already knows columns 0 and 1 of row 2; only 2 and 3
        // travel as data.
        let data_queries = vec![RowCol::new(2, 2), RowCol::new(2, 3)];
        prover.decommit_queries(&data_queries, &mut prover_channel);

        let mut integrity = BTreeMap::new();
        integrity.insert(RowCol::new(2, 0), data[2][0]);
        integrity.insert(RowCol::new(2, 1), data[2][1]);

        let mut verifier_channel =
            VerifierChannel::<H>::new_with_seed(&[1; 4], prover_channel.proof().to_vec());
        let verifier = TableVerifier::<F, H>::new(8, 4, &mut verifier_channel).unwrap();
        assert!(verifier
            .verify_decommitment(&data_queries, &integrity, &mut verifier_channel)
            .is_ok());
    }

    #[test]
    fn wrong_integrity_value_rejects() {
        let mut rng = SmallRng::seed_from_u64(3);
        let data = build_table(&mut rng, 8, 2);
        let mut prover_channel = ProverChannel::<H>::new_with_seed(&[2; 4]);
        let prover = commit_table(&data, &mut prover_channel);

        let data_queries = vec![RowCol::new(4, 1)];
        prover.decommit_queries(&data_queries, &mut prover_channel);

        let mut integrity = BTreeMap::new();
        integrity.insert(RowCol::new(4, 0), data[4][0] + F::one());

        let mut verifier_channel =
            VerifierChannel::<H>::new_with_seed(&[2; 4], prover_channel.proof().to_vec());
        let verifier = TableVerifier::<F, H>::new(8, 2, &mut verifier_channel).unwrap();
        assert!(matches!(
            verifier.verify_decommitment(&data_queries, &integrity, &mut verifier_channel),
            Err(Error::ProofInvalid(_))
        ));
    }

    #[test]
    fn concurrent_adds_commit() {
        let mut rng = SmallRng::seed_from_u64(4);
        let data = build_table(&mut rng, 32, 2);
        let mut prover = TableProver::<F, H>::new(32, 2);
        std::thread::scope(|scope| {
            let (first, second) = data.split_at(16);
            let prover_ref = &prover;
            scope.spawn(move || {
                for (i, row) in first.iter().enumerate() {
                    prover_ref.add_row(i, row);
                }
            });
            scope.spawn(move || {
                for (i, row) in second.iter().enumerate() {
                    prover_ref.add_row(16 + i, row);
                }
            });
        });
        let mut channel = ProverChannel::<H>::new_with_seed(&[3; 4]);
        assert!(prover.commit(&mut channel).is_ok());
    }

    #[test]
    fn missing_row_fails_commit() {
        let prover = TableProver::<F, H>::new(4, 1);
        prover.add_row(0, &[F::one()]);
        let mut prover = prover;
        let mut channel = ProverChannel::<H>::new_with_seed(&[4; 4]);
        assert!(prover.commit(&mut channel).is_err());
    }

    #[test]
    #[should_panic(expected = "written twice")]
    fn double_write_panics() {
        let prover = TableProver::<F, H>::new(4, 1);
        prover.add_row(1, &[F::one()]);
        prover.add_row(1, &[F::one()]);
    }
}
