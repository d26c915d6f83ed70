//! The FRI verifier: replays the commit phase to derive the same challenge
//! sequence, then checks every query by folding decommitted cosets layer by
//! layer down to the last-layer polynomial.

use std::collections::BTreeMap;

use tracing::instrument;

use quarry_channel::{Channel, VerifierChannel};
use quarry_commit::{RowCol, TableVerifier};
use quarry_field::{ops, FftField};
use quarry_hash::Hasher;
use quarry_util::{Error, Result};

use crate::details::{
    apply_fri_layers, draw_query_indices, next_layer_data_and_integrity_queries,
    second_layer_queries_to_first_layer_queries,
};
use crate::parameters::FriParameters;

/// Verifies a FRI proof read from `channel`. `first_layer_callback`
/// receives the first-layer query positions and must return the claimed
/// first-layer values there, validating them against whatever commitment
/// the caller made (reading any decommitment data it needs from the
/// channel).
#[instrument(skip_all)]
pub fn verify_fri<F, H, C>(
    params: &FriParameters<F>,
    channel: &mut VerifierChannel<H>,
    mut first_layer_callback: C,
) -> Result<()>
where
    F: FftField,
    H: Hasher,
    C: FnMut(&[u64], &mut VerifierChannel<H>) -> Result<Vec<F>>,
{
    let n_rounds = params.n_rounds();

    // Commit phase: the same draw/observe interleaving as the prover.
    let mut eval_points: Vec<F> = Vec::with_capacity(n_rounds);
    let mut tables: Vec<TableVerifier<F, H>> = Vec::new();
    for round in 0..n_rounds {
        eval_points.push(channel.get_random_field_element());
        if round + 1 < n_rounds {
            let width = 1usize << params.fri_step_list[round + 1];
            let n_rows = (params.layer_domain_size(round + 1) as usize) / width;
            tables.push(TableVerifier::new(n_rows, width, channel)?);
        }
    }
    let last_layer_coefficients: Vec<F> =
        channel.receive_field_elements(params.last_layer_degree_bound)?;

    // Query phase.
    channel.apply_proof_of_work(params.proof_of_work_bits)?;
    let mut query_indices = draw_query_indices(channel, params);
    query_indices.dedup();

    let first_layer_queries =
        second_layer_queries_to_first_layer_queries(&query_indices, params);
    let first_layer_values = first_layer_callback(&first_layer_queries, channel)?;
    if first_layer_values.len() != first_layer_queries.len() {
        return Err(Error::ProofInvalid(
            "first layer callback returned the wrong number of values".to_string(),
        ));
    }

    // Fold the first-layer cosets into the first committed layer.
    let first_coset_size = 1usize << params.fri_step_list[0];
    let mut current: BTreeMap<u64, F> = BTreeMap::new();
    for (block, &query) in query_indices.iter().enumerate() {
        let coset = &first_layer_values[block * first_coset_size..(block + 1) * first_coset_size];
        current.insert(
            query,
            apply_fri_layers(
                coset,
                eval_points[0],
                params,
                0,
                query * first_coset_size as u64,
            ),
        );
    }

    // Middle rounds: decommitted data cells plus derived integrity cells
    // reconstruct each queried coset, which folds into the next round.
    for round in 1..n_rounds {
        let shift = params.query_index_shift(round);
        let round_step = params.fri_step_list[round];
        let row_mask = (1u64 << round_step) - 1;

        let mut integrity_values: BTreeMap<RowCol, F> = BTreeMap::new();
        for (&query, &value) in &current {
            let layer_index = query >> shift;
            let cell = RowCol::new(layer_index >> round_step, layer_index & row_mask);
            if let Some(&existing) = integrity_values.get(&cell) {
                if existing != value {
                    return Err(Error::ProofInvalid(format!(
                        "inconsistent folded values in FRI round {round}"
                    )));
                }
            }
            integrity_values.insert(cell, value);
        }

        let (data_queries, _) =
            next_layer_data_and_integrity_queries(&query_indices, params, round);
        let data_queries: Vec<RowCol> = data_queries.into_iter().collect();
        let cells = tables[round - 1]
            .verify_decommitment(&data_queries, &integrity_values, channel)
            .map_err(|e| match e {
                Error::ProofInvalid(msg) => {
                    Error::ProofInvalid(format!("FRI round {round}: {msg}"))
                }
                other => other,
            })?;

        let mut next: BTreeMap<u64, F> = BTreeMap::new();
        for &query in &query_indices {
            let row = (query >> shift) >> round_step;
            let coset: Vec<F> = (0..=row_mask)
                .map(|col| cells[&RowCol::new(row, col)])
                .collect();
            next.insert(
                query,
                apply_fri_layers(
                    &coset,
                    eval_points[round],
                    params,
                    round,
                    row << round_step,
                ),
            );
        }
        current = next;
    }

    // Last layer: every folded value must match the transmitted polynomial.
    let final_shift = params.query_index_shift(n_rounds);
    let last_domain = params.fft_bases.at(params.total_fri_steps());
    for (&query, &value) in &current {
        let point = last_domain.at(query >> final_shift);
        if ops::horner_eval(point, &last_layer_coefficients) != value {
            return Err(Error::ProofInvalid(
                "FRI last layer evaluation mismatch".to_string(),
            ));
        }
    }
    Ok(())
}
