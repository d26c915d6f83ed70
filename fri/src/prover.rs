//! The FRI prover: iterated folding of a committed evaluation, per-layer
//! table commitments, the last-layer coefficients, and the query-phase
//! decommitments. The first layer is committed by the caller (in the STARK
//! it is the DEEP composition, answered through trace decommitments), so
//! its queries are delegated to a callback.

use tracing::{info_span, instrument};

use quarry_channel::{Channel, ProverChannel};
use quarry_commit::{RowCol, TableProver};
use quarry_field::{FftField, Field};
use quarry_hash::Hasher;
use quarry_lde::LdeManager;
use quarry_util::{Error, Result};

use crate::details::{
    draw_query_indices, next_layer_data_and_integrity_queries,
    second_layer_queries_to_first_layer_queries,
};
use crate::folder::fold_layer;
use crate::parameters::FriParameters;

/// Proves that `witness` (an evaluation on the parameters' first layer, in
/// bit-reversed order) is close to a polynomial of degree below
/// `first_layer_size / 2^total_fri_steps * last_layer_degree_bound`-ish
/// bound; precisely, folds to degree < `last_layer_degree_bound`.
#[instrument(skip_all)]
pub fn prove_fri<F, H, C>(
    params: &FriParameters<F>,
    witness: Vec<F>,
    channel: &mut ProverChannel<H>,
    mut first_layer_callback: C,
) -> Result<()>
where
    F: FftField,
    H: Hasher,
    C: FnMut(&[u64], &mut ProverChannel<H>) -> Result<()>,
{
    if witness.len() as u64 != params.first_layer_size() {
        return Err(Error::InvalidParameter(
            "witness size does not match the first FRI layer".to_string(),
        ));
    }
    let n_rounds = params.n_rounds();

    // Commit phase: draw, fold, commit, round by round.
    let mut tables: Vec<TableProver<F, H>> = Vec::new();
    let mut current = witness;
    for round in 0..n_rounds {
        let _span = info_span!("fri_commit_round", round).entered();
        let eval_point: F = channel.get_random_field_element();
        let mut point = eval_point;
        let mut basis_index = params.cumulative_fri_step(round);
        for _ in 0..params.fri_step_list[round] {
            current = fold_layer(&current, point, params.fft_bases.at(basis_index));
            point = point.square();
            basis_index += 1;
        }
        if round + 1 < n_rounds {
            let width = 1usize << params.fri_step_list[round + 1];
            let n_rows = current.len() / width;
            let mut table = TableProver::new(n_rows, width);
            for row in 0..n_rows {
                table.add_row(row, &current[row * width..(row + 1) * width]);
            }
            table.commit(channel)?;
            tables.push(table);
        }
    }
    send_last_layer(params, &current, channel)?;

    // Query phase.
    channel.apply_proof_of_work(params.proof_of_work_bits);
    let mut query_indices = draw_query_indices(channel, params);
    query_indices.dedup();

    let first_layer_queries =
        second_layer_queries_to_first_layer_queries(&query_indices, params);
    first_layer_callback(&first_layer_queries, channel)?;

    for round in 1..n_rounds {
        let (data_queries, _) =
            next_layer_data_and_integrity_queries(&query_indices, params, round);
        let data_queries: Vec<RowCol> = data_queries.into_iter().collect();
        tables[round - 1].decommit_queries(&data_queries, channel);
    }
    Ok(())
}

/// Interpolates the final evaluation and sends its coefficients. A witness
/// that does not fold below the bound is a prover bug.
fn send_last_layer<F: FftField, H: Hasher>(
    params: &FriParameters<F>,
    evaluation: &[F],
    channel: &mut ProverChannel<H>,
) -> Result<()> {
    let last_bases = params.fft_bases.from_layer(params.total_fri_steps());
    let mut lde = LdeManager::new(last_bases);
    lde.add_evaluation(evaluation);
    let degree = lde.get_evaluation_degree(0);
    if degree >= params.last_layer_degree_bound as i64 {
        return Err(Error::InvalidParameter(format!(
            "witness folds to degree {degree}, above the last layer bound {}",
            params.last_layer_degree_bound
        )));
    }
    // Bit-reversed bases store coefficients in natural order; everything
    // past the bound is zero by the degree check.
    let coefficients = &lde.get_coefficients(0)[..params.last_layer_degree_bound];
    channel.send_field_elements(coefficients);
    Ok(())
}
