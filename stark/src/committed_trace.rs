//! A group of columns committed over the evaluation domain: a cached LDE
//! keyed by the evaluation-coset offsets plus a table whose row index is
//! the bit-reversed big-domain position.

use std::sync::Arc;

use tracing::instrument;

use quarry_channel::ProverChannel;
use quarry_commit::{RowCol, TableProver};
use quarry_field::{FftField, Field};
use quarry_hash::Hasher;
use quarry_lde::{CachedLdeManager, LdeManager};
use quarry_util::bit_reversal::bit_reverse;
use quarry_util::Result;

use crate::parameters::StarkParameters;

pub struct CommittedTraceProver<F: FftField, H: Hasher> {
    cached: CachedLdeManager<F>,
    table: TableProver<F, H>,
    n_columns: usize,
    log_coset_size: usize,
}

impl<F: FftField, H: Hasher> CommittedTraceProver<F, H> {
    /// Interpolates `columns` (evaluations on the trace domain) and
    /// prepares the evaluation-domain table.
    pub fn new(params: &StarkParameters<F>, columns: &[Vec<F>]) -> Self {
        let inner = LdeManager::new(params.trace_bases.clone());
        let mut cached = CachedLdeManager::new(
            inner,
            params.evaluation_offsets.clone(),
            true,
            true,
        );
        for column in columns {
            cached.add_evaluation(column);
        }
        cached.finalize_adding();
        let n_rows = params.evaluation_domain_size();
        Self {
            cached,
            table: TableProver::new(n_rows, columns.len()),
            n_columns: columns.len(),
            log_coset_size: params.log_trace_length,
        }
    }

    /// Evaluates every coset, fills the table (rows indexed by bit-reversed
    /// big-domain position) and sends the commitment.
    #[instrument(skip_all)]
    pub fn commit(&mut self, channel: &mut ProverChannel<H>) -> Result<()> {
        let coset_size = 1usize << self.log_coset_size;
        for coset_index in 0..self.cached.num_cosets() {
            let evaluations = self.cached.eval_on_coset(coset_index);
            let mut row = vec![F::zero(); self.n_columns];
            for position in 0..coset_size {
                let natural =
                    bit_reverse(position as u64, self.log_coset_size as u32) as usize;
                for (slot, column) in row.iter_mut().zip(evaluations.iter()) {
                    *slot = column[natural];
                }
                self.table.add_row(coset_index * coset_size + position, &row);
            }
        }
        self.table.commit(channel)?;
        self.cached.finalize_evaluations();
        Ok(())
    }

    /// Natural-order evaluations of all columns on coset `coset_index`.
    pub fn coset_evaluations(&mut self, coset_index: usize) -> Arc<Vec<Vec<F>>> {
        self.cached.eval_on_coset(coset_index)
    }

    /// Out-of-domain evaluation of one column.
    pub fn eval_column_at_point(&self, column: usize, point: F) -> F {
        let mut out = [F::zero()];
        self.cached.eval_at_points_not_cached(column, &[point], &mut out);
        out[0]
    }

    /// Decommits every cell of the given big-domain rows.
    pub fn decommit_rows(&self, rows: &[u64], channel: &mut ProverChannel<H>) {
        let queries = rows_to_cells(rows, self.n_columns);
        self.table.decommit_queries(&queries, channel);
    }
}

/// All cells of each row, in sorted order.
pub fn rows_to_cells(rows: &[u64], n_columns: usize) -> Vec<RowCol> {
    let mut queries = Vec::with_capacity(rows.len() * n_columns);
    for &row in rows {
        for col in 0..n_columns {
            queries.push(RowCol::new(row, col as u64));
        }
    }
    queries
}
