//! The STARK prover: commit the trace LDE, optionally an interaction
//! trace, evaluate and break the composition polynomial, sample out of
//! domain, build the DEEP combination and hand it to FRI. The channel
//! threads through every step; the proof is whatever it accumulated.

use tracing::{info_span, instrument};

use quarry_air::{Air, Trace};
use quarry_channel::{Channel, ProverChannel};
use quarry_commit::TableProver;
use quarry_composition::{CompositionPolynomial, PolynomialBreak};
use quarry_field::{ops, FftField, Field};
use quarry_fri::prove_fri;
use quarry_hash::Hasher;
use quarry_lde::{CachedLdeManager, LdeManager};
use quarry_util::bit_reversal::bit_reverse;
use quarry_util::{Error, Result};

use crate::committed_trace::{rows_to_cells, CommittedTraceProver};
use crate::oods::DeepComposition;
use crate::parameters::StarkParameters;

#[instrument(skip_all)]
pub fn prove_stark<F, H, A>(
    air: &A,
    trace: Trace<F>,
    params: &StarkParameters<F>,
    channel: &mut ProverChannel<H>,
) -> Result<()>
where
    F: FftField,
    H: Hasher,
    A: Air<F>,
{
    if air.trace_length() != params.trace_length() || trace.length() != params.trace_length() {
        return Err(Error::InvalidParameter(
            "trace length does not match the parameters".to_string(),
        ));
    }
    let interaction = air.interaction_params();
    let n_first_columns = match interaction {
        Some(ip) => ip.n_columns_first,
        None => air.num_columns(),
    };
    if trace.width() != n_first_columns {
        return Err(Error::InvalidParameter(
            "trace width does not match the AIR".to_string(),
        ));
    }

    // Commit the first trace over the evaluation domain.
    let mut first_trace = CommittedTraceProver::<F, H>::new(params, trace.columns());
    first_trace.commit(channel)?;

    // Interaction round: challenges, second trace, second commitment. The
    // effective AIR binds the drawn elements into the constraints.
    let mut interaction_trace: Option<CommittedTraceProver<F, H>> = None;
    let bound_air;
    let air: &A = if let Some(ip) = interaction {
        let elements: Vec<F> = channel.get_random_field_elements(ip.n_interaction_elements);
        let second = air.build_interaction_trace(&trace, &elements);
        if second.width() != ip.n_interaction_columns()
            || second.length() != params.trace_length()
        {
            return Err(Error::InvalidParameter(
                "interaction trace shape does not match the AIR".to_string(),
            ));
        }
        let mut committed = CommittedTraceProver::new(params, second.columns());
        committed.commit(channel)?;
        interaction_trace = Some(committed);
        bound_air = air.with_interaction_elements(&elements);
        &bound_air
    } else {
        air
    };

    // The composition polynomial under channel-drawn coefficients.
    let coefficients: Vec<F> = channel.get_random_field_elements(air.num_random_coefficients());
    let composition = CompositionPolynomial::new(air, params.trace_generator, coefficients)?;

    let trace_length = params.trace_length();
    let mut composition_evaluation = vec![F::zero(); params.evaluation_domain_size()];
    {
        let _span = info_span!("composition_evaluation").entered();
        for (coset_index, &offset) in params.evaluation_offsets.iter().enumerate() {
            let first = first_trace.coset_evaluations(coset_index);
            let second = interaction_trace
                .as_mut()
                .map(|t| t.coset_evaluations(coset_index));
            let mut columns: Vec<&[F]> = first.iter().map(|c| c.as_slice()).collect();
            if let Some(second) = &second {
                columns.extend(second.iter().map(|c| c.as_slice()));
            }
            composition.eval_on_coset_bit_reversed(
                offset,
                &columns,
                &mut composition_evaluation
                    [coset_index * trace_length..(coset_index + 1) * trace_length],
            )?;
        }
    }

    // Break into sub-polynomials and commit them over the evaluation
    // domain.
    let breaker = PolynomialBreak::new(params.big_bases.clone(), params.log_breaks)?;
    let chunks = breaker.break_evaluation(&composition_evaluation);
    drop(composition_evaluation);
    let n_breaks = params.n_breaks();
    let mut broken_lde = CachedLdeManager::new(
        LdeManager::new(params.big_bases.from_layer(params.log_breaks)),
        params.break_coset_offsets.clone(),
        true,
        true,
    );
    for chunk in &chunks {
        broken_lde.add_evaluation(chunk);
    }
    broken_lde.finalize_adding();
    drop(chunks);

    let break_domain_size = params.evaluation_domain_size() >> params.log_breaks;
    let mut broken_table =
        TableProver::<F, H>::new(params.evaluation_domain_size(), n_breaks);
    for coset_index in 0..n_breaks {
        let evaluations = broken_lde.eval_on_coset(coset_index);
        let mut row = vec![F::zero(); n_breaks];
        for position in 0..break_domain_size {
            for (slot, column) in row.iter_mut().zip(evaluations.iter()) {
                *slot = column[position];
            }
            broken_table.add_row(coset_index * break_domain_size + position, &row);
        }
    }
    broken_table.commit(channel)?;
    broken_lde.finalize_evaluations();

    // Out-of-domain sampling.
    let oods_point: F = channel.get_random_field_element();
    let mask = air.mask().to_vec();
    let mut mask_values = Vec::with_capacity(mask.len());
    for &(row_offset, column) in &mask {
        let point = oods_point * params.trace_generator.pow_u64(row_offset as u64);
        let value = if column < n_first_columns {
            first_trace.eval_column_at_point(column, point)
        } else {
            interaction_trace
                .as_ref()
                .expect("mask reads interaction columns without an interaction")
                .eval_column_at_point(column - n_first_columns, point)
        };
        mask_values.push(value);
    }
    channel.send_field_elements(&mask_values);

    let mut break_point = oods_point;
    for _ in 0..params.log_breaks {
        break_point = break_point.square();
    }
    let mut break_values = Vec::with_capacity(n_breaks);
    for i in 0..n_breaks {
        let mut out = [F::zero()];
        broken_lde.eval_at_points_not_cached(i, &[break_point], &mut out);
        break_values.push(out[0]);
    }
    channel.send_field_elements(&break_values);

    // The DEEP combination and its FRI proof.
    let deep_coefficients: Vec<F> =
        channel.get_random_field_elements(mask.len() + n_breaks);
    let deep = DeepComposition::new(
        &mask,
        params.trace_generator,
        oods_point,
        params.log_breaks,
        mask_values,
        break_values,
        deep_coefficients,
    );
    let deep_evaluation = compute_deep_evaluation(
        params,
        &deep,
        air.num_columns(),
        n_first_columns,
        &mut first_trace,
        interaction_trace.as_mut(),
        &mut broken_lde,
    )?;

    prove_fri(&params.fri, deep_evaluation, channel, |indices, channel| {
        first_trace.decommit_rows(indices, channel);
        if let Some(second) = &interaction_trace {
            second.decommit_rows(indices, channel);
        }
        broken_table.decommit_queries(&rows_to_cells(indices, n_breaks), channel);
        Ok(())
    })
}

/// Evaluates the DEEP combination over the whole evaluation domain, in the
/// bit-reversed block order FRI consumes.
#[instrument(skip_all)]
fn compute_deep_evaluation<F, H>(
    params: &StarkParameters<F>,
    deep: &DeepComposition<F>,
    n_total_columns: usize,
    n_first_columns: usize,
    first_trace: &mut CommittedTraceProver<F, H>,
    mut interaction_trace: Option<&mut CommittedTraceProver<F, H>>,
    broken_lde: &mut CachedLdeManager<F>,
) -> Result<Vec<F>>
where
    F: FftField,
    H: Hasher,
{
    let trace_length = params.trace_length();
    let log_trace_length = params.log_trace_length as u32;
    let sub_cosets_per_break = 1usize << (params.log_n_cosets - params.log_breaks);
    let mask_points = deep.mask_points().to_vec();
    let n_mask = mask_points.len();
    let break_point = deep.break_point();

    let mut output = vec![F::zero(); params.evaluation_domain_size()];
    for (coset_index, &offset) in params.evaluation_offsets.iter().enumerate() {
        let first = first_trace.coset_evaluations(coset_index);
        let second = interaction_trace
            .as_mut()
            .map(|t| t.coset_evaluations(coset_index));
        let broken = broken_lde.eval_on_coset(coset_index / sub_cosets_per_break);
        let broken_offset = (coset_index % sub_cosets_per_break) * trace_length;

        // All quotient denominators for the coset, inverted in one batch.
        let mut denominators = Vec::with_capacity(trace_length * (n_mask + 1));
        let mut point = offset;
        for _ in 0..trace_length {
            for &mask_point in &mask_points {
                denominators.push(point - mask_point);
            }
            denominators.push(point - break_point);
            point *= params.trace_generator;
        }
        let inverses = ops::batch_inverse(&denominators)?;

        let mut trace_row = vec![F::zero(); n_total_columns];
        let mut break_row = vec![F::zero(); broken.len()];
        for row in 0..trace_length {
            let reversed = bit_reverse(row as u64, log_trace_length) as usize;
            for (column, values) in first.iter().enumerate() {
                trace_row[column] = values[row];
            }
            if let Some(second) = &second {
                for (column, values) in second.iter().enumerate() {
                    trace_row[n_first_columns + column] = values[row];
                }
            }
            for (slot, column) in break_row.iter_mut().zip(broken.iter()) {
                *slot = column[broken_offset + reversed];
            }
            let base = row * (n_mask + 1);
            output[coset_index * trace_length + reversed] = deep.combine(
                &trace_row,
                &break_row,
                &inverses[base..base + n_mask],
                inverses[base + n_mask],
            );
        }
    }
    Ok(output)
}
