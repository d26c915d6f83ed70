//! The STARK verifier: replays the prover's channel schedule, checks the
//! out-of-domain consistency between the mask values and the broken
//! composition, and validates FRI with the DEEP combination re-evaluated
//! at every query from decommitted cells.

use std::collections::BTreeMap;

use tracing::instrument;

use quarry_air::Air;
use quarry_channel::{Channel, VerifierChannel};
use quarry_commit::{RowCol, TableVerifier};
use quarry_composition::{eval_from_samples_with_order, CompositionPolynomial};
use quarry_fft::MultiplicativeGroupOrdering;
use quarry_field::FftField;
use quarry_fri::verify_fri;
use quarry_hash::Hasher;
use quarry_util::{Error, Result};

use crate::committed_trace::rows_to_cells;
use crate::oods::DeepComposition;
use crate::parameters::StarkParameters;

#[instrument(skip_all)]
pub fn verify_stark<F, H, A>(
    air: &A,
    params: &StarkParameters<F>,
    channel: &mut VerifierChannel<H>,
) -> Result<()>
where
    F: FftField,
    H: Hasher,
    A: Air<F>,
{
    if air.trace_length() != params.trace_length() {
        return Err(Error::InvalidParameter(
            "trace length does not match the parameters".to_string(),
        ));
    }
    let interaction = air.interaction_params();
    let n_first_columns = match interaction {
        Some(ip) => ip.n_columns_first,
        None => air.num_columns(),
    };
    let n_rows = params.evaluation_domain_size();

    let first_trace = TableVerifier::<F, H>::new(n_rows, n_first_columns, channel)?;
    let mut interaction_trace: Option<TableVerifier<F, H>> = None;
    let bound_air;
    let air: &A = if let Some(ip) = interaction {
        let elements: Vec<F> = channel.get_random_field_elements(ip.n_interaction_elements);
        interaction_trace = Some(TableVerifier::new(
            n_rows,
            ip.n_interaction_columns(),
            channel,
        )?);
        bound_air = air.with_interaction_elements(&elements);
        &bound_air
    } else {
        air
    };

    let coefficients: Vec<F> = channel.get_random_field_elements(air.num_random_coefficients());
    let composition = CompositionPolynomial::new(air, params.trace_generator, coefficients)?;

    let n_breaks = params.n_breaks();
    let broken_table = TableVerifier::<F, H>::new(n_rows, n_breaks, channel)?;

    // Out-of-domain values, then their internal consistency: the mask
    // values must reproduce the broken columns' combined evaluation.
    let oods_point: F = channel.get_random_field_element();
    let mask = air.mask().to_vec();
    let mask_values: Vec<F> = channel.receive_field_elements(mask.len())?;
    let break_values: Vec<F> = channel.receive_field_elements(n_breaks)?;

    let composition_at_oods = composition.eval_at_point(oods_point, &mask_values);
    let reassembled = eval_from_samples_with_order(
        MultiplicativeGroupOrdering::BitReversed,
        &break_values,
        oods_point,
    );
    if composition_at_oods != reassembled {
        return Err(Error::ProofInvalid(
            "out-of-domain composition value mismatch".to_string(),
        ));
    }

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

    let big_domain = params.big_bases.first_layer().clone();
    let empty = BTreeMap::new();
    verify_fri(&params.fri, channel, |indices, channel| {
        let first_cells =
            first_trace.verify_decommitment(&rows_to_cells(indices, n_first_columns), &empty, channel)?;
        let second_cells = match &interaction_trace {
            Some(table) => {
                let width = air.num_columns() - n_first_columns;
                Some(table.verify_decommitment(&rows_to_cells(indices, width), &empty, channel)?)
            }
            None => None,
        };
        let broken_cells =
            broken_table.verify_decommitment(&rows_to_cells(indices, n_breaks), &empty, channel)?;

        let mut values = Vec::with_capacity(indices.len());
        for &row in indices {
            let x = big_domain.at(row);
            let trace_row: Vec<F> = (0..air.num_columns())
                .map(|column| {
                    if column < n_first_columns {
                        first_cells[&RowCol::new(row, column as u64)]
                    } else {
                        second_cells.as_ref().expect("interaction columns in mask")
                            [&RowCol::new(row, (column - n_first_columns) as u64)]
                    }
                })
                .collect();
            let break_row: Vec<F> = (0..n_breaks)
                .map(|i| broken_cells[&RowCol::new(row, i as u64)])
                .collect();
            values.push(deep.eval_at_row(x, &trace_row, &break_row)?);
        }
        Ok(values)
    })?;

    if !channel.fully_consumed() {
        return Err(Error::ProofInvalid(
            "trailing bytes after the proof".to_string(),
        ));
    }
    Ok(())
}
