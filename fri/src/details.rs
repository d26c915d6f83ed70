//! Query bookkeeping shared by the FRI prover and verifier: verifier-side
//! coset folding, query index drawing, and the split of per-layer queries
//! into data cells (decommitted) and integrity cells (derived by folding
//! the previous layer).

use std::collections::BTreeSet;

use quarry_channel::Channel;
use quarry_commit::RowCol;
use quarry_field::{FftField, Field};
use quarry_util::math::pow2;

use crate::folder::fold_pair;
use crate::parameters::FriParameters;

/// Folds the `2^fri_step` elements of one round's coset down to the single
/// element they produce in the next round. `first_element_index` locates
/// `elements[0]` in the domain entering round `round`.
pub fn apply_fri_layers<F: FftField>(
    elements: &[F],
    eval_point: F,
    params: &FriParameters<F>,
    round: usize,
    first_element_index: u64,
) -> F {
    let round_step = params.fri_step_list[round];
    assert_eq!(
        elements.len() as u64,
        pow2(round_step as u32),
        "number of elements does not match the fri_step parameter"
    );
    let mut cumulative = params.cumulative_fri_step(round);
    let mut current = elements.to_vec();
    let mut point = eval_point;
    let mut index = first_element_index;
    for _ in 0..round_step {
        let basis = params.fft_bases.at(cumulative);
        let next: Vec<F> = (0..current.len() / 2)
            .map(|j| {
                fold_pair(
                    current[2 * j],
                    current[2 * j + 1],
                    point,
                    basis.at(index + 2 * j as u64),
                )
            })
            .collect();
        current = next;
        point = point.square();
        index /= 2;
        cumulative += 1;
    }
    current[0]
}

/// Draws the sorted query indices over the first folded layer. Proof of
/// work is applied by the caller just before, on the respective channel
/// type.
pub fn draw_query_indices<F: FftField, C: Channel>(
    channel: &mut C,
    params: &FriParameters<F>,
) -> Vec<u64> {
    let domain_size = params.first_layer_size() >> params.fri_step_list[0];
    let mut indices: Vec<u64> = (0..params.n_queries)
        .map(|_| channel.get_random_number(domain_size))
        .collect();
    indices.sort_unstable();
    indices
}

/// For round `round >= 1`: which cells of the committed layer's table the
/// prover must decommit (data) and which the verifier derives by folding
/// (integrity). Query indices address the first folded layer.
pub fn next_layer_data_and_integrity_queries<F: FftField>(
    query_indices: &[u64],
    params: &FriParameters<F>,
    round: usize,
) -> (BTreeSet<RowCol>, BTreeSet<RowCol>) {
    let shift = params.query_index_shift(round);
    let round_step = params.fri_step_list[round] as u64;
    let row_mask = pow2(round_step as u32) - 1;

    let mut integrity_queries = BTreeSet::new();
    for &index in query_indices {
        let layer_index = index >> shift;
        integrity_queries.insert(RowCol::new(layer_index >> round_step, layer_index & row_mask));
    }
    let mut data_queries = BTreeSet::new();
    for &index in query_indices {
        let row = (index >> shift) >> round_step;
        for col in 0..=row_mask {
            let query = RowCol::new(row, col);
            if !integrity_queries.contains(&query) {
                data_queries.insert(query);
            }
        }
    }
    (data_queries, integrity_queries)
}

/// Expands first-folded-layer query indices to the first-layer positions
/// whose cosets they fold from.
pub fn second_layer_queries_to_first_layer_queries<F: FftField>(
    query_indices: &[u64],
    params: &FriParameters<F>,
) -> Vec<u64> {
    let coset_size = pow2(params.fri_step_list[0] as u32);
    let mut out = Vec::with_capacity(query_indices.len() * coset_size as usize);
    for &index in query_indices {
        for i in index * coset_size..(index + 1) * coset_size {
            out.push(i);
        }
    }
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use quarry_fft::{MultiplicativeFftBases, MultiplicativeGroupOrdering};
    use quarry_field::ops;

    use crate::folder::fold_layer;

    use super::*;

    type F = quarry_field::TestField;

    fn params(log_n: usize, steps: Vec<usize>) -> FriParameters<F> {
        let bases = MultiplicativeFftBases::new(
            log_n,
            F::generator(),
            MultiplicativeGroupOrdering::BitReversed,
        )
        .unwrap();
        FriParameters::new(steps, 1, 4, 0, bases).unwrap()
    }

    #[test]
    fn apply_fri_layers_matches_whole_layer_folds() {
        let mut rng = SmallRng::seed_from_u64(1);
        let params = params(6, vec![2, 2]);
        let evaluation: Vec<F> = (0..64).map(|_| F::random(&mut rng)).collect();
        let alpha = F::random(&mut rng);

        // Reference: fold the whole layer twice.
        let once = fold_layer(&evaluation, alpha, params.fft_bases.at(0));
        let twice = fold_layer(&once, alpha.square(), params.fft_bases.at(1));

        for coset in 0..16u64 {
            let slice = &evaluation[(coset * 4) as usize..(coset * 4 + 4) as usize];
            assert_eq!(
                apply_fri_layers(slice, alpha, &params, 0, coset * 4),
                twice[coset as usize],
                "coset {coset}"
            );
        }
    }

    #[test]
    fn apply_fri_layers_on_second_round() {
        let mut rng = SmallRng::seed_from_u64(2);
        let params = params(6, vec![1, 2]);
        // A layer-1 evaluation: fold a random layer-0 one step first.
        let layer0: Vec<F> = (0..64).map(|_| F::random(&mut rng)).collect();
        let alpha0 = F::random(&mut rng);
        let layer1 = fold_layer(&layer0, alpha0, params.fft_bases.at(0));
        let alpha1 = F::random(&mut rng);
        let layer2 = fold_layer(&layer1, alpha1, params.fft_bases.at(1));
        let layer3 = fold_layer(&layer2, alpha1.square(), params.fft_bases.at(2));

        for coset in 0..8u64 {
            let slice = &layer1[(coset * 4) as usize..(coset * 4 + 4) as usize];
            assert_eq!(
                apply_fri_layers(slice, alpha1, &params, 1, coset * 4),
                layer3[coset as usize]
            );
        }
    }

    #[test]
    fn data_and_integrity_queries_partition_cosets() {
        let params = params(6, vec![2, 2]);
        let queries = vec![0u64, 5, 6];
        let (data, integrity) = next_layer_data_and_integrity_queries(&queries, &params, 1);
        // Layer-1 indices are the queries themselves (shift 0); rows 0 and 1.
        assert_eq!(integrity.len(), 3);
        assert!(integrity.contains(&RowCol::new(0, 0)));
        assert!(integrity.contains(&RowCol::new(1, 1)));
        assert!(integrity.contains(&RowCol::new(1, 2)));
        // The data queries are the remaining cells of rows 0 and 1.
        assert_eq!(data.len(), 2 * 4 - 3);
        assert!(data.iter().all(|q| !integrity.contains(q)));
        for q in data.iter().chain(integrity.iter()) {
            assert!(q.row <= 1);
        }
    }

    #[test]
    fn first_layer_expansion_covers_cosets() {
        let params = params(6, vec![2, 2]);
        let expanded = second_layer_queries_to_first_layer_queries(&[1, 3], &params);
        assert_eq!(expanded, vec![4, 5, 6, 7, 12, 13, 14, 15]);
    }

    #[test]
    fn query_draws_are_sorted_and_bounded() {
        let params = params(8, vec![2, 2]);
        let mut channel = quarry_channel::ProverChannel::<quarry_hash::Keccak256Hasher>::new_with_seed(&[1; 4]);
        let indices = draw_query_indices(&mut channel, &params);
        assert_eq!(indices.len(), 4);
        assert!(indices.windows(2).all(|w| w[0] <= w[1]));
        assert!(indices.iter().all(|&i| i < 64));
    }

    #[test]
    fn folding_preserves_low_degree_claims() {
        // Fold an actual low-degree polynomial through apply_fri_layers and
        // compare against its even/odd decomposition at the target point.
        let mut rng = SmallRng::seed_from_u64(3);
        let params = params(5, vec![1]);
        let coefs: Vec<F> = (0..8).map(|_| F::random(&mut rng)).collect();
        let domain = params.fft_bases.at(0);
        let evaluation: Vec<F> =
            (0..32).map(|i| ops::horner_eval(domain.at(i), &coefs)).collect();
        let alpha = F::random(&mut rng);
        let even: Vec<F> = coefs.iter().step_by(2).copied().collect();
        let odd: Vec<F> = coefs.iter().skip(1).step_by(2).copied().collect();
        let next_domain = params.fft_bases.at(1);
        for j in 0..16u64 {
            let folded = apply_fri_layers(
                &evaluation[(2 * j) as usize..(2 * j + 2) as usize],
                alpha,
                &params,
                0,
                2 * j,
            );
            let y = next_domain.at(j);
            assert_eq!(folded, ops::horner_eval(y, &even) + alpha * ops::horner_eval(y, &odd));
        }
    }
}
