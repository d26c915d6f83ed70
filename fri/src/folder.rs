//! The 2-to-1 FRI fold. With `a = f(x)` and `b = f(-x)`,
//! `f'(x^2) = (a + b) / 2 + alpha * (a - b) / (2x)`.

use quarry_fft::FftDomain;
use quarry_field::{ops, FftField, Field};
use quarry_util::task;

/// Folds adjacent pairs of a bit-reversed layer evaluation into the next
/// layer. `layer_domain` is the domain the evaluation lives on.
pub fn fold_layer<F: FftField>(
    evaluation: &[F],
    eval_point: F,
    layer_domain: &FftDomain<F>,
) -> Vec<F> {
    assert_eq!(evaluation.len() as u64, layer_domain.size());
    assert!(evaluation.len() >= 2);
    // Even-index elements of the bit-reversed domain never use the first
    // basis element; enumerate and invert them in one batch.
    let even_points = FftDomain::new(
        layer_domain.basis()[1..].to_vec(),
        layer_domain.offset(),
    )
    .elements();
    let inverses = ops::batch_inverse(&even_points).expect("domain elements are nonzero");
    let two_inv = F::from_u64(2).inverse();

    let mut output = vec![F::zero(); evaluation.len() / 2];
    task::parallel_for_each_chunk(&mut output, 1 << 12, |start, chunk| {
        for (offset, slot) in chunk.iter_mut().enumerate() {
            let j = start + offset;
            let a = evaluation[2 * j];
            let b = evaluation[2 * j + 1];
            *slot = (a + b + eval_point * (a - b) * inverses[j]) * two_inv;
        }
    });
    output
}

/// The same fold for a single pair, used on decommitted query cosets.
pub fn fold_pair<F: FftField>(a: F, b: F, eval_point: F, x: F) -> F {
    (a + b + eval_point * (a - b) * x.inverse()) * F::from_u64(2).inverse()
}
