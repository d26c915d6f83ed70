//! Radix-2 decimation transforms over coset domains, driven by per-layer
//! twiddle tables.
//!
//! Conventions (matching the bases ordering):
//! - natural-order bases: `fft` maps coefficients in bit-reversed order to
//!   evaluations in natural order; `ifft` is the exact reverse.
//! - bit-reversed bases: `fft` maps natural-order coefficients to
//!   bit-reversed evaluations.
//!
//! `ifft` is unnormalized: `ifft(fft(p)) = n * p`. The caller applies the
//! `1/n` scaling (or `2^-n_layers` after a partial transform), which lets
//! the polynomial breaker fold its correction factor into one pass.

use tracing::debug_span;

use quarry_field::{ops, FftField, Field};
use quarry_util::task;

use crate::bases::{MultiplicativeFftBases, MultiplicativeGroupOrdering};

/// Butterfly loops switch to parallel dispatch above this many elements.
const MIN_PARALLEL_CHUNK: usize = 1 << 13;

/// Per-layer twiddle tables for one bases chain. Layer `l` holds the
/// `2^(log_n - l - 1)` domain elements its butterflies multiply by: the
/// first half of the layer domain in natural order, the even-index elements
/// in bit-reversed order.
#[derive(Clone, Debug)]
pub struct FftPrecompute<F: FftField> {
    twiddles: Vec<Vec<F>>,
    order: MultiplicativeGroupOrdering,
    log_n: usize,
}

impl<F: FftField> FftPrecompute<F> {
    pub fn new(bases: &MultiplicativeFftBases<F>) -> Self {
        let log_n = bases.log_size();
        let twiddles = (0..log_n)
            .map(|layer| {
                let domain = bases.at(layer);
                let basis = domain.basis();
                let sub_basis = match bases.order() {
                    // Natural first halves never use the last basis element;
                    // bit-reversed even indices never use the first.
                    MultiplicativeGroupOrdering::Natural => &basis[..basis.len() - 1],
                    MultiplicativeGroupOrdering::BitReversed => &basis[1..],
                };
                crate::domain::FftDomain::new(sub_basis.to_vec(), domain.offset()).elements()
            })
            .collect();
        Self { twiddles, order: bases.order(), log_n }
    }

    /// Elementwise inverses of the forward tables, for `ifft`.
    pub fn inverse(bases: &MultiplicativeFftBases<F>) -> Self {
        let forward = Self::new(bases);
        let twiddles = forward
            .twiddles
            .iter()
            .map(|layer| ops::batch_inverse(layer).expect("domain elements are nonzero"))
            .collect();
        Self { twiddles, ..forward }
    }

    /// Reuses the tables for a coset whose offset differs by `factor`:
    /// layer `l` elements scale by `factor^(2^l)`. For inverse tables pass
    /// the inverse factor.
    pub fn shifted(&self, factor: F) -> Self {
        let mut layer_factor = factor;
        let twiddles = self
            .twiddles
            .iter()
            .map(|layer| {
                let scaled = layer.iter().map(|&t| t * layer_factor).collect();
                layer_factor = layer_factor.square();
                scaled
            })
            .collect();
        Self { twiddles, order: self.order, log_n: self.log_n }
    }

    pub fn order(&self) -> MultiplicativeGroupOrdering {
        self.order
    }

    pub fn log_n(&self) -> usize {
        self.log_n
    }

    /// Forward transform of `src` into `dst`.
    pub fn fft(&self, src: &[F], dst: &mut [F]) {
        assert_eq!(src.len(), 1 << self.log_n);
        assert_eq!(src.len(), dst.len());
        dst.copy_from_slice(src);
        self.fft_in_place(dst);
    }

    pub fn fft_in_place(&self, data: &mut [F]) {
        let _span = debug_span!("fft", log_n = self.log_n).entered();
        assert_eq!(data.len(), 1 << self.log_n);
        for layer in (0..self.log_n).rev() {
            match self.order {
                MultiplicativeGroupOrdering::Natural => {
                    natural_fft_stage(data, &self.twiddles[layer], layer)
                }
                MultiplicativeGroupOrdering::BitReversed => {
                    bit_reversed_fft_stage(data, &self.twiddles[layer], layer)
                }
            }
        }
    }

    /// Unnormalized inverse transform; `self` must hold inverse tables.
    /// With `n_layers < log_n` this is the partial transform: the output
    /// holds the `2^(log_n - n_layers)`-point evaluations of the
    /// `2^n_layers` split sub-polynomials, each scaled by `2^n_layers`.
    pub fn ifft_layers(&self, src: &[F], dst: &mut [F], n_layers: usize) {
        let _span = debug_span!("ifft", log_n = self.log_n, n_layers).entered();
        assert_eq!(src.len(), 1 << self.log_n);
        assert_eq!(src.len(), dst.len());
        assert!(n_layers <= self.log_n);
        dst.copy_from_slice(src);
        for layer in 0..n_layers {
            match self.order {
                MultiplicativeGroupOrdering::Natural => {
                    natural_ifft_stage(dst, &self.twiddles[layer], layer)
                }
                MultiplicativeGroupOrdering::BitReversed => {
                    bit_reversed_ifft_stage(dst, &self.twiddles[layer], layer)
                }
            }
        }
    }

    pub fn ifft(&self, src: &[F], dst: &mut [F]) {
        self.ifft_layers(src, dst, self.log_n);
    }
}

/// Natural-order forward stage: blocks of `n >> layer`, butterflies between
/// the block halves, one twiddle per in-block position.
fn natural_fft_stage<F: FftField>(data: &mut [F], twiddles: &[F], layer: usize) {
    let block = data.len() >> layer;
    let half = block / 2;
    let grain = block.max(MIN_PARALLEL_CHUNK.next_multiple_of(block));
    task::parallel_for_each_chunk(data, grain, |_, chunk| {
        for block_data in chunk.chunks_mut(block) {
            let (lo, hi) = block_data.split_at_mut(half);
            for j in 0..half {
                let (a, b) = F::fft_butterfly(lo[j], hi[j], twiddles[j]);
                lo[j] = a;
                hi[j] = b;
            }
        }
    });
}

fn natural_ifft_stage<F: FftField>(data: &mut [F], inv_twiddles: &[F], layer: usize) {
    let block = data.len() >> layer;
    let half = block / 2;
    let grain = block.max(MIN_PARALLEL_CHUNK.next_multiple_of(block));
    task::parallel_for_each_chunk(data, grain, |_, chunk| {
        for block_data in chunk.chunks_mut(block) {
            let (lo, hi) = block_data.split_at_mut(half);
            for j in 0..half {
                let (a, b) = F::fft_ibutterfly(lo[j], hi[j], inv_twiddles[j]);
                lo[j] = a;
                hi[j] = b;
            }
        }
    });
}

/// Bit-reversed forward stage: pairs at distance `2^layer` inside blocks of
/// `2^(layer+1)`, one twiddle per block.
fn bit_reversed_fft_stage<F: FftField>(data: &mut [F], twiddles: &[F], layer: usize) {
    let pair_block = 1 << (layer + 1);
    let stride = 1 << layer;
    let grain = pair_block.max(MIN_PARALLEL_CHUNK.next_multiple_of(pair_block));
    task::parallel_for_each_chunk(data, grain, |start, chunk| {
        let first_block = start / pair_block;
        for (local, block_data) in chunk.chunks_mut(pair_block).enumerate() {
            let twiddle = twiddles[first_block + local];
            let (lo, hi) = block_data.split_at_mut(stride);
            for t in 0..stride {
                let (a, b) = F::fft_butterfly(lo[t], hi[t], twiddle);
                lo[t] = a;
                hi[t] = b;
            }
        }
    });
}

fn bit_reversed_ifft_stage<F: FftField>(data: &mut [F], inv_twiddles: &[F], layer: usize) {
    let pair_block = 1 << (layer + 1);
    let stride = 1 << layer;
    let grain = pair_block.max(MIN_PARALLEL_CHUNK.next_multiple_of(pair_block));
    task::parallel_for_each_chunk(data, grain, |start, chunk| {
        let first_block = start / pair_block;
        for (local, block_data) in chunk.chunks_mut(pair_block).enumerate() {
            let inv_twiddle = inv_twiddles[first_block + local];
            let (lo, hi) = block_data.split_at_mut(stride);
            for t in 0..stride {
                let (a, b) = F::fft_ibutterfly(lo[t], hi[t], inv_twiddle);
                lo[t] = a;
                hi[t] = b;
            }
        }
    });
}

/// Forward FFT over the bases' first layer. Large bit-reversed transforms
/// take the cache-friendly four-step path.
pub fn fft<F: FftField>(bases: &MultiplicativeFftBases<F>, src: &[F], dst: &mut [F]) {
    if bases.order() == MultiplicativeGroupOrdering::BitReversed
        && bases.log_size() >= crate::four_step::FOUR_STEP_MIN_LOG_SIZE
    {
        crate::four_step::fft_four_step(bases, src, dst);
        return;
    }
    FftPrecompute::new(bases).fft(src, dst);
}

/// Full unnormalized inverse FFT: `ifft(fft(p)) = n * p`.
pub fn ifft<F: FftField>(bases: &MultiplicativeFftBases<F>, src: &[F], dst: &mut [F]) {
    FftPrecompute::inverse(bases).ifft(src, dst);
}

/// Partial unnormalized inverse FFT; see `FftPrecompute::ifft_layers`.
pub fn ifft_layers<F: FftField>(
    bases: &MultiplicativeFftBases<F>,
    src: &[F],
    dst: &mut [F],
    n_layers: usize,
) {
    FftPrecompute::inverse(bases).ifft_layers(src, dst, n_layers);
}

/// Scales a full inverse-FFT output down to true coefficients.
pub fn normalize<F: FftField>(data: &mut [F], log_n: usize) {
    let inv_n = F::from_u64(1 << log_n).inverse();
    task::parallel_for_each_chunk(data, MIN_PARALLEL_CHUNK, |_, chunk| {
        for x in chunk {
            *x *= inv_n;
            F::fft_normalize(x);
        }
    });
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use quarry_field::{ops, Field, TestField};
    use quarry_util::bit_reversal::bit_reversed;

    use super::*;
    use crate::bases::MultiplicativeGroupOrdering::{BitReversed, Natural};

    type F = TestField;

    fn random_vec(rng: &mut SmallRng, n: usize) -> Vec<F> {
        (0..n).map(|_| F::random(rng)).collect()
    }

    #[test]
    fn natural_fft_matches_horner() {
        let mut rng = SmallRng::seed_from_u64(1);
        let log_n = 6;
        let bases =
            MultiplicativeFftBases::new(log_n, F::from_u64(9), Natural).unwrap();
        let coefs = random_vec(&mut rng, 1 << log_n);
        let mut evals = vec![F::zero(); 1 << log_n];
        fft(&bases, &bit_reversed(&coefs), &mut evals);
        let domain = bases.first_layer();
        for i in 0..domain.size() {
            assert_eq!(evals[i as usize], ops::horner_eval(domain.at(i), &coefs));
        }
    }

    #[test]
    fn bit_reversed_fft_matches_horner() {
        let mut rng = SmallRng::seed_from_u64(2);
        let log_n = 6;
        let bases =
            MultiplicativeFftBases::new(log_n, F::from_u64(9), BitReversed).unwrap();
        let coefs = random_vec(&mut rng, 1 << log_n);
        let mut evals = vec![F::zero(); 1 << log_n];
        fft(&bases, &coefs, &mut evals);
        let domain = bases.first_layer();
        for i in 0..domain.size() {
            assert_eq!(evals[i as usize], ops::horner_eval(domain.at(i), &coefs));
        }
    }

    #[test]
    fn ifft_is_n_times_the_inverse() {
        let mut rng = SmallRng::seed_from_u64(3);
        for order in [Natural, BitReversed] {
            let log_n = 7;
            let bases = MultiplicativeFftBases::new(log_n, F::from_u64(5), order).unwrap();
            let src = random_vec(&mut rng, 1 << log_n);
            let mut evals = vec![F::zero(); 1 << log_n];
            fft(&bases, &src, &mut evals);
            let mut back = vec![F::zero(); 1 << log_n];
            ifft(&bases, &evals, &mut back);
            normalize(&mut back, log_n);
            assert_eq!(back, src);
        }
    }

    #[test]
    fn shifted_precompute_evaluates_on_other_coset() {
        let mut rng = SmallRng::seed_from_u64(4);
        let log_n = 5;
        let offset = F::from_u64(9);
        let target = F::from_u64(21);
        let bases = MultiplicativeFftBases::new(log_n, offset, BitReversed).unwrap();
        let coefs = random_vec(&mut rng, 1 << log_n);

        let shifted_pre = FftPrecompute::new(&bases).shifted(target * offset.inverse());
        let mut evals = vec![F::zero(); 1 << log_n];
        shifted_pre.fft(&coefs, &mut evals);

        let target_bases = bases.shifted(target);
        let mut expected = vec![F::zero(); 1 << log_n];
        fft(&target_bases, &coefs, &mut expected);
        assert_eq!(evals, expected);
    }

    #[test]
    fn partial_ifft_splits_into_sub_polynomials() {
        // One layer of inverse FFT on bit-reversed input interleaves the
        // even and odd sub-polynomials' evaluations, each doubled.
        let mut rng = SmallRng::seed_from_u64(5);
        let log_n = 5;
        let bases = MultiplicativeFftBases::new(log_n, F::from_u64(3), BitReversed).unwrap();
        let coefs = random_vec(&mut rng, 1 << log_n);
        let mut evals = vec![F::zero(); 1 << log_n];
        fft(&bases, &coefs, &mut evals);

        let mut partial = vec![F::zero(); 1 << log_n];
        ifft_layers(&bases, &evals, &mut partial, 1);

        let even: Vec<F> = coefs.iter().step_by(2).copied().collect();
        let odd: Vec<F> = coefs.iter().skip(1).step_by(2).copied().collect();
        let next_domain = bases.at(1);
        let two = F::from_u64(2);
        for i in 0..(1usize << (log_n - 1)) {
            let y = next_domain.at(i as u64);
            assert_eq!(partial[2 * i], two * ops::horner_eval(y, &even));
            assert_eq!(partial[2 * i + 1], two * ops::horner_eval(y, &odd));
        }
    }

    #[test]
    fn fft_linear_in_input() {
        let mut rng = SmallRng::seed_from_u64(6);
        let log_n = 4;
        let bases = MultiplicativeFftBases::new(log_n, F::from_u64(7), BitReversed).unwrap();
        let a = random_vec(&mut rng, 1 << log_n);
        let b = random_vec(&mut rng, 1 << log_n);
        let scalar = F::random(&mut rng);
        let combined: Vec<F> = a.iter().zip(&b).map(|(&x, &y)| x + scalar * y).collect();

        let pre = FftPrecompute::new(&bases);
        let mut ea = vec![F::zero(); 1 << log_n];
        let mut eb = vec![F::zero(); 1 << log_n];
        let mut ec = vec![F::zero(); 1 << log_n];
        pre.fft(&a, &mut ea);
        pre.fft(&b, &mut eb);
        pre.fft(&combined, &mut ec);
        for i in 0..1 << log_n {
            assert_eq!(ec[i], ea[i] + scalar * eb[i]);
        }
    }

    #[test]
    fn random_round_trips_at_many_sizes() {
        let mut rng = SmallRng::seed_from_u64(7);
        for log_n in 1..=9 {
            for order in [Natural, BitReversed] {
                let offset = F::from_u64(rng.random_range(1..1000));
                let bases = MultiplicativeFftBases::new(log_n, offset, order).unwrap();
                let src = random_vec(&mut rng, 1 << log_n);
                let mut evals = vec![F::zero(); 1 << log_n];
                fft(&bases, &src, &mut evals);
                let mut back = vec![F::zero(); 1 << log_n];
                ifft(&bases, &evals, &mut back);
                normalize(&mut back, log_n);
                assert_eq!(back, src, "log_n={log_n} order={order:?}");
            }
        }
    }
}
