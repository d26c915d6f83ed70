//! End-to-end STARK tests: honest proofs verify, wrong claims and
//! corrupted traces or proofs reject, and proving is deterministic.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use quarry_air::{
    degree_adjustment_factor, Air, FibonacciAir, InteractionParams, Trace,
};
use quarry_channel::{ProverChannel, VerifierChannel};
use quarry_field::{ops, FftField, Field, FractionField};
use quarry_hash::Keccak256Hasher;
use quarry_util::math::safe_log2;
use quarry_util::{Error, Result};

use crate::config::FriConfig;
use crate::parameters::StarkParameters;
use crate::{prove_stark, verify_stark};

type F = quarry_field::TestField;
type H = Keccak256Hasher;

const CHANNEL_SEED: &[u8] = &[42; 4];

fn fibonacci_setup(trace_length: usize) -> (FibonacciAir<F>, Trace<F>, StarkParameters<F>) {
    let claim = FibonacciAir::expected_claim(trace_length, F::one(), F::one());
    let air = FibonacciAir::new(trace_length, F::one(), F::one(), claim).unwrap();
    let trace = air.generate_trace();
    let log_length = safe_log2(trace_length as u64) as usize;
    let fri = FriConfig {
        fri_step_list: vec![2, log_length - 4],
        last_layer_degree_bound: 4,
        n_queries: 8,
        proof_of_work_bits: 2,
    };
    let params = StarkParameters::new(trace_length, trace_length, 2, &fri).unwrap();
    (air, trace, params)
}

fn prove<A: Air<F>>(air: &A, trace: Trace<F>, params: &StarkParameters<F>) -> Result<Vec<u8>> {
    let mut channel = ProverChannel::<H>::new_with_seed(CHANNEL_SEED);
    prove_stark(air, trace, params, &mut channel)?;
    Ok(channel.into_proof())
}

fn verify<A: Air<F>>(air: &A, params: &StarkParameters<F>, proof: Vec<u8>) -> Result<()> {
    let mut channel = VerifierChannel::<H>::new_with_seed(CHANNEL_SEED, proof);
    verify_stark(air, params, &mut channel)
}

#[test]
fn fibonacci_proof_round_trip() {
    let (air, trace, params) = fibonacci_setup(64);
    let proof = prove(&air, trace, &params).unwrap();
    verify(&air, &params, proof).unwrap();
}

#[test]
fn proving_is_deterministic() {
    let (air, trace, params) = fibonacci_setup(64);
    let proof_1 = prove(&air, trace.clone(), &params).unwrap();
    let proof_2 = prove(&air, trace, &params).unwrap();
    assert_eq!(proof_1, proof_2);
}

#[test]
fn wrong_claim_rejects() {
    let (_, trace, params) = fibonacci_setup(64);
    let claim = FibonacciAir::expected_claim(64, F::one(), F::one());
    let lying_air =
        FibonacciAir::new(64, F::one(), F::one(), claim + F::one()).unwrap();
    let proof = prove(&lying_air, trace, &params).unwrap();
    assert!(matches!(
        verify(&lying_air, &params, proof),
        Err(Error::ProofInvalid(_))
    ));
}

#[test]
fn corrupted_trace_rejects() {
    let (air, mut trace, params) = fibonacci_setup(64);
    trace.set(1, 29, trace.get(1, 29) + F::one());
    let proof = prove(&air, trace, &params).unwrap();
    assert!(matches!(
        verify(&air, &params, proof),
        Err(Error::ProofInvalid(_))
    ));
}

#[test]
fn tampered_proof_bytes_reject() {
    let (air, trace, params) = fibonacci_setup(64);
    let proof = prove(&air, trace, &params).unwrap();
    let mut rng = SmallRng::seed_from_u64(5);
    for _ in 0..8 {
        let mut tampered = proof.clone();
        let position = rng.random_range(0..tampered.len());
        tampered[position] ^= 1 << rng.random_range(0..8);
        assert!(
            verify(&air, &params, tampered).is_err(),
            "flipping byte {position} must not verify"
        );
    }
}

#[test]
fn truncated_proof_rejects() {
    let (air, trace, params) = fibonacci_setup(64);
    let mut proof = prove(&air, trace, &params).unwrap();
    proof.truncate(proof.len() - 40);
    assert!(verify(&air, &params, proof).is_err());
}

#[test]
fn proof_with_trailing_garbage_rejects() {
    let (air, trace, params) = fibonacci_setup(64);
    let mut proof = prove(&air, trace, &params).unwrap();
    proof.extend_from_slice(&[0u8; 7]);
    assert!(matches!(
        verify(&air, &params, proof),
        Err(Error::ProofInvalid(_))
    ));
}

#[test]
fn wrong_seed_rejects() {
    let (air, trace, params) = fibonacci_setup(64);
    let proof = prove(&air, trace, &params).unwrap();
    let mut channel = VerifierChannel::<H>::new_with_seed(&[43; 4], proof);
    assert!(verify_stark(&air, &params, &mut channel).is_err());
}

#[test]
fn larger_trace_round_trip() {
    let (air, trace, params) = fibonacci_setup(256);
    let proof = prove(&air, trace, &params).unwrap();
    verify(&air, &params, proof).unwrap();
}

/// A multiset-equality AIR: column `b` must be a permutation of column `a`,
/// shown by a running product over a channel-drawn element in an
/// interaction column.
struct MultisetAir<F: FftField> {
    trace_length: usize,
    last_point: F,
    mask: Vec<(usize, usize)>,
    interaction_element: Option<F>,
}

impl<F: FftField> MultisetAir<F> {
    fn new(trace_length: usize) -> Result<Self> {
        let log_length = safe_log2(trace_length as u64);
        let generator = F::subgroup_generator(log_length)?;
        Ok(Self {
            trace_length,
            last_point: generator.pow_u64(trace_length as u64 - 1),
            mask: vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)],
            interaction_element: None,
        })
    }

    fn generate_trace(&self, rng: &mut SmallRng) -> Trace<F> {
        let a: Vec<F> = (0..self.trace_length).map(|_| F::random(rng)).collect();
        // A rotation is a permutation.
        let mut b = a.clone();
        b.rotate_left(7 % self.trace_length);
        Trace::new(vec![a, b])
    }
}

impl<F: FftField> Air<F> for MultisetAir<F> {
    fn trace_length(&self) -> usize {
        self.trace_length
    }

    fn num_columns(&self) -> usize {
        3
    }

    fn num_constraints(&self) -> usize {
        3
    }

    fn num_random_coefficients(&self) -> usize {
        2 * self.num_constraints()
    }

    fn composition_polynomial_degree_bound(&self) -> usize {
        2 * self.trace_length
    }

    fn mask(&self) -> &[(usize, usize)] {
        &self.mask
    }

    fn interaction_params(&self) -> Option<InteractionParams> {
        Some(InteractionParams {
            n_interaction_elements: 1,
            n_columns_first: 2,
            n_columns_total: 3,
        })
    }

    fn build_interaction_trace(&self, first: &Trace<F>, interaction_elements: &[F]) -> Trace<F> {
        let zeta = interaction_elements[0];
        let denominators: Vec<F> =
            first.column(1).iter().map(|&b| zeta - b).collect();
        let inverses = ops::batch_inverse(&denominators).expect("zeta collided with the trace");
        let mut product = F::one();
        let mut column = Vec::with_capacity(self.trace_length);
        for row in 0..self.trace_length {
            product *= (zeta - first.get(0, row)) * inverses[row];
            column.push(product);
        }
        Trace::new(vec![column])
    }

    fn with_interaction_elements(&self, elements: &[F]) -> Self {
        Self {
            trace_length: self.trace_length,
            last_point: self.last_point,
            mask: self.mask.clone(),
            interaction_element: Some(elements[0]),
        }
    }

    fn constraints_eval(
        &self,
        neighbors: &[F],
        _periodic_values: &[F],
        random_coefficients: &[F],
        point: &F,
    ) -> FractionField<F> {
        let zeta = self
            .interaction_element
            .expect("constraints evaluated before the interaction round");
        let [a, b, c] = [neighbors[0], neighbors[1], neighbors[2]];
        let [a_next, b_next, c_next] = [neighbors[3], neighbors[4], neighbors[5]];
        let length = self.trace_length as u64;
        let x_pow_length = point.pow_u64(length);
        let vanishing = x_pow_length - F::one();
        let except_last = *point - self.last_point;
        // Degree bound is 2L; constraint degrees are 2L-3 (first row),
        // L-1 (transition), L-2 (last row).
        let adjust_first = point.square();
        let adjust_transition = point.pow_u64(length);
        let adjust_last = point.pow_u64(length + 1);

        let mut result = FractionField::zero();
        // First row: c = (zeta - a) / (zeta - b).
        result += FractionField::new(
            degree_adjustment_factor(random_coefficients, 0, adjust_first)
                * (c * (zeta - b) - (zeta - a)),
            *point - F::one(),
        );
        // Transition: c(gx) (zeta - b(gx)) = c(x) (zeta - a(gx)).
        result += FractionField::new(
            degree_adjustment_factor(random_coefficients, 1, adjust_transition)
                * (c_next * (zeta - b_next) - c * (zeta - a_next))
                * except_last,
            vanishing,
        );
        // Last row: the running product closes at one.
        result += FractionField::new(
            degree_adjustment_factor(random_coefficients, 2, adjust_last) * (c - F::one()),
            except_last,
        );
        result
    }
}

fn multiset_params(trace_length: usize) -> StarkParameters<F> {
    let log_length = safe_log2(trace_length as u64) as usize;
    let fri = FriConfig {
        fri_step_list: vec![2, log_length - 3],
        last_layer_degree_bound: 2,
        n_queries: 8,
        proof_of_work_bits: 2,
    };
    StarkParameters::new(trace_length, 2 * trace_length, 2, &fri).unwrap()
}

#[test]
fn interaction_proof_round_trip() {
    let mut rng = SmallRng::seed_from_u64(21);
    let air = MultisetAir::<F>::new(32).unwrap();
    let trace = air.generate_trace(&mut rng);
    let params = multiset_params(32);
    let proof = prove(&air, trace, &params).unwrap();
    verify(&air, &params, proof).unwrap();
}

#[test]
fn non_permutation_rejects() {
    let mut rng = SmallRng::seed_from_u64(22);
    let air = MultisetAir::<F>::new(32).unwrap();
    let mut trace = air.generate_trace(&mut rng);
    // Break the multiset equality in one cell.
    trace.set(1, 3, trace.get(1, 3) + F::one());
    let params = multiset_params(32);
    let proof = prove(&air, trace, &params).unwrap();
    assert!(matches!(
        verify(&air, &params, proof),
        Err(Error::ProofInvalid(_))
    ));
}
