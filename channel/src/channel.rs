//! Noninteractive Fiat-Shamir channels. The prover appends messages to the
//! proof and folds them into the PRNG; the verifier replays the same bytes
//! from the proof, so both sides derive identical challenge sequences.
//!
//! Decommitment data is appended to the proof without touching the PRNG:
//! it is sent after the query positions are already fixed, and must not
//! influence them.

use tracing::instrument;

use quarry_field::Field;
use quarry_hash::{Digest, Hasher, Keccak256Hasher};
use quarry_util::{Error, Result};

use crate::prng::Prng;

/// Domain tag separating grinding hashes from chain blocks.
const POW_PREFIX: &[u8] = b"0123456789abcded";

/// Challenge drawing shared by both channel directions.
pub trait Channel {
    type HasherT: Hasher;

    fn prng_mut(&mut self) -> &mut Prng<Self::HasherT>;

    /// A uniform field element, by the field's max-divisible rejection
    /// sampling. Advances the PRNG state.
    fn get_random_field_element<F: Field>(&mut self) -> F {
        F::random(self.prng_mut())
    }

    fn get_random_field_elements<F: Field>(&mut self, n: usize) -> Vec<F> {
        (0..n).map(|_| self.get_random_field_element()).collect()
    }

    /// A uniform integer in `[0, upper_bound)`.
    fn get_random_number(&mut self, upper_bound: u64) -> u64 {
        self.prng_mut().uniform_number(upper_bound)
    }
}

fn pow_digest<H: Hasher>(state: &[u8], n_bits: usize, nonce: u64) -> Digest {
    let mut buf = Vec::with_capacity(POW_PREFIX.len() + state.len() + 1 + 8);
    buf.extend_from_slice(POW_PREFIX);
    buf.extend_from_slice(state);
    buf.push(n_bits as u8);
    buf.extend_from_slice(&nonce.to_be_bytes());
    H::hash_bytes(&buf)
}

pub struct ProverChannel<H: Hasher = Keccak256Hasher> {
    prng: Prng<H>,
    proof: Vec<u8>,
}

impl<H: Hasher> ProverChannel<H> {
    pub fn new(prng: Prng<H>) -> Self {
        Self { prng, proof: Vec::new() }
    }

    pub fn new_with_seed(seed: &[u8]) -> Self {
        Self::new(Prng::new_with_seed(seed))
    }

    /// The accumulated proof bytes.
    pub fn proof(&self) -> &[u8] {
        &self.proof
    }

    pub fn into_proof(self) -> Vec<u8> {
        self.proof
    }

    pub fn send_bytes(&mut self, bytes: &[u8]) {
        self.proof.extend_from_slice(bytes);
        self.prng.mix_seed_with_bytes(bytes);
    }

    pub fn send_field_element<F: Field>(&mut self, value: &F) {
        self.send_bytes(&value.to_bytes_vec(true));
    }

    pub fn send_field_elements<F: Field>(&mut self, values: &[F]) {
        let mut bytes = Vec::with_capacity(values.len() * F::SIZE_IN_BYTES);
        for value in values {
            bytes.extend_from_slice(&value.to_bytes_vec(true));
        }
        self.send_bytes(&bytes);
    }

    pub fn send_commitment_hash(&mut self, digest: &Digest) {
        self.send_bytes(digest.as_bytes());
    }

    /// Appended to the proof only; decommitments never feed the transcript.
    pub fn send_decommitment_node(&mut self, digest: &Digest) {
        self.proof.extend_from_slice(digest.as_bytes());
    }

    /// Same non-mixing rule as decommitment nodes, for opened field values.
    pub fn send_decommitment_field_elements<F: Field>(&mut self, values: &[F]) {
        for value in values {
            self.proof.extend_from_slice(&value.to_bytes_vec(true));
        }
    }

    /// Grinds for a nonce whose bound hash has `n_bits` leading zeros and
    /// sends it (8 bytes, big-endian). `n_bits == 0` is a no-op.
    #[instrument(skip(self))]
    pub fn apply_proof_of_work(&mut self, n_bits: usize) {
        if n_bits == 0 {
            return;
        }
        let state = self.prng.prng_state();
        let nonce = (0u64..)
            .find(|&nonce| pow_digest::<H>(&state, n_bits, nonce).leading_zero_bits() >= n_bits as u32)
            .expect("nonce space exhausted");
        self.send_bytes(&nonce.to_be_bytes());
    }
}

impl<H: Hasher> Channel for ProverChannel<H> {
    type HasherT = H;

    fn prng_mut(&mut self) -> &mut Prng<H> {
        &mut self.prng
    }
}

pub struct VerifierChannel<H: Hasher = Keccak256Hasher> {
    prng: Prng<H>,
    proof: Vec<u8>,
    read_position: usize,
}

impl<H: Hasher> VerifierChannel<H> {
    pub fn new(prng: Prng<H>, proof: Vec<u8>) -> Self {
        Self { prng, proof, read_position: 0 }
    }

    pub fn new_with_seed(seed: &[u8], proof: Vec<u8>) -> Self {
        Self::new(Prng::new_with_seed(seed), proof)
    }

    /// True when every proof byte has been consumed.
    pub fn fully_consumed(&self) -> bool {
        self.read_position == self.proof.len()
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if self.read_position + n > self.proof.len() {
            return Err(Error::ProofTooShort {
                needed: self.read_position + n - self.proof.len(),
            });
        }
        let slice = &self.proof[self.read_position..self.read_position + n];
        self.read_position += n;
        Ok(slice)
    }

    pub fn receive_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let bytes = self.take(n)?.to_vec();
        self.prng.mix_seed_with_bytes(&bytes);
        Ok(bytes)
    }

    pub fn receive_field_element<F: Field>(&mut self) -> Result<F> {
        let bytes = self.receive_bytes(F::SIZE_IN_BYTES)?;
        F::from_bytes(&bytes, true).map_err(|_| {
            Error::ProofInvalid("field element encoding is not reduced".to_string())
        })
    }

    pub fn receive_field_elements<F: Field>(&mut self, n: usize) -> Result<Vec<F>> {
        let bytes = self.receive_bytes(n * F::SIZE_IN_BYTES)?;
        bytes
            .chunks(F::SIZE_IN_BYTES)
            .map(|chunk| {
                F::from_bytes(chunk, true).map_err(|_| {
                    Error::ProofInvalid("field element encoding is not reduced".to_string())
                })
            })
            .collect()
    }

    pub fn receive_commitment_hash(&mut self) -> Result<Digest> {
        let bytes = self.receive_bytes(Digest::SIZE)?;
        Digest::init_digest_to(&bytes)
    }

    pub fn receive_decommitment_node(&mut self) -> Result<Digest> {
        let bytes = self.take(Digest::SIZE)?;
        Digest::init_digest_to(bytes)
    }

    pub fn receive_decommitment_field_elements<F: Field>(&mut self, n: usize) -> Result<Vec<F>> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let bytes = self.take(F::SIZE_IN_BYTES)?;
            out.push(F::from_bytes(bytes, true).map_err(|_| {
                Error::ProofInvalid("field element encoding is not reduced".to_string())
            })?);
        }
        Ok(out)
    }

    /// Reads and validates the prover's nonce. `n_bits == 0` is a no-op.
    pub fn apply_proof_of_work(&mut self, n_bits: usize) -> Result<()> {
        if n_bits == 0 {
            return Ok(());
        }
        let state = self.prng.prng_state();
        let nonce_bytes = self.receive_bytes(8)?;
        let nonce = u64::from_be_bytes(nonce_bytes.as_slice().try_into().unwrap());
        if pow_digest::<H>(&state, n_bits, nonce).leading_zero_bits() < n_bits as u32 {
            return Err(Error::ProofInvalid("wrong proof of work".to_string()));
        }
        Ok(())
    }
}

impl<H: Hasher> Channel for VerifierChannel<H> {
    type HasherT = H;

    fn prng_mut(&mut self) -> &mut Prng<H> {
        &mut self.prng
    }
}
