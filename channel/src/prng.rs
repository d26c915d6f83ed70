//! A seeded, clonable PRNG over the hash chain. Implements `rand_core`'s
//! `RngCore`, so `Field::random` and test utilities draw from the same
//! source the channel uses.

use rand::RngCore;

use quarry_hash::{Hasher, Keccak256Hasher};

use crate::hash_chain::HashChain;

#[derive(Clone)]
pub struct Prng<H: Hasher = Keccak256Hasher> {
    chain: HashChain<H>,
}

impl<H: Hasher> Prng<H> {
    pub fn new_with_seed(seed: &[u8]) -> Self {
        Self { chain: HashChain::new(seed) }
    }

    pub fn reseed(&mut self, seed: &[u8]) {
        self.chain.init_hash_chain(seed);
    }

    pub fn mix_seed_with_bytes(&mut self, raw_bytes: &[u8]) {
        self.chain.mix_seed_with_bytes(raw_bytes);
    }

    pub fn random_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n];
        self.chain.random_bytes(&mut out);
        out
    }

    /// The current chain state, for proof-of-work binding and diagnostics.
    pub fn prng_state(&self) -> Vec<u8> {
        self.chain.state().as_bytes().to_vec()
    }

    pub fn hash_name(&self) -> &'static str {
        H::NAME
    }

    /// A uniform integer in `[0, upper_bound)` by masked rejection
    /// sampling; exact for power-of-two bounds without retries.
    pub fn uniform_number(&mut self, upper_bound: u64) -> u64 {
        assert!(upper_bound > 0, "upper bound must be positive");
        if upper_bound == 1 {
            return 0;
        }
        let mask = u64::MAX >> (upper_bound - 1).leading_zeros();
        loop {
            let candidate = self.next_u64() & mask;
            if candidate < upper_bound {
                return candidate;
            }
        }
    }
}

impl<H: Hasher> RngCore for Prng<H> {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.chain.random_bytes(&mut buf);
        u32::from_be_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.chain.random_bytes(&mut buf);
        u64::from_be_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.chain.random_bytes(dest);
    }
}
