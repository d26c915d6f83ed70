//! A counter-mode byte stream over a digest state. Blocks are
//! `H(state || counter)`; mixing new seed material increments the state (as
//! a big-endian integer) and absorbs the bytes, which separates the "next
//! block" and "new seed" domains.

use quarry_hash::{Digest, Hasher, DIGEST_NUM_BYTES};

#[derive(Clone)]
pub struct HashChain<H: Hasher> {
    state: Digest,
    counter: u64,
    spare: [u8; DIGEST_NUM_BYTES],
    spare_len: usize,
    _hasher: core::marker::PhantomData<H>,
}

impl<H: Hasher> HashChain<H> {
    pub fn new(seed: &[u8]) -> Self {
        Self {
            state: H::hash_bytes(seed),
            counter: 0,
            spare: [0; DIGEST_NUM_BYTES],
            spare_len: 0,
            _hasher: core::marker::PhantomData,
        }
    }

    pub fn init_hash_chain(&mut self, seed: &[u8]) {
        *self = Self::new(seed);
    }

    pub fn state(&self) -> Digest {
        self.state
    }

    fn next_block(&mut self) -> Digest {
        let mut buf = [0u8; DIGEST_NUM_BYTES + 8];
        buf[..DIGEST_NUM_BYTES].copy_from_slice(self.state.as_bytes());
        buf[DIGEST_NUM_BYTES..].copy_from_slice(&self.counter.to_be_bytes());
        self.counter += 1;
        H::hash_bytes(&buf)
    }

    pub fn random_bytes(&mut self, out: &mut [u8]) {
        let mut filled = 0;
        while filled < out.len() {
            if self.spare_len == 0 {
                let block = self.next_block();
                self.spare.copy_from_slice(block.as_bytes());
                self.spare_len = DIGEST_NUM_BYTES;
            }
            let take = self.spare_len.min(out.len() - filled);
            let start = DIGEST_NUM_BYTES - self.spare_len;
            out[filled..filled + take].copy_from_slice(&self.spare[start..start + take]);
            self.spare_len -= take;
            filled += take;
        }
    }

    /// Folds prover/verifier message bytes into the state. Resets the block
    /// counter; randomness drawn after a mix never aliases randomness drawn
    /// before it.
    pub fn mix_seed_with_bytes(&mut self, raw_bytes: &[u8]) {
        let incremented = increment_digest(&self.state);
        let mut buf = Vec::with_capacity(DIGEST_NUM_BYTES + raw_bytes.len());
        buf.extend_from_slice(incremented.as_bytes());
        buf.extend_from_slice(raw_bytes);
        self.state = H::hash_bytes(&buf);
        self.counter = 0;
        self.spare_len = 0;
    }
}

/// The digest as a big-endian integer, plus one.
fn increment_digest(digest: &Digest) -> Digest {
    let mut bytes = *digest.as_bytes();
    for byte in bytes.iter_mut().rev() {
        let (sum, overflow) = byte.overflowing_add(1);
        *byte = sum;
        if !overflow {
            break;
        }
    }
    Digest(bytes)
}
