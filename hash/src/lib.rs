//! The hash contract the core is written against: a 32-byte digest, a
//! byte hasher, and a two-to-one node combiner. Commitments and the channel
//! are generic over `Hasher`, so swapping the function is a type parameter,
//! not a code change.

use sha3::digest::Digest as _;

use quarry_util::{Error, Result};

pub const DIGEST_NUM_BYTES: usize = 32;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Digest(pub [u8; DIGEST_NUM_BYTES]);

impl Digest {
    pub const SIZE: usize = DIGEST_NUM_BYTES;

    /// Size-checked construction from a byte slice.
    pub fn init_digest_to(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; DIGEST_NUM_BYTES] = bytes.try_into().map_err(|_| {
            Error::InvalidParameter(format!(
                "digest must be {DIGEST_NUM_BYTES} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_NUM_BYTES] {
        &self.0
    }

    /// The number of leading zero bits, for proof-of-work checks.
    pub fn leading_zero_bits(&self) -> u32 {
        let mut count = 0;
        for &byte in &self.0 {
            if byte == 0 {
                count += 8;
            } else {
                return count + byte.leading_zeros();
            }
        }
        count
    }
}

impl core::fmt::Display for Digest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for Digest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

pub trait Hasher: 'static + Clone + Send + Sync {
    const NAME: &'static str;

    fn hash_bytes(data: &[u8]) -> Digest;

    /// Combines two digests into a parent node.
    fn hash_pair(left: &Digest, right: &Digest) -> Digest {
        let mut buf = [0u8; 2 * DIGEST_NUM_BYTES];
        buf[..DIGEST_NUM_BYTES].copy_from_slice(left.as_bytes());
        buf[DIGEST_NUM_BYTES..].copy_from_slice(right.as_bytes());
        Self::hash_bytes(&buf)
    }

    /// Hashes with an explicit length prefix, for variable-length leaves.
    fn hash_bytes_with_length(data: &[u8]) -> Digest {
        let mut buf = Vec::with_capacity(8 + data.len());
        buf.extend_from_slice(&(data.len() as u64).to_be_bytes());
        buf.extend_from_slice(data);
        Self::hash_bytes(&buf)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Blake3Hasher;

impl Hasher for Blake3Hasher {
    const NAME: &'static str = "blake3";

    fn hash_bytes(data: &[u8]) -> Digest {
        Digest(*blake3::hash(data).as_bytes())
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Keccak256Hasher;

impl Hasher for Keccak256Hasher {
    const NAME: &'static str = "keccak256";

    fn hash_bytes(data: &[u8]) -> Digest {
        let out = sha3::Keccak256::digest(data);
        Digest(out.into())
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn keccak_empty_vector() {
        // Keccak-256 of the empty string.
        assert_eq!(
            Keccak256Hasher::hash_bytes(b"").0,
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn blake3_abc_vector() {
        assert_eq!(
            Blake3Hasher::hash_bytes(b"abc").0,
            hex!("6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85")
        );
    }

    #[test]
    fn init_digest_checks_size() {
        assert!(Digest::init_digest_to(&[0u8; 31]).is_err());
        assert!(Digest::init_digest_to(&[0u8; 32]).is_ok());
    }

    #[test]
    fn pair_hash_differs_by_order() {
        let a = Blake3Hasher::hash_bytes(b"a");
        let b = Blake3Hasher::hash_bytes(b"b");
        assert_ne!(Blake3Hasher::hash_pair(&a, &b), Blake3Hasher::hash_pair(&b, &a));
    }

    #[test]
    fn leading_zero_bits_counts() {
        let mut digest = Digest([0xffu8; 32]);
        assert_eq!(digest.leading_zero_bits(), 0);
        digest.0[0] = 0;
        digest.0[1] = 0x0f;
        assert_eq!(digest.leading_zero_bits(), 12);
        assert_eq!(Digest([0u8; 32]).leading_zero_bits(), 256);
    }

    #[test]
    fn length_prefix_distinguishes() {
        // "ab" || "c" and "a" || "bc" collide without the length prefix.
        let one = Blake3Hasher::hash_bytes_with_length(b"abc");
        let two = Blake3Hasher::hash_bytes(b"abc");
        assert_ne!(one, two);
    }
}
