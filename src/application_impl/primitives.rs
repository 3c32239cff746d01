use crate::domain_port::{Clock, RandomSource, RandomSourceError};
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Operating-system entropy.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandomSource;

impl RandomSource for OsRandomSource {
    fn fill(&self, buf: &mut [u8]) -> Result<(), RandomSourceError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| RandomSourceError(e.to_string()))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// SHA-256 of a verifier.
pub fn hash_verifier(verifier: &[u8]) -> Vec<u8> {
    Sha256::digest(verifier).to_vec()
}

/// Equality whose running time does not depend on where the inputs differ.
/// Inputs of different length compare unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_known_sha256() {
        assert_eq!(
            hex::encode(hash_verifier(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn os_random_source_fills_buffer() {
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        OsRandomSource.fill(&mut a).unwrap();
        OsRandomSource.fill(&mut b).unwrap();
        assert_ne!(a, b);
    }
}
