//! Unified hash module.
//!
//! Every digest is reached through a [`HashAlgId`]; the concrete implementations
//! are the RustCrypto hashes behind `digest::DynDigest`.

use crate::provider::Digest;
use derkit_types::{CryptoError, HashAlgId};
use digest::DynDigest;

/// A runtime-selected message digest context.
pub struct Hasher {
    alg: HashAlgId,
    inner: Box<dyn DynDigest + Send + Sync>,
}

impl Hasher {
    pub fn new(alg: HashAlgId) -> Self {
        let inner: Box<dyn DynDigest + Send + Sync> = match alg {
            HashAlgId::Md5 => Box::new(md5::Md5::default()),
            HashAlgId::Sha1 => Box::new(sha1::Sha1::default()),
            HashAlgId::Sha224 => Box::new(sha2::Sha224::default()),
            HashAlgId::Sha256 => Box::new(sha2::Sha256::default()),
            HashAlgId::Sha384 => Box::new(sha2::Sha384::default()),
            HashAlgId::Sha512 => Box::new(sha2::Sha512::default()),
            HashAlgId::Ripemd160 => Box::new(ripemd::Ripemd160::default()),
        };
        Self { alg, inner }
    }

    pub fn algorithm(&self) -> HashAlgId {
        self.alg
    }

    /// Finalize into a fresh buffer and reset the context.
    pub fn finish_vec(&mut self) -> Vec<u8> {
        self.inner.finalize_reset().into_vec()
    }
}

impl Digest for Hasher {
    fn output_size(&self) -> usize {
        self.alg.output_size()
    }

    fn block_size(&self) -> usize {
        self.alg.block_size()
    }

    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.inner.update(data);
        Ok(())
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        let n = self.output_size();
        if out.len() < n {
            return Err(CryptoError::InvalidArg);
        }
        self.inner
            .finalize_into_reset(&mut out[..n])
            .map_err(|_| CryptoError::InvalidArg)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

/// One-shot digest of `data`.
pub fn digest(alg: HashAlgId, data: &[u8]) -> Vec<u8> {
    let mut ctx = Hasher::new(alg);
    ctx.inner.update(data);
    ctx.finish_vec()
}

/// One-shot digest with the algorithm addressed by name ("SHA-1", "md5", ...).
pub fn digest_by_name(name: &str, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let alg = HashAlgId::from_name(name)
        .ok_or_else(|| CryptoError::UnsupportedAlgorithm(name.to_string()))?;
    Ok(digest(alg, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_abc_digests() {
        let cases = [
            (HashAlgId::Md5, "900150983cd24fb0d6963f7d28e17f72"),
            (HashAlgId::Sha1, "a9993e364706816aba3e25717850c26c9cd0d89d"),
            (HashAlgId::Ripemd160, "8eb208f7e05d987a9b044a8e98c6b087f15a0bfc"),
            (
                HashAlgId::Sha256,
                "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            ),
        ];
        for (alg, expected) in cases {
            let out = digest(alg, b"abc");
            assert_eq!(out.len(), alg.output_size());
            assert_eq!(hex(&out), expected, "{}", alg.name());
        }
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let mut ctx = Hasher::new(HashAlgId::Sha384);
        ctx.update(b"a").unwrap();
        ctx.update(b"bc").unwrap();
        let mut out = vec![0u8; 48];
        ctx.finish(&mut out).unwrap();
        assert_eq!(out, digest(HashAlgId::Sha384, b"abc"));

        // finish resets the context
        ctx.update(b"abc").unwrap();
        assert_eq!(ctx.finish_vec(), out);
    }

    #[test]
    fn test_by_name() {
        assert_eq!(
            digest_by_name("SHA-1", b"abc").unwrap(),
            digest(HashAlgId::Sha1, b"abc")
        );
        assert!(matches!(
            digest_by_name("whirlpool", b"abc"),
            Err(CryptoError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_short_output_buffer() {
        let mut ctx = Hasher::new(HashAlgId::Sha256);
        let mut out = [0u8; 16];
        assert_eq!(ctx.finish(&mut out), Err(CryptoError::InvalidArg));
    }
}
