//! Trait-based provider interfaces.
//!
//! Callers that only need "a digest" or "a key agreement" program against these
//! traits; the concrete algorithm is chosen at runtime from an identifier.

use derkit_types::CryptoError;

/// A hash / message digest algorithm.
pub trait Digest: Send + Sync {
    /// The output size in bytes.
    fn output_size(&self) -> usize;

    /// The internal block size in bytes.
    fn block_size(&self) -> usize;

    /// Feed data into the hash state.
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError>;

    /// Finalize the hash and write the digest to `out`.
    /// The length of `out` must be at least `output_size()`.
    fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError>;

    /// Reset the hash state to process a new message.
    fn reset(&mut self);
}

/// Verifies a signature over a precomputed message digest.
pub trait Verifier {
    fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<bool, CryptoError>;
}

/// Produces a signature over a precomputed message digest.
pub trait Signer {
    fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// A key agreement party.
pub trait KeyAgreement {
    /// Compute the shared secret from the peer's public value.
    fn compute_shared_secret(&self, peer_public: &[u8]) -> Result<Vec<u8>, CryptoError>;
}
