#![forbid(unsafe_code)]
#![doc = "Cryptographic collaborators for derkit: digests, HMAC, PKCS#12 and PBKDF2 key derivation, legacy and AES ciphers, RSA/DSA/DH arithmetic."]

// Core traits
pub mod provider;

// Digests and MACs
#[cfg(feature = "hash")]
pub mod hash;
#[cfg(feature = "hmac")]
pub mod hmac;

// Key derivation
#[cfg(feature = "pbkdf2")]
pub mod pbkdf2;
#[cfg(feature = "pkcs12-kdf")]
pub mod pkcs12_kdf;

// Symmetric ciphers
#[cfg(feature = "cipher")]
pub mod cipher;

// Public-key arithmetic
#[cfg(feature = "dh")]
pub mod dh;
#[cfg(feature = "dsa")]
pub mod dsa;
#[cfg(feature = "rsa")]
pub mod rsa;

pub use derkit_types::{CipherAlgId, CipherDirection, CryptoError, HashAlgId};

/// Left-pad `value` with zeros to exactly `len` bytes.
#[cfg(any(feature = "rsa", feature = "dh"))]
pub(crate) fn to_bytes_padded(
    value: &num_bigint::BigUint,
    len: usize,
) -> Result<Vec<u8>, CryptoError> {
    let bytes = value.to_bytes_be();
    if bytes.len() > len {
        return Err(CryptoError::InvalidArg);
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(&bytes);
    Ok(out)
}
