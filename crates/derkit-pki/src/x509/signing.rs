//! Signature verification for signed X.509 structures.

use super::{AlgorithmIdentifier, Certificate, PublicKey};
use crate::oid_mapping::{oid_to_signature, SignatureFamily};
use derkit_crypto::hash::digest;
use derkit_types::PkiError;
use derkit_utils::asn1::BitString;
use tracing::debug;

impl Certificate {
    /// Verify this certificate's signature with `issuer_key`.
    ///
    /// `Ok(false)` means the signature does not match; errors are reserved
    /// for unsupported algorithms and key/algorithm mismatches.
    pub fn verify_signature(&self, issuer_key: &PublicKey) -> Result<bool, PkiError> {
        verify_signed_data(
            self.signature_algorithm(),
            self.tbs_der(),
            self.signature_bits(),
            issuer_key,
        )
    }

    /// Verify this certificate's signature with `issuer`'s public key.
    pub fn verify_issued_by(&self, issuer: &Certificate) -> Result<bool, PkiError> {
        self.verify_signature(&issuer.public_key()?)
    }
}

pub(crate) fn verify_signed_data(
    algorithm: &AlgorithmIdentifier,
    data: &[u8],
    signature: &BitString,
    key: &PublicKey,
) -> Result<bool, PkiError> {
    let (family, hash) = oid_to_signature(&algorithm.oid)
        .ok_or_else(|| PkiError::UnsupportedAlgorithm(algorithm.oid.to_string()))?;
    if signature.unused_bits != 0 {
        debug!("signature bit string has unused bits");
        return Ok(false);
    }
    let hashed = digest(hash, data);
    match (family, key) {
        (SignatureFamily::Rsa, PublicKey::Rsa(key)) => {
            Ok(key.verify_pkcs1v15(hash, &hashed, &signature.bytes)?)
        }
        (SignatureFamily::Dsa, PublicKey::Dsa(key)) => Ok(key.verify(&hashed, &signature.bytes)?),
        (family, other) => Err(PkiError::WrongKeyType {
            expected: match family {
                SignatureFamily::Rsa => "RSA",
                SignatureFamily::Dsa => "DSA",
            },
            found: other.algorithm_name().to_string(),
        }),
    }
}
