//! PKCS#12 password integrity (RFC 7292 appendix B).
//!
//! ```text
//! MacData ::= SEQUENCE {
//!     mac         DigestInfo,
//!     macSalt     OCTET STRING,
//!     iterations  INTEGER DEFAULT 1 }
//! ```

use crate::encoding::{octets_field, sub_structure, u32_field};
use crate::oid_mapping::oid_to_hash;
use crate::x509::AlgorithmIdentifier;
use derkit_crypto::hmac::Hmac;
use derkit_crypto::pkcs12_kdf;
use derkit_types::KeystoreError;
use derkit_utils::asn1::Structure;
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroizing;

/// Check the MAC over the raw AuthenticatedSafe octets.
pub(crate) fn verify(
    mac_data: &Structure,
    password: &str,
    auth_safe: &[u8],
    max_iterations: u32,
) -> Result<(), KeystoreError> {
    let digest_info = sub_structure(mac_data, "mac")?;
    let algorithm = AlgorithmIdentifier::from_field(digest_info, "digestAlgorithm")?;
    let hash = oid_to_hash(&algorithm.oid).ok_or_else(|| {
        KeystoreError::UnsupportedFeature(format!("MAC digest {}", algorithm.oid))
    })?;
    let expected = octets_field(digest_info, "digest")?;
    let salt = octets_field(mac_data, "macSalt")?;
    let iterations = u32_field(mac_data, "iterations")?;
    if iterations == 0 || iterations > max_iterations {
        return Err(KeystoreError::InvalidStructure(format!(
            "MAC iteration count {iterations} out of range"
        )));
    }
    debug!(digest = hash.name(), iterations, "verifying keystore MAC");

    let bmp = Zeroizing::new(pkcs12_kdf::bmp_password(password));
    let key = Zeroizing::new(pkcs12_kdf::derive(
        hash,
        &bmp,
        salt,
        pkcs12_kdf::MAC_ID,
        iterations,
        hash.output_size(),
    )?);
    let actual = Hmac::mac(hash, &key, auth_safe)?;
    if actual.len() == expected.len() && bool::from(actual.ct_eq(expected)) {
        Ok(())
    } else {
        Err(KeystoreError::IntegrityCheckFailed)
    }
}
