//! EMSA-PKCS1-v1_5 signature encoding (RFC 8017 §9.2).

use derkit_types::{CryptoError, HashAlgId};
use subtle::ConstantTimeEq;

/// DigestInfo DER prefix for MD5 (OID 1.2.840.113549.2.5).
const DIGEST_INFO_MD5: &[u8] = &[
    0x30, 0x20, 0x30, 0x0c, 0x06, 0x08, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x05, 0x05, 0x00,
    0x04, 0x10,
];

/// DigestInfo DER prefix for SHA-1 (OID 1.3.14.3.2.26).
const DIGEST_INFO_SHA1: &[u8] = &[
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];

/// DigestInfo DER prefix for SHA-224 (OID 2.16.840.1.101.3.4.2.4).
const DIGEST_INFO_SHA224: &[u8] = &[
    0x30, 0x2d, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x04, 0x05,
    0x00, 0x04, 0x1c,
];

/// DigestInfo DER prefix for SHA-256 (OID 2.16.840.1.101.3.4.2.1).
const DIGEST_INFO_SHA256: &[u8] = &[
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05,
    0x00, 0x04, 0x20,
];

/// DigestInfo DER prefix for SHA-384 (OID 2.16.840.1.101.3.4.2.2).
const DIGEST_INFO_SHA384: &[u8] = &[
    0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02, 0x05,
    0x00, 0x04, 0x30,
];

/// DigestInfo DER prefix for SHA-512 (OID 2.16.840.1.101.3.4.2.3).
const DIGEST_INFO_SHA512: &[u8] = &[
    0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03, 0x05,
    0x00, 0x04, 0x40,
];

/// DigestInfo DER prefix for RIPEMD-160 (OID 1.3.36.3.2.1).
const DIGEST_INFO_RIPEMD160: &[u8] = &[
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x24, 0x03, 0x02, 0x01, 0x05, 0x00, 0x04, 0x14,
];

fn digest_info_prefix(hash: HashAlgId) -> &'static [u8] {
    match hash {
        HashAlgId::Md5 => DIGEST_INFO_MD5,
        HashAlgId::Sha1 => DIGEST_INFO_SHA1,
        HashAlgId::Sha224 => DIGEST_INFO_SHA224,
        HashAlgId::Sha256 => DIGEST_INFO_SHA256,
        HashAlgId::Sha384 => DIGEST_INFO_SHA384,
        HashAlgId::Sha512 => DIGEST_INFO_SHA512,
        HashAlgId::Ripemd160 => DIGEST_INFO_RIPEMD160,
    }
}

/// EM = 0x00 || 0x01 || PS || 0x00 || DigestInfo, with PS at least 8 bytes of 0xFF.
pub(crate) fn sign_pad(hash: HashAlgId, digest: &[u8], k: usize) -> Result<Vec<u8>, CryptoError> {
    if digest.len() != hash.output_size() {
        return Err(CryptoError::InvalidArg);
    }
    let prefix = digest_info_prefix(hash);
    let t_len = prefix.len() + digest.len();

    // 3 header bytes + 8 bytes minimum padding
    if k < t_len + 11 {
        return Err(CryptoError::InvalidKey);
    }

    let ps_len = k - t_len - 3;
    let mut em = Vec::with_capacity(k);
    em.push(0x00);
    em.push(0x01);
    em.extend(std::iter::repeat(0xFF).take(ps_len));
    em.push(0x00);
    em.extend_from_slice(prefix);
    em.extend_from_slice(digest);

    debug_assert_eq!(em.len(), k);
    Ok(em)
}

/// Rebuild the expected encoding and compare in constant time.
pub(crate) fn verify_unpad(
    em: &[u8],
    hash: HashAlgId,
    expected_digest: &[u8],
    k: usize,
) -> Result<bool, CryptoError> {
    if expected_digest.len() != hash.output_size() {
        return Ok(false);
    }
    let expected_em = sign_pad(hash, expected_digest, k)?;
    Ok(em.ct_eq(&expected_em).into())
}
