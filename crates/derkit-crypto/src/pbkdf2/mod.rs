//! PBKDF2 (RFC 8018) with an HMAC pseudorandom function.
//!
//! PBES2 key derivation in PKCS#8 and PKCS#12 files names its PRF by OID;
//! the caller maps that to a [`HashAlgId`].

use derkit_types::{CryptoError, HashAlgId};
use hmac::Hmac;

/// Derive `dk_len` bytes from `password` using PBKDF2-HMAC-`alg`.
pub fn pbkdf2(
    alg: HashAlgId,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    dk_len: usize,
) -> Result<Vec<u8>, CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::KdfInvalidIterations);
    }
    if dk_len == 0 {
        return Err(CryptoError::InvalidArg);
    }
    let mut out = vec![0u8; dk_len];
    let result = match alg {
        HashAlgId::Md5 => ::pbkdf2::pbkdf2::<Hmac<md5::Md5>>(password, salt, iterations, &mut out),
        HashAlgId::Sha1 => {
            ::pbkdf2::pbkdf2::<Hmac<sha1::Sha1>>(password, salt, iterations, &mut out)
        }
        HashAlgId::Sha224 => {
            ::pbkdf2::pbkdf2::<Hmac<sha2::Sha224>>(password, salt, iterations, &mut out)
        }
        HashAlgId::Sha256 => {
            ::pbkdf2::pbkdf2::<Hmac<sha2::Sha256>>(password, salt, iterations, &mut out)
        }
        HashAlgId::Sha384 => {
            ::pbkdf2::pbkdf2::<Hmac<sha2::Sha384>>(password, salt, iterations, &mut out)
        }
        HashAlgId::Sha512 => {
            ::pbkdf2::pbkdf2::<Hmac<sha2::Sha512>>(password, salt, iterations, &mut out)
        }
        HashAlgId::Ripemd160 => {
            ::pbkdf2::pbkdf2::<Hmac<ripemd::Ripemd160>>(password, salt, iterations, &mut out)
        }
    };
    result.map_err(|_| CryptoError::InvalidArg)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    // RFC 6070
    #[test]
    fn test_pbkdf2_sha1() {
        let dk = pbkdf2(HashAlgId::Sha1, b"password", b"salt", 1, 20).unwrap();
        assert_eq!(hex(&dk), "0c60c80f961f0e71f3a9b524af6012062fe037a6");
        let dk = pbkdf2(HashAlgId::Sha1, b"password", b"salt", 2, 20).unwrap();
        assert_eq!(hex(&dk), "ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957");
    }

    #[test]
    fn test_pbkdf2_sha256() {
        let dk = pbkdf2(HashAlgId::Sha256, b"password", b"salt", 4096, 32).unwrap();
        assert_eq!(
            hex(&dk),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(
            pbkdf2(HashAlgId::Sha1, b"p", b"s", 0, 20),
            Err(CryptoError::KdfInvalidIterations)
        );
        assert_eq!(
            pbkdf2(HashAlgId::Sha1, b"p", b"s", 1, 0),
            Err(CryptoError::InvalidArg)
        );
    }
}
