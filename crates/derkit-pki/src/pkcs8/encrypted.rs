//! Encrypted PKCS#8 (EncryptedPrivateKeyInfo) and password-based encryption.
//!
//! Two families are supported: the PKCS#12 PBE suites (SHA-1 key derivation
//! with RC2, RC4 or triple DES) and PBES2 (PBKDF2 with AES or triple DES).
//! The same parameters drive PKCS#12 `encryptedData` content.
//!
//! ```text
//! EncryptedPrivateKeyInfo ::= SEQUENCE {
//!     encryptionAlgorithm  AlgorithmIdentifier,
//!     encryptedData        OCTET STRING
//! }
//! ```

use super::PrivateKey;
use crate::context::PkiContext;
use crate::encoding::{octets_field, structure, u32_field, u64_field_opt};
use crate::oid_mapping::{oid_to_hash, oid_to_pbes2_cipher, oid_to_pkcs12_pbe};
use crate::schema;
use crate::x509::AlgorithmIdentifier;
use derkit_crypto::{cipher, pbkdf2, pkcs12_kdf};
use derkit_types::{CipherAlgId, CipherDirection, HashAlgId, PkiError};
use derkit_utils::asn1::Value;
use derkit_utils::oid::known;
use derkit_utils::pem;
use zeroize::Zeroizing;

/// Decoded password-based encryption parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum PbeParameters {
    /// `pbeWithSHAAnd*` from PKCS#12: key and IV from the PKCS#12 KDF.
    Pkcs12 {
        cipher: CipherAlgId,
        key_len: usize,
        salt: Vec<u8>,
        iterations: u32,
    },
    /// PBES2 with PBKDF2 key derivation.
    Pbes2 {
        prf: HashAlgId,
        salt: Vec<u8>,
        iterations: u32,
        key_len: usize,
        cipher: CipherAlgId,
        iv: Vec<u8>,
    },
}

impl PbeParameters {
    pub fn from_algorithm(algorithm: &AlgorithmIdentifier) -> Result<Self, PkiError> {
        let params = algorithm.meaningful_parameters().ok_or_else(|| {
            PkiError::InvalidKeySpec(format!("{} without parameters", algorithm.oid))
        })?;
        if let Some((cipher, key_len)) = oid_to_pkcs12_pbe(&algorithm.oid) {
            let s = structure(params, "PKCS12PbeParams")?;
            return Ok(PbeParameters::Pkcs12 {
                cipher,
                key_len,
                salt: octets_field(s, "salt")?.to_vec(),
                iterations: u32_field(s, "iterations")?,
            });
        }
        if algorithm.oid.to_dot_string() == known::PBES2 {
            return pbes2(structure(params, "PBES2-params")?);
        }
        Err(PkiError::UnsupportedAlgorithm(algorithm.oid.to_string()))
    }

    pub fn iterations(&self) -> u32 {
        match self {
            PbeParameters::Pkcs12 { iterations, .. } | PbeParameters::Pbes2 { iterations, .. } => {
                *iterations
            }
        }
    }

    /// Derive the key and IV from `password` and decrypt `data`.
    pub fn decrypt(&self, password: &str, data: &[u8]) -> Result<Zeroizing<Vec<u8>>, PkiError> {
        let plain = match self {
            PbeParameters::Pkcs12 {
                cipher: alg,
                key_len,
                salt,
                iterations,
            } => {
                let bmp = Zeroizing::new(pkcs12_kdf::bmp_password(password));
                let derive = |id, len| {
                    pkcs12_kdf::derive(HashAlgId::Sha1, &bmp, salt, id, *iterations, len)
                        .map(Zeroizing::new)
                };
                let key = derive(pkcs12_kdf::KEY_ID, *key_len)?;
                let iv = if alg.needs_iv() {
                    derive(pkcs12_kdf::IV_ID, alg.block_size())?
                } else {
                    Zeroizing::new(Vec::new())
                };
                cipher::cipher(CipherDirection::Decrypt, *alg, &key, &iv, data)?
            }
            PbeParameters::Pbes2 {
                prf,
                salt,
                iterations,
                key_len,
                cipher: alg,
                iv,
            } => {
                let key = Zeroizing::new(pbkdf2::pbkdf2(
                    *prf,
                    password.as_bytes(),
                    salt,
                    *iterations,
                    *key_len,
                )?);
                cipher::cipher(CipherDirection::Decrypt, *alg, &key, iv, data)?
            }
        };
        Ok(Zeroizing::new(plain))
    }
}

fn pbes2(s: &derkit_utils::asn1::Structure) -> Result<PbeParameters, PkiError> {
    let kdf = AlgorithmIdentifier::from_field(s, "keyDerivationFunc")?;
    if kdf.oid.to_dot_string() != known::PBKDF2 {
        return Err(PkiError::UnsupportedAlgorithm(format!("PBES2 KDF {}", kdf.oid)));
    }
    let scheme = AlgorithmIdentifier::from_field(s, "encryptionScheme")?;
    let cipher = oid_to_pbes2_cipher(&scheme.oid)
        .ok_or_else(|| PkiError::UnsupportedAlgorithm(format!("PBES2 cipher {}", scheme.oid)))?;
    let iv = scheme
        .parameters
        .as_ref()
        .and_then(Value::as_octets)
        .ok_or_else(|| PkiError::InvalidKeySpec("PBES2 cipher without IV".into()))?
        .to_vec();

    let params = kdf
        .meaningful_parameters()
        .ok_or_else(|| PkiError::InvalidKeySpec("PBKDF2 without parameters".into()))?;
    let p = structure(params, "PBKDF2-params")?;
    let salt = p
        .require("salt")?
        .as_octets()
        .ok_or_else(|| PkiError::UnsupportedAlgorithm("PBKDF2 otherSource salt".into()))?
        .to_vec();
    let prf = match p.get("prf") {
        Some(prf) => {
            let prf = AlgorithmIdentifier::from_structure(structure(prf, "prf")?)?;
            oid_to_hash(&prf.oid)
                .ok_or_else(|| PkiError::UnsupportedAlgorithm(format!("PBKDF2 PRF {}", prf.oid)))?
        }
        None => HashAlgId::Sha1,
    };
    let key_len = match u64_field_opt(p, "keyLength")? {
        Some(len) => usize::try_from(len)
            .map_err(|_| PkiError::InvalidKeySpec("PBKDF2 keyLength out of range".into()))?,
        None => cipher::key_len(cipher).ok_or_else(|| {
            PkiError::InvalidKeySpec("PBKDF2 keyLength required for this cipher".into())
        })?,
    };
    Ok(PbeParameters::Pbes2 {
        prf,
        salt,
        iterations: u32_field(p, "iterationCount")?,
        key_len,
        cipher,
        iv,
    })
}

/// A password-protected PrivateKeyInfo.
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptedPrivateKeyInfo {
    pub algorithm: AlgorithmIdentifier,
    pub encrypted_data: Vec<u8>,
}

impl EncryptedPrivateKeyInfo {
    pub fn from_der_with(ctx: &PkiContext, der: &[u8]) -> Result<Self, PkiError> {
        Self::from_value(&ctx.decode(schema::encrypted_private_key_info, der)?)
    }

    pub(crate) fn from_value(value: &Value) -> Result<Self, PkiError> {
        let s = structure(value, "EncryptedPrivateKeyInfo")?;
        Ok(Self {
            algorithm: AlgorithmIdentifier::from_field(s, "encryptionAlgorithm")?,
            encrypted_data: octets_field(s, "encryptedData")?.to_vec(),
        })
    }

    pub fn parameters(&self) -> Result<PbeParameters, PkiError> {
        PbeParameters::from_algorithm(&self.algorithm)
    }

    /// Decrypt to PrivateKeyInfo DER.
    ///
    /// The plaintext must decode as a PrivateKeyInfo; padding alone does not
    /// prove the password was right.
    pub fn decrypt(&self, ctx: &PkiContext, password: &str) -> Result<Zeroizing<Vec<u8>>, PkiError> {
        let plain = self.parameters()?.decrypt(password, &self.encrypted_data)?;
        ctx.decode(schema::private_key_info, &plain).map_err(|e| {
            PkiError::InvalidKeySpec(format!("decrypted data is not a PrivateKeyInfo: {e}"))
        })?;
        Ok(plain)
    }

    /// Decrypt and parse the private key.
    pub fn decrypt_key(&self, ctx: &PkiContext, password: &str) -> Result<PrivateKey, PkiError> {
        let plain = self.decrypt(ctx, password)?;
        PrivateKey::from_der_with(ctx, &plain)
    }
}

/// Decrypt an EncryptedPrivateKeyInfo DER structure to PrivateKeyInfo DER.
pub fn decrypt_pkcs8_der(der: &[u8], password: &str) -> Result<Zeroizing<Vec<u8>>, PkiError> {
    let ctx = PkiContext::shared()?;
    EncryptedPrivateKeyInfo::from_der_with(ctx, der)?.decrypt(ctx, password)
}

/// Decrypt a PEM "ENCRYPTED PRIVATE KEY" block to PrivateKeyInfo DER.
pub fn decrypt_pkcs8_pem(input: &str, password: &str) -> Result<Zeroizing<Vec<u8>>, PkiError> {
    decrypt_pkcs8_der(&pem::find(input, "ENCRYPTED PRIVATE KEY")?, password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    // A toy DSA PrivateKeyInfo (p = 283, q = 47, g = 64, x = 24) under
    // password "secret", salt 0102030405060708, 3 iterations.
    const PLAIN: &str = "301f020100301506072a8648ce380401300a0202011b02012f0201400403020118";
    const LEGACY_3DES: &str = "3047301b060a2a864886f70d010c0103300d04080102030405060708020103\
        04289cb51c085061cc5c191319b1012bc7cc008b448d0abca811568bd9f0ef03cdd1faa3e597de4bd3c6";
    const PBES2_SHA256_AES128: &str = "30818a305606092a864886f70d01050d3049302806092a864886f70d\
        01050c301b04080102030405060708020103300c06082a864886f70d02090500301d0609608648016503040102\
        0410000102030405060708090a0b0c0d0e0f0430dfa095dc5682b95677dabf95da43f2652955b914ef6df78b00\
        4d6f95f61ae47a63177ca45c34c6778d2cd9215b7f7d45";
    const PBES2_SHA1_AES256: &str = "307c304806092a864886f70d01050d303b301a06092a864886f70d0105\
        0c300d04080102030405060708020103301d060960864801650304012a0410000102030405060708090a0b0c0d\
        0e0f04306e7604b8c51ed53ed4d189974e185dfbc7567d246cb135d8cdd546e1f0c17d843a82056926ebe966a4\
        20dbe376f7ff62";

    #[test]
    fn test_legacy_pbe() {
        let plain = decrypt_pkcs8_der(&hex(LEGACY_3DES), "secret").unwrap();
        assert_eq!(*plain, hex(PLAIN));

        let ctx = PkiContext::shared().unwrap();
        let info = EncryptedPrivateKeyInfo::from_der_with(ctx, &hex(LEGACY_3DES)).unwrap();
        assert_eq!(
            info.parameters().unwrap(),
            PbeParameters::Pkcs12 {
                cipher: CipherAlgId::DesEde3Cbc,
                key_len: 24,
                salt: hex("0102030405060708"),
                iterations: 3,
            }
        );
    }

    #[test]
    fn test_pbes2() {
        let plain = decrypt_pkcs8_der(&hex(PBES2_SHA256_AES128), "secret").unwrap();
        assert_eq!(*plain, hex(PLAIN));

        // prf absent: hmacWithSHA1; keyLength absent: from the cipher
        let ctx = PkiContext::shared().unwrap();
        let info = EncryptedPrivateKeyInfo::from_der_with(ctx, &hex(PBES2_SHA1_AES256)).unwrap();
        match info.parameters().unwrap() {
            PbeParameters::Pbes2 {
                prf,
                key_len,
                cipher,
                iterations,
                ..
            } => {
                assert_eq!(prf, HashAlgId::Sha1);
                assert_eq!(key_len, 32);
                assert_eq!(cipher, CipherAlgId::Aes256Cbc);
                assert_eq!(iterations, 3);
            }
            other => panic!("unexpected parameters {other:?}"),
        }
        let key = info.decrypt_key(ctx, "secret").unwrap();
        assert_eq!(key.as_dsa().unwrap().x_bytes(), &[24]);
    }

    #[test]
    fn test_wrong_password() {
        for der in [LEGACY_3DES, PBES2_SHA256_AES128, PBES2_SHA1_AES256] {
            assert!(decrypt_pkcs8_der(&hex(der), "wrong").is_err());
        }
    }

    #[test]
    fn test_pem_and_unsupported() {
        let text = pem::encode("ENCRYPTED PRIVATE KEY", &hex(PBES2_SHA256_AES128));
        assert_eq!(*decrypt_pkcs8_pem(&text, "secret").unwrap(), hex(PLAIN));

        let alg = AlgorithmIdentifier {
            oid: "1.2.3.4".parse().unwrap(),
            parameters: Some(Value::from_octets(vec![1])),
        };
        assert!(matches!(
            PbeParameters::from_algorithm(&alg),
            Err(PkiError::UnsupportedAlgorithm(_))
        ));
        let alg = AlgorithmIdentifier {
            oid: known::PBES2.parse().unwrap(),
            parameters: None,
        };
        assert!(matches!(
            PbeParameters::from_algorithm(&alg),
            Err(PkiError::InvalidKeySpec(_))
        ));
    }
}
