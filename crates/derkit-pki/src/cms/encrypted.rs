//! PKCS#7 EncryptedData with password-based encryption.
//!
//! ```text
//! EncryptedData ::= SEQUENCE {
//!     version               INTEGER,
//!     encryptedContentInfo  EncryptedContentInfo }
//!
//! EncryptedContentInfo ::= SEQUENCE {
//!     contentType                 OBJECT IDENTIFIER,
//!     contentEncryptionAlgorithm  AlgorithmIdentifier,
//!     encryptedContent        [0] IMPLICIT OCTET STRING OPTIONAL }
//! ```

use crate::encoding::{oid_field, structure, sub_structure};
use crate::pkcs8::PbeParameters;
use crate::x509::AlgorithmIdentifier;
use derkit_types::PkiError;
use derkit_utils::asn1::Value;
use derkit_utils::oid::Oid;
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq)]
pub struct EncryptedData {
    pub version: u64,
    /// Type of the plaintext, normally `data`.
    pub content_type: Oid,
    pub algorithm: AlgorithmIdentifier,
    pub encrypted_content: Option<Vec<u8>>,
}

impl EncryptedData {
    pub(crate) fn from_value(value: &Value) -> Result<Self, PkiError> {
        let s = structure(value, "EncryptedData")?;
        let version = s
            .require("version")?
            .as_u64()
            .ok_or_else(|| PkiError::InvalidKeySpec("EncryptedData version out of range".into()))?;
        let eci = sub_structure(s, "encryptedContentInfo")?;
        Ok(Self {
            version,
            content_type: oid_field(eci, "contentType")?.clone(),
            algorithm: AlgorithmIdentifier::from_field(eci, "contentEncryptionAlgorithm")?,
            encrypted_content: eci
                .get("encryptedContent")
                .and_then(Value::as_octets)
                .map(<[u8]>::to_vec),
        })
    }

    pub fn parameters(&self) -> Result<PbeParameters, PkiError> {
        PbeParameters::from_algorithm(&self.algorithm)
    }

    /// Decrypt the content with `password`. Absent content decrypts to nothing.
    pub fn decrypt(&self, password: &str) -> Result<Zeroizing<Vec<u8>>, PkiError> {
        match &self.encrypted_content {
            Some(data) => self.parameters()?.decrypt(password, data),
            None => Ok(Zeroizing::new(Vec::new())),
        }
    }
}
