//! Subject public keys decoded into crypto-layer key types.

use super::{AlgorithmIdentifier, SubjectPublicKeyInfo};
use crate::context::PkiContext;
use crate::encoding::{structure, unsigned_bytes, unsigned_field};
use crate::schema;
use derkit_crypto::dsa::{DsaParams, DsaPublicKey};
use derkit_crypto::rsa::RsaPublicKey;
use derkit_types::PkiError;
use derkit_utils::asn1::Value;
use derkit_utils::oid::{known, Oid};

/// A certificate's public key.
#[derive(Debug, Clone, PartialEq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    Dsa(DsaPublicKey),
    /// An algorithm this crate has no key type for; the raw key bits.
    Other { algorithm: Oid, key: Vec<u8> },
}

impl PublicKey {
    pub fn from_spki(ctx: &PkiContext, spki: &SubjectPublicKeyInfo) -> Result<Self, PkiError> {
        if spki.public_key.unused_bits != 0 {
            return Err(PkiError::InvalidKeySpec(
                "subjectPublicKey has unused bits".into(),
            ));
        }
        let key = &spki.public_key.bytes;
        match spki.algorithm.oid.to_dot_string().as_str() {
            known::RSA_ENCRYPTION => {
                let value = ctx.decode(schema::rsa_public_key, key)?;
                let s = structure(&value, "RSAPublicKey")?;
                let n = unsigned_field(s, "modulus")?;
                let e = unsigned_field(s, "publicExponent")?;
                Ok(PublicKey::Rsa(RsaPublicKey::new(&n, &e)?))
            }
            known::DSA => {
                let params = dsa_params(&spki.algorithm)?;
                let y = unsigned_bytes(&ctx.decode(Value::integer, key)?)?;
                Ok(PublicKey::Dsa(DsaPublicKey::new(params, &y)?))
            }
            _ => Ok(PublicKey::Other {
                algorithm: spki.algorithm.oid.clone(),
                key: key.clone(),
            }),
        }
    }

    pub fn algorithm_name(&self) -> &'static str {
        match self {
            PublicKey::Rsa(_) => "RSA",
            PublicKey::Dsa(_) => "DSA",
            PublicKey::Other { .. } => "unknown",
        }
    }

    /// Key size in bits: the modulus for RSA, the prime `p` for DSA.
    pub fn bits(&self) -> usize {
        match self {
            PublicKey::Rsa(key) => key.bits(),
            PublicKey::Dsa(key) => key.params().p().bits() as usize,
            PublicKey::Other { key, .. } => key.len() * 8,
        }
    }
}

/// Dss-Parms from a DSA algorithm identifier.
pub(crate) fn dsa_params(algorithm: &AlgorithmIdentifier) -> Result<DsaParams, PkiError> {
    let params = algorithm
        .meaningful_parameters()
        .ok_or_else(|| PkiError::InvalidKeySpec("DSA key without domain parameters".into()))?;
    let s = structure(params, "Dss-Parms")?;
    Ok(DsaParams::new(
        &unsigned_field(s, "p")?,
        &unsigned_field(s, "q")?,
        &unsigned_field(s, "g")?,
    )?)
}
