//! PKCS#8 private keys (RFC 5958).
//!
//! Parses PrivateKeyInfo into RSA or DSA private keys. Password-protected
//! EncryptedPrivateKeyInfo lives in the `encrypted` submodule.
//!
//! ```text
//! PrivateKeyInfo ::= SEQUENCE {
//!     version                   INTEGER,
//!     privateKeyAlgorithm       AlgorithmIdentifier,
//!     privateKey                OCTET STRING,
//!     attributes           [0]  IMPLICIT Attributes OPTIONAL,
//!     publicKey            [1]  IMPLICIT BIT STRING OPTIONAL }
//! ```

pub mod encrypted;

pub use encrypted::{decrypt_pkcs8_der, decrypt_pkcs8_pem, EncryptedPrivateKeyInfo, PbeParameters};

use crate::context::PkiContext;
use crate::encoding::{octets_field, structure, unsigned_bytes, unsigned_field};
use crate::schema;
use crate::x509::{dsa_params, AlgorithmIdentifier, PublicKey};
use derkit_crypto::dsa::{DsaParams, DsaPrivateKey};
use derkit_crypto::rsa::RsaPrivateKey;
use derkit_types::PkiError;
use derkit_utils::asn1::Value;
use derkit_utils::oid::known;
use derkit_utils::pem;
use tracing::debug;
use zeroize::Zeroizing;

/// A private key recovered from a PrivateKeyInfo.
#[derive(Debug, Clone)]
pub enum PrivateKey {
    /// RSA private key with all CRT components.
    Rsa(RsaPrivateKey),
    /// DSA private key with its domain parameters.
    Dsa(DsaPrivateKey),
}

impl PrivateKey {
    /// Parse a DER-encoded PrivateKeyInfo with the shared context.
    pub fn from_der(der: &[u8]) -> Result<Self, PkiError> {
        Self::from_der_with(PkiContext::shared()?, der)
    }

    pub fn from_der_with(ctx: &PkiContext, der: &[u8]) -> Result<Self, PkiError> {
        let value = ctx.decode(schema::private_key_info, der)?;
        Self::from_value(ctx, &value)
    }

    /// Parse a PEM "PRIVATE KEY" block.
    pub fn from_pem(input: &str) -> Result<Self, PkiError> {
        let der = Zeroizing::new(pem::find(input, "PRIVATE KEY")?);
        Self::from_der(&der)
    }

    /// Build a key from a decoded PrivateKeyInfo tree.
    pub(crate) fn from_value(ctx: &PkiContext, value: &Value) -> Result<Self, PkiError> {
        let info = structure(value, "PrivateKeyInfo")?;
        let version = info.require("version")?.as_u64();
        if !matches!(version, Some(0 | 1)) {
            return Err(PkiError::InvalidKeySpec(format!(
                "unsupported PrivateKeyInfo version {version:?}"
            )));
        }
        let algorithm = AlgorithmIdentifier::from_field(info, "privateKeyAlgorithm")?;
        let key = octets_field(info, "privateKey")?;
        match algorithm.oid.to_dot_string().as_str() {
            known::RSA_ENCRYPTION => rsa_private_key(ctx, key),
            known::DSA => dsa_private_key(ctx, dsa_params(&algorithm)?, key),
            other => Err(PkiError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    pub fn algorithm_name(&self) -> &'static str {
        match self {
            PrivateKey::Rsa(_) => "RSA",
            PrivateKey::Dsa(_) => "DSA",
        }
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Rsa(key) => PublicKey::Rsa(key.public_key()),
            PrivateKey::Dsa(key) => PublicKey::Dsa(key.public_key()),
        }
    }

    /// True when `public` is this key's public half.
    pub fn public_matches(&self, public: &PublicKey) -> bool {
        self.public_key() == *public
    }

    pub fn as_rsa(&self) -> Result<&RsaPrivateKey, PkiError> {
        match self {
            PrivateKey::Rsa(key) => Ok(key),
            other => Err(PkiError::WrongKeyType {
                expected: "RSA",
                found: other.algorithm_name().to_string(),
            }),
        }
    }

    pub fn as_dsa(&self) -> Result<&DsaPrivateKey, PkiError> {
        match self {
            PrivateKey::Dsa(key) => Ok(key),
            other => Err(PkiError::WrongKeyType {
                expected: "DSA",
                found: other.algorithm_name().to_string(),
            }),
        }
    }
}

fn rsa_private_key(ctx: &PkiContext, der: &[u8]) -> Result<PrivateKey, PkiError> {
    let value = ctx.decode(schema::rsa_private_key, der)?;
    let s = structure(&value, "RSAPrivateKey")?;
    let field = |name| unsigned_field(s, name).map(Zeroizing::new);
    let key = RsaPrivateKey::new(
        &field("modulus")?,
        &field("publicExponent")?,
        &field("privateExponent")?,
        &field("prime1")?,
        &field("prime2")?,
    )
    .map_err(|e| PkiError::InvalidKeySpec(format!("RSAPrivateKey: {e}")))?;
    Ok(PrivateKey::Rsa(key))
}

/// The private value is a bare INTEGER; some producers instead emit a
/// `SEQUENCE { y, x }`. Both are tried, in that order.
fn dsa_private_key(ctx: &PkiContext, params: DsaParams, der: &[u8]) -> Result<PrivateKey, PkiError> {
    let x = match ctx.decode(Value::integer, der) {
        Ok(value) => Zeroizing::new(unsigned_bytes(&value)?),
        Err(single) => {
            debug!(error = %single, "DSA private key is not a bare INTEGER, trying SEQUENCE form");
            let value = ctx
                .decode(schema::dsa_private_key_pair, der)
                .map_err(|_| PkiError::InvalidKeySpec("unrecognized DSA private key encoding".into()))?;
            let last = value
                .as_collection()
                .and_then(|list| list.iter().last())
                .ok_or_else(|| PkiError::InvalidKeySpec("empty DSA private key sequence".into()))?;
            Zeroizing::new(unsigned_bytes(last)?)
        }
    };
    let key = DsaPrivateKey::new(params, &x)
        .map_err(|e| PkiError::InvalidKeySpec(format!("DSA private key: {e}")))?;
    Ok(PrivateKey::Dsa(key))
}
