//! PKCS#7 / CMS content: ContentInfo and password-encrypted data.

mod encrypted;

pub use encrypted::EncryptedData;

use crate::context::PkiContext;
use crate::encoding::{oid_field, structure};
use crate::schema;
use derkit_types::PkiError;
use derkit_utils::asn1::Value;
use derkit_utils::oid::{known, Oid};
use std::fmt;

/// PKCS#7 content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Data,
    SignedData,
    EnvelopedData,
    SignedAndEnvelopedData,
    DigestedData,
    EncryptedData,
    Other,
}

impl ContentType {
    pub fn from_oid(oid: &Oid) -> Self {
        match oid.to_dot_string().as_str() {
            known::PKCS7_DATA => ContentType::Data,
            known::PKCS7_SIGNED_DATA => ContentType::SignedData,
            known::PKCS7_ENVELOPED_DATA => ContentType::EnvelopedData,
            known::PKCS7_SIGNED_AND_ENVELOPED_DATA => ContentType::SignedAndEnvelopedData,
            known::PKCS7_DIGESTED_DATA => ContentType::DigestedData,
            known::PKCS7_ENCRYPTED_DATA => ContentType::EncryptedData,
            _ => ContentType::Other,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContentType::Data => "data",
            ContentType::SignedData => "signedData",
            ContentType::EnvelopedData => "envelopedData",
            ContentType::SignedAndEnvelopedData => "signedAndEnvelopedData",
            ContentType::DigestedData => "digestedData",
            ContentType::EncryptedData => "encryptedData",
            ContentType::Other => "unknown",
        })
    }
}

/// ```text
/// ContentInfo ::= SEQUENCE {
///     contentType  OBJECT IDENTIFIER,
///     content      [0] EXPLICIT ANY DEFINED BY contentType OPTIONAL }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ContentInfo {
    pub content_type: ContentType,
    pub content_type_oid: Oid,
    /// The registry-resolved content, with the `[0]` wrapper removed.
    pub content: Option<Value>,
}

impl ContentInfo {
    pub fn from_der_with(ctx: &PkiContext, der: &[u8]) -> Result<Self, PkiError> {
        Self::from_value(&ctx.decode(schema::content_info, der)?)
    }

    pub(crate) fn from_value(value: &Value) -> Result<Self, PkiError> {
        let s = structure(value, "ContentInfo")?;
        let oid = oid_field(s, "contentType")?.clone();
        Ok(Self {
            content_type: ContentType::from_oid(&oid),
            content_type_oid: oid,
            content: s.get("content").map(|c| c.inner().clone()),
        })
    }

    /// The octets of a `data` content.
    pub fn data(&self) -> Result<&[u8], PkiError> {
        if self.content_type != ContentType::Data {
            return Err(PkiError::InvalidKeySpec(format!(
                "expected data content, found {}",
                self.content_type
            )));
        }
        self.content
            .as_ref()
            .and_then(Value::as_octets)
            .ok_or_else(|| PkiError::InvalidKeySpec("data content without octets".into()))
    }

    /// The body of an `encryptedData` content.
    pub fn encrypted_data(&self) -> Result<EncryptedData, PkiError> {
        if self.content_type != ContentType::EncryptedData {
            return Err(PkiError::InvalidKeySpec(format!(
                "expected encryptedData content, found {}",
                self.content_type
            )));
        }
        let content = self
            .content
            .as_ref()
            .ok_or_else(|| PkiError::InvalidKeySpec("encryptedData without content".into()))?;
        EncryptedData::from_value(content)
    }
}
