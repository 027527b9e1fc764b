//! X.509 certificate model: parsing, names, extensions, public keys.

mod certificate;
mod extensions;
mod name;
mod public_key;
mod signing;
mod text;

pub use certificate::Certificate;
pub use extensions::{
    AuthorityKeyIdentifier, BasicConstraints, Extension, ExtensionValue, GeneralName, KeyUsage,
    NamedOid, PolicyInformation, PolicyQualifier,
};
pub use name::{AttributeTypeAndValue, DistinguishedName};
pub use public_key::PublicKey;

pub(crate) use public_key::dsa_params;

use crate::encoding::{bits_field, oid_field, sub_structure};
use derkit_types::Asn1Error;
use derkit_utils::asn1::{BitString, Structure, Value};
use derkit_utils::oid::Oid;

/// An algorithm OID with its (registry-resolved) parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmIdentifier {
    pub oid: Oid,
    /// `None` when the parameters field is absent; an explicit NULL is kept.
    pub parameters: Option<Value>,
}

impl AlgorithmIdentifier {
    pub(crate) fn from_structure(s: &Structure) -> Result<Self, Asn1Error> {
        Ok(Self {
            oid: oid_field(s, "algorithm")?.clone(),
            parameters: s.get("parameters").map(|p| p.inner().clone()),
        })
    }

    pub(crate) fn from_field(s: &Structure, name: &'static str) -> Result<Self, Asn1Error> {
        Self::from_structure(sub_structure(s, name)?)
    }

    /// Parameters that carry something other than NULL.
    pub fn meaningful_parameters(&self) -> Option<&Value> {
        self.parameters
            .as_ref()
            .filter(|p| !matches!(p, Value::Null(_)))
    }
}

/// Subject public key info: algorithm plus the raw key bit string.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectPublicKeyInfo {
    pub algorithm: AlgorithmIdentifier,
    pub public_key: BitString,
}

impl SubjectPublicKeyInfo {
    pub(crate) fn from_structure(s: &Structure) -> Result<Self, Asn1Error> {
        Ok(Self {
            algorithm: AlgorithmIdentifier::from_field(s, "algorithm")?,
            public_key: bits_field(s, "subjectPublicKey")?.clone(),
        })
    }
}

/// Parsing options for [`Certificate::from_der_with`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Fail on critical extensions that have no registered decoder or whose
    /// value does not decode. Off by default; such extensions are kept as
    /// opaque and logged.
    pub reject_unknown_critical: bool,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            reject_unknown_critical: true,
        }
    }
}
