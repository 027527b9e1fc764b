//! X.509 extension types and their decoding through the OID registry.

use super::DistinguishedName;
use crate::context::PkiContext;
use crate::encoding::{octets_field, oid_field, structure};
use derkit_types::Asn1Error;
use derkit_utils::asn1::{BitString, Structure, Value};
use derkit_utils::oid::{known, Oid};
use num_bigint::BigInt;
use tracing::warn;

// ---------------------------------------------------------------------------
// Extension types
// ---------------------------------------------------------------------------

/// Parsed BasicConstraints extension (RFC 5280 §4.2.1.9).
#[derive(Debug, Clone, PartialEq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub path_len_constraint: Option<u32>,
}

/// Parsed KeyUsage extension (RFC 5280 §4.2.1.3) as a bit-flag mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub u16);

impl KeyUsage {
    // BIT STRING bit numbering: bit 0 = MSB of first byte (0x80).
    pub const DIGITAL_SIGNATURE: u16 = 0x0080;
    pub const NON_REPUDIATION: u16 = 0x0040;
    pub const KEY_ENCIPHERMENT: u16 = 0x0020;
    pub const DATA_ENCIPHERMENT: u16 = 0x0010;
    pub const KEY_AGREEMENT: u16 = 0x0008;
    pub const KEY_CERT_SIGN: u16 = 0x0004;
    pub const CRL_SIGN: u16 = 0x0002;
    pub const ENCIPHER_ONLY: u16 = 0x0001;
    pub const DECIPHER_ONLY: u16 = 0x8000;

    pub(crate) const NAMES: [(u16, &'static str); 9] = [
        (Self::DIGITAL_SIGNATURE, "Digital Signature"),
        (Self::NON_REPUDIATION, "Non Repudiation"),
        (Self::KEY_ENCIPHERMENT, "Key Encipherment"),
        (Self::DATA_ENCIPHERMENT, "Data Encipherment"),
        (Self::KEY_AGREEMENT, "Key Agreement"),
        (Self::KEY_CERT_SIGN, "Certificate Sign"),
        (Self::CRL_SIGN, "CRL Sign"),
        (Self::ENCIPHER_ONLY, "Encipher Only"),
        (Self::DECIPHER_ONLY, "Decipher Only"),
    ];

    pub fn from_bits(bits: &BitString) -> Self {
        let mut mask = 0u16;
        for (i, byte) in bits.bytes.iter().take(2).enumerate() {
            let mut byte = *byte;
            if i + 1 == bits.bytes.len() && bits.unused_bits < 8 {
                byte &= 0xffu8 << bits.unused_bits;
            }
            mask |= (byte as u16) << (8 * i);
        }
        KeyUsage(mask)
    }

    pub fn has(&self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    /// Names of the asserted usages, in bit order.
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.has(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// An OID paired with its registered display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedOid {
    pub oid: Oid,
    pub name: Option<&'static str>,
}

impl NamedOid {
    fn new(ctx: &PkiContext, oid: &Oid) -> Self {
        Self {
            name: ctx.registry().lookup_name(oid),
            oid: oid.clone(),
        }
    }
}

impl std::fmt::Display for NamedOid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.oid),
        }
    }
}

/// A GeneralName value as used in SAN, IAN and AKI.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneralName {
    OtherName { type_id: Oid, value: Vec<u8> },
    Rfc822Name(String),
    DnsName(String),
    DirectoryName(DistinguishedName),
    Uri(String),
    IpAddress(Vec<u8>),
    RegisteredId(Oid),
}

impl GeneralName {
    fn from_value(ctx: &PkiContext, value: &Value) -> Result<Self, Asn1Error> {
        let choice = value
            .as_choice()
            .ok_or(Asn1Error::TypeMismatch("GeneralName"))?;
        let (name, selected) = choice
            .selection()
            .ok_or_else(|| Asn1Error::ValueNotSet("GeneralName".into()))?;
        let text = || {
            selected
                .as_text()
                .ok_or(Asn1Error::TypeMismatch("IA5String"))
        };
        let general_name = match name {
            "otherName" => {
                let s = structure(selected, "AnotherName")?;
                GeneralName::OtherName {
                    type_id: oid_field(s, "type-id")?.clone(),
                    value: ctx.codec().to_der(s.require("value")?.inner())?,
                }
            }
            "rfc822Name" => GeneralName::Rfc822Name(text()?),
            "dNSName" => GeneralName::DnsName(text()?),
            "uniformResourceIdentifier" => GeneralName::Uri(text()?),
            "directoryName" => {
                GeneralName::DirectoryName(DistinguishedName::from_value(ctx, selected.inner())?)
            }
            "iPAddress" => GeneralName::IpAddress(
                selected
                    .as_octets()
                    .ok_or(Asn1Error::TypeMismatch("OCTET STRING"))?
                    .to_vec(),
            ),
            "registeredID" => GeneralName::RegisteredId(
                selected
                    .as_oid()
                    .ok_or(Asn1Error::TypeMismatch("OBJECT IDENTIFIER"))?
                    .clone(),
            ),
            other => return Err(Asn1Error::UnsupportedFeature(format!("GeneralName {other}"))),
        };
        Ok(general_name)
    }
}

fn general_names(ctx: &PkiContext, value: &Value) -> Result<Vec<GeneralName>, Asn1Error> {
    value
        .as_collection()
        .ok_or(Asn1Error::TypeMismatch("GeneralNames"))?
        .iter()
        .map(|gn| GeneralName::from_value(ctx, gn))
        .collect()
}

/// Parsed Authority Key Identifier extension (RFC 5280 §4.2.1.1).
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Option<Vec<u8>>,
    pub authority_cert_issuer: Vec<GeneralName>,
    pub authority_cert_serial_number: Option<BigInt>,
}

/// A single policy entry within the Certificate Policies extension.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyInformation {
    pub policy_identifier: NamedOid,
    pub qualifiers: Vec<PolicyQualifier>,
}

/// A policy qualifier within a PolicyInformation.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyQualifier {
    pub qualifier_id: NamedOid,
    /// Text of a CPS URI qualifier.
    pub text: Option<String>,
    /// DER of the qualifier value.
    pub qualifier: Vec<u8>,
}

/// Decoded value of an extension.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionValue {
    BasicConstraints(BasicConstraints),
    KeyUsage(KeyUsage),
    ExtendedKeyUsage(Vec<NamedOid>),
    SubjectAltName(Vec<GeneralName>),
    IssuerAltName(Vec<GeneralName>),
    SubjectKeyIdentifier(Vec<u8>),
    AuthorityKeyIdentifier(AuthorityKeyIdentifier),
    CertificatePolicies(Vec<PolicyInformation>),
    /// Decoded by a registered template with no typed view here.
    Other(Value),
    /// No decoder registered for the OID.
    Opaque,
    /// A decoder is registered but the value did not decode.
    Undecodable(String),
}

/// A certificate extension.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    oid: Oid,
    name: Option<&'static str>,
    critical: bool,
    raw: Vec<u8>,
    value: ExtensionValue,
}

impl Extension {
    pub(crate) fn from_structure(ctx: &PkiContext, s: &Structure) -> Result<Self, Asn1Error> {
        let oid = oid_field(s, "extnID")?.clone();
        let critical = s.get("critical").and_then(Value::as_bool).unwrap_or(false);
        let raw = octets_field(s, "extnValue")?.to_vec();
        let value = decode_value(ctx, &oid, &raw);
        if let ExtensionValue::Undecodable(reason) = &value {
            warn!(oid = %oid, critical, reason = %reason, "extension value did not decode");
        }
        Ok(Self {
            name: ctx.registry().lookup_short_name(&oid),
            oid,
            critical,
            raw,
            value,
        })
    }

    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Registered short name such as `basicConstraints`.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// The extnValue contents.
    pub fn raw_value(&self) -> &[u8] {
        &self.raw
    }

    pub fn value(&self) -> &ExtensionValue {
        &self.value
    }

    /// Whether a registered decoder understood the value.
    pub fn is_recognized(&self) -> bool {
        !matches!(
            self.value,
            ExtensionValue::Opaque | ExtensionValue::Undecodable(_)
        )
    }
}

fn decode_value(ctx: &PkiContext, oid: &Oid, raw: &[u8]) -> ExtensionValue {
    let Some(template) = ctx.registry().resolve_decoder(oid) else {
        return ExtensionValue::Opaque;
    };
    let mut tree = template.instantiate();
    if let Err(e) = ctx.codec().decode_all(&mut tree, raw) {
        return ExtensionValue::Undecodable(e.to_string());
    }
    typed_view(ctx, oid, tree).unwrap_or_else(|e| ExtensionValue::Undecodable(e.to_string()))
}

fn typed_view(ctx: &PkiContext, oid: &Oid, tree: Value) -> Result<ExtensionValue, Asn1Error> {
    let value = match oid.to_dot_string().as_str() {
        known::BASIC_CONSTRAINTS => {
            let s = structure(&tree, "BasicConstraints")?;
            let path_len_constraint = match s.get("pathLenConstraint") {
                Some(v) => Some(
                    v.as_u64()
                        .and_then(|n| u32::try_from(n).ok())
                        .ok_or_else(|| Asn1Error::malformed("pathLenConstraint out of range"))?,
                ),
                None => None,
            };
            ExtensionValue::BasicConstraints(BasicConstraints {
                is_ca: s.get("cA").and_then(Value::as_bool).unwrap_or(false),
                path_len_constraint,
            })
        }
        known::KEY_USAGE => ExtensionValue::KeyUsage(KeyUsage::from_bits(
            tree.as_bit_string()
                .ok_or(Asn1Error::TypeMismatch("BIT STRING"))?,
        )),
        known::EXT_KEY_USAGE => {
            let purposes = tree
                .as_collection()
                .ok_or(Asn1Error::TypeMismatch("ExtKeyUsageSyntax"))?
                .iter()
                .map(|v| {
                    v.as_oid()
                        .map(|oid| NamedOid::new(ctx, oid))
                        .ok_or(Asn1Error::TypeMismatch("KeyPurposeId"))
                })
                .collect::<Result<_, _>>()?;
            ExtensionValue::ExtendedKeyUsage(purposes)
        }
        known::SUBJECT_ALT_NAME => ExtensionValue::SubjectAltName(general_names(ctx, &tree)?),
        known::ISSUER_ALT_NAME => ExtensionValue::IssuerAltName(general_names(ctx, &tree)?),
        known::SUBJECT_KEY_IDENTIFIER => ExtensionValue::SubjectKeyIdentifier(
            tree.as_octets()
                .ok_or(Asn1Error::TypeMismatch("OCTET STRING"))?
                .to_vec(),
        ),
        known::AUTHORITY_KEY_IDENTIFIER => {
            let s = structure(&tree, "AuthorityKeyIdentifier")?;
            ExtensionValue::AuthorityKeyIdentifier(AuthorityKeyIdentifier {
                key_identifier: s
                    .get("keyIdentifier")
                    .and_then(Value::as_octets)
                    .map(<[u8]>::to_vec),
                authority_cert_issuer: match s.get("authorityCertIssuer") {
                    Some(names) => general_names(ctx, names.inner())?,
                    None => Vec::new(),
                },
                authority_cert_serial_number: s
                    .get("authorityCertSerialNumber")
                    .and_then(Value::as_integer)
                    .cloned(),
            })
        }
        known::CERTIFICATE_POLICIES => {
            ExtensionValue::CertificatePolicies(certificate_policies(ctx, &tree)?)
        }
        _ => ExtensionValue::Other(tree),
    };
    Ok(value)
}

fn certificate_policies(ctx: &PkiContext, tree: &Value) -> Result<Vec<PolicyInformation>, Asn1Error> {
    let policies = tree
        .as_collection()
        .ok_or(Asn1Error::TypeMismatch("CertificatePolicies"))?;
    let mut out = Vec::with_capacity(policies.len());
    for policy in policies {
        let s = structure(policy, "PolicyInformation")?;
        let mut qualifiers = Vec::new();
        if let Some(list) = s.get("policyQualifiers").and_then(Value::as_collection) {
            for q in list {
                let qs = structure(q, "PolicyQualifierInfo")?;
                let qualifier = qs.require("qualifier")?;
                qualifiers.push(PolicyQualifier {
                    qualifier_id: NamedOid::new(ctx, oid_field(qs, "policyQualifierId")?),
                    text: qualifier.as_text(),
                    qualifier: ctx.codec().to_der(qualifier)?,
                });
            }
        }
        out.push(PolicyInformation {
            policy_identifier: NamedOid::new(ctx, oid_field(s, "policyIdentifier")?),
            qualifiers,
        });
    }
    Ok(out)
}
