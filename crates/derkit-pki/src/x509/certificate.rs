//! X.509 certificate parsing and accessors.

use super::{
    AlgorithmIdentifier, BasicConstraints, DistinguishedName, Extension, ExtensionValue,
    GeneralName, KeyUsage, ParseOptions, PublicKey, SubjectPublicKeyInfo,
};
use crate::context::PkiContext;
use crate::encoding::{structure, sub_structure};
use crate::schema;
use derkit_types::{Asn1Error, PkiError};
use derkit_utils::asn1::{BitString, Reader, Structure, Value};
use derkit_utils::oid::{Oid, OidRegistry};
use derkit_utils::pem;
use num_bigint::BigInt;
use std::fmt;
use std::ops::Range;
use tracing::{debug, warn};

/// A parsed X.509 certificate.
///
/// The decoded tree is kept alongside the typed fields, so
/// [`Certificate::to_der`] re-encodes exactly what was parsed.
#[derive(Clone)]
pub struct Certificate {
    raw: Vec<u8>,
    tbs: Range<usize>,
    tree: Value,
    /// Context the certificate was decoded with; nested decodes reuse it.
    ctx: PkiContext,
    version: u32,
    serial_number: BigInt,
    signature_algorithm: AlgorithmIdentifier,
    issuer: DistinguishedName,
    subject: DistinguishedName,
    not_before: i64,
    not_after: i64,
    spki: SubjectPublicKeyInfo,
    issuer_unique_id: Option<BitString>,
    subject_unique_id: Option<BitString>,
    extensions: Vec<Extension>,
    signature: BitString,
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("version", &self.version)
            .field("serial_number", &self.serial_number)
            .field("subject", &self.subject.to_string())
            .field("issuer", &self.issuer.to_string())
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

impl Certificate {
    /// Parse a DER-encoded certificate with the shared context.
    pub fn from_der(der: &[u8]) -> Result<Self, PkiError> {
        Self::from_der_with(PkiContext::shared()?, der, &ParseOptions::default())
    }

    /// Parse the first `CERTIFICATE` block of a PEM document.
    pub fn from_pem(pem: &str) -> Result<Self, PkiError> {
        Self::from_der(&pem::find(pem, "CERTIFICATE")?)
    }

    /// Parse with an explicit context and options.
    pub fn from_der_with(
        ctx: &PkiContext,
        der: &[u8],
        options: &ParseOptions,
    ) -> Result<Self, PkiError> {
        let tree = ctx.decode(schema::certificate, der)?;
        let cert = structure(&tree, "Certificate")?;
        let tbs = sub_structure(cert, "tbsCertificate")?;

        let version = tbs
            .require("version")?
            .as_u64()
            .filter(|v| *v <= 2)
            .ok_or_else(|| PkiError::InvalidCert("unsupported version".into()))?
            as u32;

        let signature_algorithm = AlgorithmIdentifier::from_field(cert, "signatureAlgorithm")?;
        let inner_algorithm = AlgorithmIdentifier::from_field(tbs, "signature")?;
        if inner_algorithm.oid != signature_algorithm.oid {
            return Err(PkiError::InvalidCert(format!(
                "signature algorithm mismatch: {} vs {}",
                inner_algorithm.oid, signature_algorithm.oid
            )));
        }

        let validity = sub_structure(tbs, "validity")?;
        let time = |name: &'static str| -> Result<i64, PkiError> {
            validity
                .require(name)?
                .as_time()
                .ok_or_else(|| PkiError::InvalidCert(format!("bad {name}")))
        };

        let extensions = match tbs.get("extensions") {
            Some(list) => {
                if version != 2 {
                    return Err(PkiError::InvalidCert(
                        "extensions present in a pre-v3 certificate".into(),
                    ));
                }
                parse_extensions(ctx, list, options)?
            }
            None => Vec::new(),
        };

        let certificate = Self {
            raw: der.to_vec(),
            tbs: tbs_range(der)?,
            ctx: ctx.clone(),
            version,
            serial_number: tbs
                .require("serialNumber")?
                .as_integer()
                .cloned()
                .ok_or(Asn1Error::TypeMismatch("INTEGER"))?,
            issuer: DistinguishedName::from_value(ctx, tbs.require("issuer")?)?,
            subject: DistinguishedName::from_value(ctx, tbs.require("subject")?)?,
            not_before: time("notBefore")?,
            not_after: time("notAfter")?,
            spki: SubjectPublicKeyInfo::from_structure(sub_structure(
                tbs,
                "subjectPublicKeyInfo",
            )?)?,
            issuer_unique_id: unique_id(tbs, "issuerUniqueID"),
            subject_unique_id: unique_id(tbs, "subjectUniqueID"),
            extensions,
            signature: cert
                .require("signatureValue")?
                .as_bit_string()
                .cloned()
                .ok_or(Asn1Error::TypeMismatch("BIT STRING"))?,
            signature_algorithm,
            tree,
        };
        debug!(subject = %certificate.subject, "parsed certificate");
        Ok(certificate)
    }

    /// The DER this certificate was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Re-encode the decoded tree.
    pub fn to_der(&self) -> Result<Vec<u8>, PkiError> {
        Ok(self.ctx.codec().to_der(&self.tree)?)
    }

    pub fn to_pem(&self) -> String {
        pem::encode("CERTIFICATE", &self.raw)
    }

    /// The decoded certificate tree.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// The exact TBSCertificate bytes covered by the signature.
    pub fn tbs_der(&self) -> &[u8] {
        &self.raw[self.tbs.clone()]
    }

    /// Zero-based version: 2 for v3.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn serial_number(&self) -> &BigInt {
        &self.serial_number
    }

    pub fn signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.signature_algorithm
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature.bytes
    }

    pub(crate) fn signature_bits(&self) -> &BitString {
        &self.signature
    }

    /// The registry this certificate was decoded with.
    pub(crate) fn registry(&self) -> &OidRegistry {
        self.ctx.registry()
    }

    pub fn issuer(&self) -> &DistinguishedName {
        &self.issuer
    }

    pub fn subject(&self) -> &DistinguishedName {
        &self.subject
    }

    /// Issuer in RFC 2253 form.
    pub fn issuer_dn(&self) -> String {
        self.issuer.to_string()
    }

    /// Subject in RFC 2253 form.
    pub fn subject_dn(&self) -> String {
        self.subject.to_string()
    }

    /// notBefore as UNIX seconds.
    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    /// notAfter as UNIX seconds.
    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    /// Whether `time` (UNIX seconds) falls within the validity period, inclusive.
    pub fn is_valid_at(&self, time: i64) -> bool {
        self.not_before <= time && time <= self.not_after
    }

    /// Subject and issuer names are equal.
    pub fn is_self_signed(&self) -> bool {
        self.subject == self.issuer
    }

    pub fn issuer_unique_id(&self) -> Option<&BitString> {
        self.issuer_unique_id.as_ref()
    }

    pub fn subject_unique_id(&self) -> Option<&BitString> {
        self.subject_unique_id.as_ref()
    }

    pub fn subject_public_key_info(&self) -> &SubjectPublicKeyInfo {
        &self.spki
    }

    /// Decode the subject public key.
    pub fn public_key(&self) -> Result<PublicKey, PkiError> {
        PublicKey::from_spki(&self.ctx, &self.spki)
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn extension(&self, oid: &Oid) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.oid() == oid)
    }

    fn find_value<T>(&self, pick: impl Fn(&ExtensionValue) -> Option<&T>) -> Option<&T> {
        self.extensions.iter().find_map(|e| pick(e.value()))
    }

    pub fn basic_constraints(&self) -> Option<&BasicConstraints> {
        self.find_value(|v| match v {
            ExtensionValue::BasicConstraints(bc) => Some(bc),
            _ => None,
        })
    }

    pub fn key_usage(&self) -> Option<KeyUsage> {
        self.find_value(|v| match v {
            ExtensionValue::KeyUsage(ku) => Some(ku),
            _ => None,
        })
        .copied()
    }

    pub fn subject_alt_names(&self) -> &[GeneralName] {
        self.find_value(|v| match v {
            ExtensionValue::SubjectAltName(names) => Some(names),
            _ => None,
        })
        .map(Vec::as_slice)
        .unwrap_or_default()
    }

    pub fn subject_key_identifier(&self) -> Option<&[u8]> {
        self.find_value(|v| match v {
            ExtensionValue::SubjectKeyIdentifier(id) => Some(id),
            _ => None,
        })
        .map(Vec::as_slice)
    }

    /// Whether the certificate asserts CA status through basicConstraints.
    pub fn is_ca(&self) -> bool {
        self.basic_constraints().is_some_and(|bc| bc.is_ca)
    }
}

fn parse_extensions(
    ctx: &PkiContext,
    list: &Value,
    options: &ParseOptions,
) -> Result<Vec<Extension>, PkiError> {
    let list = list
        .as_collection()
        .ok_or(Asn1Error::TypeMismatch("Extensions"))?;
    if list.is_empty() {
        return Err(PkiError::InvalidCert("empty extensions".into()));
    }
    let mut extensions: Vec<Extension> = Vec::with_capacity(list.len());
    for item in list {
        let ext = Extension::from_structure(ctx, structure(item, "Extension")?)?;
        if extensions.iter().any(|e| e.oid() == ext.oid()) {
            return Err(PkiError::InvalidCert(format!(
                "duplicate extension {}",
                ext.oid()
            )));
        }
        if ext.is_critical() && !ext.is_recognized() {
            if options.reject_unknown_critical {
                return Err(PkiError::UnrecognizedCriticalExtension(ext.oid().to_string()));
            }
            warn!(oid = %ext.oid(), "unrecognized critical extension tolerated");
        }
        extensions.push(ext);
    }
    Ok(extensions)
}

fn unique_id(tbs: &Structure, name: &str) -> Option<BitString> {
    tbs.get(name).and_then(Value::as_bit_string).cloned()
}

/// Byte range of the first element inside the outer SEQUENCE.
fn tbs_range(der: &[u8]) -> Result<Range<usize>, Asn1Error> {
    let mut reader = Reader::new(der);
    reader.read_header()?;
    let start = reader.position();
    let (_, length) = reader.read_header()?;
    reader.skip_contents(length)?;
    Ok(start..reader.position())
}

#[cfg(test)]
mod tests {
    use super::*;
    use derkit_utils::oid::known;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
        let len = content.len();
        let mut out = match len {
            0..=0x7f => vec![tag, len as u8],
            0x80..=0xff => vec![tag, 0x81, len as u8],
            _ => vec![tag, 0x82, (len >> 8) as u8, len as u8],
        };
        out.extend_from_slice(content);
        out
    }

    fn seq(parts: &[&[u8]]) -> Vec<u8> {
        tlv(0x30, &parts.concat())
    }

    // Minimal v3 certificate with an unsigned body; only the framing matters here.
    fn build(extensions: Option<&[u8]>, version: Option<u8>) -> Vec<u8> {
        // unknown algorithm keeps the SPKI opaque
        let spki = seq(&[&hex("300506032b6570"), &tlv(0x03, &[0, 1, 2, 3])]);
        build_with_spki(&spki, extensions, version)
    }

    fn build_with_spki(spki: &[u8], extensions: Option<&[u8]>, version: Option<u8>) -> Vec<u8> {
        let alg = hex("300d06092a864886f70d01010b0500");
        let name = hex("3010310e300c06035504030c056f776e6572");
        let validity = seq(&[
            &tlv(0x17, b"260101000000Z"),
            &tlv(0x18, b"20360101000000Z"),
        ]);
        let spki = spki.to_vec();
        let mut parts: Vec<Vec<u8>> = Vec::new();
        if let Some(v) = version {
            parts.push(tlv(0xa0, &[2, 1, v]));
        }
        parts.push(hex("020101"));
        parts.push(alg.clone());
        parts.push(name.clone());
        parts.push(validity);
        parts.push(name);
        parts.push(spki);
        if let Some(ext) = extensions {
            parts.push(tlv(0xa3, ext));
        }
        let refs: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
        let tbs = seq(&refs);
        seq(&[&tbs, &alg, &tlv(0x03, &[0, 0xaa])])
    }

    #[test]
    fn test_parse_minimal_certificate() {
        let der = build(None, None);
        let cert = Certificate::from_der(&der).unwrap();
        assert_eq!(cert.version(), 0);
        assert_eq!(cert.serial_number(), &BigInt::from(1));
        assert_eq!(cert.subject_dn(), "CN=owner");
        assert!(cert.is_self_signed());
        assert_eq!(cert.not_before(), 1_767_225_600);
        assert_eq!(cert.not_after(), 2_082_758_400);
        assert!(cert.is_valid_at(1_800_000_000));
        assert!(!cert.is_valid_at(1_767_225_599));
        assert!(cert.extensions().is_empty());
        assert_eq!(cert.signature(), &[0xaa]);
        assert_eq!(cert.to_der().unwrap(), der);
        // TBS is the first element of the outer SEQUENCE
        assert!(der[2..].starts_with(cert.tbs_der()));
        assert_eq!(cert.tbs_der().len(), der.len() - 2 - 15 - 4);
    }

    #[test]
    fn test_unknown_critical_extension() {
        // critical 1.3.6.1.4.1.99999.1 with UTF8String "hello"
        let ext = seq(&[&seq(&[
            &hex("06092b06010401868d1f010101ff"),
            &tlv(0x04, &hex("0c0568656c6c6f")),
        ])]);
        let der = build(Some(&ext), Some(2));
        let ctx = PkiContext::shared().unwrap();

        let lenient = Certificate::from_der_with(ctx, &der, &ParseOptions::default()).unwrap();
        let parsed = &lenient.extensions()[0];
        assert!(parsed.is_critical());
        assert_eq!(parsed.value(), &ExtensionValue::Opaque);
        assert_eq!(parsed.raw_value(), &hex("0c0568656c6c6f")[..]);

        assert!(matches!(
            Certificate::from_der_with(ctx, &der, &ParseOptions::strict()),
            Err(PkiError::UnrecognizedCriticalExtension(oid)) if oid == "1.3.6.1.4.1.99999.1"
        ));
    }

    #[test]
    fn test_extension_rules() {
        let bc = seq(&[&hex("0603551d13"), &tlv(0x04, &hex("30030101ff"))]);
        // extensions need v3
        let der = build(Some(&seq(&[&bc])), Some(1));
        assert!(matches!(
            Certificate::from_der(&der),
            Err(PkiError::InvalidCert(_))
        ));
        // the same extension twice
        let der = build(Some(&seq(&[&bc, &bc])), Some(2));
        assert!(matches!(
            Certificate::from_der(&der),
            Err(PkiError::InvalidCert(_))
        ));
        let der = build(Some(&seq(&[&bc])), Some(2));
        let cert = Certificate::from_der(&der).unwrap();
        assert!(cert.is_ca());
        let oid: Oid = known::BASIC_CONSTRAINTS.parse().unwrap();
        assert_eq!(cert.extension(&oid).unwrap().name(), Some("basicConstraints"));
    }

    #[test]
    fn test_public_key_decodes_with_certificate_context() {
        // RSAPublicKey {3, 3} wrapped in a BER indefinite-length SEQUENCE
        let key = hex("0030800201030201030000");
        let spki = seq(&[&hex("300d06092a864886f70d0101010500"), &tlv(0x03, &key)]);
        let der = build_with_spki(&spki, None, None);

        let lenient = Certificate::from_der(&der).unwrap();
        assert!(matches!(lenient.public_key().unwrap(), PublicKey::Rsa(_)));

        let config = derkit_utils::asn1::DecoderConfig::builder()
            .allow_indefinite(false)
            .build();
        let ctx = PkiContext::with_config(config).unwrap();
        let strict = Certificate::from_der_with(&ctx, &der, &ParseOptions::default()).unwrap();
        assert!(strict.public_key().is_err());
    }

    #[test]
    fn test_rejects_bad_input() {
        let der = build(None, None);
        assert!(Certificate::from_der(&der[..der.len() - 1]).is_err());
        let mut trailing = der.clone();
        trailing.push(0);
        assert!(Certificate::from_der(&trailing).is_err());
        assert!(matches!(
            Certificate::from_der(&build(None, Some(3))),
            Err(PkiError::InvalidCert(_))
        ));
        assert!(matches!(
            Certificate::from_pem("no pem here"),
            Err(PkiError::Pem(_))
        ));
    }
}
