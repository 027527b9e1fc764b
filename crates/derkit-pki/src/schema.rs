//! ASN.1 templates for certificates, PKCS#7 content, PKCS#8 keys and PKCS#12 stores.
//!
//! Every function returns a fresh, unset tree for the codec to decode into.
//! Open-type slots (`ANY DEFINED BY`) are filled through the registry modules
//! in [`crate::oid_mapping`], which refer back to these functions as decoders.

use derkit_utils::asn1::{Choice, Collection, Component, StringKind, Structure, Template, Value};

fn sequence(name: &'static str, components: Vec<Component>) -> Value {
    Value::Structure(Structure::sequence(name, components))
}

fn sequence_of(element: fn() -> Value) -> Value {
    Value::Collection(Collection::sequence_of(Template(element)))
}

fn set_of(element: fn() -> Value) -> Value {
    Value::Collection(Collection::set_of(Template(element)))
}

// ---------------------------------------------------------------------------
// RFC 5280 certificate
// ---------------------------------------------------------------------------

/// ```text
/// AlgorithmIdentifier ::= SEQUENCE {
///     algorithm   OBJECT IDENTIFIER,
///     parameters  ANY DEFINED BY algorithm OPTIONAL }
/// ```
pub fn algorithm_identifier() -> Value {
    sequence(
        "AlgorithmIdentifier",
        vec![
            Component::required("algorithm", Value::oid()),
            Component::optional("parameters", Value::any_defined_by("algorithm")),
        ],
    )
}

/// X.520 DirectoryString, widened with the IA5, numeric and visible forms
/// seen in `domainComponent`, `emailAddress` and legacy names.
pub fn directory_string() -> Value {
    Value::Choice(Choice::new(vec![
        ("teletexString", Value::string(StringKind::Teletex)),
        ("printableString", Value::string(StringKind::Printable)),
        ("universalString", Value::string(StringKind::Universal)),
        ("utf8String", Value::string(StringKind::Utf8)),
        ("bmpString", Value::string(StringKind::Bmp)),
        ("ia5String", Value::string(StringKind::Ia5)),
        ("numericString", Value::string(StringKind::Numeric)),
        ("visibleString", Value::string(StringKind::Visible)),
    ]))
}

pub fn attribute_type_and_value() -> Value {
    sequence(
        "AttributeTypeAndValue",
        vec![
            Component::required("type", Value::oid()),
            Component::required("value", Value::any_defined_by("type")),
        ],
    )
}

/// `RelativeDistinguishedName ::= SET SIZE (1..MAX) OF AttributeTypeAndValue`
pub fn relative_distinguished_name() -> Value {
    set_of(attribute_type_and_value)
}

/// `Name ::= RDNSequence`, the only alternative of the Name CHOICE.
pub fn name() -> Value {
    sequence_of(relative_distinguished_name)
}

pub fn time() -> Value {
    Value::Choice(Choice::new(vec![
        ("utcTime", Value::string(StringKind::UtcTime)),
        ("generalTime", Value::string(StringKind::GeneralizedTime)),
    ]))
}

pub fn validity() -> Value {
    sequence(
        "Validity",
        vec![
            Component::required("notBefore", time()),
            Component::required("notAfter", time()),
        ],
    )
}

pub fn subject_public_key_info() -> Value {
    sequence(
        "SubjectPublicKeyInfo",
        vec![
            Component::required("algorithm", algorithm_identifier()),
            Component::required("subjectPublicKey", Value::bit_string()),
        ],
    )
}

pub fn extension() -> Value {
    sequence(
        "Extension",
        vec![
            Component::required("extnID", Value::oid()),
            Component::with_default("critical", Value::boolean(), Value::from_bool(false)),
            Component::required("extnValue", Value::octet_string()),
        ],
    )
}

pub fn extensions() -> Value {
    sequence_of(extension)
}

/// ```text
/// TBSCertificate ::= SEQUENCE {
///     version          [0] EXPLICIT Version DEFAULT v1,
///     serialNumber         CertificateSerialNumber,
///     signature            AlgorithmIdentifier,
///     issuer               Name,
///     validity             Validity,
///     subject              Name,
///     subjectPublicKeyInfo SubjectPublicKeyInfo,
///     issuerUniqueID   [1] IMPLICIT UniqueIdentifier OPTIONAL,
///     subjectUniqueID  [2] IMPLICIT UniqueIdentifier OPTIONAL,
///     extensions       [3] EXPLICIT Extensions OPTIONAL }
/// ```
pub fn tbs_certificate() -> Value {
    sequence(
        "TBSCertificate",
        vec![
            Component::with_default(
                "version",
                Value::explicit(0, Value::integer()),
                Value::explicit(0, Value::from_integer(0)),
            ),
            Component::required("serialNumber", Value::integer()),
            Component::required("signature", algorithm_identifier()),
            Component::required("issuer", name()),
            Component::required("validity", validity()),
            Component::required("subject", name()),
            Component::required("subjectPublicKeyInfo", subject_public_key_info()),
            Component::optional("issuerUniqueID", Value::implicit(1, Value::bit_string())),
            Component::optional("subjectUniqueID", Value::implicit(2, Value::bit_string())),
            Component::optional("extensions", Value::explicit(3, extensions())),
        ],
    )
}

pub fn certificate() -> Value {
    sequence(
        "Certificate",
        vec![
            Component::required("tbsCertificate", tbs_certificate()),
            Component::required("signatureAlgorithm", algorithm_identifier()),
            Component::required("signatureValue", Value::bit_string()),
        ],
    )
}

// ---------------------------------------------------------------------------
// Certificate extensions
// ---------------------------------------------------------------------------

pub fn basic_constraints() -> Value {
    sequence(
        "BasicConstraints",
        vec![
            Component::with_default("cA", Value::boolean(), Value::from_bool(false)),
            Component::optional("pathLenConstraint", Value::integer()),
        ],
    )
}

pub fn key_usage() -> Value {
    Value::bit_string()
}

pub fn ext_key_usage() -> Value {
    sequence_of(Value::oid)
}

pub fn subject_key_identifier() -> Value {
    Value::octet_string()
}

fn another_name() -> Value {
    sequence(
        "AnotherName",
        vec![
            Component::required("type-id", Value::oid()),
            Component::required("value", Value::explicit(0, Value::any_defined_by("type-id"))),
        ],
    )
}

/// GeneralName without the rarely used `x400Address` and `ediPartyName`
/// alternatives; those fail to match and surface as undecodable extensions.
pub fn general_name() -> Value {
    Value::Choice(Choice::new(vec![
        ("otherName", Value::implicit(0, another_name())),
        ("rfc822Name", Value::implicit(1, Value::string(StringKind::Ia5))),
        ("dNSName", Value::implicit(2, Value::string(StringKind::Ia5))),
        ("directoryName", Value::explicit(4, name())),
        (
            "uniformResourceIdentifier",
            Value::implicit(6, Value::string(StringKind::Ia5)),
        ),
        ("iPAddress", Value::implicit(7, Value::octet_string())),
        ("registeredID", Value::implicit(8, Value::oid())),
    ]))
}

pub fn general_names() -> Value {
    sequence_of(general_name)
}

pub fn authority_key_identifier() -> Value {
    sequence(
        "AuthorityKeyIdentifier",
        vec![
            Component::optional("keyIdentifier", Value::implicit(0, Value::octet_string())),
            Component::optional("authorityCertIssuer", Value::implicit(1, general_names())),
            Component::optional(
                "authorityCertSerialNumber",
                Value::implicit(2, Value::integer()),
            ),
        ],
    )
}

fn policy_qualifier_info() -> Value {
    sequence(
        "PolicyQualifierInfo",
        vec![
            Component::required("policyQualifierId", Value::oid()),
            Component::required("qualifier", Value::any_defined_by("policyQualifierId")),
        ],
    )
}

fn policy_information() -> Value {
    sequence(
        "PolicyInformation",
        vec![
            Component::required("policyIdentifier", Value::oid()),
            Component::optional("policyQualifiers", sequence_of(policy_qualifier_info)),
        ],
    )
}

pub fn certificate_policies() -> Value {
    sequence_of(policy_information)
}

// ---------------------------------------------------------------------------
// Public and private keys
// ---------------------------------------------------------------------------

pub fn rsa_public_key() -> Value {
    sequence(
        "RSAPublicKey",
        vec![
            Component::required("modulus", Value::integer()),
            Component::required("publicExponent", Value::integer()),
        ],
    )
}

pub fn rsa_private_key() -> Value {
    sequence(
        "RSAPrivateKey",
        vec![
            Component::required("version", Value::integer()),
            Component::required("modulus", Value::integer()),
            Component::required("publicExponent", Value::integer()),
            Component::required("privateExponent", Value::integer()),
            Component::required("prime1", Value::integer()),
            Component::required("prime2", Value::integer()),
            Component::required("exponent1", Value::integer()),
            Component::required("exponent2", Value::integer()),
            Component::required("coefficient", Value::integer()),
            Component::optional("otherPrimeInfos", Value::any()),
        ],
    )
}

/// `Dss-Parms ::= SEQUENCE { p INTEGER, q INTEGER, g INTEGER }`
pub fn dss_parms() -> Value {
    sequence(
        "Dss-Parms",
        vec![
            Component::required("p", Value::integer()),
            Component::required("q", Value::integer()),
            Component::required("g", Value::integer()),
        ],
    )
}

/// The two-integer `{ y, x }` DSA private key some producers emit in place of
/// a bare INTEGER.
pub fn dsa_private_key_pair() -> Value {
    sequence_of(Value::integer)
}

/// Attribute as used by PKCS#8 and PKCS#12 bags:
/// `SEQUENCE { attrId OBJECT IDENTIFIER, attrValues SET OF ANY DEFINED BY attrId }`.
pub fn attribute() -> Value {
    sequence(
        "Attribute",
        vec![
            Component::required("attrId", Value::oid()),
            Component::required("attrValues", set_of(attribute_value)),
        ],
    )
}

fn attribute_value() -> Value {
    Value::any_defined_by("attrId")
}

pub fn private_key_info() -> Value {
    sequence(
        "PrivateKeyInfo",
        vec![
            Component::required("version", Value::integer()),
            Component::required("privateKeyAlgorithm", algorithm_identifier()),
            Component::required("privateKey", Value::octet_string()),
            Component::optional("attributes", Value::implicit(0, set_of(attribute))),
            Component::optional("publicKey", Value::implicit(1, Value::bit_string())),
        ],
    )
}

pub fn encrypted_private_key_info() -> Value {
    sequence(
        "EncryptedPrivateKeyInfo",
        vec![
            Component::required("encryptionAlgorithm", algorithm_identifier()),
            Component::required("encryptedData", Value::octet_string()),
        ],
    )
}

// ---------------------------------------------------------------------------
// Password-based encryption parameters
// ---------------------------------------------------------------------------

/// `pkcs-12PbeParams ::= SEQUENCE { salt OCTET STRING, iterations INTEGER }`
pub fn pkcs12_pbe_params() -> Value {
    sequence(
        "PKCS12PbeParams",
        vec![
            Component::required("salt", Value::octet_string()),
            Component::required("iterations", Value::integer()),
        ],
    )
}

pub fn pbes2_params() -> Value {
    sequence(
        "PBES2-params",
        vec![
            Component::required("keyDerivationFunc", algorithm_identifier()),
            Component::required("encryptionScheme", algorithm_identifier()),
        ],
    )
}

/// PBKDF2-params; an absent `prf` means hmacWithSHA1.
pub fn pbkdf2_params() -> Value {
    sequence(
        "PBKDF2-params",
        vec![
            Component::required(
                "salt",
                Value::Choice(Choice::new(vec![
                    ("specified", Value::octet_string()),
                    ("otherSource", algorithm_identifier()),
                ])),
            ),
            Component::required("iterationCount", Value::integer()),
            Component::optional("keyLength", Value::integer()),
            Component::optional("prf", algorithm_identifier()),
        ],
    )
}

/// CBC initialization vector carried as cipher parameters.
pub fn cbc_iv() -> Value {
    Value::octet_string()
}

// ---------------------------------------------------------------------------
// PKCS#7 content
// ---------------------------------------------------------------------------

pub fn content_info() -> Value {
    sequence(
        "ContentInfo",
        vec![
            Component::required("contentType", Value::oid()),
            Component::optional(
                "content",
                Value::explicit(0, Value::any_defined_by("contentType")),
            ),
        ],
    )
}

pub fn encrypted_content_info() -> Value {
    sequence(
        "EncryptedContentInfo",
        vec![
            Component::required("contentType", Value::oid()),
            Component::required("contentEncryptionAlgorithm", algorithm_identifier()),
            Component::optional(
                "encryptedContent",
                Value::implicit(0, Value::octet_string()),
            ),
        ],
    )
}

pub fn encrypted_data() -> Value {
    sequence(
        "EncryptedData",
        vec![
            Component::required("version", Value::integer()),
            Component::required("encryptedContentInfo", encrypted_content_info()),
            Component::optional("unprotectedAttrs", Value::implicit(1, set_of(attribute))),
        ],
    )
}

// ---------------------------------------------------------------------------
// PKCS#12
// ---------------------------------------------------------------------------

pub fn digest_info() -> Value {
    sequence(
        "DigestInfo",
        vec![
            Component::required("digestAlgorithm", algorithm_identifier()),
            Component::required("digest", Value::octet_string()),
        ],
    )
}

pub fn mac_data() -> Value {
    sequence(
        "MacData",
        vec![
            Component::required("mac", digest_info()),
            Component::required("macSalt", Value::octet_string()),
            Component::with_default("iterations", Value::integer(), Value::from_integer(1)),
        ],
    )
}

pub fn pfx() -> Value {
    sequence(
        "PFX",
        vec![
            Component::required("version", Value::integer()),
            Component::required("authSafe", content_info()),
            Component::optional("macData", mac_data()),
        ],
    )
}

pub fn authenticated_safe() -> Value {
    sequence_of(content_info)
}

pub fn safe_bag() -> Value {
    sequence(
        "SafeBag",
        vec![
            Component::required("bagId", Value::oid()),
            Component::required("bagValue", Value::explicit(0, Value::any_defined_by("bagId"))),
            Component::optional("bagAttributes", set_of(attribute)),
        ],
    )
}

pub fn safe_contents() -> Value {
    sequence_of(safe_bag)
}

pub fn cert_bag() -> Value {
    sequence(
        "CertBag",
        vec![
            Component::required("certId", Value::oid()),
            Component::required("certValue", Value::explicit(0, Value::any_defined_by("certId"))),
        ],
    )
}
