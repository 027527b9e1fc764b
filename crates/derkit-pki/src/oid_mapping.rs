//! Registry modules for the PKI crate and OID-to-algorithm mapping helpers.
//!
//! Each OID belongs to exactly one module. Entries with a decoder resolve the
//! open types (`ANY DEFINED BY`) that the OID governs; extension entries carry
//! the decoder for their `extnValue` payload.

use crate::schema;
use derkit_types::{Asn1Error, CipherAlgId, HashAlgId};
use derkit_utils::asn1::{StringKind, Template, Value};
use derkit_utils::oid::{known, Oid, OidEntry, OidModule, OidRegistry};

const NULL: Template = Template(Value::null);
const OCTETS: Template = Template(Value::octet_string);
const IA5: Template = Template(ia5_string);
const BMP: Template = Template(bmp_string);
const DIRECTORY_STRING: Template = Template(schema::directory_string);

fn ia5_string() -> Value {
    Value::string(StringKind::Ia5)
}

fn bmp_string() -> Value {
    Value::string(StringKind::Bmp)
}

/// Key, signature, digest, MAC and password-based encryption algorithms.
pub static PKIX_ALGORITHMS: OidModule = OidModule {
    name: "pkix-algorithms",
    entries: &[
        OidEntry::new(known::RSA_ENCRYPTION, "rsaEncryption").with_decoder(NULL),
        OidEntry::new(known::MD5_WITH_RSA_ENCRYPTION, "md5WithRSAEncryption").with_decoder(NULL),
        OidEntry::new(known::SHA1_WITH_RSA_ENCRYPTION, "sha1WithRSAEncryption")
            .with_decoder(NULL),
        OidEntry::new(known::SHA224_WITH_RSA_ENCRYPTION, "sha224WithRSAEncryption")
            .with_decoder(NULL),
        OidEntry::new(known::SHA256_WITH_RSA_ENCRYPTION, "sha256WithRSAEncryption")
            .with_decoder(NULL),
        OidEntry::new(known::SHA384_WITH_RSA_ENCRYPTION, "sha384WithRSAEncryption")
            .with_decoder(NULL),
        OidEntry::new(known::SHA512_WITH_RSA_ENCRYPTION, "sha512WithRSAEncryption")
            .with_decoder(NULL),
        OidEntry::new(known::DSA, "dsaEncryption").with_decoder(Template(schema::dss_parms)),
        OidEntry::new(known::DSA_WITH_SHA1, "dsaWithSHA1"),
        OidEntry::new(known::DSA_WITH_SHA224, "dsa_with_SHA224"),
        OidEntry::new(known::DSA_WITH_SHA256, "dsa_with_SHA256"),
        OidEntry::new(known::DH_PUBLIC_NUMBER, "dhpublicnumber"),
        OidEntry::new(known::DH_KEY_AGREEMENT, "dhKeyAgreement"),
        OidEntry::new(known::MD5, "md5").with_decoder(NULL),
        OidEntry::new(known::SHA1, "sha1").with_decoder(NULL),
        OidEntry::new(known::SHA224, "sha224").with_decoder(NULL),
        OidEntry::new(known::SHA256, "sha256").with_decoder(NULL),
        OidEntry::new(known::SHA384, "sha384").with_decoder(NULL),
        OidEntry::new(known::SHA512, "sha512").with_decoder(NULL),
        OidEntry::new(known::RIPEMD160, "ripemd160").with_decoder(NULL),
        OidEntry::new(known::HMAC_WITH_SHA1, "hmacWithSHA1").with_decoder(NULL),
        OidEntry::new(known::HMAC_WITH_SHA224, "hmacWithSHA224").with_decoder(NULL),
        OidEntry::new(known::HMAC_WITH_SHA256, "hmacWithSHA256").with_decoder(NULL),
        OidEntry::new(known::HMAC_WITH_SHA384, "hmacWithSHA384").with_decoder(NULL),
        OidEntry::new(known::HMAC_WITH_SHA512, "hmacWithSHA512").with_decoder(NULL),
        OidEntry::new(known::DES_EDE3_CBC, "des-ede3-cbc").with_decoder(OCTETS),
        OidEntry::new(known::AES128_CBC, "aes-128-cbc").with_decoder(OCTETS),
        OidEntry::new(known::AES192_CBC, "aes-192-cbc").with_decoder(OCTETS),
        OidEntry::new(known::AES256_CBC, "aes-256-cbc").with_decoder(OCTETS),
        OidEntry::new(known::PBKDF2, "PBKDF2").with_decoder(Template(schema::pbkdf2_params)),
        OidEntry::new(known::PBES2, "PBES2").with_decoder(Template(schema::pbes2_params)),
        OidEntry::new(known::PBE_SHA1_RC4_128, "pbeWithSHA1And128BitRC4")
            .with_decoder(Template(schema::pkcs12_pbe_params)),
        OidEntry::new(known::PBE_SHA1_RC4_40, "pbeWithSHA1And40BitRC4")
            .with_decoder(Template(schema::pkcs12_pbe_params)),
        OidEntry::new(known::PBE_SHA1_3DES, "pbeWithSHA1And3-KeyTripleDES-CBC")
            .with_decoder(Template(schema::pkcs12_pbe_params)),
        OidEntry::new(known::PBE_SHA1_2DES, "pbeWithSHA1And2-KeyTripleDES-CBC")
            .with_decoder(Template(schema::pkcs12_pbe_params)),
        OidEntry::new(known::PBE_SHA1_RC2_128, "pbeWithSHA1And128BitRC2-CBC")
            .with_decoder(Template(schema::pkcs12_pbe_params)),
        OidEntry::new(known::PBE_SHA1_RC2_40, "pbeWithSHA1And40BitRC2-CBC")
            .with_decoder(Template(schema::pkcs12_pbe_params)),
    ],
};

/// X.520 naming attributes. Short names follow the RFC 4514 keyword table;
/// other attribute types render as dotted OIDs.
pub static X520: OidModule = OidModule {
    name: "x520",
    entries: &[
        OidEntry::new(known::COMMON_NAME, "commonName")
            .with_short_name("CN")
            .with_decoder(DIRECTORY_STRING),
        OidEntry::new("2.5.4.4", "surname").with_decoder(DIRECTORY_STRING),
        OidEntry::new("2.5.4.5", "serialNumber").with_decoder(DIRECTORY_STRING),
        OidEntry::new(known::COUNTRY_NAME, "countryName")
            .with_short_name("C")
            .with_decoder(DIRECTORY_STRING),
        OidEntry::new("2.5.4.7", "localityName")
            .with_short_name("L")
            .with_decoder(DIRECTORY_STRING),
        OidEntry::new("2.5.4.8", "stateOrProvinceName")
            .with_short_name("ST")
            .with_decoder(DIRECTORY_STRING),
        OidEntry::new("2.5.4.9", "streetAddress")
            .with_short_name("STREET")
            .with_decoder(DIRECTORY_STRING),
        OidEntry::new(known::ORGANIZATION_NAME, "organizationName")
            .with_short_name("O")
            .with_decoder(DIRECTORY_STRING),
        OidEntry::new("2.5.4.11", "organizationalUnitName")
            .with_short_name("OU")
            .with_decoder(DIRECTORY_STRING),
        OidEntry::new("2.5.4.12", "title").with_decoder(DIRECTORY_STRING),
        OidEntry::new("2.5.4.42", "givenName").with_decoder(DIRECTORY_STRING),
        OidEntry::new("2.5.4.43", "initials").with_decoder(DIRECTORY_STRING),
        OidEntry::new("2.5.4.46", "dnQualifier").with_decoder(DIRECTORY_STRING),
        OidEntry::new("0.9.2342.19200300.100.1.1", "userId")
            .with_short_name("UID")
            .with_decoder(DIRECTORY_STRING),
        OidEntry::new("0.9.2342.19200300.100.1.25", "domainComponent")
            .with_short_name("DC")
            .with_decoder(IA5),
    ],
};

/// Certificate extensions, policy qualifiers and key purposes.
pub static X509_EXTENSIONS: OidModule = OidModule {
    name: "x509-extensions",
    entries: &[
        OidEntry::new(known::SUBJECT_KEY_IDENTIFIER, "X509v3 Subject Key Identifier")
            .with_short_name("subjectKeyIdentifier")
            .with_decoder(Template(schema::subject_key_identifier)),
        OidEntry::new(known::KEY_USAGE, "X509v3 Key Usage")
            .with_short_name("keyUsage")
            .with_decoder(Template(schema::key_usage)),
        OidEntry::new(known::SUBJECT_ALT_NAME, "X509v3 Subject Alternative Name")
            .with_short_name("subjectAltName")
            .with_decoder(Template(schema::general_names)),
        OidEntry::new(known::ISSUER_ALT_NAME, "X509v3 Issuer Alternative Name")
            .with_short_name("issuerAltName")
            .with_decoder(Template(schema::general_names)),
        OidEntry::new(known::BASIC_CONSTRAINTS, "X509v3 Basic Constraints")
            .with_short_name("basicConstraints")
            .with_decoder(Template(schema::basic_constraints)),
        OidEntry::new(known::CERTIFICATE_POLICIES, "X509v3 Certificate Policies")
            .with_short_name("certificatePolicies")
            .with_decoder(Template(schema::certificate_policies)),
        OidEntry::new(known::AUTHORITY_KEY_IDENTIFIER, "X509v3 Authority Key Identifier")
            .with_short_name("authorityKeyIdentifier")
            .with_decoder(Template(schema::authority_key_identifier)),
        OidEntry::new(known::EXT_KEY_USAGE, "X509v3 Extended Key Usage")
            .with_short_name("extendedKeyUsage")
            .with_decoder(Template(schema::ext_key_usage)),
        OidEntry::new("2.5.29.30", "X509v3 Name Constraints").with_short_name("nameConstraints"),
        OidEntry::new("2.5.29.31", "X509v3 CRL Distribution Points")
            .with_short_name("crlDistributionPoints"),
        OidEntry::new("1.3.6.1.5.5.7.1.1", "Authority Information Access")
            .with_short_name("authorityInfoAccess"),
        OidEntry::new("2.5.29.32.0", "X509v3 Any Policy").with_short_name("anyPolicy"),
        OidEntry::new("1.3.6.1.5.5.7.2.1", "Policy Qualifier CPS")
            .with_short_name("id-qt-cps")
            .with_decoder(IA5),
        OidEntry::new("1.3.6.1.5.5.7.2.2", "Policy Qualifier User Notice")
            .with_short_name("id-qt-unotice"),
        OidEntry::new("1.3.6.1.5.5.7.3.1", "TLS Web Server Authentication")
            .with_short_name("serverAuth"),
        OidEntry::new("1.3.6.1.5.5.7.3.2", "TLS Web Client Authentication")
            .with_short_name("clientAuth"),
        OidEntry::new("1.3.6.1.5.5.7.3.3", "Code Signing").with_short_name("codeSigning"),
        OidEntry::new("1.3.6.1.5.5.7.3.4", "E-mail Protection")
            .with_short_name("emailProtection"),
        OidEntry::new("1.3.6.1.5.5.7.3.8", "Time Stamping").with_short_name("timeStamping"),
        OidEntry::new("1.3.6.1.5.5.7.3.9", "OCSP Signing").with_short_name("OCSPSigning"),
    ],
};

/// PKCS#7 content types.
pub static PKCS7: OidModule = OidModule {
    name: "pkcs7",
    entries: &[
        OidEntry::new(known::PKCS7_DATA, "pkcs7-data").with_decoder(OCTETS),
        OidEntry::new(known::PKCS7_SIGNED_DATA, "pkcs7-signedData"),
        OidEntry::new(known::PKCS7_ENVELOPED_DATA, "pkcs7-envelopedData"),
        OidEntry::new(
            known::PKCS7_SIGNED_AND_ENVELOPED_DATA,
            "pkcs7-signedAndEnvelopedData",
        ),
        OidEntry::new(known::PKCS7_DIGESTED_DATA, "pkcs7-digestData"),
        OidEntry::new(known::PKCS7_ENCRYPTED_DATA, "pkcs7-encryptedData")
            .with_decoder(Template(schema::encrypted_data)),
    ],
};

/// PKCS#9 attributes and certificate types.
pub static PKCS9: OidModule = OidModule {
    name: "pkcs9",
    entries: &[
        OidEntry::new(known::EMAIL_ADDRESS, "emailAddress").with_decoder(DIRECTORY_STRING),
        OidEntry::new(known::FRIENDLY_NAME, "friendlyName").with_decoder(BMP),
        OidEntry::new(known::LOCAL_KEY_ID, "localKeyID").with_decoder(OCTETS),
        OidEntry::new(known::X509_CERTIFICATE, "x509Certificate").with_decoder(OCTETS),
        OidEntry::new("1.2.840.113549.1.9.22.2", "sdsiCertificate").with_decoder(IA5),
        OidEntry::new("1.2.840.113549.1.9.23.1", "x509Crl").with_decoder(OCTETS),
    ],
};

/// PKCS#12 bag types.
pub static PKCS12: OidModule = OidModule {
    name: "pkcs12",
    entries: &[
        OidEntry::new(known::KEY_BAG, "keyBag").with_decoder(Template(schema::private_key_info)),
        OidEntry::new(known::PKCS8_SHROUDED_KEY_BAG, "pkcs8ShroudedKeyBag")
            .with_decoder(Template(schema::encrypted_private_key_info)),
        OidEntry::new(known::CERT_BAG, "certBag").with_decoder(Template(schema::cert_bag)),
        OidEntry::new(known::CRL_BAG, "crlBag"),
        OidEntry::new(known::SECRET_BAG, "secretBag"),
        OidEntry::new(known::SAFE_CONTENTS_BAG, "safeContentsBag")
            .with_decoder(Template(schema::safe_contents)),
    ],
};

/// Every module this crate ships, in registration order.
pub static STANDARD_MODULES: &[&OidModule] =
    &[&PKIX_ALGORITHMS, &X520, &X509_EXTENSIONS, &PKCS7, &PKCS9, &PKCS12];

/// A registry loaded with [`STANDARD_MODULES`].
pub fn standard_registry() -> Result<OidRegistry, Asn1Error> {
    OidRegistry::builder().modules(STANDARD_MODULES).build()
}

/// Map a digest (or HMAC) algorithm OID to its `HashAlgId`.
///
/// Returns `None` for unrecognized OIDs; callers wrap in their own error type.
pub(crate) fn oid_to_hash(oid: &Oid) -> Option<HashAlgId> {
    let alg = match oid.to_dot_string().as_str() {
        known::MD5 => HashAlgId::Md5,
        known::SHA1 | known::HMAC_WITH_SHA1 => HashAlgId::Sha1,
        known::SHA224 | known::HMAC_WITH_SHA224 => HashAlgId::Sha224,
        known::SHA256 | known::HMAC_WITH_SHA256 => HashAlgId::Sha256,
        known::SHA384 | known::HMAC_WITH_SHA384 => HashAlgId::Sha384,
        known::SHA512 | known::HMAC_WITH_SHA512 => HashAlgId::Sha512,
        known::RIPEMD160 => HashAlgId::Ripemd160,
        _ => return None,
    };
    Some(alg)
}

/// Public-key family of a signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignatureFamily {
    Rsa,
    Dsa,
}

/// Map a signature algorithm OID to its key family and digest.
pub(crate) fn oid_to_signature(oid: &Oid) -> Option<(SignatureFamily, HashAlgId)> {
    let mapping = match oid.to_dot_string().as_str() {
        known::MD5_WITH_RSA_ENCRYPTION => (SignatureFamily::Rsa, HashAlgId::Md5),
        known::SHA1_WITH_RSA_ENCRYPTION => (SignatureFamily::Rsa, HashAlgId::Sha1),
        known::SHA224_WITH_RSA_ENCRYPTION => (SignatureFamily::Rsa, HashAlgId::Sha224),
        known::SHA256_WITH_RSA_ENCRYPTION => (SignatureFamily::Rsa, HashAlgId::Sha256),
        known::SHA384_WITH_RSA_ENCRYPTION => (SignatureFamily::Rsa, HashAlgId::Sha384),
        known::SHA512_WITH_RSA_ENCRYPTION => (SignatureFamily::Rsa, HashAlgId::Sha512),
        known::DSA_WITH_SHA1 => (SignatureFamily::Dsa, HashAlgId::Sha1),
        known::DSA_WITH_SHA224 => (SignatureFamily::Dsa, HashAlgId::Sha224),
        known::DSA_WITH_SHA256 => (SignatureFamily::Dsa, HashAlgId::Sha256),
        _ => return None,
    };
    Some(mapping)
}

/// Map a PKCS#12 PBE OID to its cipher and key length in bytes.
pub(crate) fn oid_to_pkcs12_pbe(oid: &Oid) -> Option<(CipherAlgId, usize)> {
    let mapping = match oid.to_dot_string().as_str() {
        known::PBE_SHA1_RC4_128 => (CipherAlgId::Rc4, 16),
        known::PBE_SHA1_RC4_40 => (CipherAlgId::Rc4, 5),
        known::PBE_SHA1_3DES => (CipherAlgId::DesEde3Cbc, 24),
        known::PBE_SHA1_2DES => (CipherAlgId::DesEde2Cbc, 16),
        known::PBE_SHA1_RC2_128 => (CipherAlgId::Rc2Cbc { effective_bits: 128 }, 16),
        known::PBE_SHA1_RC2_40 => (CipherAlgId::Rc2Cbc { effective_bits: 40 }, 5),
        _ => return None,
    };
    Some(mapping)
}

/// Map a PBES2 encryption scheme OID to its cipher.
pub(crate) fn oid_to_pbes2_cipher(oid: &Oid) -> Option<CipherAlgId> {
    let alg = match oid.to_dot_string().as_str() {
        known::DES_EDE3_CBC => CipherAlgId::DesEde3Cbc,
        known::AES128_CBC => CipherAlgId::Aes128Cbc,
        known::AES192_CBC => CipherAlgId::Aes192Cbc,
        known::AES256_CBC => CipherAlgId::Aes256Cbc,
        _ => return None,
    };
    Some(alg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_builds() {
        let registry = standard_registry().unwrap();
        let total: usize = STANDARD_MODULES.iter().map(|m| m.entries.len()).sum();
        // every OID belongs to exactly one module
        assert_eq!(registry.len(), total);

        let cn: Oid = known::COMMON_NAME.parse().unwrap();
        assert_eq!(registry.lookup_short_name(&cn), Some("CN"));
        assert_eq!(registry.module_of(&cn), Some("x520"));
        let bag: Oid = known::CERT_BAG.parse().unwrap();
        assert_eq!(registry.module_of(&bag), Some("pkcs12"));
        assert!(registry.resolve_decoder(&bag).is_some());
    }

    #[test]
    fn test_algorithm_mapping() {
        let oid: Oid = known::HMAC_WITH_SHA256.parse().unwrap();
        assert_eq!(oid_to_hash(&oid), Some(HashAlgId::Sha256));
        let oid: Oid = known::DSA_WITH_SHA256.parse().unwrap();
        assert_eq!(
            oid_to_signature(&oid),
            Some((SignatureFamily::Dsa, HashAlgId::Sha256))
        );
        let oid: Oid = known::PBE_SHA1_RC2_40.parse().unwrap();
        assert_eq!(
            oid_to_pkcs12_pbe(&oid),
            Some((CipherAlgId::Rc2Cbc { effective_bits: 40 }, 5))
        );
        let oid: Oid = known::AES256_CBC.parse().unwrap();
        assert_eq!(oid_to_pbes2_cipher(&oid), Some(CipherAlgId::Aes256Cbc));
        let unknown: Oid = "1.2.3.4".parse().unwrap();
        assert_eq!(oid_to_hash(&unknown), None);
    }
}
