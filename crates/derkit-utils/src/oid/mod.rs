//! OID (Object Identifier) values and the OID registry.

use derkit_types::Asn1Error;
use std::str::FromStr;

#[cfg(feature = "asn1")]
mod registry;

#[cfg(feature = "asn1")]
pub use registry::{OidEntry, OidModule, OidRegistry, OidRegistryBuilder};

/// A parsed OID represented as a sequence of arc values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid {
    arcs: Vec<u32>,
}

impl Oid {
    /// Create an OID from a slice of arc values.
    ///
    /// Fails unless there are at least two arcs, the first is 0, 1 or 2, and
    /// the second is below 40 when the first is 0 or 1.
    pub fn new(arcs: &[u32]) -> Result<Self, Asn1Error> {
        match arcs {
            [first, second, ..] if *first <= 2 && (*first == 2 || *second < 40) => Ok(Self {
                arcs: arcs.to_vec(),
            }),
            _ => Err(Asn1Error::InvalidOid(format!("{arcs:?}"))),
        }
    }

    /// Return the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Encode this OID to its content octets (no tag/length).
    pub fn to_der_value(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.arcs.len() + 4);
        let first = self.arcs[0] as u64 * 40 + self.arcs[1] as u64;
        encode_arc(&mut buf, first);
        for &arc in &self.arcs[2..] {
            encode_arc(&mut buf, arc as u64);
        }
        buf
    }

    /// Parse an OID from its content octets.
    pub fn from_der_value(data: &[u8]) -> Result<Self, Asn1Error> {
        if data.is_empty() {
            return Err(Asn1Error::malformed("empty object identifier"));
        }
        let mut arcs = Vec::new();
        let mut i = 0;
        while i < data.len() {
            let (value, consumed) = decode_arc(&data[i..])?;
            if i == 0 {
                let (a, b) = match value {
                    0..=39 => (0, value),
                    40..=79 => (1, value - 40),
                    _ => (2, value - 80),
                };
                arcs.push(a);
                arcs.push(
                    u32::try_from(b).map_err(|_| Asn1Error::malformed("oid arc overflows 32 bits"))?,
                );
            } else {
                arcs.push(
                    u32::try_from(value)
                        .map_err(|_| Asn1Error::malformed("oid arc overflows 32 bits"))?,
                );
            }
            i += consumed;
        }
        Ok(Self { arcs })
    }

    /// Return the dotted-string representation (e.g., "1.2.840.113549.1.1.1").
    pub fn to_dot_string(&self) -> String {
        self.arcs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl FromStr for Oid {
    type Err = Asn1Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let arcs = s
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(Asn1Error::InvalidOid(s.to_string()));
                }
                part.parse::<u32>()
                    .map_err(|_| Asn1Error::InvalidOid(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Oid::new(&arcs).map_err(|_| Asn1Error::InvalidOid(s.to_string()))
    }
}

impl PartialEq<str> for Oid {
    fn eq(&self, other: &str) -> bool {
        let mut parts = other.split('.');
        for arc in &self.arcs {
            match parts.next().map(str::parse::<u32>) {
                Some(Ok(v)) if v == *arc => {}
                _ => return false,
            }
        }
        parts.next().is_none()
    }
}

impl PartialEq<&str> for Oid {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_dot_string())
    }
}

fn encode_arc(buf: &mut Vec<u8>, value: u64) {
    let mut groups = [0u8; 10];
    let mut n = 0;
    let mut v = value;
    loop {
        groups[n] = (v & 0x7F) as u8;
        n += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let more = if i > 0 { 0x80 } else { 0x00 };
        buf.push(groups[i] | more);
    }
}

fn decode_arc(data: &[u8]) -> Result<(u64, usize), Asn1Error> {
    if data.first() == Some(&0x80) {
        return Err(Asn1Error::malformed("non-minimal oid arc"));
    }
    let mut value: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if value >> 57 != 0 {
            return Err(Asn1Error::malformed("oid arc overflows 32 bits"));
        }
        value = (value << 7) | (byte & 0x7F) as u64;
        if (byte & 0x80) == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Asn1Error::malformed("truncated oid arc"))
}

/// Dotted forms of the OIDs this workspace dispatches on.
pub mod known {
    // PKCS#1
    pub const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
    pub const MD5_WITH_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.4";
    pub const SHA1_WITH_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.5";
    pub const SHA256_WITH_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.11";
    pub const SHA384_WITH_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.12";
    pub const SHA512_WITH_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.13";
    pub const SHA224_WITH_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.14";

    // DSA / DH
    pub const DSA: &str = "1.2.840.10040.4.1";
    pub const DSA_WITH_SHA1: &str = "1.2.840.10040.4.3";
    pub const DSA_WITH_SHA224: &str = "2.16.840.1.101.3.4.3.1";
    pub const DSA_WITH_SHA256: &str = "2.16.840.1.101.3.4.3.2";
    pub const DH_PUBLIC_NUMBER: &str = "1.2.840.10046.2.1";
    pub const DH_KEY_AGREEMENT: &str = "1.2.840.113549.1.3.1";

    // Digests
    pub const MD5: &str = "1.2.840.113549.2.5";
    pub const SHA1: &str = "1.3.14.3.2.26";
    pub const SHA224: &str = "2.16.840.1.101.3.4.2.4";
    pub const SHA256: &str = "2.16.840.1.101.3.4.2.1";
    pub const SHA384: &str = "2.16.840.1.101.3.4.2.2";
    pub const SHA512: &str = "2.16.840.1.101.3.4.2.3";
    pub const RIPEMD160: &str = "1.3.36.3.2.1";

    // HMAC PRFs (RFC 8018)
    pub const HMAC_WITH_SHA1: &str = "1.2.840.113549.2.7";
    pub const HMAC_WITH_SHA224: &str = "1.2.840.113549.2.8";
    pub const HMAC_WITH_SHA256: &str = "1.2.840.113549.2.9";
    pub const HMAC_WITH_SHA384: &str = "1.2.840.113549.2.10";
    pub const HMAC_WITH_SHA512: &str = "1.2.840.113549.2.11";

    // Ciphers
    pub const DES_EDE3_CBC: &str = "1.2.840.113549.3.7";
    pub const AES128_CBC: &str = "2.16.840.1.101.3.4.1.2";
    pub const AES192_CBC: &str = "2.16.840.1.101.3.4.1.22";
    pub const AES256_CBC: &str = "2.16.840.1.101.3.4.1.42";

    // PKCS#5 / PKCS#12 password-based encryption
    pub const PBKDF2: &str = "1.2.840.113549.1.5.12";
    pub const PBES2: &str = "1.2.840.113549.1.5.13";
    pub const PBE_SHA1_RC4_128: &str = "1.2.840.113549.1.12.1.1";
    pub const PBE_SHA1_RC4_40: &str = "1.2.840.113549.1.12.1.2";
    pub const PBE_SHA1_3DES: &str = "1.2.840.113549.1.12.1.3";
    pub const PBE_SHA1_2DES: &str = "1.2.840.113549.1.12.1.4";
    pub const PBE_SHA1_RC2_128: &str = "1.2.840.113549.1.12.1.5";
    pub const PBE_SHA1_RC2_40: &str = "1.2.840.113549.1.12.1.6";

    // PKCS#7
    pub const PKCS7_DATA: &str = "1.2.840.113549.1.7.1";
    pub const PKCS7_SIGNED_DATA: &str = "1.2.840.113549.1.7.2";
    pub const PKCS7_ENVELOPED_DATA: &str = "1.2.840.113549.1.7.3";
    pub const PKCS7_SIGNED_AND_ENVELOPED_DATA: &str = "1.2.840.113549.1.7.4";
    pub const PKCS7_DIGESTED_DATA: &str = "1.2.840.113549.1.7.5";
    pub const PKCS7_ENCRYPTED_DATA: &str = "1.2.840.113549.1.7.6";

    // PKCS#9
    pub const EMAIL_ADDRESS: &str = "1.2.840.113549.1.9.1";
    pub const FRIENDLY_NAME: &str = "1.2.840.113549.1.9.20";
    pub const LOCAL_KEY_ID: &str = "1.2.840.113549.1.9.21";
    pub const X509_CERTIFICATE: &str = "1.2.840.113549.1.9.22.1";

    // PKCS#12 bag types
    pub const KEY_BAG: &str = "1.2.840.113549.1.12.10.1.1";
    pub const PKCS8_SHROUDED_KEY_BAG: &str = "1.2.840.113549.1.12.10.1.2";
    pub const CERT_BAG: &str = "1.2.840.113549.1.12.10.1.3";
    pub const CRL_BAG: &str = "1.2.840.113549.1.12.10.1.4";
    pub const SECRET_BAG: &str = "1.2.840.113549.1.12.10.1.5";
    pub const SAFE_CONTENTS_BAG: &str = "1.2.840.113549.1.12.10.1.6";

    // X.509 extensions (RFC 5280)
    pub const SUBJECT_KEY_IDENTIFIER: &str = "2.5.29.14";
    pub const KEY_USAGE: &str = "2.5.29.15";
    pub const SUBJECT_ALT_NAME: &str = "2.5.29.17";
    pub const ISSUER_ALT_NAME: &str = "2.5.29.18";
    pub const BASIC_CONSTRAINTS: &str = "2.5.29.19";
    pub const CERTIFICATE_POLICIES: &str = "2.5.29.32";
    pub const AUTHORITY_KEY_IDENTIFIER: &str = "2.5.29.35";
    pub const EXT_KEY_USAGE: &str = "2.5.29.37";

    // X.520 attribute types
    pub const COMMON_NAME: &str = "2.5.4.3";
    pub const COUNTRY_NAME: &str = "2.5.4.6";
    pub const ORGANIZATION_NAME: &str = "2.5.4.10";
}
