#![forbid(unsafe_code)]
#![doc = "Utility layer for derkit: ASN.1 BER/DER codec, OID registry, PEM."]

#[cfg(feature = "asn1")]
pub mod asn1;

#[cfg(feature = "oid")]
pub mod oid;

#[cfg(feature = "pem")]
pub mod pem;
