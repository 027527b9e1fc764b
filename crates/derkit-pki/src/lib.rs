#![forbid(unsafe_code)]
#![doc = "Certificate and keystore models for derkit: X.509, PKCS#7 content, PKCS#8 keys and PKCS#12 stores."]

pub mod context;
pub(crate) mod encoding;
pub mod oid_mapping;
pub mod schema;

#[cfg(feature = "x509")]
pub mod x509;

#[cfg(feature = "pkcs8")]
pub mod pkcs8;

#[cfg(feature = "cms")]
pub mod cms;

#[cfg(feature = "pkcs12")]
pub mod pkcs12;

pub use context::PkiContext;
pub use derkit_types::{KeystoreError, PkiError};
