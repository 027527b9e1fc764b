//! Shared decoding context: a codec bound to a registry of PKI modules.

use crate::oid_mapping;
use derkit_types::{Asn1Error, PkiError};
use derkit_utils::asn1::{Codec, DecoderConfig, Value};
use derkit_utils::oid::OidRegistry;
use std::sync::{Arc, OnceLock};

/// Registry handle and decoder limits used by every parser in this crate.
///
/// Cheap to clone; the registry is shared read-only behind an `Arc`. Tests and
/// applications with their own extension decoders build an isolated context
/// with [`PkiContext::from_registry`].
#[derive(Debug, Clone)]
pub struct PkiContext {
    codec: Codec,
}

impl PkiContext {
    /// A context over the standard modules with default decoder limits.
    pub fn new() -> Result<Self, Asn1Error> {
        Self::with_config(DecoderConfig::default())
    }

    /// A context over the standard modules with custom decoder limits.
    pub fn with_config(config: DecoderConfig) -> Result<Self, Asn1Error> {
        let registry = oid_mapping::standard_registry()?;
        Ok(Self::from_registry(Arc::new(registry), config))
    }

    /// A context over a caller-built registry.
    pub fn from_registry(registry: Arc<OidRegistry>, config: DecoderConfig) -> Self {
        Self {
            codec: Codec::with_config(registry, config),
        }
    }

    /// The process-wide default context, built on first use.
    pub fn shared() -> Result<&'static PkiContext, PkiError> {
        static SHARED: OnceLock<Result<PkiContext, Asn1Error>> = OnceLock::new();
        SHARED
            .get_or_init(PkiContext::new)
            .as_ref()
            .map_err(|e| PkiError::Asn1(e.clone()))
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn registry(&self) -> &OidRegistry {
        self.codec.registry()
    }

    /// Decode all of `der` into a fresh instance of `template`.
    pub fn decode(&self, template: fn() -> Value, der: &[u8]) -> Result<Value, Asn1Error> {
        let mut value = template();
        self.codec.decode_all(&mut value, der)?;
        Ok(value)
    }
}
