//! The Tag/Length/Value codec: DER out, BER in.

use super::writer::write_tlv;
use super::{Asn1Node, Length, Reader, Value};
use crate::oid::OidRegistry;
use derkit_types::Asn1Error;
use std::sync::Arc;

/// Limits applied while decoding untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum constructed-value nesting depth.
    pub max_depth: usize,
    /// Accept BER indefinite lengths.
    pub allow_indefinite: bool,
    /// Largest definite length accepted for any single TLV.
    pub max_length: usize,
    /// Fall back to an opaque `ANY` for open types whose OID is not registered.
    pub allow_unknown_open_types: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            allow_indefinite: true,
            max_length: 16 * 1024 * 1024,
            allow_unknown_open_types: true,
        }
    }
}

impl DecoderConfig {
    /// Create a builder for decoder configuration.
    pub fn builder() -> DecoderConfigBuilder {
        DecoderConfigBuilder::default()
    }
}

/// Builder for `DecoderConfig`.
#[derive(Debug, Default)]
pub struct DecoderConfigBuilder {
    config: DecoderConfig,
}

impl DecoderConfigBuilder {
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn allow_indefinite(mut self, enabled: bool) -> Self {
        self.config.allow_indefinite = enabled;
        self
    }

    pub fn max_length(mut self, length: usize) -> Self {
        self.config.max_length = length;
        self
    }

    pub fn allow_unknown_open_types(mut self, enabled: bool) -> Self {
        self.config.allow_unknown_open_types = enabled;
        self
    }

    pub fn build(self) -> DecoderConfig {
        self.config
    }
}

/// Encodes and decodes [`Value`] trees against a shared OID registry.
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<OidRegistry>,
    config: DecoderConfig,
}

impl Codec {
    pub fn new(registry: Arc<OidRegistry>) -> Self {
        Self::with_config(registry, DecoderConfig::default())
    }

    pub fn with_config(registry: Arc<OidRegistry>, config: DecoderConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &OidRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Append the DER encoding of `value`; returns the number of bytes written.
    pub fn encode(&self, value: &Value, out: &mut Vec<u8>) -> Result<usize, Asn1Error> {
        if !value.is_set() {
            return Err(Asn1Error::ValueNotSet(value.type_name().into()));
        }
        match value {
            // captured TLVs are written back verbatim
            Value::Any(Some(raw)) => {
                out.extend_from_slice(raw);
                Ok(raw.len())
            }
            Value::Choice(c) => match c.selected() {
                Some(selected) => self.encode(selected, out),
                None => Err(Asn1Error::ValueNotSet("CHOICE".into())),
            },
            Value::AnyDefinedBy(a) => match a.resolved() {
                Some(resolved) => self.encode(resolved, out),
                None => Err(Asn1Error::ValueNotSet("ANY DEFINED BY".into())),
            },
            _ => {
                let mut contents = Vec::new();
                value.encode_value(self, &mut contents)?;
                write_tlv(out, value.tag(), &contents)
            }
        }
    }

    /// DER encoding of `value` as a new buffer.
    pub fn to_der(&self, value: &Value) -> Result<Vec<u8>, Asn1Error> {
        let mut out = Vec::new();
        self.encode(value, &mut out)?;
        Ok(out)
    }

    /// Decode one TLV from the front of `data` into `value`; returns the number
    /// of bytes consumed.
    pub fn decode(&self, value: &mut Value, data: &[u8]) -> Result<usize, Asn1Error> {
        let mut src = Reader::new(data);
        self.decode_from(value, &mut src)?;
        Ok(src.position())
    }

    /// Decode `data` into `value`, requiring every byte be consumed.
    pub fn decode_all(&self, value: &mut Value, data: &[u8]) -> Result<(), Asn1Error> {
        let consumed = self.decode(value, data)?;
        if consumed != data.len() {
            return Err(Asn1Error::malformed(format!(
                "{} trailing bytes after {}",
                data.len() - consumed,
                value.type_name()
            )));
        }
        Ok(())
    }

    /// Read the next header from `src` and decode the TLV into `value`.
    pub fn decode_from(&self, value: &mut Value, src: &mut Reader<'_>) -> Result<(), Asn1Error> {
        self.check_depth(src)?;
        let (tag, length) = src.read_header()?;
        match length {
            Length::Definite(len) if len > self.config.max_length => {
                return Err(Asn1Error::malformed(format!(
                    "length {len} exceeds limit {}",
                    self.config.max_length
                )));
            }
            Length::Indefinite if !self.config.allow_indefinite => {
                return Err(Asn1Error::malformed("indefinite length not permitted"));
            }
            _ => {}
        }
        if !value.matches(tag) {
            return Err(Asn1Error::malformed(format!(
                "expected {}, found {tag}",
                value.type_name()
            )));
        }
        value.decode_value(self, src, tag, length)
    }

    pub(crate) fn check_depth(&self, src: &Reader<'_>) -> Result<(), Asn1Error> {
        if src.depth() > self.config.max_depth {
            return Err(Asn1Error::DepthExceeded(self.config.max_depth));
        }
        Ok(())
    }
}
