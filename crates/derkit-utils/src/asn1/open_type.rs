//! ANY DEFINED BY: an open type resolved through the OID registry at decode time.

use super::{Asn1Node, Codec, Length, Reader, Tag, Value};
use crate::oid::Oid;
use derkit_types::Asn1Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct AnyDefinedBy {
    key: &'static str,
    governing: Option<Oid>,
    fallback: bool,
    inner: Option<Box<Value>>,
}

impl AnyDefinedBy {
    /// An open type governed by the sibling component named `key`.
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            governing: None,
            fallback: true,
            inner: None,
        }
    }

    /// Refuse the opaque `ANY` fallback for unregistered OIDs, whatever the
    /// codec configuration allows.
    pub fn strict(mut self) -> Self {
        self.fallback = false;
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// The OID this slot was resolved against.
    pub fn governing(&self) -> Option<&Oid> {
        self.governing.as_ref()
    }

    /// The concrete decoded node.
    pub fn resolved(&self) -> Option<&Value> {
        self.inner.as_deref()
    }

    pub(crate) fn bind(&mut self, oid: Oid) {
        self.governing = Some(oid);
    }

    pub(crate) fn set_value(&mut self, value: Value) {
        self.inner = Some(Box::new(value));
    }

    fn instantiate(&self, codec: &Codec) -> Result<Value, Asn1Error> {
        let allow_any = self.fallback && codec.config().allow_unknown_open_types;
        let Some(oid) = &self.governing else {
            return if allow_any {
                Ok(Value::any())
            } else {
                Err(Asn1Error::UnknownOpenType(format!("<unbound {}>", self.key)))
            };
        };
        match codec.registry().resolve_decoder(oid) {
            Some(template) => {
                trace!(oid = %oid, "resolved open type");
                Ok(template.instantiate())
            }
            None if allow_any => {
                trace!(oid = %oid, "open type not registered, keeping opaque value");
                Ok(Value::any())
            }
            None => Err(Asn1Error::UnknownOpenType(oid.to_string())),
        }
    }
}

impl Asn1Node for AnyDefinedBy {
    fn tag(&self) -> Tag {
        self.resolved()
            .map_or(Tag::universal(0, false), Value::tag)
    }

    fn is_set(&self) -> bool {
        self.resolved().is_some_and(Value::is_set)
    }

    fn encode_value(&self, codec: &Codec, out: &mut Vec<u8>) -> Result<usize, Asn1Error> {
        self.resolved()
            .ok_or_else(|| Asn1Error::ValueNotSet("ANY DEFINED BY".into()))?
            .encode_value(codec, out)
    }

    fn decode_value(
        &mut self,
        codec: &Codec,
        src: &mut Reader<'_>,
        tag: Tag,
        length: Length,
    ) -> Result<(), Asn1Error> {
        let mut inner = self.instantiate(codec)?;
        if !inner.matches(tag) {
            return Err(Asn1Error::malformed(format!(
                "open type {} expects {}, found {tag}",
                self.governing
                    .as_ref()
                    .map_or_else(|| self.key.to_string(), Oid::to_string),
                inner.type_name()
            )));
        }
        inner.decode_value(codec, src, tag, length)?;
        self.inner = Some(Box::new(inner));
        Ok(())
    }
}
