//! Context-specific re-tagging: `[n] IMPLICIT` and `[n] EXPLICIT`.

use super::{Asn1Node, Codec, Length, Reader, Tag, Value};
use derkit_types::Asn1Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMode {
    /// The outer tag replaces the inner type's tag.
    Implicit,
    /// The outer tag wraps the inner type's complete encoding.
    Explicit,
}

/// A wrapper that owns its inner node and forwards all value behavior to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged {
    mode: TagMode,
    number: u8,
    inner: Box<Value>,
}

impl Tagged {
    pub fn explicit(number: u8, inner: Value) -> Self {
        Self {
            mode: TagMode::Explicit,
            number,
            inner: Box::new(inner),
        }
    }

    pub fn implicit(number: u8, inner: Value) -> Self {
        Self {
            mode: TagMode::Implicit,
            number,
            inner: Box::new(inner),
        }
    }

    pub fn mode(&self) -> TagMode {
        self.mode
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn inner(&self) -> &Value {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut Value {
        &mut self.inner
    }

    pub(crate) fn matches(&self, tag: Tag) -> bool {
        let outer = Tag::context(self.number, tag.constructed);
        if tag != outer {
            return false;
        }
        match self.mode {
            TagMode::Explicit => tag.constructed,
            TagMode::Implicit => self.inner.matches(self.native_tag(tag)),
        }
    }

    /// The inner type's own tag, with the wire's constructed bit.
    fn native_tag(&self, wire: Tag) -> Tag {
        self.inner.tag().with_constructed(wire.constructed)
    }
}

impl Asn1Node for Tagged {
    fn tag(&self) -> Tag {
        match self.mode {
            TagMode::Explicit => Tag::context(self.number, true),
            // the constructed bit comes from the wrapped type
            TagMode::Implicit => Tag::context(self.number, self.inner.tag().constructed),
        }
    }

    fn is_set(&self) -> bool {
        self.inner.is_set()
    }

    fn encode_value(&self, codec: &Codec, out: &mut Vec<u8>) -> Result<usize, Asn1Error> {
        match self.mode {
            TagMode::Explicit => codec.encode(&self.inner, out),
            TagMode::Implicit => match &*self.inner {
                Value::Choice(_) | Value::AnyDefinedBy(_) => Err(Asn1Error::UnsupportedFeature(
                    "implicit tagging of an untagged type".into(),
                )),
                inner => inner.encode_value(codec, out),
            },
        }
    }

    fn decode_value(
        &mut self,
        codec: &Codec,
        src: &mut Reader<'_>,
        tag: Tag,
        length: Length,
    ) -> Result<(), Asn1Error> {
        match self.mode {
            TagMode::Implicit => {
                let native = self.native_tag(tag);
                self.inner.decode_value(codec, src, native, length)
            }
            TagMode::Explicit => {
                if !tag.constructed {
                    return Err(Asn1Error::malformed(format!(
                        "explicit {tag} must be constructed"
                    )));
                }
                match length {
                    Length::Definite(len) => {
                        let mut body = src.sub(len)?;
                        codec.decode_from(&mut self.inner, &mut body)?;
                        if !body.is_empty() {
                            return Err(Asn1Error::SizeMismatch {
                                declared: len,
                                consumed: body.position(),
                            });
                        }
                    }
                    Length::Indefinite => {
                        let mut body = src.rest();
                        codec.decode_from(&mut self.inner, &mut body)?;
                        body.read_end_of_contents()?;
                        src.advance(body.position());
                    }
                }
                Ok(())
            }
        }
    }
}
