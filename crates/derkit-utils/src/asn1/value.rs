//! The Value Model: one closed sum type covering every ASN.1 node kind.

use super::{
    tags, AnyDefinedBy, Choice, Codec, Collection, Length, Reader, Structure, Tag, Tagged,
};
use crate::oid::Oid;
use derkit_types::Asn1Error;
use num_bigint::BigInt;
use std::fmt;

/// Behavior shared by every node kind.
///
/// `encode_value` writes only the contents octets; the codec supplies the
/// identifier and length. `decode_value` is called after the codec has read
/// the header, with the tag and length found on the wire.
pub trait Asn1Node {
    fn tag(&self) -> Tag;
    fn is_set(&self) -> bool;
    fn encode_value(&self, codec: &Codec, out: &mut Vec<u8>) -> Result<usize, Asn1Error>;
    fn decode_value(
        &mut self,
        codec: &Codec,
        src: &mut Reader<'_>,
        tag: Tag,
        length: Length,
    ) -> Result<(), Asn1Error>;
}

/// Character string and time types. Contents are kept as raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    Utf8,
    Numeric,
    Printable,
    Teletex,
    Ia5,
    UtcTime,
    GeneralizedTime,
    Visible,
    Universal,
    Bmp,
}

impl StringKind {
    pub fn tag_number(self) -> u8 {
        match self {
            StringKind::Utf8 => tags::UTF8_STRING,
            StringKind::Numeric => tags::NUMERIC_STRING,
            StringKind::Printable => tags::PRINTABLE_STRING,
            StringKind::Teletex => tags::TELETEX_STRING,
            StringKind::Ia5 => tags::IA5_STRING,
            StringKind::UtcTime => tags::UTC_TIME,
            StringKind::GeneralizedTime => tags::GENERALIZED_TIME,
            StringKind::Visible => tags::VISIBLE_STRING,
            StringKind::Universal => tags::UNIVERSAL_STRING,
            StringKind::Bmp => tags::BMP_STRING,
        }
    }

    pub fn from_tag_number(number: u32) -> Option<Self> {
        let kind = match u8::try_from(number).ok()? {
            tags::UTF8_STRING => StringKind::Utf8,
            tags::NUMERIC_STRING => StringKind::Numeric,
            tags::PRINTABLE_STRING => StringKind::Printable,
            tags::TELETEX_STRING => StringKind::Teletex,
            tags::IA5_STRING => StringKind::Ia5,
            tags::UTC_TIME => StringKind::UtcTime,
            tags::GENERALIZED_TIME => StringKind::GeneralizedTime,
            tags::VISIBLE_STRING => StringKind::Visible,
            tags::UNIVERSAL_STRING => StringKind::Universal,
            tags::BMP_STRING => StringKind::Bmp,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            StringKind::Utf8 => "UTF8String",
            StringKind::Numeric => "NumericString",
            StringKind::Printable => "PrintableString",
            StringKind::Teletex => "TeletexString",
            StringKind::Ia5 => "IA5String",
            StringKind::UtcTime => "UTCTime",
            StringKind::GeneralizedTime => "GeneralizedTime",
            StringKind::Visible => "VisibleString",
            StringKind::Universal => "UniversalString",
            StringKind::Bmp => "BMPString",
        }
    }

    /// Decode raw contents to text.
    pub fn decode_text(self, bytes: &[u8]) -> Option<String> {
        match self {
            StringKind::Bmp => {
                if bytes.len() % 2 != 0 {
                    return None;
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&units).ok()
            }
            StringKind::Universal => {
                if bytes.len() % 4 != 0 {
                    return None;
                }
                bytes
                    .chunks_exact(4)
                    .map(|c| char::from_u32(u32::from_be_bytes([c[0], c[1], c[2], c[3]])))
                    .collect()
            }
            // T.61 is approximated as Latin-1.
            StringKind::Teletex => Some(bytes.iter().map(|&b| b as char).collect()),
            _ => String::from_utf8(bytes.to_vec()).ok(),
        }
    }

    /// Encode text to raw contents, enforcing the kind's character set.
    pub fn encode_text(self, text: &str) -> Result<Vec<u8>, Asn1Error> {
        let ok = match self {
            StringKind::Numeric => text.bytes().all(|b| b.is_ascii_digit() || b == b' '),
            StringKind::Printable => text.bytes().all(|b| {
                b.is_ascii_alphanumeric() || b" '()+,-./:=?".contains(&b)
            }),
            StringKind::Ia5 | StringKind::UtcTime | StringKind::GeneralizedTime => {
                text.is_ascii()
            }
            StringKind::Visible => text.bytes().all(|b| (0x20..0x7F).contains(&b)),
            StringKind::Teletex => text.chars().all(|c| (c as u32) < 0x100),
            StringKind::Utf8 | StringKind::Universal | StringKind::Bmp => true,
        };
        if !ok {
            return Err(Asn1Error::TypeMismatch(self.name()));
        }
        Ok(match self {
            StringKind::Bmp => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            StringKind::Universal => text.chars().flat_map(|c| (c as u32).to_be_bytes()).collect(),
            StringKind::Teletex => text.chars().map(|c| c as u8).collect(),
            _ => text.as_bytes().to_vec(),
        })
    }
}

/// BIT STRING contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitString {
    /// Number of unused bits in the final octet (0..=7).
    pub unused_bits: u8,
    pub bytes: Vec<u8>,
}

impl BitString {
    pub fn new(bytes: Vec<u8>, unused_bits: u8) -> Self {
        Self { unused_bits, bytes }
    }

    /// Number of significant bits.
    pub fn bit_len(&self) -> usize {
        (self.bytes.len() * 8).saturating_sub(self.unused_bits as usize)
    }

    /// Named-bit access, bit 0 being the most significant bit of the first octet.
    pub fn bit(&self, index: usize) -> bool {
        index < self.bit_len() && self.bytes[index / 8] & (0x80 >> (index % 8)) != 0
    }
}

/// A factory for an unset schema node, used wherever the concrete type is
/// chosen at decode time (collection elements, registry decoders).
#[derive(Clone, Copy)]
pub struct Template(pub fn() -> Value);

impl Template {
    pub fn instantiate(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Template")
    }
}

// Templates are schema, not data: two values are equal regardless of the
// factory that produced their elements.
impl PartialEq for Template {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Eq for Template {}

/// An ASN.1 node. `None` / `false` payloads mean "not set".
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(Option<bool>),
    Integer(Option<BigInt>),
    Enumerated(Option<BigInt>),
    Null(bool),
    ObjectIdentifier(Option<Oid>),
    BitString(Option<BitString>),
    OctetString(Option<Vec<u8>>),
    String {
        kind: StringKind,
        value: Option<Vec<u8>>,
    },
    /// Opaque capture of a complete TLV.
    Any(Option<Vec<u8>>),
    Collection(Collection),
    Structure(Structure),
    Choice(Choice),
    AnyDefinedBy(AnyDefinedBy),
    Tagged(Tagged),
}

impl Value {
    // Unset templates

    pub fn boolean() -> Self {
        Value::Boolean(None)
    }
    pub fn integer() -> Self {
        Value::Integer(None)
    }
    pub fn enumerated() -> Self {
        Value::Enumerated(None)
    }
    pub fn null() -> Self {
        Value::Null(false)
    }
    pub fn oid() -> Self {
        Value::ObjectIdentifier(None)
    }
    pub fn bit_string() -> Self {
        Value::BitString(None)
    }
    pub fn octet_string() -> Self {
        Value::OctetString(None)
    }
    pub fn string(kind: StringKind) -> Self {
        Value::String { kind, value: None }
    }
    pub fn any() -> Self {
        Value::Any(None)
    }

    /// `[n] EXPLICIT inner`
    pub fn explicit(number: u8, inner: Value) -> Self {
        Value::Tagged(Tagged::explicit(number, inner))
    }

    /// `[n] IMPLICIT inner`
    pub fn implicit(number: u8, inner: Value) -> Self {
        Value::Tagged(Tagged::implicit(number, inner))
    }

    /// An open type resolved through the sibling component named `key`.
    pub fn any_defined_by(key: &'static str) -> Self {
        Value::AnyDefinedBy(AnyDefinedBy::new(key))
    }

    // Set values

    pub fn from_bool(v: bool) -> Self {
        Value::Boolean(Some(v))
    }
    pub fn from_integer(v: impl Into<BigInt>) -> Self {
        Value::Integer(Some(v.into()))
    }
    pub fn null_value() -> Self {
        Value::Null(true)
    }
    pub fn from_oid(oid: Oid) -> Self {
        Value::ObjectIdentifier(Some(oid))
    }
    pub fn from_bit_string(bits: BitString) -> Self {
        Value::BitString(Some(bits))
    }
    pub fn from_octets(bytes: impl Into<Vec<u8>>) -> Self {
        Value::OctetString(Some(bytes.into()))
    }
    pub fn from_text(kind: StringKind, text: &str) -> Result<Self, Asn1Error> {
        Ok(Value::String {
            kind,
            value: Some(kind.encode_text(text)?),
        })
    }
    /// Wrap a complete DER/BER TLV.
    pub fn from_der(raw: impl Into<Vec<u8>>) -> Self {
        Value::Any(Some(raw.into()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "BOOLEAN",
            Value::Integer(_) => "INTEGER",
            Value::Enumerated(_) => "ENUMERATED",
            Value::Null(_) => "NULL",
            Value::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            Value::BitString(_) => "BIT STRING",
            Value::OctetString(_) => "OCTET STRING",
            Value::String { kind, .. } => kind.name(),
            Value::Any(_) => "ANY",
            Value::Collection(c) => c.type_name(),
            Value::Structure(s) => s.name(),
            Value::Choice(_) => "CHOICE",
            Value::AnyDefinedBy(_) => "ANY DEFINED BY",
            Value::Tagged(t) => t.inner().type_name(),
        }
    }

    /// Whether a TLV with this identifier can be decoded into this node.
    pub fn matches(&self, tag: Tag) -> bool {
        match self {
            Value::Any(_) | Value::AnyDefinedBy(_) => true,
            Value::Choice(c) => c.alternative_for(tag).is_some(),
            Value::Tagged(t) => t.matches(tag),
            // strings may arrive in constructed (chunked) form
            Value::BitString(_) | Value::OctetString(_) | Value::String { .. } => {
                tag.same_number(&self.tag())
            }
            _ => tag == self.tag(),
        }
    }

    /// The node carrying the payload: strips tagging and open-type/choice
    /// indirection.
    pub fn inner(&self) -> &Value {
        match self {
            Value::Tagged(t) => t.inner().inner(),
            Value::Choice(c) => c.selected().map_or(self, Value::inner),
            Value::AnyDefinedBy(a) => a.resolved().map_or(self, Value::inner),
            _ => self,
        }
    }

    /// Replace this node's payload with `value`, keeping any tagging.
    pub fn assign(&mut self, value: Value) -> Result<(), Asn1Error> {
        match self {
            Value::Tagged(t) => t.inner_mut().assign(value),
            Value::AnyDefinedBy(a) => {
                a.set_value(value);
                Ok(())
            }
            Value::Choice(_) => Err(Asn1Error::TypeMismatch("CHOICE alternative")),
            Value::String { kind, .. } => match value {
                Value::String { kind: k, .. } if k == *kind => {
                    *self = value;
                    Ok(())
                }
                _ => Err(Asn1Error::TypeMismatch(kind.name())),
            },
            _ if std::mem::discriminant(self) == std::mem::discriminant(&value) => {
                *self = value;
                Ok(())
            }
            _ => Err(Asn1Error::TypeMismatch(self.type_name())),
        }
    }

    // Accessors; all look through tagging and open-type indirection.

    pub fn as_bool(&self) -> Option<bool> {
        match self.inner() {
            Value::Boolean(v) => *v,
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self.inner() {
            Value::Integer(v) | Value::Enumerated(v) => v.as_ref(),
            _ => None,
        }
    }

    /// INTEGER as u64, when non-negative and in range.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_integer()
            .and_then(|v| num_traits::ToPrimitive::to_u64(v))
    }

    pub fn as_oid(&self) -> Option<&Oid> {
        match self.inner() {
            Value::ObjectIdentifier(v) => v.as_ref(),
            _ => None,
        }
    }

    pub fn as_bit_string(&self) -> Option<&BitString> {
        match self.inner() {
            Value::BitString(v) => v.as_ref(),
            _ => None,
        }
    }

    pub fn as_octets(&self) -> Option<&[u8]> {
        match self.inner() {
            Value::OctetString(v) => v.as_deref(),
            _ => None,
        }
    }

    /// Character string contents as text.
    pub fn as_text(&self) -> Option<String> {
        match self.inner() {
            Value::String {
                kind,
                value: Some(v),
            } => kind.decode_text(v),
            _ => None,
        }
    }

    pub fn string_kind(&self) -> Option<StringKind> {
        match self.inner() {
            Value::String { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// UTCTime / GeneralizedTime as UNIX seconds.
    pub fn as_time(&self) -> Option<i64> {
        match self.inner() {
            Value::String {
                kind: kind @ (StringKind::UtcTime | StringKind::GeneralizedTime),
                value: Some(v),
            } => super::parse_time(*kind, v).ok(),
            _ => None,
        }
    }

    /// The captured TLV of an `ANY`.
    pub fn as_any(&self) -> Option<&[u8]> {
        match self.inner() {
            Value::Any(v) => v.as_deref(),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&Structure> {
        match self.inner() {
            Value::Structure(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self.inner() {
            Value::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// The choice node itself (not its selection).
    pub fn as_choice(&self) -> Option<&Choice> {
        match self {
            Value::Choice(c) => Some(c),
            Value::Tagged(t) => t.inner().as_choice(),
            _ => None,
        }
    }

    /// The sibling component name an open type in this node is governed by.
    pub(crate) fn open_type_key(&self) -> Option<&'static str> {
        match self {
            Value::AnyDefinedBy(a) => Some(a.key()),
            Value::Collection(c) => c.open_type_key(),
            Value::Tagged(t) => t.inner().open_type_key(),
            _ => None,
        }
    }

    /// Bind the governing OID of an open type in this node.
    pub(crate) fn bind_governing(&mut self, oid: &Oid) {
        match self {
            Value::AnyDefinedBy(a) => a.bind(oid.clone()),
            Value::Collection(c) => c.bind(oid.clone()),
            Value::Tagged(t) => t.inner_mut().bind_governing(oid),
            _ => {}
        }
    }
}

impl Asn1Node for Value {
    fn tag(&self) -> Tag {
        match self {
            Value::Boolean(_) => Tag::universal(tags::BOOLEAN, false),
            Value::Integer(_) => Tag::universal(tags::INTEGER, false),
            Value::Enumerated(_) => Tag::universal(tags::ENUMERATED, false),
            Value::Null(_) => Tag::universal(tags::NULL, false),
            Value::ObjectIdentifier(_) => Tag::universal(tags::OID, false),
            Value::BitString(_) => Tag::universal(tags::BIT_STRING, false),
            Value::OctetString(_) => Tag::universal(tags::OCTET_STRING, false),
            Value::String { kind, .. } => Tag::universal(kind.tag_number(), false),
            Value::Any(raw) => raw
                .as_deref()
                .and_then(|r| Tag::from_bytes(r).ok())
                .unwrap_or(Tag::universal(tags::END_OF_CONTENTS, false)),
            Value::Collection(c) => c.tag(),
            Value::Structure(s) => s.tag(),
            Value::Choice(c) => c.tag(),
            Value::AnyDefinedBy(a) => a.tag(),
            Value::Tagged(t) => t.tag(),
        }
    }

    fn is_set(&self) -> bool {
        match self {
            Value::Boolean(v) => v.is_some(),
            Value::Integer(v) | Value::Enumerated(v) => v.is_some(),
            Value::Null(v) => *v,
            Value::ObjectIdentifier(v) => v.is_some(),
            Value::BitString(v) => v.is_some(),
            Value::OctetString(v) => v.is_some(),
            Value::String { value, .. } => value.is_some(),
            Value::Any(v) => v.is_some(),
            Value::Collection(c) => c.is_set(),
            Value::Structure(s) => s.is_set(),
            Value::Choice(c) => c.is_set(),
            Value::AnyDefinedBy(a) => a.is_set(),
            Value::Tagged(t) => t.is_set(),
        }
    }

    fn encode_value(&self, codec: &Codec, out: &mut Vec<u8>) -> Result<usize, Asn1Error> {
        let start = out.len();
        match self {
            Value::Boolean(Some(v)) => out.push(if *v { 0xFF } else { 0x00 }),
            Value::Integer(Some(v)) | Value::Enumerated(Some(v)) => {
                out.extend_from_slice(&v.to_signed_bytes_be())
            }
            Value::Null(true) => {}
            Value::ObjectIdentifier(Some(oid)) => out.extend_from_slice(&oid.to_der_value()),
            Value::BitString(Some(bits)) => {
                if bits.unused_bits > 7 || (bits.bytes.is_empty() && bits.unused_bits != 0) {
                    return Err(Asn1Error::malformed("invalid unused-bit count"));
                }
                out.push(bits.unused_bits);
                out.extend_from_slice(&bits.bytes);
            }
            Value::OctetString(Some(v)) | Value::String { value: Some(v), .. } => {
                out.extend_from_slice(v)
            }
            Value::Any(Some(raw)) => out.extend_from_slice(any_contents(raw)?),
            Value::Collection(c) => return c.encode_value(codec, out),
            Value::Structure(s) => return s.encode_value(codec, out),
            Value::Choice(c) => return c.encode_value(codec, out),
            Value::AnyDefinedBy(a) => return a.encode_value(codec, out),
            Value::Tagged(t) => return t.encode_value(codec, out),
            _ => return Err(Asn1Error::ValueNotSet(self.type_name().into())),
        }
        Ok(out.len() - start)
    }

    fn decode_value(
        &mut self,
        codec: &Codec,
        src: &mut Reader<'_>,
        tag: Tag,
        length: Length,
    ) -> Result<(), Asn1Error> {
        match self {
            Value::Boolean(v) => {
                let contents = primitive(src, tag, length, "BOOLEAN")?;
                if contents.len() != 1 {
                    return Err(Asn1Error::malformed("BOOLEAN must be one octet"));
                }
                *v = Some(contents[0] != 0);
            }
            Value::Integer(v) | Value::Enumerated(v) => {
                let contents = primitive(src, tag, length, "INTEGER")?;
                if contents.is_empty() {
                    return Err(Asn1Error::malformed("empty INTEGER"));
                }
                *v = Some(BigInt::from_signed_bytes_be(contents));
            }
            Value::Null(v) => {
                if !primitive(src, tag, length, "NULL")?.is_empty() {
                    return Err(Asn1Error::malformed("NULL with contents"));
                }
                *v = true;
            }
            Value::ObjectIdentifier(v) => {
                let contents = primitive(src, tag, length, "OBJECT IDENTIFIER")?;
                *v = Some(Oid::from_der_value(contents)?);
            }
            Value::BitString(v) => *v = Some(decode_bit_string(codec, src, tag, length)?),
            Value::OctetString(v) | Value::String { value: v, .. } => {
                *v = Some(string_contents(codec, src, tag, length)?)
            }
            Value::Any(v) => {
                src.skip_contents(length)?;
                *v = Some(src.since_last_header().to_vec());
            }
            Value::Collection(c) => c.decode_value(codec, src, tag, length)?,
            Value::Structure(s) => s.decode_value(codec, src, tag, length)?,
            Value::Choice(c) => c.decode_value(codec, src, tag, length)?,
            Value::AnyDefinedBy(a) => a.decode_value(codec, src, tag, length)?,
            Value::Tagged(t) => t.decode_value(codec, src, tag, length)?,
        }
        Ok(())
    }
}

/// Contents of a primitive encoding.
fn primitive<'a>(
    src: &mut Reader<'a>,
    tag: Tag,
    length: Length,
    what: &str,
) -> Result<&'a [u8], Asn1Error> {
    if tag.constructed {
        return Err(Asn1Error::malformed(format!("{what} must be primitive")));
    }
    match length {
        Length::Definite(len) => src.take(len),
        Length::Indefinite => Err(Asn1Error::malformed(format!(
            "{what} cannot use the indefinite length"
        ))),
    }
}

/// Contents of a string type, reassembling constructed (chunked) encodings.
fn string_contents(
    codec: &Codec,
    src: &mut Reader<'_>,
    tag: Tag,
    length: Length,
) -> Result<Vec<u8>, Asn1Error> {
    if !tag.constructed {
        return Ok(primitive(src, tag, length, "string")?.to_vec());
    }
    let mut chunks = Vec::new();
    collect_chunks(codec, src, tag, length, &mut chunks)?;
    Ok(chunks.concat())
}

fn decode_bit_string(
    codec: &Codec,
    src: &mut Reader<'_>,
    tag: Tag,
    length: Length,
) -> Result<BitString, Asn1Error> {
    let chunks = if tag.constructed {
        let mut chunks = Vec::new();
        collect_chunks(codec, src, tag, length, &mut chunks)?;
        chunks
    } else {
        vec![primitive(src, tag, length, "BIT STRING")?]
    };
    let mut bits = BitString::new(Vec::new(), 0);
    for (i, chunk) in chunks.iter().enumerate() {
        let (&unused, bytes) = chunk
            .split_first()
            .ok_or_else(|| Asn1Error::malformed("BIT STRING without unused-bit octet"))?;
        let last = i + 1 == chunks.len();
        if unused > 7 || (unused != 0 && (!last || bytes.is_empty())) {
            return Err(Asn1Error::malformed("invalid unused-bit count"));
        }
        bits.bytes.extend_from_slice(bytes);
        bits.unused_bits = unused;
    }
    Ok(bits)
}

fn collect_chunks<'a>(
    codec: &Codec,
    src: &mut Reader<'a>,
    outer: Tag,
    length: Length,
    chunks: &mut Vec<&'a [u8]>,
) -> Result<(), Asn1Error> {
    let mut body = match length {
        Length::Definite(len) => src.sub(len)?,
        Length::Indefinite => src.rest(),
    };
    codec.check_depth(&body)?;
    loop {
        if length == Length::Indefinite && body.at_end_of_contents() {
            body.read_end_of_contents()?;
            break;
        }
        if body.is_empty() {
            if length == Length::Indefinite {
                return Err(Asn1Error::UnexpectedEof);
            }
            break;
        }
        let (tag, len) = body.read_header()?;
        // chunks carry the universal tag of the string type
        if !tag.same_number(&outer) {
            return Err(Asn1Error::malformed(format!(
                "unexpected {tag} inside constructed {outer}"
            )));
        }
        if tag.constructed {
            collect_chunks(codec, &mut body, tag, len, chunks)?;
        } else {
            chunks.push(primitive(&mut body, tag, len, "string chunk")?);
        }
    }
    if length == Length::Indefinite {
        src.advance(body.position());
    }
    Ok(())
}

/// Contents octets of a captured TLV.
fn any_contents(raw: &[u8]) -> Result<&[u8], Asn1Error> {
    let mut r = Reader::new(raw);
    let (_, length) = r.read_header()?;
    let contents = r.remaining();
    Ok(match length {
        Length::Definite(_) => contents,
        // drop the end-of-contents marker; the codec writes a definite length
        Length::Indefinite => &contents[..contents.len().saturating_sub(2)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid::OidRegistry;
    use std::sync::Arc;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn codec() -> Codec {
        Codec::new(Arc::new(OidRegistry::new()))
    }

    #[test]
    fn test_integer_encoding() {
        let c = codec();
        assert_eq!(c.to_der(&Value::from_integer(0)).unwrap(), hex("020100"));
        assert_eq!(c.to_der(&Value::from_integer(128)).unwrap(), hex("02020080"));
        assert_eq!(c.to_der(&Value::from_integer(-129)).unwrap(), hex("0202ff7f"));

        let mut v = Value::integer();
        c.decode_all(&mut v, &hex("0209008000000000000001")).unwrap();
        assert_eq!(
            v.as_integer().unwrap().to_string(),
            "9223372036854775809"
        );
    }

    #[test]
    fn test_primitive_roundtrip() {
        let c = codec();
        let values = [
            Value::from_bool(true),
            Value::null_value(),
            Value::from_oid("1.2.840.113549.1.1.11".parse().unwrap()),
            Value::from_bit_string(BitString::new(vec![0x86], 1)),
            Value::from_octets(vec![1, 2, 3]),
            Value::from_text(StringKind::Printable, "Example Org").unwrap(),
            Value::from_text(StringKind::Bmp, "mykey").unwrap(),
        ];
        for original in values {
            let der = c.to_der(&original).unwrap();
            let mut decoded = match &original {
                Value::String { kind, .. } => Value::string(*kind),
                Value::Boolean(_) => Value::boolean(),
                Value::Null(_) => Value::null(),
                Value::ObjectIdentifier(_) => Value::oid(),
                Value::BitString(_) => Value::bit_string(),
                _ => Value::octet_string(),
            };
            c.decode_all(&mut decoded, &der).unwrap();
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn test_boolean_ber_true() {
        let c = codec();
        let mut v = Value::boolean();
        c.decode_all(&mut v, &hex("010101")).unwrap();
        assert_eq!(v.as_bool(), Some(true));
        // DER re-encodes TRUE as 0xFF
        assert_eq!(c.to_der(&v).unwrap(), hex("0101ff"));
    }

    #[test]
    fn test_constructed_octet_string() {
        let c = codec();
        // BER: constructed, indefinite, two chunks
        let mut v = Value::octet_string();
        c.decode_all(&mut v, &hex("2480040201020401030000")).unwrap();
        assert_eq!(v.as_octets(), Some(&[1u8, 2, 3][..]));

        let mut v = Value::string(StringKind::Utf8);
        c.decode_all(&mut v, &hex("2c090c0268650c036c6c6f")).unwrap();
        assert_eq!(v.as_text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_constructed_bit_string() {
        let c = codec();
        let mut v = Value::bit_string();
        c.decode_all(&mut v, &hex("230903020055030301aa80")).unwrap();
        let bits = v.as_bit_string().unwrap();
        assert_eq!(bits.bytes, vec![0x55, 0xAA, 0x80]);
        assert_eq!(bits.unused_bits, 1);
    }

    #[test]
    fn test_indefinite_primitive_rejected() {
        let c = codec();
        let mut v = Value::integer();
        let err = c.decode_all(&mut v, &hex("0280010000")).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_any_capture() {
        let c = codec();
        let mut v = Value::any();
        c.decode_all(&mut v, &hex("3006020101020102")).unwrap();
        assert_eq!(v.as_any().unwrap(), &hex("3006020101020102")[..]);
        assert_eq!(c.to_der(&v).unwrap(), hex("3006020101020102"));
        assert_eq!(v.tag(), Tag::SEQUENCE);
    }

    #[test]
    fn test_string_text() {
        assert_eq!(
            StringKind::Bmp.decode_text(&hex("006d0079")).as_deref(),
            Some("my")
        );
        assert_eq!(
            StringKind::Teletex.decode_text(&[0x4D, 0xFC]).as_deref(),
            Some("M\u{fc}")
        );
        assert!(StringKind::Printable.encode_text("a@b").is_err());
        assert!(StringKind::Numeric.encode_text("12 34").is_ok());
    }

    #[test]
    fn test_unset_value_not_encoded() {
        let c = codec();
        assert!(matches!(
            c.to_der(&Value::integer()),
            Err(Asn1Error::ValueNotSet(_))
        ));
    }

    #[test]
    fn test_assign_keeps_tagging() {
        let mut v = Value::explicit(0, Value::integer());
        v.assign(Value::from_integer(2)).unwrap();
        assert_eq!(v.tag(), Tag::context(0, true));
        assert_eq!(v.as_u64(), Some(2));
        assert!(v.assign(Value::from_bool(true)).is_err());
    }

    #[test]
    fn test_bit_string_named_bits() {
        // keyUsage digitalSignature, keyCertSign, cRLSign
        let bits = BitString::new(vec![0x86], 1);
        assert!(bits.bit(0));
        assert!(!bits.bit(1));
        assert!(bits.bit(5));
        assert!(bits.bit(6));
        assert!(!bits.bit(7));
        assert_eq!(bits.bit_len(), 7);
    }
}
