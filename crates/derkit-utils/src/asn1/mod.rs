//! ASN.1 BER/DER value model and codec.
//!
//! Values are schema-carrying nodes: a template is built unset, the codec decodes
//! into it, and accessors read the result. Encoding always produces DER; decoding
//! accepts BER, including indefinite lengths and constructed strings.

mod choice;
mod codec;
mod collection;
mod open_type;
mod reader;
mod structure;
mod tag;
mod tagged;
mod time;
mod value;
mod writer;

pub use choice::Choice;
pub use codec::{Codec, DecoderConfig, DecoderConfigBuilder};
pub use collection::{Collection, CollectionKind};
pub use open_type::AnyDefinedBy;
pub use reader::Reader;
pub use structure::{Component, Presence, StructKind, Structure};
pub use tagged::{TagMode, Tagged};
pub use time::{datetime_to_unix, format_generalized_time, format_utc_time, parse_time};
pub use value::{Asn1Node, BitString, StringKind, Template, Value};
pub use writer::{write_header, write_length};

/// ASN.1 universal tag numbers and identifier-octet bits.
pub mod tags {
    pub const END_OF_CONTENTS: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const INTEGER: u8 = 0x02;
    pub const BIT_STRING: u8 = 0x03;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OID: u8 = 0x06;
    pub const ENUMERATED: u8 = 0x0A;
    pub const UTF8_STRING: u8 = 0x0C;
    pub const SEQUENCE: u8 = 0x10;
    pub const SET: u8 = 0x11;
    pub const NUMERIC_STRING: u8 = 0x12;
    pub const PRINTABLE_STRING: u8 = 0x13;
    pub const TELETEX_STRING: u8 = 0x14;
    pub const IA5_STRING: u8 = 0x16;
    pub const UTC_TIME: u8 = 0x17;
    pub const GENERALIZED_TIME: u8 = 0x18;
    pub const VISIBLE_STRING: u8 = 0x1A;
    pub const UNIVERSAL_STRING: u8 = 0x1C;
    pub const BMP_STRING: u8 = 0x1E;
    pub const CONTEXT_SPECIFIC: u8 = 0x80;
    pub const CONSTRUCTED: u8 = 0x20;
}

/// Represents an ASN.1 tag.
///
/// Only the short (single-octet) form is supported; tag numbers of 31 and above
/// are rejected in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub class: TagClass,
    pub constructed: bool,
    pub number: u32,
}

/// ASN.1 tag class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

/// The length octets of a TLV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Definite(usize),
    /// BER indefinite form (`0x80`), terminated by an end-of-contents marker.
    Indefinite,
}
