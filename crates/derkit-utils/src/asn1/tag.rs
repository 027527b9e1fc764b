//! ASN.1 tag parsing and encoding.

use super::{tags, Tag, TagClass};
use derkit_types::Asn1Error;

impl Tag {
    /// A universal-class tag.
    pub const fn universal(number: u8, constructed: bool) -> Self {
        Tag {
            class: TagClass::Universal,
            constructed,
            number: number as u32,
        }
    }

    /// A context-specific tag (`[n]`).
    pub const fn context(number: u8, constructed: bool) -> Self {
        Tag {
            class: TagClass::ContextSpecific,
            constructed,
            number: number as u32,
        }
    }

    pub const SEQUENCE: Tag = Tag::universal(tags::SEQUENCE, true);
    pub const SET: Tag = Tag::universal(tags::SET, true);

    /// Parse a tag from the first byte of `input`.
    pub fn from_bytes(input: &[u8]) -> Result<Self, Asn1Error> {
        let first = *input.first().ok_or(Asn1Error::UnexpectedEof)?;
        let class = match first >> 6 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        };
        let constructed = (first & tags::CONSTRUCTED) != 0;

        let low_bits = first & 0x1F;
        if low_bits == 0x1F {
            return Err(Asn1Error::UnsupportedFeature(
                "multi-byte (long form) tag".into(),
            ));
        }
        Ok(Tag {
            class,
            constructed,
            number: low_bits as u32,
        })
    }

    /// Encode this tag to its single identifier octet.
    pub fn to_byte(&self) -> Result<u8, Asn1Error> {
        if self.number >= 0x1F {
            return Err(Asn1Error::UnsupportedFeature(format!(
                "tag number {} needs the long form",
                self.number
            )));
        }
        let class_bits = match self.class {
            TagClass::Universal => 0x00,
            TagClass::Application => 0x40,
            TagClass::ContextSpecific => 0x80,
            TagClass::Private => 0xC0,
        };
        let constructed_bit = if self.constructed {
            tags::CONSTRUCTED
        } else {
            0x00
        };
        Ok(class_bits | constructed_bit | self.number as u8)
    }

    /// Same class and number, ignoring the primitive/constructed bit.
    pub fn same_number(&self, other: &Tag) -> bool {
        self.class == other.class && self.number == other.number
    }

    /// This tag with its constructed bit replaced.
    pub fn with_constructed(self, constructed: bool) -> Tag {
        Tag {
            constructed,
            ..self
        }
    }

    /// True for the end-of-contents marker's identifier (`0x00`).
    pub fn is_end_of_contents(&self) -> bool {
        self.class == TagClass::Universal && !self.constructed && self.number == 0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.class {
            TagClass::Universal => write!(f, "UNIVERSAL {}", self.number),
            TagClass::Application => write!(f, "[APPLICATION {}]", self.number),
            TagClass::ContextSpecific => write!(f, "[{}]", self.number),
            TagClass::Private => write!(f, "[PRIVATE {}]", self.number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tag() {
        let tag = Tag::from_bytes(&[0x30]).unwrap();
        assert_eq!(tag.class, TagClass::Universal);
        assert!(tag.constructed);
        assert_eq!(tag.number, 0x10);
    }

    #[test]
    fn test_parse_context_tag() {
        let tag = Tag::from_bytes(&[0xA3]).unwrap();
        assert_eq!(tag, Tag::context(3, true));
        let tag = Tag::from_bytes(&[0x81]).unwrap();
        assert_eq!(tag, Tag::context(1, false));
    }

    #[test]
    fn test_long_form_rejected() {
        let err = Tag::from_bytes(&[0x1F, 0x81, 0x00]).unwrap_err();
        assert!(matches!(err, Asn1Error::UnsupportedFeature(_)));

        let tag = Tag {
            class: TagClass::ContextSpecific,
            constructed: false,
            number: 31,
        };
        assert!(matches!(
            tag.to_byte(),
            Err(Asn1Error::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_roundtrip() {
        let tag = Tag {
            class: TagClass::Private,
            constructed: true,
            number: 30,
        };
        let byte = tag.to_byte().unwrap();
        assert_eq!(byte, 0xFE);
        assert_eq!(Tag::from_bytes(&[byte]).unwrap(), tag);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Tag::from_bytes(&[]).unwrap_err(), Asn1Error::UnexpectedEof);
    }
}
