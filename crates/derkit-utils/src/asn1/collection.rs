//! SEQUENCE OF / SET OF.

use super::{Asn1Node, Codec, Length, Reader, Tag, Template, Value};
use crate::oid::Oid;
use derkit_types::Asn1Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    SequenceOf,
    SetOf,
}

/// A homogeneous list whose element type is given by a [`Template`].
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    kind: CollectionKind,
    element: Template,
    elements: Vec<Value>,
    set: bool,
    governing: Option<Oid>,
}

impl Collection {
    pub fn sequence_of(element: Template) -> Self {
        Self::new(CollectionKind::SequenceOf, element)
    }

    pub fn set_of(element: Template) -> Self {
        Self::new(CollectionKind::SetOf, element)
    }

    fn new(kind: CollectionKind, element: Template) -> Self {
        Self {
            kind,
            element,
            elements: Vec::new(),
            set: false,
            governing: None,
        }
    }

    /// Replace the contents; an empty list still counts as set.
    pub fn with_elements(mut self, elements: Vec<Value>) -> Self {
        self.elements = elements;
        self.set = true;
        self
    }

    pub fn push(&mut self, value: Value) {
        self.elements.push(value);
        self.set = true;
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self.kind {
            CollectionKind::SequenceOf => "SEQUENCE OF",
            CollectionKind::SetOf => "SET OF",
        }
    }

    pub(crate) fn open_type_key(&self) -> Option<&'static str> {
        self.element.instantiate().open_type_key()
    }

    /// Governing OID handed to every open-type element on decode.
    pub(crate) fn bind(&mut self, oid: Oid) {
        self.governing = Some(oid);
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl Asn1Node for Collection {
    fn tag(&self) -> Tag {
        match self.kind {
            CollectionKind::SequenceOf => Tag::SEQUENCE,
            CollectionKind::SetOf => Tag::SET,
        }
    }

    fn is_set(&self) -> bool {
        self.set
    }

    fn encode_value(&self, codec: &Codec, out: &mut Vec<u8>) -> Result<usize, Asn1Error> {
        let mut encoded = self
            .elements
            .iter()
            .map(|e| codec.to_der(e))
            .collect::<Result<Vec<_>, _>>()?;
        // DER: SET OF elements in ascending order of their encodings
        if self.kind == CollectionKind::SetOf {
            encoded.sort();
        }
        let start = out.len();
        for tlv in encoded {
            out.extend_from_slice(&tlv);
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
        if !tag.constructed {
            return Err(Asn1Error::malformed(format!(
                "{} must be constructed",
                self.type_name()
            )));
        }
        let mut body = match length {
            Length::Definite(len) => src.sub(len)?,
            Length::Indefinite => src.rest(),
        };
        self.elements.clear();
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
            let mut element = self.element.instantiate();
            if let Some(oid) = &self.governing {
                element.bind_governing(oid);
            }
            codec.decode_from(&mut element, &mut body)?;
            self.elements.push(element);
        }
        if length == Length::Indefinite {
            src.advance(body.position());
        }
        self.set = true;
        Ok(())
    }
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
    fn test_sequence_of_integers() {
        let c = codec();
        let mut v = Value::Collection(Collection::sequence_of(Template(Value::integer)));
        let der = hex("3009020101020102020103");
        c.decode_all(&mut v, &der).unwrap();
        let list = v.as_collection().unwrap();
        let numbers: Vec<u64> = list.iter().filter_map(Value::as_u64).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(c.to_der(&v).unwrap(), der);
    }

    #[test]
    fn test_set_of_sorted_on_encode() {
        let c = codec();
        let set = Collection::set_of(Template(Value::integer)).with_elements(vec![
            Value::from_integer(3),
            Value::from_integer(1),
            Value::from_integer(2),
        ]);
        assert_eq!(
            c.to_der(&Value::Collection(set)).unwrap(),
            hex("3109020101020102020103")
        );
    }

    #[test]
    fn test_empty_collection() {
        let c = codec();
        let set = Collection::set_of(Template(Value::integer)).with_elements(vec![]);
        assert_eq!(c.to_der(&Value::Collection(set)).unwrap(), hex("3100"));
        assert!(c
            .to_der(&Value::Collection(Collection::set_of(Template(Value::integer))))
            .is_err());
    }

    #[test]
    fn test_indefinite_sequence_of() {
        let c = codec();
        let mut v = Value::Collection(Collection::sequence_of(Template(Value::integer)));
        c.decode_all(&mut v, &hex("30800201010201020000")).unwrap();
        assert_eq!(v.as_collection().unwrap().len(), 2);
    }

    #[test]
    fn test_element_overrun() {
        let c = codec();
        let mut v = Value::Collection(Collection::sequence_of(Template(Value::integer)));
        let err = c.decode_all(&mut v, &hex("3004020101020501")).unwrap_err();
        assert!(err.is_malformed());
    }
}
