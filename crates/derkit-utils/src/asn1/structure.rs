//! The Structure Engine: SEQUENCE and SET with OPTIONAL / DEFAULT components.

use super::{Asn1Node, Codec, Length, Reader, Tag, Value};
use derkit_types::Asn1Error;

/// SEQUENCE (ordered) or SET (unordered) assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructKind {
    Sequence,
    Set,
}

/// Whether a component must be present on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    Optional,
    /// OPTIONAL with a DEFAULT; DER omits the component when it equals the default.
    Default(Box<Value>),
}

/// A named component of a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: &'static str,
    pub value: Value,
    pub presence: Presence,
}

impl Component {
    pub fn required(name: &'static str, value: Value) -> Self {
        Self {
            name,
            value,
            presence: Presence::Required,
        }
    }

    pub fn optional(name: &'static str, value: Value) -> Self {
        Self {
            name,
            value,
            presence: Presence::Optional,
        }
    }

    /// `value` is the unset template; `default` the same shape, set.
    pub fn with_default(name: &'static str, value: Value, default: Value) -> Self {
        Self {
            name,
            value,
            presence: Presence::Default(Box::new(default)),
        }
    }

    pub fn is_optional(&self) -> bool {
        !matches!(self.presence, Presence::Required)
    }

    /// Whether DER encoding leaves this component out.
    fn omitted(&self) -> bool {
        match &self.presence {
            _ if !self.value.is_set() => true,
            Presence::Default(default) => self.value == **default,
            _ => false,
        }
    }
}

/// A named, heterogeneous list of components decoded in place.
///
/// Built as an unset template, populated by exactly one decode pass (or by
/// [`Structure::assign`]), then read through [`Structure::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    name: &'static str,
    kind: StructKind,
    components: Vec<Component>,
    set: bool,
}

impl Structure {
    pub fn sequence(name: &'static str, components: Vec<Component>) -> Self {
        Self {
            name,
            kind: StructKind::Sequence,
            components,
            set: false,
        }
    }

    pub fn set(name: &'static str, components: Vec<Component>) -> Self {
        Self {
            name,
            kind: StructKind::Set,
            components,
            set: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> StructKind {
        self.kind
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// The named component's value, or its declared default when it was not
    /// present. `None` for an absent component without a default.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let component = self.components.iter().find(|c| c.name == name)?;
        if component.value.is_set() {
            return Some(&component.value);
        }
        match &component.presence {
            Presence::Default(default) => Some(default),
            _ => None,
        }
    }

    /// Like [`Structure::get`] but fails for a missing component.
    pub fn require(&self, name: &str) -> Result<&Value, Asn1Error> {
        self.get(name)
            .ok_or_else(|| Asn1Error::ValueNotSet(format!("{}.{name}", self.name)))
    }

    /// True only when the named component was decoded or assigned.
    pub fn is_component_set(&self, name: &str) -> bool {
        self.components
            .iter()
            .any(|c| c.name == name && c.value.is_set())
    }

    /// Set the named component's value, keeping its tagging.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), Asn1Error> {
        let component = self
            .components
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| Asn1Error::ValueNotSet(format!("{}.{name}", self.name)))?;
        component.value.assign(value)?;
        self.set = true;
        Ok(())
    }

    /// Mark an all-optional structure as present even with no components set.
    pub fn mark_set(&mut self) {
        self.set = true;
    }

    fn decode_components(
        &mut self,
        codec: &Codec,
        body: &mut Reader<'_>,
        length: Length,
    ) -> Result<(), Asn1Error> {
        let mut position = 0;
        loop {
            if length == Length::Indefinite && body.at_end_of_contents() {
                break;
            }
            if body.is_empty() {
                if length == Length::Indefinite {
                    return Err(Asn1Error::UnexpectedEof);
                }
                break;
            }
            let tag = body.peek_tag()?;
            let Some(index) = self.component_for(tag, &mut position) else {
                if length == Length::Indefinite {
                    return Err(Asn1Error::malformed(format!(
                        "unexpected {tag} in {}",
                        self.name
                    )));
                }
                // leftover bytes are reported by the caller as a size mismatch
                break;
            };
            self.bind_open_type(index);
            codec.decode_from(&mut self.components[index].value, body)?;
        }

        if let Some(missing) = self
            .components
            .iter()
            .find(|c| !c.is_optional() && !c.value.is_set())
        {
            return Err(Asn1Error::malformed(format!(
                "{} is missing required component {}",
                self.name, missing.name
            )));
        }
        Ok(())
    }

    /// Dispatch an incoming tag to a component.
    ///
    /// SEQUENCE: match the component at `position`, skipping unmatched
    /// optional ones; the position only moves past consumed components.
    /// SET: any component not yet set whose type matches.
    fn component_for(&self, tag: Tag, position: &mut usize) -> Option<usize> {
        match self.kind {
            StructKind::Sequence => {
                let mut i = *position;
                while i < self.components.len() {
                    let component = &self.components[i];
                    if component.value.matches(tag) {
                        *position = i + 1;
                        return Some(i);
                    }
                    if !component.is_optional() {
                        return None;
                    }
                    i += 1;
                }
                None
            }
            StructKind::Set => self
                .components
                .iter()
                .position(|c| !c.value.is_set() && c.value.matches(tag)),
        }
    }

    fn bind_open_type(&mut self, index: usize) {
        let Some(key) = self.components[index].value.open_type_key() else {
            return;
        };
        let governing = self
            .components
            .iter()
            .find(|c| c.name == key)
            .and_then(|c| c.value.as_oid())
            .cloned();
        if let Some(oid) = governing {
            self.components[index].value.bind_governing(&oid);
        }
    }
}

impl Asn1Node for Structure {
    fn tag(&self) -> Tag {
        match self.kind {
            StructKind::Sequence => Tag::SEQUENCE,
            StructKind::Set => Tag::SET,
        }
    }

    fn is_set(&self) -> bool {
        self.set
    }

    fn encode_value(&self, codec: &Codec, out: &mut Vec<u8>) -> Result<usize, Asn1Error> {
        let mut encoded = Vec::with_capacity(self.components.len());
        for component in &self.components {
            if component.omitted() {
                if !component.is_optional() {
                    return Err(Asn1Error::ValueNotSet(format!(
                        "{}.{}",
                        self.name, component.name
                    )));
                }
                continue;
            }
            encoded.push(codec.to_der(&component.value)?);
        }
        // DER: SET components in ascending tag order
        if self.kind == StructKind::Set {
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
                self.name
            )));
        }
        match length {
            Length::Definite(len) => {
                let mut body = src.sub(len)?;
                self.decode_components(codec, &mut body, length)?;
                if !body.is_empty() {
                    return Err(Asn1Error::SizeMismatch {
                        declared: len,
                        consumed: body.position(),
                    });
                }
            }
            Length::Indefinite => {
                let mut body = src.rest();
                self.decode_components(codec, &mut body, length)?;
                body.read_end_of_contents()?;
                src.advance(body.position());
            }
        }
        self.set = true;
        Ok(())
    }
}
