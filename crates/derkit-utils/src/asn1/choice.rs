//! CHOICE: exactly one of a fixed set of alternatives.

use super::{Asn1Node, Codec, Length, Reader, Tag, Value};
use derkit_types::Asn1Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    alternatives: Vec<(&'static str, Value)>,
    selected: Option<usize>,
}

impl Choice {
    pub fn new(alternatives: Vec<(&'static str, Value)>) -> Self {
        Self {
            alternatives,
            selected: None,
        }
    }

    /// Name and value of the active alternative.
    pub fn selection(&self) -> Option<(&'static str, &Value)> {
        let index = self.selected?;
        let (name, value) = &self.alternatives[index];
        Some((*name, value))
    }

    pub fn selected(&self) -> Option<&Value> {
        self.selection().map(|(_, value)| value)
    }

    pub fn selected_name(&self) -> Option<&'static str> {
        self.selection().map(|(name, _)| name)
    }

    /// Activate the named alternative. Fails if one is already active.
    pub fn select(&mut self, name: &str, value: Value) -> Result<(), Asn1Error> {
        if let Some(current) = self.selected_name() {
            return Err(Asn1Error::malformed(format!(
                "choice already holds {current}"
            )));
        }
        let index = self
            .alternatives
            .iter()
            .position(|(n, _)| *n == name)
            .ok_or_else(|| Asn1Error::ValueNotSet(format!("choice alternative {name}")))?;
        self.alternatives[index].1.assign(value)?;
        self.selected = Some(index);
        Ok(())
    }

    pub(crate) fn alternative_for(&self, tag: Tag) -> Option<usize> {
        self.alternatives.iter().position(|(_, v)| v.matches(tag))
    }
}

impl Asn1Node for Choice {
    fn tag(&self) -> Tag {
        match self.selected() {
            Some(value) => value.tag(),
            None => self
                .alternatives
                .first()
                .map_or(Tag::universal(0, false), |(_, v)| v.tag()),
        }
    }

    fn is_set(&self) -> bool {
        self.selected().is_some_and(Value::is_set)
    }

    fn encode_value(&self, codec: &Codec, out: &mut Vec<u8>) -> Result<usize, Asn1Error> {
        self.selected()
            .ok_or_else(|| Asn1Error::ValueNotSet("CHOICE".into()))?
            .encode_value(codec, out)
    }

    fn decode_value(
        &mut self,
        codec: &Codec,
        src: &mut Reader<'_>,
        tag: Tag,
        length: Length,
    ) -> Result<(), Asn1Error> {
        if let Some(current) = self.selected_name() {
            return Err(Asn1Error::malformed(format!(
                "choice already holds {current}"
            )));
        }
        let index = self
            .alternative_for(tag)
            .ok_or_else(|| Asn1Error::malformed(format!("no choice alternative for {tag}")))?;
        self.alternatives[index]
            .1
            .decode_value(codec, src, tag, length)?;
        self.selected = Some(index);
        Ok(())
    }
}
