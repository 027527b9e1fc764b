//! Distinguished names and their RFC 2253 string form.

use crate::context::PkiContext;
use crate::encoding::{hex, oid_field, structure};
use crate::schema;
use derkit_types::Asn1Error;
use derkit_utils::asn1::Value;
use derkit_utils::oid::Oid;
use std::fmt;

/// One `type=value` pair of a relative distinguished name.
#[derive(Debug, Clone)]
pub struct AttributeTypeAndValue {
    oid: Oid,
    short_name: Option<&'static str>,
    text: Option<String>,
    der: Vec<u8>,
}

impl AttributeTypeAndValue {
    fn from_value(ctx: &PkiContext, value: &Value) -> Result<Self, Asn1Error> {
        let s = structure(value, "AttributeTypeAndValue")?;
        let oid = oid_field(s, "type")?.clone();
        let attr = s.require("value")?;
        Ok(Self {
            short_name: ctx.registry().lookup_short_name(&oid),
            text: attr.as_text(),
            der: ctx.codec().to_der(attr)?,
            oid,
        })
    }

    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Registered short name such as `CN`, if any.
    pub fn short_name(&self) -> Option<&'static str> {
        self.short_name
    }

    /// The value as text when it is a character string.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The value's complete DER encoding.
    pub fn value_der(&self) -> &[u8] {
        &self.der
    }
}

impl PartialEq for AttributeTypeAndValue {
    fn eq(&self, other: &Self) -> bool {
        if self.oid != other.oid {
            return false;
        }
        match (&self.text, &other.text) {
            // PrintableString and UTF8String spellings of one value compare equal
            (Some(a), Some(b)) => a == b,
            _ => self.der == other.der,
        }
    }
}

impl fmt::Display for AttributeTypeAndValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.short_name, &self.text) {
            (Some(short), Some(text)) => write!(f, "{short}={}", escape_value(text)),
            (Some(short), None) => write!(f, "{short}=#{}", hex(&self.der)),
            (None, _) => write!(f, "{}=#{}", self.oid, hex(&self.der)),
        }
    }
}

/// An X.500 name as an ordered list of RDNs, in encoding order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DistinguishedName {
    rdns: Vec<Vec<AttributeTypeAndValue>>,
}

impl DistinguishedName {
    /// Build from a decoded `Name` tree.
    pub(crate) fn from_value(ctx: &PkiContext, value: &Value) -> Result<Self, Asn1Error> {
        let rdn_seq = value
            .as_collection()
            .ok_or(Asn1Error::TypeMismatch("RDNSequence"))?;
        let mut rdns = Vec::with_capacity(rdn_seq.len());
        for rdn in rdn_seq {
            let set = rdn
                .as_collection()
                .ok_or(Asn1Error::TypeMismatch("RelativeDistinguishedName"))?;
            if set.is_empty() {
                return Err(Asn1Error::malformed("empty relative distinguished name"));
            }
            let atvs = set
                .iter()
                .map(|atv| AttributeTypeAndValue::from_value(ctx, atv))
                .collect::<Result<Vec<_>, _>>()?;
            rdns.push(atvs);
        }
        Ok(Self { rdns })
    }

    /// Parse a DER-encoded `Name`.
    pub fn from_der(ctx: &PkiContext, der: &[u8]) -> Result<Self, Asn1Error> {
        let value = ctx.decode(schema::name, der)?;
        Self::from_value(ctx, &value)
    }

    pub fn rdns(&self) -> &[Vec<AttributeTypeAndValue>] {
        &self.rdns
    }

    /// All attributes, in encoding order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeTypeAndValue> {
        self.rdns.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Text of the first attribute with the given short name (e.g. `"CN"`).
    pub fn get(&self, short_name: &str) -> Option<&str> {
        self.iter()
            .find(|atv| atv.short_name == Some(short_name))
            .and_then(AttributeTypeAndValue::text)
    }
}

/// RFC 2253: most specific RDN first, `+` inside multi-valued RDNs.
impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            for (j, atv) in rdn.iter().enumerate() {
                if j > 0 {
                    f.write_str("+")?;
                }
                write!(f, "{atv}")?;
            }
        }
        Ok(())
    }
}

fn escape_value(text: &str) -> String {
    let last = text.chars().count().saturating_sub(1);
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        let escape = match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' => true,
            '#' => i == 0,
            ' ' => i == 0 || i == last,
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    // C=US, O=Example Org, CN=Example, Inc. in encoding order
    const EXAMPLE_NAME: &str = "303b310b300906035504061302555331143012060355040a0c0b4578616d706c65\
        204f7267311630140603550403130d4578616d706c652c20496e632e";

    #[test]
    fn test_rfc2253_order_and_escaping() {
        let ctx = PkiContext::shared().unwrap();
        let dn = DistinguishedName::from_der(ctx, &hex(EXAMPLE_NAME)).unwrap();
        assert_eq!(dn.rdns().len(), 3);
        assert_eq!(dn.to_string(), "CN=Example\\, Inc.,O=Example Org,C=US");
        assert_eq!(dn.get("CN"), Some("Example, Inc."));
        assert_eq!(dn.get("C"), Some("US"));
        assert_eq!(dn.get("OU"), None);
    }

    #[test]
    fn test_multi_valued_rdn_and_unknown_attribute() {
        let ctx = PkiContext::shared().unwrap();
        // SET { CN=a, 1.2.3.4=UTF8String "x" }
        let der = hex("3016311430080603550403130161300806032a03040c0178");
        let dn = DistinguishedName::from_der(ctx, &der).unwrap();
        assert_eq!(dn.rdns()[0].len(), 2);
        assert_eq!(dn.to_string(), "CN=a+1.2.3.4=#0c0178");
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("#lead"), "\\#lead");
        assert_eq!(escape_value(" pad "), "\\ pad\\ ");
        assert_eq!(escape_value("a#b"), "a#b");
        assert_eq!(escape_value("x<y>;"), "x\\<y\\>\\;");
        assert_eq!(escape_value(""), "");
    }

    #[test]
    fn test_equality_ignores_string_type() {
        let ctx = PkiContext::shared().unwrap();
        let printable = DistinguishedName::from_der(ctx, &hex("300e310c300a06035504031303616263")).unwrap();
        let utf8 = DistinguishedName::from_der(ctx, &hex("300e310c300a06035504030c03616263")).unwrap();
        assert_eq!(printable, utf8);
        assert_ne!(
            printable.rdns()[0][0].value_der(),
            utf8.rdns()[0][0].value_der()
        );
    }

    #[test]
    fn test_truncated_name_rejected() {
        let ctx = PkiContext::shared().unwrap();
        assert!(DistinguishedName::from_der(ctx, &hex("300c310a300806035504031301")).is_err());
    }
}
