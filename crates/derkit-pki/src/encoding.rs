//! Shared helpers for reading decoded trees in the PKI crate.
//!
//! The schema templates give the shape; these functions pull typed fields out
//! of a decoded [`Structure`] and report a missing or mistyped field as an
//! [`Asn1Error`]. They are used across x509, pkcs8, pkcs12, and cms modules.

use derkit_types::Asn1Error;
use derkit_utils::asn1::{BitString, Structure, Value};
use derkit_utils::oid::Oid;
use num_bigint::Sign;

/// View `value` as a structure.
pub(crate) fn structure<'a>(
    value: &'a Value,
    what: &'static str,
) -> Result<&'a Structure, Asn1Error> {
    value.as_structure().ok_or(Asn1Error::TypeMismatch(what))
}

/// A required structure component.
pub(crate) fn sub_structure<'a>(
    s: &'a Structure,
    name: &'static str,
) -> Result<&'a Structure, Asn1Error> {
    structure(s.require(name)?, name)
}

pub(crate) fn oid_field<'a>(s: &'a Structure, name: &'static str) -> Result<&'a Oid, Asn1Error> {
    s.require(name)?
        .as_oid()
        .ok_or(Asn1Error::TypeMismatch("OBJECT IDENTIFIER"))
}

pub(crate) fn octets_field<'a>(s: &'a Structure, name: &'static str) -> Result<&'a [u8], Asn1Error> {
    s.require(name)?
        .as_octets()
        .ok_or(Asn1Error::TypeMismatch("OCTET STRING"))
}

pub(crate) fn bits_field<'a>(
    s: &'a Structure,
    name: &'static str,
) -> Result<&'a BitString, Asn1Error> {
    s.require(name)?
        .as_bit_string()
        .ok_or(Asn1Error::TypeMismatch("BIT STRING"))
}

/// Magnitude of a non-negative INTEGER as minimal big-endian bytes.
pub(crate) fn unsigned_bytes(value: &Value) -> Result<Vec<u8>, Asn1Error> {
    let int = value
        .as_integer()
        .ok_or(Asn1Error::TypeMismatch("INTEGER"))?;
    match int.to_bytes_be() {
        (Sign::Minus, _) => Err(Asn1Error::malformed("negative integer where unsigned expected")),
        (_, bytes) => Ok(bytes),
    }
}

pub(crate) fn unsigned_field(s: &Structure, name: &'static str) -> Result<Vec<u8>, Asn1Error> {
    unsigned_bytes(s.require(name)?)
}

/// An INTEGER field that must fit in `u32`.
pub(crate) fn u32_field(s: &Structure, name: &'static str) -> Result<u32, Asn1Error> {
    s.require(name)?
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| Asn1Error::malformed(format!("{}.{name} out of range", s.name())))
}

/// An optional INTEGER field as `u64`; `None` when absent.
pub(crate) fn u64_field_opt(s: &Structure, name: &'static str) -> Result<Option<u64>, Asn1Error> {
    match s.get(name) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| Asn1Error::malformed(format!("{}.{name} out of range", s.name()))),
    }
}

/// Lower-case hex without separators.
pub(crate) fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

/// Upper-case, colon-separated hex as in `openssl x509 -text`.
pub(crate) fn hex_colon(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use derkit_utils::asn1::Component;

    fn sample() -> Structure {
        let mut s = Structure::sequence(
            "Sample",
            vec![
                Component::required("n", Value::integer()),
                Component::required("id", Value::oid()),
                Component::optional("neg", Value::integer()),
            ],
        );
        s.assign("n", Value::from_integer(0x1_0000_0001u64)).unwrap();
        s.assign("id", Value::from_oid("1.2.3".parse().unwrap()))
            .unwrap();
        s.assign("neg", Value::from_integer(-5)).unwrap();
        s
    }

    #[test]
    fn test_field_access() {
        let s = sample();
        assert_eq!(unsigned_field(&s, "n").unwrap(), vec![1, 0, 0, 0, 1]);
        assert_eq!(oid_field(&s, "id").unwrap(), "1.2.3");
        assert!(u32_field(&s, "n").unwrap_err().is_malformed());
        assert!(unsigned_field(&s, "neg").unwrap_err().is_malformed());
        assert_eq!(
            octets_field(&s, "id").unwrap_err(),
            Asn1Error::TypeMismatch("OCTET STRING")
        );
        assert!(matches!(
            oid_field(&s, "missing"),
            Err(Asn1Error::ValueNotSet(_))
        ));
    }

    #[test]
    fn test_hex_forms() {
        assert_eq!(hex(&[0xd3, 0x41, 0x0a]), "d3410a");
        assert_eq!(hex_colon(&[0xd3, 0x41, 0x0a]), "D3:41:0A");
        assert_eq!(hex_colon(&[]), "");
    }
}
