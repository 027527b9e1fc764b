//! DER header emission.

use super::Tag;
use derkit_types::Asn1Error;

/// Append a DER length: short form below 128, otherwise the minimal
/// big-endian long form.
pub fn write_length(out: &mut Vec<u8>, length: usize) -> usize {
    if length < 0x80 {
        out.push(length as u8);
        return 1;
    }
    let bytes = length.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    let significant = &bytes[skip..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
    1 + significant.len()
}

/// Append identifier and length octets; returns the number of bytes written.
pub fn write_header(out: &mut Vec<u8>, tag: Tag, length: usize) -> Result<usize, Asn1Error> {
    out.push(tag.to_byte()?);
    Ok(1 + write_length(out, length))
}

/// Append a complete TLV with already-encoded contents.
pub(crate) fn write_tlv(out: &mut Vec<u8>, tag: Tag, contents: &[u8]) -> Result<usize, Asn1Error> {
    let header = write_header(out, tag, contents.len())?;
    out.extend_from_slice(contents);
    Ok(header + contents.len())
}
