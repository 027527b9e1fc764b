//! Positioned byte source for BER decoding.

use super::{Length, Tag};
use derkit_types::Asn1Error;

/// A cursor over BER-encoded input.
///
/// Readers nest: the contents of a definite-length constructed value are read
/// through a child reader bounded to exactly the declared length, so overruns
/// inside a container surface as [`Asn1Error::SizeMismatch`] rather than
/// reading into the parent's bytes.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
    bounded: bool,
    header_start: usize,
}

impl<'a> Reader<'a> {
    /// Create a top-level reader over the given data.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
            bounded: false,
            header_start: 0,
        }
    }

    /// Returns the remaining unread bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Constructed-value nesting depth of this reader.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Peek at the next tag without consuming it.
    pub fn peek_tag(&self) -> Result<Tag, Asn1Error> {
        Tag::from_bytes(self.remaining())
    }

    /// Read the identifier and length octets of the next TLV.
    pub fn read_header(&mut self) -> Result<(Tag, Length), Asn1Error> {
        self.header_start = self.pos;
        let tag = Tag::from_bytes(self.remaining())?;
        self.pos += 1;
        let length = self.read_length()?;
        Ok((tag, length))
    }

    /// Parse BER length octets.
    fn read_length(&mut self) -> Result<Length, Asn1Error> {
        let first = *self.data.get(self.pos).ok_or(Asn1Error::UnexpectedEof)?;
        self.pos += 1;

        if first < 0x80 {
            return Ok(Length::Definite(first as usize));
        }
        if first == 0x80 {
            return Ok(Length::Indefinite);
        }
        let num_bytes = (first & 0x7F) as usize;
        if num_bytes == 0x7F {
            return Err(Asn1Error::malformed("reserved length octet 0xFF"));
        }
        if num_bytes > std::mem::size_of::<usize>() {
            return Err(Asn1Error::malformed(format!(
                "length uses {num_bytes} octets"
            )));
        }
        if self.pos + num_bytes > self.data.len() {
            return Err(Asn1Error::UnexpectedEof);
        }
        let length = self.data[self.pos..self.pos + num_bytes]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        self.pos += num_bytes;
        Ok(Length::Definite(length))
    }

    /// The complete identifier + length + contents bytes from the most recently
    /// read header up to the current position.
    pub fn since_last_header(&self) -> &'a [u8] {
        &self.data[self.header_start..self.pos]
    }

    /// Consume exactly `len` content bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], Asn1Error> {
        let available = self.data.len() - self.pos;
        if len > available {
            return Err(if self.bounded {
                Asn1Error::SizeMismatch {
                    declared: len,
                    consumed: available,
                }
            } else {
                Asn1Error::UnexpectedEof
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Consume `len` bytes and return a child reader bounded to them.
    pub fn sub(&mut self, len: usize) -> Result<Reader<'a>, Asn1Error> {
        let depth = self.depth + 1;
        let data = self.take(len)?;
        Ok(Reader {
            data,
            pos: 0,
            depth,
            bounded: true,
            header_start: 0,
        })
    }

    /// A child reader over everything that remains, for indefinite-length
    /// contents. Call [`Reader::advance`] with the child's position afterwards.
    pub fn rest(&self) -> Reader<'a> {
        Reader {
            data: self.remaining(),
            pos: 0,
            depth: self.depth + 1,
            bounded: self.bounded,
            header_start: 0,
        }
    }

    /// Skip `n` bytes already consumed through a child reader.
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.data.len());
    }

    /// True if the next two bytes are the end-of-contents marker.
    pub fn at_end_of_contents(&self) -> bool {
        self.remaining().starts_with(&[0x00, 0x00])
    }

    /// Consume the end-of-contents marker.
    pub fn read_end_of_contents(&mut self) -> Result<(), Asn1Error> {
        if self.remaining().len() < 2 {
            return Err(Asn1Error::UnexpectedEof);
        }
        if !self.at_end_of_contents() {
            return Err(Asn1Error::malformed("expected end-of-contents marker"));
        }
        self.pos += 2;
        Ok(())
    }

    /// Skip the contents of a value whose header was just read.
    pub fn skip_contents(&mut self, length: Length) -> Result<(), Asn1Error> {
        match length {
            Length::Definite(len) => self.take(len).map(|_| ()),
            Length::Indefinite => {
                // Iterative so hostile nesting cannot exhaust the stack.
                let header_start = self.header_start;
                let mut open = 1usize;
                while open > 0 {
                    if self.at_end_of_contents() {
                        self.read_end_of_contents()?;
                        open -= 1;
                        continue;
                    }
                    if self.is_empty() {
                        return Err(Asn1Error::UnexpectedEof);
                    }
                    match self.read_header()?.1 {
                        Length::Definite(len) => {
                            self.take(len)?;
                        }
                        Length::Indefinite => open += 1,
                    }
                }
                self.header_start = header_start;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_lengths() {
        let mut r = Reader::new(&[0x04, 0x7F]);
        assert_eq!(
            r.read_header().unwrap().1,
            Length::Definite(127)
        );

        let mut r = Reader::new(&[0x04, 0x81, 0x80]);
        assert_eq!(r.read_header().unwrap().1, Length::Definite(128));

        let mut r = Reader::new(&[0x04, 0x82, 0x01, 0x00]);
        assert_eq!(r.read_header().unwrap().1, Length::Definite(256));
    }

    #[test]
    fn test_indefinite_marker() {
        let mut r = Reader::new(&[0x30, 0x80, 0x00, 0x00]);
        let (tag, len) = r.read_header().unwrap();
        assert_eq!(tag, Tag::SEQUENCE);
        assert_eq!(len, Length::Indefinite);
        assert!(r.at_end_of_contents());
        r.read_end_of_contents().unwrap();
        assert!(r.is_empty());
    }

    #[test]
    fn test_truncated_length() {
        let mut r = Reader::new(&[0x04, 0x82, 0x01]);
        assert_eq!(r.read_header().unwrap_err(), Asn1Error::UnexpectedEof);
    }

    #[test]
    fn test_bounded_overrun_is_size_mismatch() {
        let data = [0x30, 0x03, 0x02, 0x05, 0x01];
        let mut r = Reader::new(&data);
        let (_, len) = r.read_header().unwrap();
        let Length::Definite(len) = len else {
            panic!("definite length expected")
        };
        let mut body = r.sub(len).unwrap();
        let (_, inner) = body.read_header().unwrap();
        let Length::Definite(inner) = inner else {
            panic!("definite length expected")
        };
        assert!(matches!(
            body.take(inner),
            Err(Asn1Error::SizeMismatch { declared: 5, consumed: 1 })
        ));
    }

    #[test]
    fn test_skip_nested_indefinite() {
        // SEQUENCE (indef) { SEQUENCE (indef) { NULL } } INTEGER 1
        let data = [
            0x30, 0x80, 0x30, 0x80, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x01, 0x01,
        ];
        let mut r = Reader::new(&data);
        let (_, len) = r.read_header().unwrap();
        r.skip_contents(len).unwrap();
        assert_eq!(r.since_last_header().len(), 10);
        assert_eq!(r.remaining(), &[0x02, 0x01, 0x01]);
    }
}
