//! Zero-copy TLV decoding over a borrowed buffer.

use super::{BerError, Class, Tag};

/// A single tag-length-value element borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub tag: Tag,
    pub value: &'a [u8],
}

/// Sequential reader over the contents of a constructed value.
#[derive(Debug, Clone)]
pub struct BerReader<'a> {
    data: &'a [u8],
}

impl<'a> BerReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// No elements remain.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Tag of the next element without consuming it.
    pub fn peek_tag(&self) -> Result<Option<Tag>, BerError> {
        if self.data.is_empty() {
            return Ok(None);
        }
        parse_tag(self.data).map(|(tag, _)| Some(tag))
    }

    /// Consume the next element, whatever its tag.
    pub fn read_tlv(&mut self) -> Result<Tlv<'a>, BerError> {
        let (tag, header_len, value_len) = parse_header(self.data)?;
        let end = header_len
            .checked_add(value_len)
            .ok_or(BerError::Invalid("length"))?;
        if self.data.len() < end {
            return Err(BerError::Truncated);
        }
        let value = &self.data[header_len..end];
        self.data = &self.data[end..];
        Ok(Tlv { tag, value })
    }

    /// Consume the next element and check its tag.
    pub fn read_expected(&mut self, expected: Tag) -> Result<&'a [u8], BerError> {
        let tlv = self.read_tlv()?;
        if tlv.tag != expected {
            return Err(BerError::UnexpectedTag {
                expected,
                found: tlv.tag,
            });
        }
        Ok(tlv.value)
    }

    pub fn read_integer(&mut self) -> Result<i64, BerError> {
        decode_integer(self.read_expected(Tag::INTEGER)?)
    }

    pub fn read_enumerated(&mut self) -> Result<i64, BerError> {
        decode_integer(self.read_expected(Tag::ENUMERATED)?)
    }

    pub fn read_boolean(&mut self) -> Result<bool, BerError> {
        match self.read_expected(Tag::BOOLEAN)? {
            [byte] => Ok(*byte != 0),
            _ => Err(BerError::Invalid("boolean")),
        }
    }

    pub fn read_octet_string(&mut self) -> Result<&'a [u8], BerError> {
        self.read_expected(Tag::OCTET_STRING)
    }

    /// An OCTET STRING carrying an LDAPString, which must be UTF-8.
    pub fn read_string(&mut self) -> Result<String, BerError> {
        let bytes = self.read_octet_string()?;
        decode_utf8(bytes)
    }

    pub fn read_sequence(&mut self) -> Result<BerReader<'a>, BerError> {
        self.read_constructed(Tag::SEQUENCE)
    }

    /// Consume a constructed element with the given tag and return a reader
    /// over its contents.
    pub fn read_constructed(&mut self, tag: Tag) -> Result<BerReader<'a>, BerError> {
        self.read_expected(tag).map(BerReader::new)
    }
}

/// Decode UTF-8 text from an OCTET STRING value.
pub fn decode_utf8(bytes: &[u8]) -> Result<String, BerError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| BerError::Invalid("utf-8 string"))
}

/// Decode a two's complement big-endian INTEGER value.
pub fn decode_integer(bytes: &[u8]) -> Result<i64, BerError> {
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(BerError::Invalid("integer"));
    }
    let mut value: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    for byte in bytes {
        value = (value << 8) | i64::from(*byte);
    }
    Ok(value)
}

/// Total encoded size of the element at the start of `data`.
///
/// Returns `Ok(None)` while the header itself is still incomplete, which
/// lets a stream decoder wait for more input.
pub fn frame_length(data: &[u8]) -> Result<Option<usize>, BerError> {
    match parse_header(data) {
        Ok((_, header_len, value_len)) => header_len
            .checked_add(value_len)
            .map(Some)
            .ok_or(BerError::Invalid("length")),
        Err(BerError::Truncated) => Ok(None),
        Err(e) => Err(e),
    }
}

fn parse_tag(data: &[u8]) -> Result<(Tag, usize), BerError> {
    let first = *data.first().ok_or(BerError::Truncated)?;
    let class = Class::from_bits(first >> 6);
    let constructed = first & 0x20 != 0;
    let low = u32::from(first & 0x1f);
    if low != 0x1f {
        return Ok((
            Tag {
                class,
                constructed,
                number: low,
            },
            1,
        ));
    }

    let mut number: u32 = 0;
    for (i, byte) in data[1..].iter().enumerate() {
        if i == 4 {
            return Err(BerError::Invalid("tag number"));
        }
        number = (number << 7) | u32::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok((
                Tag {
                    class,
                    constructed,
                    number,
                },
                i + 2,
            ));
        }
    }
    Err(BerError::Truncated)
}

fn parse_header(data: &[u8]) -> Result<(Tag, usize, usize), BerError> {
    let (tag, tag_len) = parse_tag(data)?;
    let first = *data.get(tag_len).ok_or(BerError::Truncated)?;
    if first < 0x80 {
        return Ok((tag, tag_len + 1, usize::from(first)));
    }
    if first == 0x80 {
        return Err(BerError::IndefiniteLength);
    }

    let octets = usize::from(first & 0x7f);
    if octets > 4 {
        return Err(BerError::LengthTooLong(octets));
    }
    let start = tag_len + 1;
    let bytes = data
        .get(start..start + octets)
        .ok_or(BerError::Truncated)?;
    let len = bytes
        .iter()
        .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte));
    Ok((tag, start + octets, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_short_and_long_lengths() {
        let mut long = vec![0x04, 0x81, 0x80];
        long.extend(std::iter::repeat_n(b'a', 128));
        let mut reader = BerReader::new(&long);
        assert_eq!(reader.read_octet_string().unwrap().len(), 128);
        assert!(reader.is_empty());

        let mut reader = BerReader::new(&[0x02, 0x01, 0x05]);
        assert_eq!(reader.read_integer().unwrap(), 5);
    }

    #[test]
    fn test_decode_negative_integers() {
        assert_eq!(decode_integer(&[0xff]).unwrap(), -1);
        assert_eq!(decode_integer(&[0xff, 0x7f]).unwrap(), -129);
        assert_eq!(decode_integer(&[0x00, 0x80]).unwrap(), 128);
        assert!(decode_integer(&[]).is_err());
    }

    #[test]
    fn test_frame_length_waits_for_header() {
        assert_eq!(frame_length(&[]).unwrap(), None);
        assert_eq!(frame_length(&[0x30]).unwrap(), None);
        assert_eq!(frame_length(&[0x30, 0x82, 0x01]).unwrap(), None);
        assert_eq!(frame_length(&[0x30, 0x82, 0x01, 0x00]).unwrap(), Some(260));
        assert_eq!(frame_length(&[0x30, 0x03, 0x02]).unwrap(), Some(5));
    }

    #[test]
    fn test_reject_indefinite_length() {
        assert_eq!(frame_length(&[0x30, 0x80]), Err(BerError::IndefiniteLength));
        assert_eq!(
            frame_length(&[0x30, 0x85, 1, 2, 3, 4, 5]),
            Err(BerError::LengthTooLong(5))
        );
    }

    #[test]
    fn test_truncated_value() {
        let mut reader = BerReader::new(&[0x04, 0x05, b'a', b'b']);
        assert_eq!(reader.read_octet_string(), Err(BerError::Truncated));
    }

    #[test]
    fn test_unexpected_tag() {
        let mut reader = BerReader::new(&[0x01, 0x01, 0xff]);
        assert!(matches!(
            reader.read_integer(),
            Err(BerError::UnexpectedTag { .. })
        ));
    }

    #[test]
    fn test_application_and_context_tags() {
        let mut reader = BerReader::new(&[0x63, 0x00, 0x87, 0x02, b'c', b'n']);
        assert_eq!(reader.peek_tag().unwrap(), Some(Tag::application(3, true)));
        reader.read_constructed(Tag::application(3, true)).unwrap();
        let tlv = reader.read_tlv().unwrap();
        assert_eq!(tlv.tag, Tag::context(7, false));
        assert_eq!(tlv.value, b"cn");
    }

    #[test]
    fn test_high_tag_number() {
        let mut reader = BerReader::new(&[0x5f, 0x81, 0x00, 0x00]);
        let tlv = reader.read_tlv().unwrap();
        assert_eq!(tlv.tag, Tag::application(128, false));
    }
}
