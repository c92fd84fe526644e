//! Definite-length BER encoding into a growable buffer.

use super::Tag;

/// Builds an encoded value, nesting constructed elements through closures.
#[derive(Debug, Default)]
pub struct BerWriter {
    buf: Vec<u8>,
}

impl BerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Write a primitive element with pre-encoded contents.
    pub fn write_raw(&mut self, tag: Tag, value: &[u8]) {
        encode_tag(tag, &mut self.buf);
        encode_length(value.len(), &mut self.buf);
        self.buf.extend_from_slice(value);
    }

    pub fn write_integer(&mut self, value: i64) {
        self.write_tagged_integer(Tag::INTEGER, value);
    }

    pub fn write_enumerated(&mut self, value: i64) {
        self.write_tagged_integer(Tag::ENUMERATED, value);
    }

    pub fn write_tagged_integer(&mut self, tag: Tag, value: i64) {
        self.write_raw(tag, &integer_bytes(value));
    }

    pub fn write_boolean(&mut self, value: bool) {
        self.write_raw(Tag::BOOLEAN, &[if value { 0xff } else { 0x00 }]);
    }

    pub fn write_octet_string(&mut self, value: &[u8]) {
        self.write_raw(Tag::OCTET_STRING, value);
    }

    pub fn write_sequence(&mut self, body: impl FnOnce(&mut BerWriter)) {
        self.write_constructed(Tag::SEQUENCE, body);
    }

    pub fn write_set(&mut self, body: impl FnOnce(&mut BerWriter)) {
        self.write_constructed(Tag::SET, body);
    }

    /// Write a constructed element whose contents `body` produces.
    pub fn write_constructed(&mut self, tag: Tag, body: impl FnOnce(&mut BerWriter)) {
        let mut inner = BerWriter::new();
        body(&mut inner);
        let tag = Tag {
            constructed: true,
            ..tag
        };
        self.write_raw(tag, &inner.buf);
    }
}

fn encode_tag(tag: Tag, out: &mut Vec<u8>) {
    let mut first = tag.class.bits() << 6;
    if tag.constructed {
        first |= 0x20;
    }
    if tag.number < 0x1f {
        out.push(first | tag.number as u8);
        return;
    }

    out.push(first | 0x1f);
    let mut groups = Vec::new();
    let mut number = tag.number;
    loop {
        groups.push((number & 0x7f) as u8);
        number >>= 7;
        if number == 0 {
            break;
        }
    }
    for (i, group) in groups.iter().rev().enumerate() {
        let more = i + 1 < groups.len();
        out.push(if more { group | 0x80 } else { *group });
    }
}

fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = (len as u64).to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let significant = &bytes[skip..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}

/// Minimal two's complement encoding.
fn integer_bytes(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}
