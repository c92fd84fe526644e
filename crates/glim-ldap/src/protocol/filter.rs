//! Search filters: decoding and evaluation against projected entries.

use std::fmt;

use crate::ber::reader::decode_utf8;
use crate::ber::{BerError, BerReader, Class, Tag, Tlv};
use crate::entry::Entry;

/// Nesting deeper than this is rejected as a protocol error.
const MAX_DEPTH: usize = 32;

/// A decoded RFC 4511 `Filter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equality {
        attr: String,
        value: String,
    },
    Substrings {
        attr: String,
        initial: Option<String>,
        any: Vec<String>,
        last: Option<String>,
    },
    GreaterOrEqual {
        attr: String,
        value: String,
    },
    LessOrEqual {
        attr: String,
        value: String,
    },
    Present(String),
    Approx {
        attr: String,
        value: String,
    },
    Extensible,
}

impl Filter {
    /// `(objectClass=*)`.
    pub fn any_object() -> Self {
        Self::Present("objectClass".to_string())
    }

    /// Decode a filter from its TLV.
    pub fn decode(tlv: Tlv<'_>) -> Result<Self, BerError> {
        decode_at(tlv, 0)
    }

    /// Evaluate the filter against an entry.
    ///
    /// Attribute names and values compare case-insensitively. Ordering,
    /// approximate and extensible matches are never satisfied.
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Self::And(filters) => filters.iter().all(|f| f.matches(entry)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(entry)),
            Self::Not(filter) => !filter.matches(entry),
            Self::Equality { attr, value } => {
                let value = value.to_lowercase();
                entry
                    .values(attr)
                    .iter()
                    .any(|v| v.to_lowercase() == value)
            }
            Self::Substrings {
                attr,
                initial,
                any,
                last,
            } => entry
                .values(attr)
                .iter()
                .any(|v| substring_match(v, initial.as_deref(), any, last.as_deref())),
            Self::Present(attr) => !entry.values(attr).is_empty(),
            Self::GreaterOrEqual { .. }
            | Self::LessOrEqual { .. }
            | Self::Approx { .. }
            | Self::Extensible => false,
        }
    }
}

fn decode_at(tlv: Tlv<'_>, depth: usize) -> Result<Filter, BerError> {
    if depth > MAX_DEPTH {
        return Err(BerError::Invalid("filter nesting"));
    }
    if tlv.tag.class != Class::Context {
        return Err(BerError::Invalid("filter choice"));
    }

    let filter = match (tlv.tag.number, tlv.tag.constructed) {
        (0, true) => Filter::And(decode_set(tlv.value, depth)?),
        (1, true) => Filter::Or(decode_set(tlv.value, depth)?),
        (2, true) => {
            let mut reader = BerReader::new(tlv.value);
            let inner = decode_at(reader.read_tlv()?, depth + 1)?;
            Filter::Not(Box::new(inner))
        }
        (3, true) => {
            let (attr, value) = assertion(tlv.value)?;
            Filter::Equality { attr, value }
        }
        (4, true) => decode_substrings(tlv.value)?,
        (5, true) => {
            let (attr, value) = assertion(tlv.value)?;
            Filter::GreaterOrEqual { attr, value }
        }
        (6, true) => {
            let (attr, value) = assertion(tlv.value)?;
            Filter::LessOrEqual { attr, value }
        }
        (7, false) => Filter::Present(decode_utf8(tlv.value)?),
        (8, true) => {
            let (attr, value) = assertion(tlv.value)?;
            Filter::Approx { attr, value }
        }
        (9, true) => Filter::Extensible,
        _ => return Err(BerError::Invalid("filter choice")),
    };
    Ok(filter)
}

fn decode_set(data: &[u8], depth: usize) -> Result<Vec<Filter>, BerError> {
    let mut reader = BerReader::new(data);
    let mut filters = Vec::new();
    while !reader.is_empty() {
        filters.push(decode_at(reader.read_tlv()?, depth + 1)?);
    }
    Ok(filters)
}

fn assertion(data: &[u8]) -> Result<(String, String), BerError> {
    let mut reader = BerReader::new(data);
    let attr = reader.read_string()?;
    let value = reader.read_string()?;
    Ok((attr, value))
}

fn decode_substrings(data: &[u8]) -> Result<Filter, BerError> {
    let mut reader = BerReader::new(data);
    let attr = reader.read_string()?;
    let mut parts = reader.read_sequence()?;

    let mut initial = None;
    let mut any = Vec::new();
    let mut last = None;
    while !parts.is_empty() {
        let part = parts.read_tlv()?;
        let text = decode_utf8(part.value)?;
        match part.tag {
            t if t == Tag::context(0, false) && initial.is_none() && any.is_empty() => {
                initial = Some(text);
            }
            t if t == Tag::context(1, false) && last.is_none() => any.push(text),
            t if t == Tag::context(2, false) && last.is_none() => last = Some(text),
            _ => return Err(BerError::Invalid("substring filter")),
        }
    }
    Ok(Filter::Substrings {
        attr,
        initial,
        any,
        last,
    })
}

fn substring_match(value: &str, initial: Option<&str>, any: &[String], last: Option<&str>) -> bool {
    let value = value.to_lowercase();
    let mut rest = value.as_str();

    if let Some(initial) = initial {
        let initial = initial.to_lowercase();
        match rest.strip_prefix(initial.as_str()) {
            Some(tail) => rest = tail,
            None => return false,
        }
    }

    for piece in any {
        let piece = piece.to_lowercase();
        match rest.find(piece.as_str()) {
            Some(pos) => rest = &rest[pos + piece.len()..],
            None => return false,
        }
    }

    match last {
        Some(last) => rest.ends_with(last.to_lowercase().as_str()),
        None => true,
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(filters) => {
                write!(f, "(&")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                write!(f, ")")
            }
            Self::Or(filters) => {
                write!(f, "(|")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                write!(f, ")")
            }
            Self::Not(filter) => write!(f, "(!{filter})"),
            Self::Equality { attr, value } => write!(f, "({attr}={value})"),
            Self::Substrings {
                attr,
                initial,
                any,
                last,
            } => {
                write!(f, "({attr}={}*", initial.as_deref().unwrap_or(""))?;
                for piece in any {
                    write!(f, "{piece}*")?;
                }
                write!(f, "{})", last.as_deref().unwrap_or(""))
            }
            Self::GreaterOrEqual { attr, value } => write!(f, "({attr}>={value})"),
            Self::LessOrEqual { attr, value } => write!(f, "({attr}<={value})"),
            Self::Present(attr) => write!(f, "({attr}=*)"),
            Self::Approx { attr, value } => write!(f, "({attr}~={value})"),
            Self::Extensible => write!(f, "(:extensible:)"),
        }
    }
}
