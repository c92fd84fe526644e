//! Decoding of client requests.

use thiserror::Error;

use super::filter::Filter;
use crate::ber::reader::decode_utf8;
use crate::ber::{BerError, BerReader, Class, Tag};

/// OID of the "Who am I?" extended operation (RFC 4532).
pub const WHOAMI_OID: &str = "1.3.6.1.4.1.4203.1.11.3";

const BIND_REQUEST: Tag = Tag::application(0, true);
const UNBIND_REQUEST: Tag = Tag::application(2, false);
const SEARCH_REQUEST: Tag = Tag::application(3, true);
const EXTENDED_REQUEST: Tag = Tag::application(23, true);

const SIMPLE_AUTH: Tag = Tag::context(0, false);
const SASL_AUTH: Tag = Tag::context(3, true);

/// A request envelope. Controls are accepted and ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct LdapMessage {
    pub id: i32,
    pub op: ProtocolOp,
}

/// Operations the server understands. Anything else is carried as
/// `Unsupported` with its application tag number.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolOp {
    Bind(BindRequest),
    Unbind,
    Search(SearchRequest),
    Extended(ExtendedRequest),
    Unsupported(u32),
}

impl ProtocolOp {
    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bind(_) => "bind",
            Self::Unbind => "unbind",
            Self::Search(_) => "search",
            Self::Extended(_) => "extended",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindRequest {
    pub version: i64,
    pub name: String,
    pub auth: BindAuth,
}

#[derive(Clone, PartialEq, Eq)]
pub enum BindAuth {
    Simple(Vec<u8>),
    Sasl { mechanism: String },
}

impl std::fmt::Debug for BindAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple(_) => f.write_str("Simple(****)"),
            Self::Sasl { mechanism } => f.debug_struct("Sasl").field("mechanism", mechanism).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    BaseObject,
    SingleLevel,
    WholeSubtree,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base: String,
    pub scope: Scope,
    pub deref_aliases: i64,
    /// Client-requested entry limit, 0 for none.
    pub size_limit: i64,
    /// Client-requested time limit in seconds, 0 for none.
    pub time_limit: i64,
    pub types_only: bool,
    pub filter: Filter,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedRequest {
    pub name: String,
    pub value: Option<Vec<u8>>,
}

/// A request that could not be decoded.
///
/// `message_id` is set when the envelope was readable, so that the
/// connection can answer before closing.
#[derive(Debug, Clone, Error)]
#[error("{source}")]
pub struct DecodeError {
    pub message_id: Option<i32>,
    #[source]
    pub source: BerError,
}

impl From<BerError> for DecodeError {
    fn from(source: BerError) -> Self {
        Self {
            message_id: None,
            source,
        }
    }
}

impl LdapMessage {
    /// Decode one complete `LDAPMessage` frame.
    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        let mut outer = BerReader::new(frame);
        let mut envelope = outer.read_sequence()?;
        let id = envelope.read_integer()?;
        let id = i32::try_from(id)
            .ok()
            .filter(|id| *id >= 0)
            .ok_or(BerError::Invalid("message id"))?;

        decode_op(&mut envelope)
            .map(|op| Self { id, op })
            .map_err(|source| DecodeError {
                message_id: Some(id),
                source,
            })
    }
}

fn decode_op(envelope: &mut BerReader<'_>) -> Result<ProtocolOp, BerError> {
    let tlv = envelope.read_tlv()?;
    let op = match tlv.tag {
        BIND_REQUEST => ProtocolOp::Bind(decode_bind(tlv.value)?),
        UNBIND_REQUEST => ProtocolOp::Unbind,
        SEARCH_REQUEST => ProtocolOp::Search(decode_search(tlv.value)?),
        EXTENDED_REQUEST => ProtocolOp::Extended(decode_extended(tlv.value)?),
        tag if tag.class == Class::Application => ProtocolOp::Unsupported(tag.number),
        _ => return Err(BerError::Invalid("protocol operation")),
    };
    Ok(op)
}

fn decode_bind(data: &[u8]) -> Result<BindRequest, BerError> {
    let mut reader = BerReader::new(data);
    let version = reader.read_integer()?;
    let name = reader.read_string()?;
    let auth = reader.read_tlv()?;
    let auth = match auth.tag {
        SIMPLE_AUTH => BindAuth::Simple(auth.value.to_vec()),
        SASL_AUTH => {
            let mut sasl = BerReader::new(auth.value);
            BindAuth::Sasl {
                mechanism: sasl.read_string()?,
            }
        }
        _ => return Err(BerError::Invalid("authentication choice")),
    };
    Ok(BindRequest {
        version,
        name,
        auth,
    })
}

fn decode_search(data: &[u8]) -> Result<SearchRequest, BerError> {
    let mut reader = BerReader::new(data);
    let base = reader.read_string()?;
    let scope = match reader.read_enumerated()? {
        0 => Scope::BaseObject,
        1 => Scope::SingleLevel,
        2 => Scope::WholeSubtree,
        _ => return Err(BerError::Invalid("search scope")),
    };
    let deref_aliases = reader.read_enumerated()?;
    let size_limit = reader.read_integer()?;
    let time_limit = reader.read_integer()?;
    if size_limit < 0 || time_limit < 0 {
        return Err(BerError::Invalid("search limit"));
    }
    let types_only = reader.read_boolean()?;
    let filter = Filter::decode(reader.read_tlv()?)?;

    let mut list = reader.read_sequence()?;
    let mut attributes = Vec::new();
    while !list.is_empty() {
        attributes.push(list.read_string()?);
    }

    Ok(SearchRequest {
        base,
        scope,
        deref_aliases,
        size_limit,
        time_limit,
        types_only,
        filter,
        attributes,
    })
}

fn decode_extended(data: &[u8]) -> Result<ExtendedRequest, BerError> {
    let mut reader = BerReader::new(data);
    let name = decode_utf8(reader.read_expected(Tag::context(0, false))?)?;
    let value = if reader.is_empty() {
        None
    } else {
        Some(reader.read_expected(Tag::context(1, false))?.to_vec())
    };
    Ok(ExtendedRequest { name, value })
}
