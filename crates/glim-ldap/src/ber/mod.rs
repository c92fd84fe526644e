//! Basic Encoding Rules, restricted to the definite-length subset LDAPv3
//! uses on the wire.

pub mod reader;
pub mod writer;

use thiserror::Error;

pub use reader::{BerReader, Tlv, frame_length};
pub use writer::BerWriter;

/// Tag class, the top two bits of the identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// Universal ASN.1 types.
    Universal,
    /// Application-wide tags, used for LDAP protocol operations.
    Application,
    /// Context-specific tags inside a constructed value.
    Context,
    /// Private-use tags.
    Private,
}

impl Class {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Universal,
            1 => Self::Application,
            2 => Self::Context,
            _ => Self::Private,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Self::Universal => 0,
            Self::Application => 1,
            Self::Context => 2,
            Self::Private => 3,
        }
    }
}

/// A decoded identifier octet (or octets, for high tag numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    /// Tag class.
    pub class: Class,
    /// Whether the value holds nested TLVs.
    pub constructed: bool,
    /// Tag number within the class.
    pub number: u32,
}

impl Tag {
    pub const BOOLEAN: Tag = Tag::universal(1, false);
    pub const INTEGER: Tag = Tag::universal(2, false);
    pub const OCTET_STRING: Tag = Tag::universal(4, false);
    pub const NULL: Tag = Tag::universal(5, false);
    pub const ENUMERATED: Tag = Tag::universal(10, false);
    pub const SEQUENCE: Tag = Tag::universal(16, true);
    pub const SET: Tag = Tag::universal(17, true);

    /// A universal-class tag.
    pub const fn universal(number: u32, constructed: bool) -> Self {
        Self {
            class: Class::Universal,
            constructed,
            number,
        }
    }

    /// An application-class tag.
    pub const fn application(number: u32, constructed: bool) -> Self {
        Self {
            class: Class::Application,
            constructed,
            number,
        }
    }

    /// A context-specific tag.
    pub const fn context(number: u32, constructed: bool) -> Self {
        Self {
            class: Class::Context,
            constructed,
            number,
        }
    }
}

/// Decoding failures. Any of them means the peer violated the protocol.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BerError {
    #[error("unexpected end of data")]
    Truncated,
    #[error("indefinite length encoding is not allowed")]
    IndefiniteLength,
    #[error("length field of {0} octets is not supported")]
    LengthTooLong(usize),
    #[error("expected tag {expected:?}, found {found:?}")]
    UnexpectedTag { expected: Tag, found: Tag },
    #[error("invalid {0} encoding")]
    Invalid(&'static str),
}
