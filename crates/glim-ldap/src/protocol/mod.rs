//! LDAPv3 message model (RFC 4511) and its wire codec.

pub mod codec;
pub mod filter;
pub mod message;
pub mod response;
pub mod result;

pub use codec::LdapCodec;
pub use filter::Filter;
pub use message::{
    BindAuth, BindRequest, DecodeError, ExtendedRequest, LdapMessage, ProtocolOp, Scope,
    SearchRequest, WHOAMI_OID,
};
pub use response::{ExtendedResponse, LdapResponse, PartialAttribute, ResponseOp, SearchEntry};
pub use result::{LdapResult, ResultCode};
