//! Stream framing: one `LDAPMessage` TLV per item.
//!
//! A frame whose contents do not decode is yielded as an `Err` item. The
//! stream stays usable; only broken framing ends it.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use super::message::{DecodeError, LdapMessage};
use super::response::LdapResponse;
use crate::ber::frame_length;
use crate::error::LdapError;

/// Largest request accepted from a client.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct LdapCodec {
    max_frame_len: usize,
}

impl LdapCodec {
    pub fn new() -> Self {
        Self::with_max_frame_len(MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }
}

impl Default for LdapCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LdapCodec {
    type Item = Result<LdapMessage, DecodeError>;
    type Error = LdapError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(len) = frame_length(src)? else {
            return Ok(None);
        };
        if len > self.max_frame_len {
            return Err(LdapError::FrameTooLarge(len));
        }
        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        let frame = src.split_to(len);
        Ok(Some(LdapMessage::decode(&frame)))
    }
}

impl Encoder<LdapResponse> for LdapCodec {
    type Error = LdapError;

    fn encode(&mut self, item: LdapResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item.encode());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::tests::simple_bind;
    use crate::protocol::{LdapResult, ProtocolOp, ResponseOp};

    #[test]
    fn test_decode_waits_for_full_frame() {
        let frame = simple_bind(1, "cn=admin,dc=example,dc=org", "secret");
        let mut codec = LdapCodec::new();
        let mut buf = BytesMut::from(&frame[..frame.len() - 3]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&frame[frame.len() - 3..]);
        let message = codec.decode(&mut buf).unwrap().unwrap().unwrap();
        assert!(matches!(message.op, ProtocolOp::Bind(_)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_pipelined_frames() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&simple_bind(1, "", "a"));
        buf.extend_from_slice(&simple_bind(2, "", "b"));
        let mut codec = LdapCodec::new();
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().unwrap().id, 1);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().unwrap().id, 2);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_reject_oversized_frame() {
        let mut codec = LdapCodec::with_max_frame_len(16);
        let mut buf = BytesMut::from(&[0x30, 0x82, 0x10, 0x00][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(LdapError::FrameTooLarge(4100))
        ));
    }

    #[test]
    fn test_undecodable_frame_is_an_item() {
        let mut buf = BytesMut::from(&[0x30, 0x03, 0x02, 0x01, 0x07, 0x30, 0x00][..]);
        let mut codec = LdapCodec::new();
        let err = codec.decode(&mut buf).unwrap().unwrap().unwrap_err();
        assert_eq!(err.message_id, Some(7));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_encode_appends_response() {
        let mut codec = LdapCodec::new();
        let mut buf = BytesMut::new();
        let response = LdapResponse::new(1, ResponseOp::Bind(LdapResult::success()));
        codec.encode(response.clone(), &mut buf).unwrap();
        assert_eq!(&buf[..], &response.encode()[..]);
    }
}
