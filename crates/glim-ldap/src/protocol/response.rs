//! Encoding of server responses.

use super::result::LdapResult;
use crate::ber::{BerWriter, Tag};

const BIND_RESPONSE: Tag = Tag::application(1, true);
const SEARCH_RESULT_ENTRY: Tag = Tag::application(4, true);
const SEARCH_RESULT_DONE: Tag = Tag::application(5, true);
const EXTENDED_RESPONSE: Tag = Tag::application(24, true);

/// A response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapResponse {
    pub id: i32,
    pub op: ResponseOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOp {
    Bind(LdapResult),
    SearchEntry(SearchEntry),
    SearchDone(LdapResult),
    Extended(ExtendedResponse),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub dn: String,
    pub attributes: Vec<PartialAttribute>,
}

/// An attribute description with its values, possibly none when only
/// types were requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialAttribute {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedResponse {
    pub result: LdapResult,
    pub name: Option<String>,
    pub value: Option<Vec<u8>>,
}

impl LdapResponse {
    pub fn new(id: i32, op: ResponseOp) -> Self {
        Self { id, op }
    }

    /// Serialize the complete `LDAPMessage`.
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BerWriter::new();
        writer.write_sequence(|seq| {
            seq.write_integer(i64::from(self.id));
            match &self.op {
                ResponseOp::Bind(result) => {
                    seq.write_constructed(BIND_RESPONSE, |op| write_result(op, result));
                }
                ResponseOp::SearchEntry(entry) => {
                    seq.write_constructed(SEARCH_RESULT_ENTRY, |op| write_entry(op, entry));
                }
                ResponseOp::SearchDone(result) => {
                    seq.write_constructed(SEARCH_RESULT_DONE, |op| write_result(op, result));
                }
                ResponseOp::Extended(response) => {
                    seq.write_constructed(EXTENDED_RESPONSE, |op| {
                        write_result(op, &response.result);
                        if let Some(name) = &response.name {
                            op.write_raw(Tag::context(10, false), name.as_bytes());
                        }
                        if let Some(value) = &response.value {
                            op.write_raw(Tag::context(11, false), value);
                        }
                    });
                }
            }
        });
        writer.into_bytes()
    }
}

fn write_result(writer: &mut BerWriter, result: &LdapResult) {
    writer.write_enumerated(result.code.code());
    writer.write_octet_string(result.matched_dn.as_bytes());
    writer.write_octet_string(result.message.as_bytes());
}

fn write_entry(writer: &mut BerWriter, entry: &SearchEntry) {
    writer.write_octet_string(entry.dn.as_bytes());
    writer.write_sequence(|attrs| {
        for attribute in &entry.attributes {
            attrs.write_sequence(|attr| {
                attr.write_octet_string(attribute.name.as_bytes());
                attr.write_set(|values| {
                    for value in &attribute.values {
                        values.write_octet_string(value.as_bytes());
                    }
                });
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::BerReader;
    use crate::protocol::result::ResultCode;

    #[test]
    fn test_encode_bind_response() {
        let response = LdapResponse::new(
            1,
            ResponseOp::Bind(LdapResult::new(ResultCode::InvalidCredentials, "invalid credentials")),
        );
        let bytes = response.encode();

        let mut outer = BerReader::new(&bytes);
        let mut seq = outer.read_sequence().unwrap();
        assert_eq!(seq.read_integer().unwrap(), 1);
        let mut op = seq.read_constructed(BIND_RESPONSE).unwrap();
        assert_eq!(op.read_enumerated().unwrap(), 49);
        assert_eq!(op.read_octet_string().unwrap(), b"");
        assert_eq!(op.read_string().unwrap(), "invalid credentials");
    }

    #[test]
    fn test_encode_entry_attributes() {
        let response = LdapResponse::new(
            2,
            ResponseOp::SearchEntry(SearchEntry {
                dn: "uid=kim,ou=Users,dc=example,dc=org".into(),
                attributes: vec![
                    PartialAttribute {
                        name: "uid".into(),
                        values: vec!["kim".into()],
                    },
                    PartialAttribute {
                        name: "mail".into(),
                        values: vec![],
                    },
                ],
            }),
        );
        let bytes = response.encode();

        let mut outer = BerReader::new(&bytes);
        let mut seq = outer.read_sequence().unwrap();
        seq.read_integer().unwrap();
        let mut op = seq.read_constructed(SEARCH_RESULT_ENTRY).unwrap();
        assert_eq!(op.read_string().unwrap(), "uid=kim,ou=Users,dc=example,dc=org");
        let mut attrs = op.read_sequence().unwrap();
        let mut uid = attrs.read_sequence().unwrap();
        assert_eq!(uid.read_string().unwrap(), "uid");
        let mut values = uid.read_constructed(Tag::SET).unwrap();
        assert_eq!(values.read_string().unwrap(), "kim");
        let mut mail = attrs.read_sequence().unwrap();
        assert_eq!(mail.read_string().unwrap(), "mail");
        assert!(mail.read_constructed(Tag::SET).unwrap().is_empty());
    }

    #[test]
    fn test_encode_extended_value() {
        let response = LdapResponse::new(
            3,
            ResponseOp::Extended(ExtendedResponse {
                result: LdapResult::success(),
                name: None,
                value: Some(b"dn:uid=saul,ou=Users,dc=example,dc=org".to_vec()),
            }),
        );
        let bytes = response.encode();
        assert!(bytes.ends_with(b"dn:uid=saul,ou=Users,dc=example,dc=org"));
        let value_tag_at = bytes.len() - 38 - 2;
        assert_eq!(bytes[value_tag_at], 0x8b);
    }
}
