//! Extended operations. Only "Who am I?" is implemented.

use crate::protocol::{ExtendedRequest, ExtendedResponse, LdapResult, ResultCode, WHOAMI_OID};
use crate::session::Session;

pub fn extended(session: &Session, request: &ExtendedRequest) -> ExtendedResponse {
    if request.name != WHOAMI_OID {
        return ExtendedResponse {
            result: LdapResult::new(
                ResultCode::UnwillingToPerform,
                format!("extended operation {} is not supported", request.name),
            ),
            name: None,
            value: None,
        };
    }

    // RFC 4532: the authzId of an anonymous connection is empty.
    let authz_id = session
        .identity()
        .map(|identity| format!("dn:{}", identity.dn))
        .unwrap_or_default();
    ExtendedResponse {
        result: LdapResult::success(),
        name: None,
        value: Some(authz_id.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::BoundIdentity;

    fn whoami() -> ExtendedRequest {
        ExtendedRequest {
            name: WHOAMI_OID.to_string(),
            value: None,
        }
    }

    #[test]
    fn test_whoami_anonymous_is_empty() {
        let session = Session::new("127.0.0.1:4000".parse().unwrap());
        let response = extended(&session, &whoami());
        assert!(response.result.is_success());
        assert_eq!(response.value, Some(Vec::new()));
    }

    #[test]
    fn test_whoami_reports_bound_dn() {
        let mut session = Session::new("127.0.0.1:4000".parse().unwrap());
        session.bind(BoundIdentity {
            dn: "uid=saul,ou=Users,dc=example,dc=org".into(),
            username: "saul".into(),
            manager: false,
            readonly: false,
        });
        let response = extended(&session, &whoami());
        assert_eq!(
            response.value.as_deref(),
            Some(&b"dn:uid=saul,ou=Users,dc=example,dc=org"[..])
        );
    }

    #[test]
    fn test_unknown_extended_operation() {
        let session = Session::new("127.0.0.1:4000".parse().unwrap());
        let response = extended(
            &session,
            &ExtendedRequest {
                name: "1.3.6.1.4.1.1466.20037".into(),
                value: None,
            },
        );
        assert_eq!(response.result.code, ResultCode::UnwillingToPerform);
    }
}
