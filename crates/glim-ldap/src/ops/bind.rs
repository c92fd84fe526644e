//! Simple bind against the catalog.

use tracing::{error, info, warn};

use glim_auth::Verification;
use glim_entity::ADMIN_USERNAME;

use crate::dn::Dn;
use crate::handler::LdapHandler;
use crate::protocol::{BindAuth, BindRequest, LdapResult, ResultCode};
use crate::session::{BoundIdentity, Session};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Authenticate the connection. Any bind first drops the previous
/// identity, so a failed bind leaves the connection anonymous.
pub async fn bind(handler: &LdapHandler, session: &mut Session, request: BindRequest) -> LdapResult {
    session.reset();

    if request.version != 3 {
        return LdapResult::new(ResultCode::ProtocolError, "only LDAPv3 is supported");
    }
    let password = match request.auth {
        BindAuth::Simple(password) => password,
        BindAuth::Sasl { mechanism } => {
            return LdapResult::new(
                ResultCode::AuthMethodNotSupported,
                format!("SASL mechanism {mechanism} is not supported"),
            );
        }
    };
    if password.is_empty() {
        return LdapResult::new(ResultCode::InvalidCredentials, INVALID_CREDENTIALS);
    }

    let dn = match Dn::parse(&request.name) {
        Ok(dn) => dn,
        Err(e) => return LdapResult::new(ResultCode::InvalidDnSyntax, e.to_string()),
    };
    let Some(username) = handler.tree.bind_username(&dn, ADMIN_USERNAME) else {
        warn!(name = %request.name, peer = %session.peer(), "Bind DN outside the directory");
        return LdapResult::new(ResultCode::InvalidCredentials, INVALID_CREDENTIALS);
    };
    let Ok(password) = String::from_utf8(password) else {
        return LdapResult::new(ResultCode::InvalidCredentials, INVALID_CREDENTIALS);
    };

    match handler.credentials.verify_password(&username, &password).await {
        Ok(Verification::Valid(user)) => {
            let user = *user;
            let dn = if dn.rdns().len() == handler.tree.suffix().rdns().len() + 1 {
                handler.tree.manager_dn(&username)
            } else {
                handler.tree.user_dn(&username)
            };
            info!(username = %user.username, peer = %session.peer(), "LDAP bind succeeded");
            session.bind(BoundIdentity {
                dn: dn.to_string(),
                username: user.username,
                manager: user.manager,
                readonly: user.readonly,
            });
            LdapResult::success()
        }
        Ok(Verification::UnknownUser) => {
            warn!(%username, peer = %session.peer(), "LDAP bind for unknown user");
            LdapResult::new(ResultCode::InsufficientAccessRights, "user does not exist")
        }
        Ok(Verification::WrongPassword | Verification::Locked) => {
            warn!(%username, peer = %session.peer(), "LDAP bind rejected");
            LdapResult::new(ResultCode::InvalidCredentials, INVALID_CREDENTIALS)
        }
        Err(e) => {
            error!(%username, error = %e, "LDAP bind failed");
            LdapResult::from(&e)
        }
    }
}
