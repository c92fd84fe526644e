//! Request dispatch: one protocol operation in, its responses out.

use tracing::{debug, warn};

use glim_auth::{CredentialVerifier, PasswordHasher};
use glim_core::config::ldap::LdapConfig;
use glim_core::error::AppError;
use glim_core::result::AppResult;
use glim_database::{DatabasePool, GroupRepository, UserRepository};

use crate::ops;
use crate::protocol::{
    ExtendedResponse, LdapMessage, LdapResponse, LdapResult, ProtocolOp, ResponseOp, ResultCode,
};
use crate::session::Session;
use crate::tree::DirectoryTree;

/// What the connection does after a request.
#[derive(Debug, Default)]
pub struct Outcome {
    pub responses: Vec<LdapResponse>,
    /// Close the connection once the responses are written.
    pub close: bool,
}

impl Outcome {
    pub fn reply(response: LdapResponse) -> Self {
        Self {
            responses: vec![response],
            close: false,
        }
    }

    pub fn close_after(mut self) -> Self {
        self.close = true;
        self
    }
}

/// Shared request handler, one per listener.
#[derive(Debug, Clone)]
pub struct LdapHandler {
    pub(crate) tree: DirectoryTree,
    pub(crate) users: UserRepository,
    pub(crate) groups: GroupRepository,
    pub(crate) credentials: CredentialVerifier,
    /// Server-side entry limit, 0 for none.
    pub(crate) size_limit: u32,
}

impl LdapHandler {
    /// Wire the handler over the catalog. `config.domain` must already be
    /// normalized.
    pub fn new(config: &LdapConfig, db: &DatabasePool) -> AppResult<Self> {
        let tree = DirectoryTree::new(&config.domain)
            .map_err(|e| AppError::configuration(format!("invalid ldap domain: {e}")))?;
        let users = UserRepository::new(db.pool().clone());
        let groups = GroupRepository::new(db.pool().clone());
        let credentials = CredentialVerifier::new(users.clone(), PasswordHasher::new());

        Ok(Self {
            tree,
            users,
            groups,
            credentials,
            size_limit: config.size_limit,
        })
    }

    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    pub async fn handle(&self, session: &mut Session, message: LdapMessage) -> Outcome {
        let id = message.id;
        debug!(id, op = message.op.name(), "LDAP request");

        match message.op {
            ProtocolOp::Bind(request) => {
                let result = ops::bind::bind(self, session, request).await;
                Outcome::reply(LdapResponse::new(id, ResponseOp::Bind(result)))
            }
            ProtocolOp::Unbind => Outcome::default().close_after(),
            ProtocolOp::Search(request) => {
                let (entries, done) = ops::search::search(self, session, &request).await;
                let mut responses: Vec<LdapResponse> = entries
                    .into_iter()
                    .map(|entry| LdapResponse::new(id, ResponseOp::SearchEntry(entry)))
                    .collect();
                responses.push(LdapResponse::new(id, ResponseOp::SearchDone(done)));
                Outcome {
                    responses,
                    close: false,
                }
            }
            ProtocolOp::Extended(request) => {
                let response = ops::extended::extended(session, &request);
                Outcome::reply(LdapResponse::new(id, ResponseOp::Extended(response)))
            }
            ProtocolOp::Unsupported(tag) => {
                warn!(id, tag, peer = %session.peer(), "Unsupported LDAP operation");
                let response = ExtendedResponse {
                    result: LdapResult::new(
                        ResultCode::UnwillingToPerform,
                        "operation not supported",
                    ),
                    name: None,
                    value: None,
                };
                Outcome::reply(LdapResponse::new(id, ResponseOp::Extended(response))).close_after()
            }
        }
    }
}

/// The response sent before dropping a connection whose request could not
/// be decoded.
pub fn protocol_error(id: i32, message: &str) -> LdapResponse {
    LdapResponse::new(
        id,
        ResponseOp::Extended(ExtendedResponse {
            result: LdapResult::new(ResultCode::ProtocolError, message),
            name: None,
            value: None,
        }),
    )
}
