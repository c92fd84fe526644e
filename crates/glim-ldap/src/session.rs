//! Per-connection authentication state.

use std::net::SocketAddr;

/// The account a connection is bound as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundIdentity {
    /// Canonical DN the bind resolved to.
    pub dn: String,
    pub username: String,
    pub manager: bool,
    pub readonly: bool,
}

impl BoundIdentity {
    /// Managers and readers see every user's groups; plain users only
    /// their own.
    pub fn can_see_memberships_of(&self, username: &str) -> bool {
        self.manager || self.readonly || self.username == username
    }
}

/// State carried across the requests of one connection.
#[derive(Debug)]
pub struct Session {
    peer: SocketAddr,
    identity: Option<BoundIdentity>,
}

impl Session {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            identity: None,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn identity(&self) -> Option<&BoundIdentity> {
        self.identity.as_ref()
    }

    pub fn bind(&mut self, identity: BoundIdentity) {
        self.identity = Some(identity);
    }

    /// Back to anonymous, as at the start of every bind.
    pub fn reset(&mut self) {
        self.identity = None;
    }
}
