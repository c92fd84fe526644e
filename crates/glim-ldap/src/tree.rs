//! The fixed shape of the directory under the configured suffix:
//!
//! ```text
//! dc=example,dc=org
//! ├── ou=Users   uid=<username> per user
//! └── ou=Groups  cn=<name> per group
//! ```

use crate::dn::{Dn, DnError, Rdn};

pub const USERS_OU: &str = "Users";
pub const GROUPS_OU: &str = "Groups";

/// Where a DN points inside the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Root,
    Users,
    Groups,
    User(String),
    Group(String),
}

/// DN construction and classification for one directory suffix.
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    suffix: Dn,
}

impl DirectoryTree {
    /// `domain` must already be in normalized `dc=...` form.
    pub fn new(domain: &str) -> Result<Self, DnError> {
        Ok(Self {
            suffix: Dn::parse(domain)?,
        })
    }

    pub fn suffix(&self) -> &Dn {
        &self.suffix
    }

    /// Value of the first `dc` component.
    pub fn domain_component(&self) -> &str {
        self.suffix
            .rdns()
            .first()
            .map(|rdn| rdn.value.as_str())
            .unwrap_or_default()
    }

    pub fn users_dn(&self) -> Dn {
        self.suffix.child(Rdn::new("ou", USERS_OU))
    }

    pub fn groups_dn(&self) -> Dn {
        self.suffix.child(Rdn::new("ou", GROUPS_OU))
    }

    pub fn user_dn(&self, username: &str) -> Dn {
        self.users_dn().child(Rdn::new("uid", username))
    }

    pub fn group_dn(&self, name: &str) -> Dn {
        self.groups_dn().child(Rdn::new("cn", name))
    }

    /// DN of the bind-only manager name, `cn=<username>,<suffix>`.
    pub fn manager_dn(&self, username: &str) -> Dn {
        self.suffix.child(Rdn::new("cn", username))
    }

    /// Classify a DN. `None` means it is outside the suffix or names no
    /// node the tree can hold.
    pub fn locate(&self, dn: &Dn) -> Option<Node> {
        let head = dn.relative_to(&self.suffix)?;
        match head {
            [] => Some(Node::Root),
            [ou] => match ou.value_of("ou")? {
                v if v.eq_ignore_ascii_case(USERS_OU) => Some(Node::Users),
                v if v.eq_ignore_ascii_case(GROUPS_OU) => Some(Node::Groups),
                _ => None,
            },
            [leaf, ou] => {
                let ou = ou.value_of("ou")?;
                if ou.eq_ignore_ascii_case(USERS_OU) {
                    leaf.value_of("uid").map(|v| Node::User(v.to_string()))
                } else if ou.eq_ignore_ascii_case(GROUPS_OU) {
                    leaf.value_of("cn").map(|v| Node::Group(v.to_string()))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// The username a bind DN authenticates as.
    ///
    /// `uid=<u>,ou=Users,<suffix>` names any user; `cn=<u>,<suffix>` is
    /// accepted for `manager_username` only.
    pub fn bind_username(&self, dn: &Dn, manager_username: &str) -> Option<String> {
        match dn.relative_to(&self.suffix)? {
            [cn] => cn
                .value_of("cn")
                .filter(|v| *v == manager_username)
                .map(str::to_string),
            [_, _] => match self.locate(dn)? {
                Node::User(username) => Some(username),
                _ => None,
            },
            _ => None,
        }
    }

    /// The parent of a node, for the matched DN of a missing entry.
    pub fn parent_dn(&self, node: &Node) -> Dn {
        match node {
            Node::User(_) => self.users_dn(),
            Node::Group(_) => self.groups_dn(),
            _ => self.suffix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> DirectoryTree {
        DirectoryTree::new("dc=example,dc=org").unwrap()
    }

    fn locate(dn: &str) -> Option<Node> {
        tree().locate(&Dn::parse(dn).unwrap())
    }

    #[test]
    fn test_locate_nodes() {
        assert_eq!(locate("dc=example,dc=org"), Some(Node::Root));
        assert_eq!(locate("ou=users,dc=example,dc=org"), Some(Node::Users));
        assert_eq!(locate("ou=Groups,dc=Example,dc=org"), Some(Node::Groups));
        assert_eq!(
            locate("uid=saul,ou=Users,dc=example,dc=org"),
            Some(Node::User("saul".into()))
        );
        assert_eq!(
            locate("cn=developers,ou=Groups,dc=example,dc=org"),
            Some(Node::Group("developers".into()))
        );
    }

    #[test]
    fn test_locate_rejects_unknown_nodes() {
        assert_eq!(locate("ou=People,dc=example,dc=org"), None);
        assert_eq!(locate("cn=saul,ou=Users,dc=example,dc=org"), None);
        assert_eq!(locate("uid=saul,ou=Users,dc=other,dc=org"), None);
        assert_eq!(locate("a=b,uid=saul,ou=Users,dc=example,dc=org"), None);
    }

    #[test]
    fn test_bind_username() {
        let tree = tree();
        let bind = |dn: &str| tree.bind_username(&Dn::parse(dn).unwrap(), "admin");
        assert_eq!(bind("uid=kim,ou=Users,dc=example,dc=org"), Some("kim".into()));
        assert_eq!(bind("cn=admin,dc=example,dc=org"), Some("admin".into()));
        assert_eq!(bind("cn=kim,dc=example,dc=org"), None);
        assert_eq!(bind("uid=kim,ou=People,dc=example,dc=org"), None);
        assert_eq!(bind("uid=kim,ou=Users,dc=other,dc=org"), None);
    }

    #[test]
    fn test_dn_builders() {
        let tree = tree();
        assert_eq!(tree.domain_component(), "example");
        assert_eq!(
            tree.group_dn("developers").to_string(),
            "cn=developers,ou=Groups,dc=example,dc=org"
        );
        assert_eq!(tree.manager_dn("admin").to_string(), "cn=admin,dc=example,dc=org");
    }
}
