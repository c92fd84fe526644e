//! Projection of catalog records onto LDAP entries.
//!
//! Users become `inetOrgPerson` entries under `ou=Users`, groups become
//! `groupOfNames` entries under `ou=Groups`. Every entry also carries the
//! usual operational attributes, returned only when asked for.

use chrono::{DateTime, Utc};

use glim_entity::{Group, User};

use crate::protocol::{PartialAttribute, SearchEntry};
use crate::tree::{DirectoryTree, GROUPS_OU, USERS_OU};

const SUBSCHEMA: &str = "cn=Subschema";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Attribute {
    name: String,
    values: Vec<String>,
    operational: bool,
}

/// A directory entry with its full attribute set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    dn: String,
    attributes: Vec<Attribute>,
}

impl Entry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// Add a user attribute. Empty value lists are skipped.
    pub fn push<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_attribute(name, values, false);
    }

    /// Add an operational attribute.
    pub fn push_operational<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_attribute(name, values, true);
    }

    fn push_attribute<I, S>(&mut self, name: &str, values: I, operational: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return;
        }
        self.attributes.push(Attribute {
            name: name.to_string(),
            values,
            operational,
        });
    }

    /// Values of an attribute, matched without regard to case.
    pub fn values(&self, name: &str) -> &[String] {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.values.as_slice())
            .unwrap_or_default()
    }

    /// Render the entry for a search response.
    pub fn to_search_entry(&self, selection: &AttributeSelection, types_only: bool) -> SearchEntry {
        let attributes = self
            .attributes
            .iter()
            .filter(|attr| selection.includes(&attr.name, attr.operational))
            .map(|attr| PartialAttribute {
                name: attr.name.clone(),
                values: if types_only {
                    Vec::new()
                } else {
                    attr.values.clone()
                },
            })
            .collect();
        SearchEntry {
            dn: self.dn.clone(),
            attributes,
        }
    }
}

/// The attribute list of a search request, interpreted per RFC 4511.
///
/// An empty list or `*` selects all user attributes, `+` selects all
/// operational attributes, and `1.1` alone selects none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSelection {
    all_user: bool,
    all_operational: bool,
    named: Vec<String>,
}

impl AttributeSelection {
    pub fn from_request(requested: &[String]) -> Self {
        if requested.is_empty() {
            return Self {
                all_user: true,
                ..Self::default()
            };
        }

        let mut selection = Self::default();
        for attr in requested {
            match attr.as_str() {
                "*" => selection.all_user = true,
                "+" => selection.all_operational = true,
                "1.1" => {}
                name => selection.named.push(name.to_ascii_lowercase()),
            }
        }
        selection
    }

    fn includes(&self, name: &str, operational: bool) -> bool {
        if (operational && self.all_operational) || (!operational && self.all_user) {
            return true;
        }
        let name = name.to_ascii_lowercase();
        self.named.contains(&name)
    }
}

/// Formats a timestamp as LDAP GeneralizedTime.
pub fn generalized_time(at: &DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%SZ").to_string()
}

/// `inetOrgPerson` projection of a user.
///
/// `with_member_of` controls whether group memberships are exposed.
pub fn user_entry(tree: &DirectoryTree, user: &User, with_member_of: bool) -> Entry {
    let dn = tree.user_dn(&user.username).to_string();
    let mut entry = Entry::new(dn.clone());

    let cn = match user.full_name() {
        name if name.is_empty() => user.username.clone(),
        name => name,
    };
    let sn = if user.lastname.is_empty() {
        user.username.clone()
    } else {
        user.lastname.clone()
    };

    entry.push(
        "objectClass",
        ["top", "person", "organizationalPerson", "inetOrgPerson"],
    );
    entry.push("uid", [user.username.as_str()]);
    entry.push("cn", [cn]);
    entry.push("sn", [sn]);
    entry.push("givenName", non_empty(&user.firstname));
    entry.push("mail", non_empty(&user.email));
    if with_member_of {
        entry.push(
            "memberOf",
            user.member_of
                .iter()
                .map(|group| tree.group_dn(&group.name).to_string()),
        );
    }

    push_operational(
        &mut entry,
        tree,
        Audit {
            dn,
            uuid: user.uuid.to_string(),
            structural: "inetOrgPerson",
            has_subordinates: false,
            created_at: Some(&user.created_at),
            created_by: &user.created_by,
            updated_at: Some(&user.updated_at),
            updated_by: &user.updated_by,
        },
    );
    entry
}

/// `groupOfNames` projection of a group.
pub fn group_entry(tree: &DirectoryTree, group: &Group) -> Entry {
    let dn = tree.group_dn(&group.name).to_string();
    let mut entry = Entry::new(dn.clone());

    entry.push("objectClass", ["top", "groupOfNames"]);
    entry.push("cn", [group.name.as_str()]);
    entry.push("description", non_empty(&group.description));
    entry.push(
        "member",
        group
            .members
            .iter()
            .map(|user| tree.user_dn(&user.username).to_string()),
    );

    push_operational(
        &mut entry,
        tree,
        Audit {
            dn,
            uuid: group.uuid.to_string(),
            structural: "groupOfNames",
            has_subordinates: false,
            created_at: Some(&group.created_at),
            created_by: &group.created_by,
            updated_at: Some(&group.updated_at),
            updated_by: &group.updated_by,
        },
    );
    entry
}

/// `ou=Users` container entry.
pub fn users_entry(tree: &DirectoryTree) -> Entry {
    container_entry(tree, tree.users_dn().to_string(), USERS_OU)
}

/// `ou=Groups` container entry.
pub fn groups_entry(tree: &DirectoryTree) -> Entry {
    container_entry(tree, tree.groups_dn().to_string(), GROUPS_OU)
}

fn container_entry(tree: &DirectoryTree, dn: String, ou: &str) -> Entry {
    let mut entry = Entry::new(dn.clone());
    entry.push("objectClass", ["top", "organizationalUnit"]);
    entry.push("ou", [ou]);
    push_operational(&mut entry, tree, Audit::structural(dn, "organizationalUnit"));
    entry
}

/// The suffix entry itself.
pub fn root_entry(tree: &DirectoryTree) -> Entry {
    let dn = tree.suffix().to_string();
    let mut entry = Entry::new(dn.clone());
    entry.push("objectClass", ["top", "domain"]);
    entry.push("dc", [tree.domain_component()]);
    push_operational(&mut entry, tree, Audit::structural(dn, "domain"));
    entry
}

struct Audit<'a> {
    dn: String,
    uuid: String,
    structural: &'static str,
    has_subordinates: bool,
    created_at: Option<&'a DateTime<Utc>>,
    created_by: &'a str,
    updated_at: Option<&'a DateTime<Utc>>,
    updated_by: &'a str,
}

impl Audit<'_> {
    fn structural(dn: String, structural: &'static str) -> Self {
        Self {
            dn,
            uuid: String::new(),
            structural,
            has_subordinates: true,
            created_at: None,
            created_by: "",
            updated_at: None,
            updated_by: "",
        }
    }
}

fn push_operational(entry: &mut Entry, tree: &DirectoryTree, audit: Audit<'_>) {
    let actor_dn = |name: &str| non_empty(name).map(|name| tree.user_dn(name).to_string());

    entry.push_operational("structuralObjectClass", [audit.structural]);
    entry.push_operational("entryUUID", non_empty(&audit.uuid));
    entry.push_operational("entryDN", [audit.dn]);
    entry.push_operational("creatorsName", actor_dn(audit.created_by));
    entry.push_operational("createTimestamp", audit.created_at.map(generalized_time));
    entry.push_operational("modifiersName", actor_dn(audit.updated_by));
    entry.push_operational("modifyTimestamp", audit.updated_at.map(generalized_time));
    entry.push_operational("subschemaSubentry", [SUBSCHEMA]);
    entry.push_operational(
        "hasSubordinates",
        [if audit.has_subordinates { "TRUE" } else { "FALSE" }],
    );
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use glim_entity::GroupRef;
    use uuid::Uuid;

    use super::*;

    fn tree() -> DirectoryTree {
        DirectoryTree::new("dc=example,dc=org").unwrap()
    }

    fn user() -> User {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 17, 5, 2).unwrap();
        User {
            uid: 3,
            uuid: Uuid::new_v4(),
            username: "saul".into(),
            firstname: "Saul".into(),
            lastname: "Goodman".into(),
            email: String::new(),
            ssh_public_key: String::new(),
            jpeg_photo: String::new(),
            manager: false,
            readonly: false,
            locked: false,
            password_hash: "hash".into(),
            created_at: at,
            updated_at: at,
            created_by: "admin".into(),
            updated_by: "admin".into(),
            member_of: vec![GroupRef {
                gid: 1,
                name: "developers".into(),
                description: String::new(),
            }],
        }
    }

    fn names(entry: &SearchEntry) -> Vec<&str> {
        entry.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_user_projection() {
        let entry = user_entry(&tree(), &user(), true);
        assert_eq!(entry.dn(), "uid=saul,ou=Users,dc=example,dc=org");
        assert_eq!(entry.values("CN"), ["Saul Goodman"]);
        assert_eq!(entry.values("sn"), ["Goodman"]);
        assert!(entry.values("mail").is_empty());
        assert_eq!(
            entry.values("memberOf"),
            ["cn=developers,ou=Groups,dc=example,dc=org"]
        );
        assert_eq!(entry.values("createTimestamp"), ["20240309170502Z"]);
        assert_eq!(
            entry.values("creatorsName"),
            ["uid=admin,ou=Users,dc=example,dc=org"]
        );

        let hidden = user_entry(&tree(), &user(), false);
        assert!(hidden.values("memberOf").is_empty());
    }

    #[test]
    fn test_selection_defaults_to_user_attributes() {
        let entry = user_entry(&tree(), &user(), true);
        let rendered = entry.to_search_entry(&AttributeSelection::from_request(&[]), false);
        assert_eq!(
            names(&rendered),
            ["objectClass", "uid", "cn", "sn", "givenName", "memberOf"]
        );
    }

    #[test]
    fn test_selection_of_operational_and_named() {
        let entry = user_entry(&tree(), &user(), true);
        let selection = AttributeSelection::from_request(&["uid".into(), "+".into()]);
        let rendered = entry.to_search_entry(&selection, false);
        let rendered = names(&rendered);
        assert!(rendered.contains(&"uid"));
        assert!(rendered.contains(&"entryUUID"));
        assert!(rendered.contains(&"modifyTimestamp"));
        assert!(!rendered.contains(&"cn"));

        let selection = AttributeSelection::from_request(&["ENTRYDN".into()]);
        let rendered = entry.to_search_entry(&selection, false);
        assert_eq!(rendered.attributes[0].values, ["uid=saul,ou=Users,dc=example,dc=org"]);
    }

    #[test]
    fn test_no_attributes_and_types_only() {
        let entry = user_entry(&tree(), &user(), true);
        let none = entry.to_search_entry(&AttributeSelection::from_request(&["1.1".into()]), false);
        assert!(none.attributes.is_empty());

        let types = entry.to_search_entry(&AttributeSelection::from_request(&["*".into()]), true);
        assert!(!types.attributes.is_empty());
        assert!(types.attributes.iter().all(|a| a.values.is_empty()));
    }

    #[test]
    fn test_container_entries() {
        let users = users_entry(&tree());
        assert_eq!(users.dn(), "ou=Users,dc=example,dc=org");
        assert_eq!(users.values("objectClass"), ["top", "organizationalUnit"]);
        assert_eq!(users.values("hasSubordinates"), ["TRUE"]);
        assert!(users.values("entryUUID").is_empty());

        let root = root_entry(&tree());
        assert_eq!(root.values("dc"), ["example"]);
    }
}
