//! Search over the projected directory.
//!
//! Candidates are chosen from the base node and scope, projected, then
//! filtered. Both bootstrap accounts stay out of `ou=Users` listings but
//! remain reachable by their own DN.

use std::time::Duration;

use tracing::{debug, error};

use glim_core::error::AppError;
use glim_entity::{ADMIN_USERNAME, SEARCH_USERNAME};

use crate::dn::Dn;
use crate::entry::{self, AttributeSelection, Entry};
use crate::handler::LdapHandler;
use crate::protocol::{LdapResult, ResultCode, Scope, SearchEntry, SearchRequest};
use crate::session::{BoundIdentity, Session};
use crate::tree::Node;

/// Run a search, returning the entries to send and the final result.
pub async fn search(
    handler: &LdapHandler,
    session: &Session,
    request: &SearchRequest,
) -> (Vec<SearchEntry>, LdapResult) {
    let Some(identity) = session.identity() else {
        return (
            Vec::new(),
            LdapResult::new(
                ResultCode::InsufficientAccessRights,
                "anonymous search is not allowed",
            ),
        );
    };

    let base = match Dn::parse(&request.base) {
        Ok(base) => base,
        Err(e) => {
            return (
                Vec::new(),
                LdapResult::new(ResultCode::InvalidDnSyntax, e.to_string()),
            );
        }
    };
    let Some(node) = handler.tree.locate(&base) else {
        let matched = if base.relative_to(handler.tree.suffix()).is_some() {
            handler.tree.suffix().to_string()
        } else {
            String::new()
        };
        return (
            Vec::new(),
            LdapResult::new(ResultCode::NoSuchObject, "no such object").with_matched_dn(matched),
        );
    };

    let candidates = candidates(handler, identity, &node, request.scope);
    let candidates = match time_limit(request) {
        Some(limit) => match tokio::time::timeout(limit, candidates).await {
            Ok(result) => result,
            Err(_) => {
                return (
                    Vec::new(),
                    LdapResult::new(ResultCode::TimeLimitExceeded, "time limit exceeded"),
                );
            }
        },
        None => candidates.await,
    };
    let candidates = match candidates {
        Ok(candidates) => candidates,
        Err(result) => return (Vec::new(), result),
    };

    let selection = AttributeSelection::from_request(&request.attributes);
    let mut entries: Vec<SearchEntry> = candidates
        .iter()
        .filter(|entry| request.filter.matches(entry))
        .map(|entry| entry.to_search_entry(&selection, request.types_only))
        .collect();

    let mut result = LdapResult::success();
    if let Some(limit) = size_limit(request.size_limit, handler.size_limit) {
        if entries.len() > limit {
            entries.truncate(limit);
            result = LdapResult::new(ResultCode::SizeLimitExceeded, "size limit exceeded");
        }
    }

    debug!(
        base = %request.base,
        scope = ?request.scope,
        filter = %request.filter,
        entries = entries.len(),
        user = %identity.username,
        "LDAP search"
    );
    (entries, result)
}

/// The smaller of the client and server limits, ignoring zeroes.
fn size_limit(requested: i64, configured: u32) -> Option<usize> {
    let requested = usize::try_from(requested).ok().filter(|n| *n > 0);
    let configured = usize::try_from(configured).ok().filter(|n| *n > 0);
    match (requested, configured) {
        (Some(r), Some(c)) => Some(r.min(c)),
        (r, c) => r.or(c),
    }
}

fn time_limit(request: &SearchRequest) -> Option<Duration> {
    u64::try_from(request.time_limit)
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

async fn candidates(
    handler: &LdapHandler,
    identity: &BoundIdentity,
    node: &Node,
    scope: Scope,
) -> Result<Vec<Entry>, LdapResult> {
    let tree = &handler.tree;
    match (node, scope) {
        (Node::Root, Scope::BaseObject) => Ok(vec![entry::root_entry(tree)]),
        (Node::Root, Scope::SingleLevel) => {
            Ok(vec![entry::users_entry(tree), entry::groups_entry(tree)])
        }
        (Node::Root, Scope::WholeSubtree) => {
            let mut entries = vec![entry::users_entry(tree), entry::groups_entry(tree)];
            entries.extend(listed_users(handler, identity).await?);
            entries.extend(listed_groups(handler).await?);
            Ok(entries)
        }
        (Node::Users, Scope::BaseObject) => Ok(vec![entry::users_entry(tree)]),
        (Node::Users, _) => listed_users(handler, identity).await,
        (Node::Groups, Scope::BaseObject) => Ok(vec![entry::groups_entry(tree)]),
        (Node::Groups, _) => listed_groups(handler).await,
        (Node::User(username), scope) => {
            let user = handler
                .users
                .find_by_username(username)
                .await
                .map_err(internal)?
                .ok_or_else(|| missing(handler, node))?;
            if scope == Scope::SingleLevel {
                return Ok(Vec::new());
            }
            let with_member_of = identity.can_see_memberships_of(&user.username);
            Ok(vec![entry::user_entry(tree, &user, with_member_of)])
        }
        (Node::Group(name), scope) => {
            let group = handler
                .groups
                .find_by_name(name)
                .await
                .map_err(internal)?
                .ok_or_else(|| missing(handler, node))?;
            if scope == Scope::SingleLevel {
                return Ok(Vec::new());
            }
            Ok(vec![entry::group_entry(tree, &group)])
        }
    }
}

async fn listed_users(
    handler: &LdapHandler,
    identity: &BoundIdentity,
) -> Result<Vec<Entry>, LdapResult> {
    let users = handler.users.list_all().await.map_err(internal)?;
    Ok(users
        .iter()
        .filter(|user| user.username != ADMIN_USERNAME && user.username != SEARCH_USERNAME)
        .map(|user| {
            let with_member_of = identity.can_see_memberships_of(&user.username);
            entry::user_entry(&handler.tree, user, with_member_of)
        })
        .collect())
}

async fn listed_groups(handler: &LdapHandler) -> Result<Vec<Entry>, LdapResult> {
    let groups = handler.groups.list_all().await.map_err(internal)?;
    Ok(groups
        .iter()
        .map(|group| entry::group_entry(&handler.tree, group))
        .collect())
}

fn missing(handler: &LdapHandler, node: &Node) -> LdapResult {
    LdapResult::new(ResultCode::NoSuchObject, "no such object")
        .with_matched_dn(handler.tree.parent_dn(node).to_string())
}

fn internal(err: AppError) -> LdapResult {
    error!(error = %err, "LDAP search failed");
    LdapResult::from(&err)
}
