//! Access policy: which roles may perform an action on a resource, and which
//! branch a caller's operation is confined to.
//!
//! Route handlers never inspect roles themselves. The router consults
//! [`routes::ROUTE_TABLE`] through [`authorize_route`] before a handler runs, and
//! services call [`resolve_branch_scope`] for every read or write that touches
//! branch-owned rows.

pub mod routes;

use thiserror::Error;

use crate::auth::Principal;
use crate::types::Role;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("{0}")]
    Forbidden(String),

    #[error("branch_id is required")]
    BranchRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Session,
    Branch,
    User,
    Student,
    Class,
    Course,
    Enrollment,
    Payment,
    Invoice,
    Report,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Changing a password, own or otherwise
    Credentials,
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const STAFF: &[Role] = &[Role::Admin, Role::Accountant];

/// Capability table
pub fn required_roles(resource: Resource, action: Action) -> &'static [Role] {
    use Action::*;
    use Resource::*;

    match (resource, action) {
        (Session, Read) => STAFF,
        (Session, Create) => ADMIN_ONLY,

        (Branch, Read) => STAFF,
        (Branch, Create | Update | Delete) => ADMIN_ONLY,

        (User, Read) => STAFF,
        (User, Create | Update | Delete) => ADMIN_ONLY,
        (User, Credentials) => STAFF,

        (Student | Class | Course | Enrollment | Payment | Invoice, Read | Create | Update | Delete) => STAFF,

        (Report | Dashboard, Read) => STAFF,

        _ => &[],
    }
}

pub fn authorize(principal: &Principal, resource: Resource, action: Action) -> Result<(), PolicyError> {
    let roles = required_roles(resource, action);
    if roles.contains(&principal.role) {
        return Ok(());
    }
    tracing::warn!(
        "Denied {:?} {:?} to user {} with role {}",
        action,
        resource,
        principal.user_id,
        principal.role
    );
    let required: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
    Err(PolicyError::Forbidden(if required.is_empty() {
        "Access denied".to_string()
    } else {
        format!("Access denied: requires role {}", required.join(" or "))
    }))
}

/// Looks up the route in the table and checks the caller's role. Routes missing
/// from the table are denied.
pub fn authorize_route(principal: &Principal, method: &str, path: &str) -> Result<(), PolicyError> {
    match routes::lookup(method, path) {
        Some(rule) => authorize(principal, rule.resource, rule.action),
        None => {
            tracing::warn!("No capability declared for {} {}", method, path);
            Err(PolicyError::Forbidden("Access denied".to_string()))
        }
    }
}

/// Effective branch an operation runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchScope {
    /// Admin without a branch filter
    All,
    Branch(i64),
}

impl BranchScope {
    pub fn branch_id(&self) -> Option<i64> {
        match self {
            BranchScope::All => None,
            BranchScope::Branch(id) => Some(*id),
        }
    }

    /// For writes that must land in exactly one branch
    pub fn require(self) -> Result<i64, PolicyError> {
        self.branch_id().ok_or(PolicyError::BranchRequired)
    }
}

/// Reconciles the caller's assigned branch with the branch the request asks for.
///
/// Accountants are pinned to their own branch and asking for any other one is
/// refused. Admins get exactly what they ask for, or every branch when they do
/// not ask.
pub fn resolve_branch_scope(principal: &Principal, requested: Option<i64>) -> Result<BranchScope, PolicyError> {
    match principal.role {
        Role::Admin => Ok(requested.map(BranchScope::Branch).unwrap_or(BranchScope::All)),
        Role::Accountant => {
            let assigned = principal.branch_id.ok_or_else(|| {
                tracing::warn!("Accountant {} has no assigned branch", principal.user_id);
                PolicyError::Forbidden("Unauthorized: Accountant has no assigned branch".to_string())
            })?;
            match requested {
                Some(branch_id) if branch_id != assigned => {
                    tracing::warn!(
                        "Accountant {} (branch {}) attempted access to branch {}",
                        principal.user_id,
                        assigned,
                        branch_id
                    );
                    Err(PolicyError::Forbidden(
                        "Unauthorized: Accountants can only access their assigned branch".to_string(),
                    ))
                }
                _ => Ok(BranchScope::Branch(assigned)),
            }
        }
    }
}

/// Scope for a write whose target branch may be named in the body, the query
/// string, or both. Two different branches is refused outright; otherwise the
/// named branch goes through [`resolve_branch_scope`].
pub fn resolve_write_scope(
    principal: &Principal,
    body_branch: Option<i64>,
    query_branch: Option<i64>,
) -> Result<BranchScope, PolicyError> {
    match (body_branch, query_branch) {
        (Some(body), Some(query)) if body != query => {
            tracing::warn!(
                "User {} sent branch {} in the body but branch {} in the query",
                principal.user_id,
                body,
                query
            );
            Err(PolicyError::Forbidden(
                "Unauthorized: branch_id in the body does not match the requested branch".to_string(),
            ))
        }
        _ => resolve_branch_scope(principal, body_branch.or(query_branch)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{accountant, admin};

    #[test]
    fn write_scope_takes_branch_from_body_or_query() {
        let caller = admin(1);
        assert_eq!(resolve_write_scope(&caller, Some(3), None), Ok(BranchScope::Branch(3)));
        assert_eq!(resolve_write_scope(&caller, None, Some(4)), Ok(BranchScope::Branch(4)));
        assert_eq!(resolve_write_scope(&caller, Some(4), Some(4)), Ok(BranchScope::Branch(4)));
        assert_eq!(resolve_write_scope(&caller, None, None), Ok(BranchScope::All));
    }

    #[test]
    fn write_scope_refuses_conflicting_branches() {
        assert!(matches!(resolve_write_scope(&admin(1), Some(3), Some(4)), Err(PolicyError::Forbidden(_))));
        assert!(matches!(
            resolve_write_scope(&accountant(5, 2), Some(2), Some(7)),
            Err(PolicyError::Forbidden(_))
        ));
    }

    #[test]
    fn write_scope_pins_accountant_query_branch() {
        let caller = accountant(5, 2);
        assert_eq!(resolve_write_scope(&caller, None, Some(2)), Ok(BranchScope::Branch(2)));
        assert!(matches!(resolve_write_scope(&caller, None, Some(9)), Err(PolicyError::Forbidden(_))));
        assert_eq!(resolve_write_scope(&caller, None, None), Ok(BranchScope::Branch(2)));
    }

    #[test]
    fn accountant_is_pinned_to_assigned_branch() {
        let caller = accountant(5, 2);
        assert_eq!(resolve_branch_scope(&caller, None), Ok(BranchScope::Branch(2)));
        assert_eq!(resolve_branch_scope(&caller, Some(2)), Ok(BranchScope::Branch(2)));
        for other in [1, 3, 99] {
            assert!(matches!(resolve_branch_scope(&caller, Some(other)), Err(PolicyError::Forbidden(_))));
        }
    }

    #[test]
    fn admin_request_is_honored_verbatim() {
        let caller = admin(1);
        assert_eq!(resolve_branch_scope(&caller, None), Ok(BranchScope::All));
        assert_eq!(resolve_branch_scope(&caller, Some(3)), Ok(BranchScope::Branch(3)));
    }

    #[test]
    fn writes_without_branch_need_one() {
        let scope = resolve_branch_scope(&admin(1), None).unwrap();
        assert_eq!(scope.require(), Err(PolicyError::BranchRequired));
        let scope = resolve_branch_scope(&accountant(5, 4), None).unwrap();
        assert_eq!(scope.require(), Ok(4));
    }

    #[test]
    fn accountant_without_branch_is_refused() {
        let mut caller = accountant(5, 1);
        caller.branch_id = None;
        assert!(matches!(resolve_branch_scope(&caller, None), Err(PolicyError::Forbidden(_))));
    }

    #[test]
    fn capability_table_separates_admin_only_actions() {
        let acct = accountant(5, 1);
        assert!(authorize(&acct, Resource::Branch, Action::Read).is_ok());
        assert!(authorize(&acct, Resource::Branch, Action::Create).is_err());
        assert!(authorize(&acct, Resource::User, Action::Delete).is_err());
        assert!(authorize(&acct, Resource::User, Action::Credentials).is_ok());
        assert!(authorize(&acct, Resource::Invoice, Action::Update).is_ok());
        assert!(authorize(&admin(1), Resource::User, Action::Delete).is_ok());
    }

    #[test]
    fn undeclared_capabilities_are_denied() {
        assert!(required_roles(Resource::Report, Action::Delete).is_empty());
        assert!(authorize(&admin(1), Resource::Report, Action::Delete).is_err());
        assert!(authorize_route(&admin(1), "GET", "/api/unknown").is_err());
    }
}
