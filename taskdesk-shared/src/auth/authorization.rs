/// Access control policy for tasks
///
/// This module decides whether an authenticated identity may act on a task.
///
/// # Permission Model
///
/// 1. **ADMIN**: May read, update and delete any task
/// 2. **USER**: May read, update and delete only tasks it owns
/// 3. **Listing**: ADMIN sees every task, USER only its own
///
/// The policy is a pure function of role, caller and owner. It never touches
/// storage and never writes responses.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::authorization::{require_access, Action};
/// use taskdesk_shared::auth::middleware::AuthContext;
/// use taskdesk_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let user = AuthContext::new(Uuid::new_v4(), "user@example.com", Role::User);
/// let admin = AuthContext::new(Uuid::new_v4(), "admin@example.com", Role::Admin);
///
/// assert!(require_access(&user, owner, Action::Update).is_err());
/// assert!(require_access(&admin, owner, Action::Update).is_ok());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::Role;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller may not perform the action on this task
    #[error("Not authorized to {} this task", .action.verb())]
    Forbidden { action: Action },
}

/// Action being attempted on a single task
///
/// Only labels the denial; every action is governed by the same rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
}

impl Action {
    /// Verb used in denial messages
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Read => "view",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Outcome of a policy decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Decides whether `caller` with `role` may act on a task owned by `owner`
pub fn decide(role: Role, caller: Uuid, owner: Uuid) -> Decision {
    match role {
        Role::Admin => Decision::Allow,
        Role::User if caller == owner => Decision::Allow,
        Role::User => Decision::Deny,
    }
}

/// Checks that the caller may perform `action` on a task owned by `owner`
///
/// Shared by read, update and delete.
///
/// # Errors
///
/// Returns `AuthzError::Forbidden` when the policy denies access
pub fn require_access(auth: &AuthContext, owner: Uuid, action: Action) -> Result<(), AuthzError> {
    match decide(auth.role, auth.user_id, owner) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::warn!(
                user_id = %auth.user_id,
                owner_id = %owner,
                action = action.verb(),
                "Access denied"
            );
            Err(AuthzError::Forbidden { action })
        }
    }
}

/// Which tasks a listing may return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Every task in the system
    All,

    /// Only tasks owned by this identity
    Owner(Uuid),
}

impl ListScope {
    /// Owner filter, or None for unrestricted listings
    pub fn owner(&self) -> Option<Uuid> {
        match self {
            ListScope::All => None,
            ListScope::Owner(id) => Some(*id),
        }
    }

    /// Whether a task owned by `owner` falls inside this scope
    pub fn includes(&self, owner: Uuid) -> bool {
        match self {
            ListScope::All => true,
            ListScope::Owner(id) => *id == owner,
        }
    }
}

/// Listing scope for an identity
pub fn list_scope(auth: &AuthContext) -> ListScope {
    match auth.role {
        Role::Admin => ListScope::All,
        Role::User => ListScope::Owner(auth.user_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Role) -> AuthContext {
        AuthContext::new(Uuid::new_v4(), "someone@example.com", role)
    }

    #[test]
    fn test_admin_allowed_on_any_task() {
        let admin = Uuid::new_v4();
        assert_eq!(decide(Role::Admin, admin, Uuid::new_v4()), Decision::Allow);
        assert_eq!(decide(Role::Admin, admin, admin), Decision::Allow);
    }

    #[test]
    fn test_user_allowed_only_on_own_task() {
        let user = Uuid::new_v4();
        assert_eq!(decide(Role::User, user, user), Decision::Allow);
        assert_eq!(decide(Role::User, user, Uuid::new_v4()), Decision::Deny);
    }

    #[test]
    fn test_require_access_labels_denial() {
        let user = ctx(Role::User);
        let other = Uuid::new_v4();

        for action in [Action::Read, Action::Update, Action::Delete] {
            let err = require_access(&user, other, action).unwrap_err();
            assert_eq!(err, AuthzError::Forbidden { action });
        }

        assert!(require_access(&user, user.user_id, Action::Delete).is_ok());
    }

    #[test]
    fn test_authz_error_display() {
        let err = AuthzError::Forbidden { action: Action::Read };
        assert_eq!(err.to_string(), "Not authorized to view this task");

        let err = AuthzError::Forbidden { action: Action::Delete };
        assert_eq!(err.to_string(), "Not authorized to delete this task");
    }

    #[test]
    fn test_list_scope() {
        let admin = ctx(Role::Admin);
        assert_eq!(list_scope(&admin), ListScope::All);
        assert_eq!(list_scope(&admin).owner(), None);

        let user = ctx(Role::User);
        let scope = list_scope(&user);
        assert_eq!(scope.owner(), Some(user.user_id));
        assert!(scope.includes(user.user_id));
        assert!(!scope.includes(Uuid::new_v4()));
        assert!(ListScope::All.includes(Uuid::new_v4()));
    }
}
