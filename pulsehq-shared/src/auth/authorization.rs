/// Authorization helpers and permission checks
///
/// Role-based access control for the single workspace. Checks take the
/// signed-in [`Profile`] (or `None` while signed out) and return `Ok(())`
/// or an [`AuthzError`] describing what was missing.
///
/// # Permission Model
///
/// 1. **Signed in**: every check fails with `NotAuthenticated` without a profile
/// 2. **Workspace**: a profile must carry a workspace id to touch workspace data
/// 3. **Role**: Owner > Admin > Member, see [`Permission::min_role`]
/// 4. **Role grants**: only an owner may grant the owner role
///
/// # Example
///
/// ```
/// use pulsehq_shared::auth::authorization::{require_permission, Permission};
/// use pulsehq_shared::auth::identity::{Identity, UserMetadata};
/// use pulsehq_shared::auth::profile::derive_profile;
///
/// let profile = derive_profile(&Identity {
///     id: "u1".to_string(),
///     email: "alice@x.com".to_string(),
///     user_metadata: UserMetadata::default(),
///     email_confirmed_at: None,
/// });
///
/// assert!(require_permission(Some(&profile), Permission::ManageUsers).is_ok());
/// assert!(require_permission(None, Permission::View).is_err());
/// ```

use super::profile::Profile;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// No signed-in profile
    #[error("Authentication required")]
    NotAuthenticated,

    /// Profile is not attached to a workspace
    #[error("No workspace found")]
    NoWorkspace,

    /// Profile doesn't have the required role
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: UserRole, actual: UserRole },

    /// Non-owner tried to grant the owner role
    #[error("Only the workspace owner can grant the owner role")]
    OwnerGrantRequiresOwner,
}

/// Permission types for authorization checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// See boards, contacts and chat (Member+)
    View,

    /// Create, edit and delete records (Member+)
    Edit,

    /// Invite members and change their roles (Admin+)
    ManageUsers,

    /// Workspace settings (Owner only)
    ManageWorkspace,
}

impl Permission {
    /// Gets the minimum role required for this permission
    pub fn min_role(&self) -> UserRole {
        match self {
            Permission::View | Permission::Edit => UserRole::Member,
            Permission::ManageUsers => UserRole::Admin,
            Permission::ManageWorkspace => UserRole::Owner,
        }
    }
}

fn signed_in(profile: Option<&Profile>) -> Result<&Profile, AuthzError> {
    profile.ok_or(AuthzError::NotAuthenticated)
}

/// Checks that the profile has at least `required`
///
/// # Errors
///
/// - `AuthzError::NotAuthenticated` without a profile
/// - `AuthzError::InsufficientRole` if the role is too low
pub fn require_role(profile: Option<&Profile>, required: UserRole) -> Result<(), AuthzError> {
    let profile = signed_in(profile)?;

    if !profile.role.has_permission(&required) {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: profile.role,
        });
    }

    Ok(())
}

/// Checks that the profile holds `permission`
pub fn require_permission(profile: Option<&Profile>, permission: Permission) -> Result<(), AuthzError> {
    require_role(profile, permission.min_role())
}

/// Returns the workspace id of the signed-in profile
pub fn require_workspace(profile: Option<&Profile>) -> Result<&str, AuthzError> {
    let profile = signed_in(profile)?;

    if profile.workspace_id.is_empty() {
        return Err(AuthzError::NoWorkspace);
    }

    Ok(&profile.workspace_id)
}

/// Checks that `actor` may assign `role` to a member
///
/// Admins may assign admin and member. Granting owner takes an owner.
pub fn check_role_assignment(actor: Option<&Profile>, role: UserRole) -> Result<(), AuthzError> {
    require_permission(actor, Permission::ManageUsers)?;

    if role.is_owner() && !signed_in(actor)?.is_owner() {
        return Err(AuthzError::OwnerGrantRequiresOwner);
    }

    Ok(())
}
