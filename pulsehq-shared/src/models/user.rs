/// Team member model and workspace roles
///
/// Users are the members of the single workspace. Their role drives the
/// permission checks in [`crate::auth::authorization`].
///
/// # Roles
///
/// - **owner**: Full control, including granting the owner role
/// - **admin**: Manage members and invitations
/// - **member**: Work on tasks, contacts and chat
///
/// # Example
///
/// ```
/// use pulsehq_shared::models::user::{User, UserRole};
///
/// let user = User::new("u1", "Jane Smith", "jane@example.com", UserRole::Admin);
/// assert!(user.role.is_admin());
/// assert!(!user.role.is_owner());
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Workspace role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Workspace owner
    Owner,

    /// Can manage members
    Admin,

    /// Regular member
    #[default]
    Member,
}

impl UserRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Owner => "owner",
            UserRole::Admin => "admin",
            UserRole::Member => "member",
        }
    }

    /// Owner or admin
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Owner | UserRole::Admin)
    }

    /// Owner only
    pub fn is_owner(&self) -> bool {
        matches!(self, UserRole::Owner)
    }

    /// Checks if this role has at least the permission level of `required`
    ///
    /// Hierarchy: Owner > Admin > Member
    pub fn has_permission(&self, required: &UserRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            UserRole::Owner => 3,
            UserRole::Admin => 2,
            UserRole::Member => 1,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Team member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    /// Display name
    pub name: String,

    pub email: String,

    /// Workspace role. Sample data carried job titles here, which fall back
    /// to `member`.
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: UserRole,

    /// Optional avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

fn lenient_role<'de, D>(deserializer: D) -> Result<UserRole, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("owner") => UserRole::Owner,
        Some("admin") => UserRole::Admin,
        _ => UserRole::Member,
    })
}

/// Partial update for a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    /// Use `Some(None)` to clear
    pub avatar: Option<Option<String>>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            avatar: None,
        }
    }

    pub fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(avatar) = &patch.avatar {
            self.avatar = avatar.clone();
        }
    }
}
