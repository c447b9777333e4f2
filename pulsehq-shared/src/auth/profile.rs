/// Profile derivation from identity claims
///
/// The profile is never fetched from a database. It is a pure function of
/// the authenticated identity, so it can be rebuilt at any time and stays
/// stable across sessions.
///
/// # Derivation Rules
///
/// - **name**: metadata `name` → metadata `full_name` → email local-part →
///   `"User"` (empty strings are skipped)
/// - **role**: always `owner` (every self-registered identity owns its
///   workspace)
/// - **workspace_id**: `ws_` + first 16 hex chars of SHA-256(user id)
/// - **workspace name**: `"{name}'s Workspace"`
///
/// # Example
///
/// ```
/// use pulsehq_shared::auth::identity::{Identity, UserMetadata};
/// use pulsehq_shared::auth::profile::derive_profile;
///
/// let identity = Identity {
///     id: "u1".to_string(),
///     email: "alice@x.com".to_string(),
///     user_metadata: UserMetadata::default(),
///     email_confirmed_at: None,
/// };
///
/// let profile = derive_profile(&identity);
/// assert_eq!(profile.name, "alice");
/// assert_eq!(profile.workspace.name, "alice's Workspace");
/// ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::identity::Identity;
use crate::models::user::UserRole;

/// Name used when the identity carries nothing better
pub const FALLBACK_NAME: &str = "User";

/// Workspace summary embedded in the profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub id: String,
    pub name: String,
}

/// UI-facing view of the authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same as the identity id
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub workspace_id: String,
    pub workspace: WorkspaceSummary,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_owner(&self) -> bool {
        self.role.is_owner()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Resolves the display name for an identity
pub fn display_name(identity: &Identity) -> String {
    let metadata = &identity.user_metadata;
    non_empty(metadata.name.as_deref())
        .or_else(|| non_empty(metadata.full_name.as_deref()))
        .or_else(|| non_empty(identity.email.split('@').next()))
        .unwrap_or(FALLBACK_NAME)
        .to_string()
}

/// Deterministic workspace id for a user id
pub fn derive_workspace_id(user_id: &str) -> String {
    let digest = Sha256::digest(user_id.as_bytes());
    let encoded = hex::encode(digest);
    format!("ws_{}", &encoded[..16])
}

/// Builds the profile for an authenticated identity
pub fn derive_profile(identity: &Identity) -> Profile {
    let name = display_name(identity);
    let workspace_id = derive_workspace_id(&identity.id);

    Profile {
        id: identity.id.clone(),
        email: identity.email.clone(),
        role: UserRole::Owner,
        workspace: WorkspaceSummary {
            id: workspace_id.clone(),
            name: format!("{name}'s Workspace"),
        },
        workspace_id,
        name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::UserMetadata;

    fn identity(email: &str, metadata: UserMetadata) -> Identity {
        Identity {
            id: "3f0c2a7e-user".to_string(),
            email: email.to_string(),
            user_metadata: metadata,
            email_confirmed_at: None,
        }
    }

    #[test]
    fn test_name_from_metadata() {
        let profile = derive_profile(&identity("alice@x.com", UserMetadata::with_name("Alice")));
        assert_eq!(profile.name, "Alice");
    }

    #[test]
    fn test_name_falls_back_to_full_name() {
        let metadata = UserMetadata {
            name: Some("  ".to_string()),
            full_name: Some("Alice Liddell".to_string()),
            ..Default::default()
        };
        assert_eq!(derive_profile(&identity("alice@x.com", metadata)).name, "Alice Liddell");
    }

    #[test]
    fn test_name_falls_back_to_email_local_part() {
        let profile = derive_profile(&identity("alice@x.com", UserMetadata::default()));
        assert_eq!(profile.name, "alice");
    }

    #[test]
    fn test_name_falls_back_to_literal() {
        let profile = derive_profile(&identity("", UserMetadata::default()));
        assert_eq!(profile.name, FALLBACK_NAME);

        let profile = derive_profile(&identity("@x.com", UserMetadata::default()));
        assert_eq!(profile.name, FALLBACK_NAME);
    }

    #[test]
    fn test_role_is_always_owner() {
        let profile = derive_profile(&identity("alice@x.com", UserMetadata::default()));
        assert_eq!(profile.role, UserRole::Owner);
        assert!(profile.is_owner());
        assert!(profile.is_admin());
    }

    #[test]
    fn test_workspace_id_is_deterministic() {
        let a = derive_workspace_id("user-1");
        let b = derive_workspace_id("user-1");
        let c = derive_workspace_id("user-2");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("ws_"));
        assert_eq!(a.len(), 3 + 16);
    }

    #[test]
    fn test_workspace_matches_profile() {
        let profile = derive_profile(&identity("alice@x.com", UserMetadata::with_name("Alice")));
        assert_eq!(profile.workspace.id, profile.workspace_id);
        assert_eq!(profile.workspace.name, "Alice's Workspace");
        assert_eq!(profile.id, "3f0c2a7e-user");
    }
}
