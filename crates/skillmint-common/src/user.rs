//! Signed-in user identity.

use serde::{Deserialize, Serialize};

use crate::error::{SkillMintError, SkillMintResult};
use crate::ids::UserId;

/// A signed-in user. The id is derived from the display name and is the
/// identity boundary for persisted progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Derived user id.
    pub id: UserId,
    /// Display name as entered at sign-in.
    pub name: String,
}

impl User {
    /// Signs in a user by display name.
    ///
    /// Blank names are rejected because they would collapse to an id made only
    /// of underscores (or an empty id) and collide across accounts.
    pub fn from_display_name(name: &str) -> SkillMintResult<Self> {
        if name.trim().is_empty() {
            return Err(SkillMintError::InvalidUser(name.to_string()));
        }

        let user = Self {
            id: UserId::from_display_name(name),
            name: name.to_string(),
        };
        tracing::debug!("Signed in user {} as {}", user.name, user.id);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_display_name() {
        let user = User::from_display_name("Grace Hopper").expect("valid name");
        assert_eq!(user.id.as_str(), "grace_hopper");
        assert_eq!(user.name, "Grace Hopper");
    }

    #[test]
    fn test_user_blank_name_rejected() {
        assert!(matches!(
            User::from_display_name("   "),
            Err(SkillMintError::InvalidUser(_))
        ));
        assert!(User::from_display_name("").is_err());
    }
}
