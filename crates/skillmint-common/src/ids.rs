//! ID types for catalog records and users.
//!
//! Catalog ids are authored strings (slugs such as `fe-1` or `frontend`), so
//! every id here is a transparent string newtype. They serialize as plain
//! strings, which keeps the persisted blob readable.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an id from its raw string form.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the raw id string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a challenge.
    ChallengeId
);

string_id!(
    /// Unique identifier for a skill track.
    SkillTrackId
);

string_id!(
    /// Unique identifier for a career path.
    CareerPathId
);

string_id!(
    /// Unique identifier for a redeemable reward.
    RewardId
);

string_id!(
    /// Identifier of a signed-in user. Scopes all persisted progress.
    UserId
);

impl UserId {
    /// Derives a user id from a display name.
    ///
    /// The derivation is deterministic: the name is lower-cased and every
    /// whitespace character becomes `_`, so "Ada Lovelace" maps to
    /// `ada_lovelace`.
    #[must_use]
    pub fn from_display_name(name: &str) -> Self {
        let id = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect::<String>();
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_from_display_name() {
        assert_eq!(UserId::from_display_name("Ada Lovelace").as_str(), "ada_lovelace");
        assert_eq!(UserId::from_display_name("  Bob\tSmith").as_str(), "__bob_smith");
        assert_eq!(UserId::from_display_name("carol").as_str(), "carol");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = ChallengeId::new("fe-1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"fe-1\"");

        let back: ChallengeId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_ids_order_by_raw_string() {
        let mut ids = vec![SkillTrackId::new("marketing"), SkillTrackId::new("design")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "design");
    }
}
