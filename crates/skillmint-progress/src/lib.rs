//! # SkillMint Progress
//!
//! The gamified progress engine behind SkillMint.
//!
//! This crate provides:
//! - The static catalog of skill tracks, career paths and rewards
//! - A pure reducer over [`ProgressState`] driven by [`Action`]s
//! - Leveling, daily streaks and notifications
//! - Checksummed persistence with a background save writer
//! - Challenge evaluation and recommendations behind [`ContentService`]
//! - [`ProgressSession`], tying the above together for one signed-in user

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod action;
pub mod catalog;
pub mod evaluation;
pub mod leveling;
pub mod notification;
pub mod persistence;
pub mod profile;
pub mod recommendations;
pub mod reducer;
pub mod session;
pub mod state;
pub mod store;
pub mod streak;
pub mod writer;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::catalog::{
        merge_skill_tracks, CareerPath, Catalog, CatalogError, CatalogResult, Challenge,
        ChallengeKind, Reward, SkillCategory, SkillTrack,
    };
    pub use crate::evaluation::{ContentService, OfflineContentService, Verdict};
    pub use crate::leveling::LevelProgress;
    pub use crate::notification::{Notification, NotificationKind, Severity, ToastQueue};
    pub use crate::persistence::{
        PersistError, PersistResult, PersistedProgress, ProgressPersistence,
    };
    pub use crate::profile::{Certificate, ProfileSummary, TrackProgress};
    pub use crate::recommendations::{DailyQuest, HomeRecommendations, RecommendationIds};
    pub use crate::reducer::{reduce, Outcome, RejectReason, Transition};
    pub use crate::session::{Dispatch, ProgressSession, SessionError, SessionResult};
    pub use crate::state::ProgressState;
    pub use crate::store::{FileStore, MemoryStore, ProgressStore, StoreError};
    pub use crate::streak::{Clock, FixedClock, SystemClock};
    pub use crate::writer::SaveWriter;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state_matches_fresh_persisted() {
        let state = ProgressState::default_initial();
        assert_eq!(PersistedProgress::from_state(&state), PersistedProgress::default());
    }
}
