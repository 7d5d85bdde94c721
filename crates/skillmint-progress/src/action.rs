//! Actions accepted by the progress reducer.

use skillmint_common::{ChallengeId, SkillTrackId};

use crate::catalog::SkillTrack;
use crate::persistence::PersistedProgress;
use crate::recommendations::HomeRecommendations;

/// Every way progress can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open a track. Not validated; front ends only offer unlocked tracks.
    SelectSkill(SkillTrack),
    /// Close the open track.
    DeselectSkill,
    /// Start over with fresh progress on the static catalog.
    ResetProgress {
        /// Static catalog tracks.
        static_tracks: Vec<SkillTrack>,
    },
    /// Replace progress with persisted progress.
    LoadProgress {
        /// Persisted subset read from storage.
        progress: PersistedProgress,
        /// Static tracks merged with the persisted generated tracks.
        all_skill_tracks: Vec<SkillTrack>,
    },
    /// Append a generated track. Ids are not de-duplicated.
    AddGeneratedSkillTrack(SkillTrack),
    /// Overwrite the three recommendation slots.
    SetHomeRecommendations(HomeRecommendations),
    /// Spend tokens to unlock a pro track.
    UnlockProTrack {
        /// Track to unlock.
        track_id: SkillTrackId,
        /// Unlock price.
        cost: u64,
    },
    /// Record a passed challenge and award its reward.
    CompleteChallenge {
        /// Challenge passed.
        challenge_id: ChallengeId,
        /// Tokens/XP to award.
        reward: u64,
    },
    /// Spend tokens on a reward. Callers pass values from a known reward.
    RedeemReward {
        /// Reward cost.
        cost: u64,
        /// Reward title.
        title: String,
    },
}

impl Action {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectSkill(_) => "SelectSkill",
            Self::DeselectSkill => "DeselectSkill",
            Self::ResetProgress { .. } => "ResetProgress",
            Self::LoadProgress { .. } => "LoadProgress",
            Self::AddGeneratedSkillTrack(_) => "AddGeneratedSkillTrack",
            Self::SetHomeRecommendations(_) => "SetHomeRecommendations",
            Self::UnlockProTrack { .. } => "UnlockProTrack",
            Self::CompleteChallenge { .. } => "CompleteChallenge",
            Self::RedeemReward { .. } => "RedeemReward",
        }
    }
}
