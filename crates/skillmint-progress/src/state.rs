//! The progress aggregate owned by one user session.

use std::collections::HashSet;

use chrono::NaiveDate;
use skillmint_common::{ChallengeId, SkillTrackId};

use crate::catalog::{find_track, CareerPath, SkillTrack};
use crate::leveling::{LevelProgress, BASE_XP_TO_NEXT_LEVEL};
use crate::recommendations::DailyQuest;

/// Tokens granted to a brand-new user.
pub const STARTING_TOKENS: u64 = 100;

/// All mutable progress for one user.
///
/// `selected_skill` and the three recommendation slots are transient: they
/// are never persisted and are cleared whenever progress is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    /// Spendable tokens.
    pub user_tokens: u64,
    /// Track currently open in the UI.
    pub selected_skill: Option<SkillTrack>,
    /// Completed challenges. Only ever grows.
    pub completed_challenges: HashSet<ChallengeId>,
    /// Current level, starting at 1.
    pub level: u32,
    /// XP inside the current level.
    pub xp: u64,
    /// XP needed to leave the current level.
    pub xp_to_next_level: u64,
    /// Static tracks followed by generated ones.
    pub all_skill_tracks: Vec<SkillTrack>,
    /// Tracks generated for this user. Append-only.
    pub generated_skill_tracks: Vec<SkillTrack>,
    /// Today's suggested challenge.
    pub daily_quest: Option<DailyQuest>,
    /// Suggested track.
    pub recommended_skill: Option<SkillTrack>,
    /// Suggested career path.
    pub recommended_career_path: Option<CareerPath>,
    /// Consecutive active days.
    pub xp_streak: u32,
    /// Day of the most recent completion.
    pub last_activity_date: Option<NaiveDate>,
    /// Unlocked pro tracks. Only ever grows.
    pub unlocked_pro_tracks: HashSet<SkillTrackId>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::default_initial()
    }
}

impl ProgressState {
    /// Fresh progress with an empty track list.
    #[must_use]
    pub fn default_initial() -> Self {
        Self {
            user_tokens: STARTING_TOKENS,
            selected_skill: None,
            completed_challenges: HashSet::new(),
            level: 1,
            xp: 0,
            xp_to_next_level: BASE_XP_TO_NEXT_LEVEL,
            all_skill_tracks: Vec::new(),
            generated_skill_tracks: Vec::new(),
            daily_quest: None,
            recommended_skill: None,
            recommended_career_path: None,
            xp_streak: 0,
            last_activity_date: None,
            unlocked_pro_tracks: HashSet::new(),
        }
    }

    /// Fresh progress over the given static tracks.
    #[must_use]
    pub fn with_tracks(tracks: Vec<SkillTrack>) -> Self {
        Self {
            all_skill_tracks: tracks,
            ..Self::default_initial()
        }
    }

    /// Level fields as one value.
    #[must_use]
    pub fn level_progress(&self) -> LevelProgress {
        LevelProgress {
            level: self.level,
            xp: self.xp,
            xp_to_next_level: self.xp_to_next_level,
        }
    }

    /// Whether a challenge has been completed.
    #[must_use]
    pub fn is_completed(&self, id: &ChallengeId) -> bool {
        self.completed_challenges.contains(id)
    }

    /// Whether the user holds at least `cost` tokens.
    #[must_use]
    pub fn can_afford(&self, cost: u64) -> bool {
        self.user_tokens >= cost
    }

    /// A track is locked when it is pro and has not been unlocked.
    #[must_use]
    pub fn is_locked(&self, track: &SkillTrack) -> bool {
        track.is_pro && !self.unlocked_pro_tracks.contains(&track.id)
    }

    /// Finds a track among all known tracks.
    #[must_use]
    pub fn track(&self, id: &SkillTrackId) -> Option<&SkillTrack> {
        find_track(&self.all_skill_tracks, id)
    }

    /// Tracks the user can open right now.
    pub fn available_tracks(&self) -> impl Iterator<Item = &SkillTrack> {
        self.all_skill_tracks.iter().filter(|t| !self.is_locked(t))
    }
}
