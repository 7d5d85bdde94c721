//! Derived views over progress: per-track and career completion, certificates
//! and the profile summary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use skillmint_common::{SkillTrackId, User};

use crate::catalog::{find_track, CareerPath, SkillTrack};
use crate::state::ProgressState;

/// Completion counts for one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackProgress {
    /// Completed challenges in the track.
    pub completed: usize,
    /// Challenges in the track.
    pub total: usize,
}

impl TrackProgress {
    /// Counts completed challenges of `track`.
    #[must_use]
    pub fn of(track: &SkillTrack, state: &ProgressState) -> Self {
        let completed = track
            .challenges
            .iter()
            .filter(|c| state.is_completed(&c.id))
            .count();
        Self {
            completed,
            total: track.challenges.len(),
        }
    }

    /// A track is complete when it has challenges and all are done.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    /// Completed share in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Whether every challenge of `track` is completed.
#[must_use]
pub fn is_track_complete(track: &SkillTrack, state: &ProgressState) -> bool {
    TrackProgress::of(track, state).is_complete()
}

/// Completed tracks, in catalog order.
#[must_use]
pub fn completed_tracks(state: &ProgressState) -> Vec<&SkillTrack> {
    state
        .all_skill_tracks
        .iter()
        .filter(|t| is_track_complete(t, state))
        .collect()
}

/// Progress through a career path's tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareerProgress {
    /// Tracks of the path that are complete.
    pub completed_tracks: Vec<SkillTrackId>,
    /// Tracks in the path.
    pub total_tracks: usize,
}

impl CareerProgress {
    /// Measures `path` against `state`. Unknown track ids count as incomplete.
    #[must_use]
    pub fn of(path: &CareerPath, state: &ProgressState) -> Self {
        let completed_tracks = path
            .skill_track_ids
            .iter()
            .filter(|id| {
                find_track(&state.all_skill_tracks, id).is_some_and(|t| is_track_complete(t, state))
            })
            .cloned()
            .collect();
        Self {
            completed_tracks,
            total_tracks: path.skill_track_ids.len(),
        }
    }

    /// Whether every track of the path is complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total_tracks > 0 && self.completed_tracks.len() == self.total_tracks
    }
}

/// Proof of finishing a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Holder's display name.
    pub user_name: String,
    /// Finished track.
    pub track_title: String,
    /// Issue date.
    pub issued_on: NaiveDate,
}

impl Certificate {
    /// Issues a certificate when `user` is signed in and `track` is complete.
    #[must_use]
    pub fn issue(
        user: Option<&User>,
        track: &SkillTrack,
        state: &ProgressState,
        today: NaiveDate,
    ) -> Option<Self> {
        let user = user?;
        is_track_complete(track, state).then(|| Self {
            user_name: user.name.clone(),
            track_title: track.title.clone(),
            issued_on: today,
        })
    }
}

/// Everything shown on the profile page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    /// Spendable tokens.
    pub tokens: u64,
    /// Current level.
    pub level: u32,
    /// XP inside the level.
    pub xp: u64,
    /// XP needed for the next level.
    pub xp_to_next_level: u64,
    /// Day streak.
    pub streak: u32,
    /// Number of completed challenges.
    pub completed_challenges: usize,
    /// Titles of completed tracks.
    pub completed_tracks: Vec<String>,
    /// Titles of unlocked pro tracks, in catalog order.
    pub unlocked_pro_tracks: Vec<String>,
}

impl ProfileSummary {
    /// Builds the summary from a state.
    #[must_use]
    pub fn from_state(state: &ProgressState) -> Self {
        let unlocked_pro_tracks = state
            .all_skill_tracks
            .iter()
            .filter(|t| t.is_pro && state.unlocked_pro_tracks.contains(&t.id))
            .map(|t| t.title.clone())
            .collect();

        Self {
            tokens: state.user_tokens,
            level: state.level,
            xp: state.xp,
            xp_to_next_level: state.xp_to_next_level,
            streak: state.xp_streak,
            completed_challenges: state.completed_challenges.len(),
            completed_tracks: completed_tracks(state)
                .into_iter()
                .map(|t| t.title.clone())
                .collect(),
            unlocked_pro_tracks,
        }
    }
}
