//! Home-screen recommendations: daily quest, suggested track and career path.
//!
//! The content service proposes ids; they are resolved here against the
//! user's own catalog. Ids that do not resolve degrade to "no recommendation"
//! for that slot. When the service has nothing to offer, a local fallback
//! picks from the first incomplete work.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use skillmint_common::{CareerPathId, ChallengeId, SkillTrackId};

use crate::catalog::{CareerPath, Challenge, SkillTrack};

/// A challenge suggested for today, with its owning track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuest {
    /// The suggested challenge.
    pub challenge: Challenge,
    /// Owning track id.
    pub skill_track_id: SkillTrackId,
    /// Owning track title.
    pub skill_track_title: String,
}

impl DailyQuest {
    fn new(track: &SkillTrack, challenge: &Challenge) -> Self {
        Self {
            challenge: challenge.clone(),
            skill_track_id: track.id.clone(),
            skill_track_title: track.title.clone(),
        }
    }
}

/// Ids proposed by the content service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationIds {
    /// Challenge for the daily quest.
    pub daily_quest_challenge_id: Option<ChallengeId>,
    /// Track to recommend.
    pub recommended_skill_id: Option<SkillTrackId>,
    /// Career path to recommend.
    pub recommended_career_path_id: Option<CareerPathId>,
}

/// What the recommender gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationInput<'a> {
    /// All tracks, static and generated.
    pub tracks: &'a [SkillTrack],
    /// Completed challenge ids.
    pub completed: &'a HashSet<ChallengeId>,
    /// Known career paths.
    pub career_paths: &'a [CareerPath],
}

impl<'a> RecommendationInput<'a> {
    /// Incomplete challenges with their tracks, in catalog order.
    #[must_use]
    pub fn incomplete_challenges(&self) -> Vec<(&'a SkillTrack, &'a Challenge)> {
        let completed = self.completed;
        self.tracks
            .iter()
            .flat_map(move |track| {
                track
                    .challenges
                    .iter()
                    .filter(move |c| !completed.contains(&c.id))
                    .map(move |c| (track, c))
            })
            .collect()
    }

    /// Tracks with at least one incomplete challenge.
    #[must_use]
    pub fn incomplete_tracks(&self) -> Vec<&'a SkillTrack> {
        let completed = self.completed;
        self.tracks
            .iter()
            .filter(|track| !track.challenges.iter().all(|c| completed.contains(&c.id)))
            .collect()
    }
}

/// The three transient recommendation slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomeRecommendations {
    /// Suggested challenge for today.
    pub daily_quest: Option<DailyQuest>,
    /// Suggested track.
    pub recommended_skill: Option<SkillTrack>,
    /// Suggested career path.
    pub recommended_career_path: Option<CareerPath>,
}

impl HomeRecommendations {
    /// No recommendations at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Resolves service-proposed ids against the catalog.
    ///
    /// The daily quest must be an incomplete challenge; the track and career
    /// path only need to exist.
    #[must_use]
    pub fn resolve(ids: &RecommendationIds, input: &RecommendationInput<'_>) -> Self {
        let daily_quest = ids.daily_quest_challenge_id.as_ref().and_then(|id| {
            input
                .incomplete_challenges()
                .into_iter()
                .find(|(_, c)| &c.id == id)
                .map(|(track, c)| DailyQuest::new(track, c))
        });

        let recommended_skill = ids
            .recommended_skill_id
            .as_ref()
            .and_then(|id| input.tracks.iter().find(|t| &t.id == id))
            .cloned();

        let recommended_career_path = ids
            .recommended_career_path_id
            .as_ref()
            .and_then(|id| input.career_paths.iter().find(|p| &p.id == id))
            .cloned();

        Self {
            daily_quest,
            recommended_skill,
            recommended_career_path,
        }
    }

    /// Local choice used when the service is unavailable.
    ///
    /// Picks the first incomplete challenge as the quest, prefers a different
    /// incomplete track for the suggestion, and suggests the first career path.
    #[must_use]
    pub fn fallback(input: &RecommendationInput<'_>) -> Self {
        let incomplete = input.incomplete_challenges();
        let tracks = input.incomplete_tracks();

        let Some(&(quest_track, quest_challenge)) = incomplete.first() else {
            return Self::none();
        };

        let recommended_skill = tracks
            .iter()
            .find(|t| t.id != quest_track.id)
            .or_else(|| tracks.first())
            .map(|t| (*t).clone());

        Self {
            daily_quest: Some(DailyQuest::new(quest_track, quest_challenge)),
            recommended_skill,
            recommended_career_path: input.career_paths.first().cloned(),
        }
    }

    /// Whether every slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.daily_quest.is_none()
            && self.recommended_skill.is_none()
            && self.recommended_career_path.is_none()
    }
}
