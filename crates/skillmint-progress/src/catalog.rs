//! Skill catalog loading and lookup.
//!
//! This module provides:
//! - Challenge, skill track, career path and reward records
//! - The built-in catalog shipped as `assets/catalog.toml`
//! - Loading a catalog override from a TOML file
//! - Catalog validation on load
//! - Merging the static tracks with a user's generated tracks

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skillmint_common::{CareerPathId, ChallengeId, RewardId, SkillTrackId};
use thiserror::Error;
use tracing::{debug, info};

/// Built-in catalog source.
const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.toml");

/// Minimum number of options a quiz needs to be answerable.
pub const MIN_QUIZ_OPTIONS: usize = 2;

/// Errors that can occur during catalog loading.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File not found.
    #[error("Catalog file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read file.
    #[error("Failed to read catalog file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse catalog TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error.
    #[error("Catalog validation error: {0}")]
    ValidationError(String),

    /// Duplicate ID.
    #[error("Duplicate {kind} ID: {id}")]
    DuplicateId {
        /// Record kind
        kind: &'static str,
        /// Offending id
        id: String,
    },
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<CatalogError> for skillmint_common::SkillMintError {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err.to_string())
    }
}

/// How a challenge is graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeKind {
    /// Free-form submission graded by the content service.
    Submission,
    /// Multiple choice, graded locally against the first option.
    Quiz,
}

/// Skill track category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillCategory {
    /// Programming tracks
    Coding,
    /// Marketing and copywriting
    DigitalMarketing,
    /// Visual design
    GraphicDesign,
    /// Spoken languages
    Language,
    /// Anything else, including generated tracks
    Other,
}

impl SkillCategory {
    /// Returns display name for the category.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Coding => "Coding",
            Self::DigitalMarketing => "Digital Marketing",
            Self::GraphicDesign => "Graphic Design",
            Self::Language => "Language",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A single challenge inside a skill track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// Unique challenge id.
    pub id: ChallengeId,
    /// Short title.
    pub title: String,
    /// Task description shown to the user.
    pub description: String,
    /// Token/XP reward for completing the challenge.
    pub reward: u64,
    /// Grading kind.
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    /// Criteria passed to the evaluator. Opaque to the progress engine.
    #[serde(default)]
    pub evaluation_criteria: String,
    /// Quiz answers; the first entry is the correct one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quiz_options: Vec<String>,
}

impl Challenge {
    /// Returns the correct quiz answer, if this is a quiz.
    #[must_use]
    pub fn correct_answer(&self) -> Option<&str> {
        match self.kind {
            ChallengeKind::Quiz => self.quiz_options.first().map(String::as_str),
            ChallengeKind::Submission => None,
        }
    }
}

/// A skill track: an ordered list of challenges on one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillTrack {
    /// Unique track id.
    pub id: SkillTrackId,
    /// Track title.
    pub title: String,
    /// One-sentence summary.
    pub description: String,
    /// Category.
    pub category: SkillCategory,
    /// Challenges in the order they should be attempted.
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    /// Icon URL or data URI.
    #[serde(default)]
    pub icon: String,
    /// Requires a one-time token unlock.
    #[serde(default)]
    pub is_pro: bool,
    /// Authored by the generation service for this user.
    #[serde(default)]
    pub is_generated: bool,
    /// Unlock price; present iff `is_pro`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_cost: Option<u64>,
}

impl SkillTrack {
    /// Finds a challenge in this track.
    #[must_use]
    pub fn challenge(&self, id: &ChallengeId) -> Option<&Challenge> {
        self.challenges.iter().find(|c| &c.id == id)
    }

    /// Total reward available in this track.
    #[must_use]
    pub fn total_reward(&self) -> u64 {
        self.challenges.iter().map(|c| c.reward).sum()
    }
}

/// A career path grouping several skill tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPath {
    /// Unique path id.
    pub id: CareerPathId,
    /// Path title.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Referenced tracks, in suggested order.
    pub skill_track_ids: Vec<SkillTrackId>,
}

/// A reward that can be redeemed for tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    /// Unique reward id.
    pub id: RewardId,
    /// Reward title.
    pub title: String,
    /// Token cost.
    pub cost: u64,
    /// Icon URL.
    #[serde(default)]
    pub icon: String,
}

/// The static, hand-authored catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Static skill tracks.
    #[serde(default)]
    pub tracks: Vec<SkillTrack>,
    /// Career paths.
    #[serde(default)]
    pub career_paths: Vec<CareerPath>,
    /// Redeemable rewards.
    #[serde(default)]
    pub rewards: Vec<Reward>,
}

impl Catalog {
    /// Loads the catalog compiled into the binary.
    pub fn builtin() -> CatalogResult<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Parses and validates a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> CatalogResult<Self> {
        let catalog: Self = toml::from_str(content)?;
        catalog.validate()?;
        debug!(
            "Parsed catalog: {} tracks, {} career paths, {} rewards",
            catalog.tracks.len(),
            catalog.career_paths.len(),
            catalog.rewards.len()
        );
        Ok(catalog)
    }

    /// Loads and validates a catalog file.
    pub fn load_from(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&content)?;
        info!("Loaded catalog from {}", path.display());
        Ok(catalog)
    }

    /// Validates ids and per-record constraints.
    pub fn validate(&self) -> CatalogResult<()> {
        let mut track_ids = HashSet::new();
        let mut challenge_ids = HashSet::new();

        for track in &self.tracks {
            if !track_ids.insert(&track.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "skill track",
                    id: track.id.to_string(),
                });
            }

            match (track.is_pro, track.unlock_cost) {
                (true, None) => {
                    return Err(CatalogError::ValidationError(format!(
                        "Pro track {} has no unlock cost",
                        track.id
                    )));
                }
                (false, Some(_)) => {
                    return Err(CatalogError::ValidationError(format!(
                        "Track {} has an unlock cost but is not pro",
                        track.id
                    )));
                }
                _ => {}
            }

            for challenge in &track.challenges {
                if !challenge_ids.insert(&challenge.id) {
                    return Err(CatalogError::DuplicateId {
                        kind: "challenge",
                        id: challenge.id.to_string(),
                    });
                }

                if challenge.kind == ChallengeKind::Quiz
                    && challenge.quiz_options.len() < MIN_QUIZ_OPTIONS
                {
                    return Err(CatalogError::ValidationError(format!(
                        "Quiz {} needs at least {MIN_QUIZ_OPTIONS} options",
                        challenge.id
                    )));
                }
            }
        }

        let mut path_ids = HashSet::new();
        for path in &self.career_paths {
            if !path_ids.insert(&path.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "career path",
                    id: path.id.to_string(),
                });
            }
            if let Some(missing) = path.skill_track_ids.iter().find(|id| !track_ids.contains(id)) {
                return Err(CatalogError::ValidationError(format!(
                    "Career path {} references unknown track {missing}",
                    path.id
                )));
            }
        }

        let mut reward_ids = HashSet::new();
        for reward in &self.rewards {
            if !reward_ids.insert(&reward.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "reward",
                    id: reward.id.to_string(),
                });
            }
            if reward.cost == 0 {
                return Err(CatalogError::ValidationError(format!(
                    "Reward {} must cost at least one token",
                    reward.id
                )));
            }
        }

        Ok(())
    }

    /// Finds a static track by id.
    #[must_use]
    pub fn track(&self, id: &SkillTrackId) -> Option<&SkillTrack> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    /// Finds a career path by id.
    #[must_use]
    pub fn career_path(&self, id: &CareerPathId) -> Option<&CareerPath> {
        self.career_paths.iter().find(|p| &p.id == id)
    }

    /// Finds a reward by id.
    #[must_use]
    pub fn reward(&self, id: &RewardId) -> Option<&Reward> {
        self.rewards.iter().find(|r| &r.id == id)
    }

    /// Combines the static tracks with a user's generated tracks.
    #[must_use]
    pub fn merged_tracks(&self, generated: &[SkillTrack]) -> Vec<SkillTrack> {
        merge_skill_tracks(&self.tracks, generated)
    }
}

/// Builds the full track list: static tracks first, then generated tracks in
/// their persisted order. Ids are assumed not to collide.
#[must_use]
pub fn merge_skill_tracks(static_tracks: &[SkillTrack], generated: &[SkillTrack]) -> Vec<SkillTrack> {
    let mut all = Vec::with_capacity(static_tracks.len() + generated.len());
    all.extend_from_slice(static_tracks);
    all.extend_from_slice(generated);
    all
}

/// Finds a track by id in a track list.
#[must_use]
pub fn find_track<'a>(tracks: &'a [SkillTrack], id: &SkillTrackId) -> Option<&'a SkillTrack> {
    tracks.iter().find(|t| &t.id == id)
}

/// Finds a challenge and its owning track in a track list.
#[must_use]
pub fn find_challenge<'a>(
    tracks: &'a [SkillTrack],
    id: &ChallengeId,
) -> Option<(&'a SkillTrack, &'a Challenge)> {
    tracks
        .iter()
        .find_map(|track| track.challenge(id).map(|challenge| (track, challenge)))
}
