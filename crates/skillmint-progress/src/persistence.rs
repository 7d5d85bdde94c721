//! Persisted progress and integrity checking.
//!
//! Only a subset of [`ProgressState`] is persisted. It is serialized to JSON,
//! checksummed, and stored as one `{data, checksum}` blob under a per-user
//! key. On load the checksum is recomputed over the stored `data` text; any
//! mismatch or parse failure discards the blob and reports "no prior
//! progress" instead of an error.
//!
//! The checksum is a 32-bit rolling hash (`h = 31 * h + unit`, wrapping, over
//! UTF-16 code units, rendered as a signed decimal). It catches accidental
//! corruption only; it is not a defence against deliberate tampering.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use skillmint_common::{ChallengeId, SkillTrackId, UserId};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::SkillTrack;
use crate::leveling::BASE_XP_TO_NEXT_LEVEL;
use crate::state::{ProgressState, STARTING_TOKENS};
use crate::store::{ProgressStore, StoreError};

/// Prefix of every progress storage key.
pub const STORAGE_KEY_PREFIX: &str = "skillmint_progress_";

/// Errors that can occur while saving or clearing progress.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage error.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The background writer is gone.
    #[error("Save writer has shut down")]
    WriterClosed,
}

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

impl From<PersistError> for skillmint_common::SkillMintError {
    fn from(err: PersistError) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Reasons a stored blob is rejected on load.
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// Envelope is not `{data, checksum}` JSON.
    #[error("Malformed progress blob: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Checksum does not match the stored data.
    #[error("Checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch {
        /// Checksum found in the blob
        stored: String,
        /// Checksum of the stored data
        computed: String,
    },

    /// Data passed the checksum but is not valid progress.
    #[error("Invalid progress data: {0}")]
    InvalidData(#[source] serde_json::Error),
}

/// The persisted subset of progress.
///
/// Missing fields take their fresh-progress defaults. Set-valued fields are
/// written as sorted sequences so the serialized text is canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedProgress {
    /// Spendable tokens.
    pub user_tokens: u64,
    /// Completed challenges.
    #[serde(serialize_with = "serialize_sorted")]
    pub completed_challenges: HashSet<ChallengeId>,
    /// Current level.
    pub level: u32,
    /// XP inside the current level.
    pub xp: u64,
    /// XP needed to leave the current level.
    pub xp_to_next_level: u64,
    /// Tracks generated for this user.
    pub generated_skill_tracks: Vec<SkillTrack>,
    /// Consecutive active days.
    pub xp_streak: u32,
    /// Day of the most recent completion.
    pub last_activity_date: Option<NaiveDate>,
    /// Unlocked pro tracks.
    #[serde(serialize_with = "serialize_sorted")]
    pub unlocked_pro_tracks: HashSet<SkillTrackId>,
}

impl Default for PersistedProgress {
    fn default() -> Self {
        Self {
            user_tokens: STARTING_TOKENS,
            completed_challenges: HashSet::new(),
            level: 1,
            xp: 0,
            xp_to_next_level: BASE_XP_TO_NEXT_LEVEL,
            generated_skill_tracks: Vec::new(),
            xp_streak: 0,
            last_activity_date: None,
            unlocked_pro_tracks: HashSet::new(),
        }
    }
}

impl PersistedProgress {
    /// Extracts the persisted subset of a state.
    #[must_use]
    pub fn from_state(state: &ProgressState) -> Self {
        Self {
            user_tokens: state.user_tokens,
            completed_challenges: state.completed_challenges.clone(),
            level: state.level,
            xp: state.xp,
            xp_to_next_level: state.xp_to_next_level,
            generated_skill_tracks: state.generated_skill_tracks.clone(),
            xp_streak: state.xp_streak,
            last_activity_date: state.last_activity_date,
            unlocked_pro_tracks: state.unlocked_pro_tracks.clone(),
        }
    }
}

fn serialize_sorted<T, S>(set: &HashSet<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize + Ord + Hash,
    S: Serializer,
{
    let mut items: Vec<&T> = set.iter().collect();
    items.sort();
    items.serialize(serializer)
}

/// On-disk envelope.
#[derive(Debug, Serialize, Deserialize)]
struct ProgressBlob {
    /// Exact serialized progress text the checksum was computed over.
    data: String,
    checksum: String,
}

/// Rolling 32-bit checksum of `text`, as a signed decimal string.
#[must_use]
pub fn checksum(text: &str) -> String {
    let mut h: i32 = 0;
    for unit in text.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    h.to_string()
}

/// Storage key for a user's progress.
#[must_use]
pub fn storage_key(user: &UserId) -> String {
    format!("{STORAGE_KEY_PREFIX}{user}")
}

/// Serializes progress into a checksummed blob.
pub fn encode_blob(progress: &PersistedProgress) -> PersistResult<String> {
    let data = serde_json::to_string(progress)?;
    let blob = ProgressBlob {
        checksum: checksum(&data),
        data,
    };
    Ok(serde_json::to_string(&blob)?)
}

/// Verifies and deserializes a blob produced by [`encode_blob`].
pub fn decode_blob(text: &str) -> Result<PersistedProgress, IntegrityError> {
    let blob: ProgressBlob = serde_json::from_str(text).map_err(IntegrityError::Malformed)?;

    let computed = checksum(&blob.data);
    if computed != blob.checksum {
        return Err(IntegrityError::ChecksumMismatch {
            stored: blob.checksum,
            computed,
        });
    }

    serde_json::from_str(&blob.data).map_err(IntegrityError::InvalidData)
}

/// Save, load and clear progress on a store, scoped by user id.
#[derive(Clone)]
pub struct ProgressPersistence {
    store: Arc<dyn ProgressStore>,
}

impl std::fmt::Debug for ProgressPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressPersistence").finish_non_exhaustive()
    }
}

impl ProgressPersistence {
    /// Creates persistence over a store.
    #[must_use]
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Writes progress for a user, replacing any previous blob.
    pub fn save(&self, user: &UserId, progress: &PersistedProgress) -> PersistResult<()> {
        let blob = encode_blob(progress)?;
        self.store.write(&storage_key(user), &blob)?;
        debug!("Saved progress for {}", user);
        Ok(())
    }

    /// Reads progress for a user.
    ///
    /// Returns `None` when there is no blob, or when the blob fails its
    /// integrity check; a failing blob is deleted. Never returns an error.
    #[must_use]
    pub fn load(&self, user: &UserId) -> Option<PersistedProgress> {
        let key = storage_key(user);

        let text = match self.store.read(&key) {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!("No stored progress for {}", user);
                return None;
            }
            Err(e) => {
                warn!("Could not read progress for {}: {}", user, e);
                return None;
            }
        };

        match decode_blob(&text) {
            Ok(progress) => {
                info!("Loaded progress for {}", user);
                Some(progress)
            }
            Err(e) => {
                warn!("Progress integrity check failed for {}: {}. Resetting.", user, e);
                if let Err(e) = self.store.remove(&key) {
                    warn!("Could not discard corrupted progress for {}: {}", user, e);
                }
                None
            }
        }
    }

    /// Deletes a user's progress. Not recoverable.
    pub fn clear(&self, user: &UserId) -> PersistResult<()> {
        self.store.remove(&storage_key(user))?;
        info!("Cleared progress for {}", user);
        Ok(())
    }
}
