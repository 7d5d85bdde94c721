//! Per-user progress session.
//!
//! A [`ProgressSession`] owns the state for whoever is signed in. It loads
//! persisted progress when the identity changes, runs every action through
//! the reducer, and queues a save after each applied action once loading has
//! finished. It also offers lookup-by-id helpers for the front end.

use std::sync::Arc;

use skillmint_common::{ChallengeId, RewardId, SkillMintError, SkillTrackId, User};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::action::Action;
use crate::catalog::{find_challenge, Catalog, SkillTrack};
use crate::evaluation::{self, completion_action, ContentService, Verdict};
use crate::notification::Notification;
use crate::persistence::{PersistError, PersistResult, PersistedProgress, ProgressPersistence};
use crate::profile::{Certificate, ProfileSummary};
use crate::recommendations::RecommendationInput;
use crate::reducer::{reduce, Outcome, Transition};
use crate::state::ProgressState;
use crate::store::ProgressStore;
use crate::streak::Clock;
use crate::writer::SaveWriter;

/// Errors from the session's lookup helpers.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No such track.
    #[error("Unknown skill track: {0}")]
    UnknownTrack(SkillTrackId),

    /// No such challenge.
    #[error("Unknown challenge: {0}")]
    UnknownChallenge(ChallengeId),

    /// No such reward.
    #[error("Unknown reward: {0}")]
    UnknownReward(RewardId),

    /// The track is free and needs no unlock.
    #[error("Skill track {0} is not a pro track")]
    NotPro(SkillTrackId),

    /// The track must be unlocked first.
    #[error("Skill track {0} is locked")]
    Locked(SkillTrackId),

    /// Persistence failure.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

impl From<SessionError> for SkillMintError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Persist(e) => e.into(),
            other => Self::Catalog(other.to_string()),
        }
    }
}

/// What one dispatched action produced.
#[derive(Debug, Clone)]
pub struct Dispatch {
    /// Applied or rejected.
    pub outcome: Outcome,
    /// Notifications to present.
    pub notifications: Vec<Notification>,
}

impl Dispatch {
    /// Whether the action was applied.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }
}

/// Result of submitting an answer.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The grader's verdict.
    pub verdict: Verdict,
    /// The completion, when the verdict passed.
    pub dispatch: Option<Dispatch>,
}

/// Progress for the signed-in user.
pub struct ProgressSession {
    catalog: Catalog,
    persistence: ProgressPersistence,
    writer: SaveWriter,
    clock: Box<dyn Clock>,
    user: Option<User>,
    state: ProgressState,
    loaded: bool,
}

impl std::fmt::Debug for ProgressSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSession")
            .field("user", &self.user)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

impl ProgressSession {
    /// Creates a signed-out session over `store`.
    pub fn new(
        catalog: Catalog,
        store: Arc<dyn ProgressStore>,
        clock: Box<dyn Clock>,
    ) -> PersistResult<Self> {
        let writer = SaveWriter::spawn(Arc::clone(&store))?;
        let state = ProgressState::with_tracks(catalog.tracks.clone());
        Ok(Self {
            catalog,
            persistence: ProgressPersistence::new(store),
            writer,
            clock,
            user: None,
            state,
            loaded: false,
        })
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Switches to `user`, loading their progress.
    ///
    /// Does nothing if `user` is already the loaded identity. Signing out
    /// (`None`) resets to fresh progress without touching storage.
    pub fn start(&mut self, user: Option<User>) -> PersistResult<()> {
        let same = match (&self.user, &user) {
            (Some(current), Some(next)) => current.id == next.id,
            (None, None) => true,
            _ => false,
        };
        if same && (self.loaded || user.is_none()) {
            return Ok(());
        }

        // Earlier saves must land before we read.
        self.writer.flush()?;
        self.loaded = false;

        let action = match &user {
            Some(u) => match self.persistence.load(&u.id) {
                Some(progress) => {
                    info!("Restoring progress for {}", u.id);
                    let all_skill_tracks = self.catalog.merged_tracks(&progress.generated_skill_tracks);
                    Action::LoadProgress {
                        progress,
                        all_skill_tracks,
                    }
                }
                None => {
                    info!("Starting fresh progress for {}", u.id);
                    self.reset_action()
                }
            },
            None => self.reset_action(),
        };

        self.apply(action);
        self.loaded = user.is_some();
        self.user = user;
        Ok(())
    }

    /// Deletes the user's stored progress and signs out.
    pub fn logout(&mut self) -> PersistResult<()> {
        if let Some(user) = self.user.take() {
            self.writer.enqueue_clear(&user.id)?;
            info!("Logged out {}", user.id);
        }
        self.loaded = false;
        let reset = self.reset_action();
        self.apply(reset);
        Ok(())
    }

    fn reset_action(&self) -> Action {
        Action::ResetProgress {
            static_tracks: self.catalog.tracks.clone(),
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Runs an action and queues a save when it changed progress.
    pub fn dispatch(&mut self, action: Action) -> Dispatch {
        let dispatch = self.apply(action);
        if dispatch.is_applied() {
            self.persist();
        }
        dispatch
    }

    fn apply(&mut self, action: Action) -> Dispatch {
        let name = action.name();
        let today = self.clock.today();
        let state = std::mem::take(&mut self.state);

        let Transition {
            state,
            notifications,
            outcome,
        } = reduce(state, action, today);
        self.state = state;

        match &outcome {
            Outcome::Applied => debug!("{} applied, {} notification(s)", name, notifications.len()),
            Outcome::Rejected(reason) => info!("{} rejected: {:?}", name, reason),
        }

        Dispatch {
            outcome,
            notifications,
        }
    }

    fn persist(&self) {
        if !self.loaded {
            return;
        }
        let Some(user) = &self.user else {
            return;
        };
        let progress = PersistedProgress::from_state(&self.state);
        if let Err(e) = self.writer.enqueue_save(&user.id, &progress) {
            error!("Failed to queue save for {}: {}", user.id, e);
        }
    }

    /// Blocks until queued saves are written.
    pub fn flush(&self) -> PersistResult<()> {
        self.writer.flush()
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Opens a track. Locked pro tracks cannot be opened.
    pub fn select_track(&mut self, track_id: &SkillTrackId) -> SessionResult<Dispatch> {
        let track = self.unlocked_track(track_id)?.clone();
        Ok(self.dispatch(Action::SelectSkill(track)))
    }

    /// Unlocks a pro track at its catalog price.
    pub fn unlock_track(&mut self, track_id: &SkillTrackId) -> SessionResult<Dispatch> {
        let track = self
            .state
            .track(track_id)
            .ok_or_else(|| SessionError::UnknownTrack(track_id.clone()))?;
        let Some(cost) = track.unlock_cost.filter(|_| track.is_pro) else {
            return Err(SessionError::NotPro(track_id.clone()));
        };
        Ok(self.dispatch(Action::UnlockProTrack {
            track_id: track_id.clone(),
            cost,
        }))
    }

    /// Redeems a catalog reward.
    pub fn redeem(&mut self, reward_id: &RewardId) -> SessionResult<Dispatch> {
        let reward = self
            .catalog
            .reward(reward_id)
            .ok_or_else(|| SessionError::UnknownReward(reward_id.clone()))?;
        let action = Action::RedeemReward {
            cost: reward.cost,
            title: reward.title.clone(),
        };
        Ok(self.dispatch(action))
    }

    /// Grades an answer and completes the challenge when it passes.
    pub fn submit(
        &mut self,
        service: &dyn ContentService,
        challenge_id: &ChallengeId,
        answer: &str,
    ) -> SessionResult<Submission> {
        let (track, challenge) = find_challenge(&self.state.all_skill_tracks, challenge_id)
            .ok_or_else(|| SessionError::UnknownChallenge(challenge_id.clone()))?;
        if self.state.is_locked(track) {
            return Err(SessionError::Locked(track.id.clone()));
        }
        let challenge = challenge.clone();

        let verdict = evaluation::evaluate(service, &challenge, answer);
        let dispatch = completion_action(&challenge, &verdict).map(|action| self.dispatch(action));
        Ok(Submission { verdict, dispatch })
    }

    /// Generates a track on `topic` and adds it. `None` when nothing was generated.
    pub fn generate_track(&mut self, service: &dyn ContentService, topic: &str) -> Option<Dispatch> {
        let titles: Vec<String> = self
            .state
            .all_skill_tracks
            .iter()
            .map(|t| t.title.clone())
            .collect();

        match service.generate_skill_track(topic, &titles) {
            Some(track) => Some(self.dispatch(Action::AddGeneratedSkillTrack(track))),
            None => {
                warn!("No skill track generated for {:?}", topic);
                None
            }
        }
    }

    /// Recomputes the home recommendations.
    pub fn refresh_recommendations(&mut self, service: &dyn ContentService) -> Dispatch {
        let recommendations = {
            let input = RecommendationInput {
                tracks: &self.state.all_skill_tracks,
                completed: &self.state.completed_challenges,
                career_paths: &self.catalog.career_paths,
            };
            evaluation::recommend(service, &input)
        };
        self.dispatch(Action::SetHomeRecommendations(recommendations))
    }

    /// Certificate for a finished track, if the user is signed in.
    pub fn certificate(&self, track_id: &SkillTrackId) -> SessionResult<Option<Certificate>> {
        let track = self
            .state
            .track(track_id)
            .ok_or_else(|| SessionError::UnknownTrack(track_id.clone()))?;
        Ok(Certificate::issue(
            self.user.as_ref(),
            track,
            &self.state,
            self.clock.today(),
        ))
    }

    fn unlocked_track(&self, track_id: &SkillTrackId) -> SessionResult<&SkillTrack> {
        let track = self
            .state
            .track(track_id)
            .ok_or_else(|| SessionError::UnknownTrack(track_id.clone()))?;
        if self.state.is_locked(track) {
            return Err(SessionError::Locked(track_id.clone()));
        }
        Ok(track)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current progress.
    #[must_use]
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Static catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Whether the signed-in user's progress has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Profile summary of the current progress.
    #[must_use]
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary::from_state(&self.state)
    }

    /// Replaces the clock.
    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::evaluation::OfflineContentService;
    use crate::notification::NotificationKind;
    use crate::persistence::storage_key;
    use crate::reducer::RejectReason;
    use crate::store::{FileStore, MemoryStore};
    use crate::streak::FixedClock;

    const QUIZ_ANSWER: &str = "To create visual balance";

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date") + chrono::Duration::days(offset)
    }

    fn session(store: &Arc<MemoryStore>) -> ProgressSession {
        let catalog = Catalog::builtin().expect("builtin catalog is valid");
        ProgressSession::new(catalog, store.clone(), Box::new(FixedClock(day(0))))
            .expect("session")
    }

    fn ada() -> User {
        User::from_display_name("Ada").expect("valid user")
    }

    #[test]
    fn test_signed_out_session_does_not_save() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        session.start(None).expect("start");

        let submission = session
            .submit(&OfflineContentService, &"gd-2".into(), QUIZ_ANSWER)
            .expect("submit");
        assert!(submission.verdict.passed);
        session.flush().expect("flush");

        assert_eq!(session.state().user_tokens, 125);
        assert!(store.is_empty());
    }

    #[test]
    fn test_progress_survives_new_session() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut session = session(&store);
            session.start(Some(ada())).expect("start");
            let submission = session
                .submit(&OfflineContentService, &"gd-2".into(), QUIZ_ANSWER)
                .expect("submit");
            let dispatch = submission.dispatch.expect("completed");
            assert_eq!(
                dispatch.notifications[0].kind,
                NotificationKind::ChallengeComplete { reward: 25 }
            );
        }

        let mut session = session(&store);
        session.start(Some(ada())).expect("start");
        assert!(session.is_loaded());
        assert_eq!(session.state().user_tokens, 125);
        assert_eq!(session.state().xp, 25);
        assert_eq!(session.state().xp_streak, 1);
        assert!(session.state().is_completed(&"gd-2".into()));
    }

    #[test]
    fn test_wrong_quiz_answer_changes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        session.start(Some(ada())).expect("start");

        let submission = session
            .submit(&OfflineContentService, &"gd-2".into(), "To save ink")
            .expect("submit");
        assert!(!submission.verdict.passed);
        assert!(submission.dispatch.is_none());
        assert_eq!(session.state().user_tokens, 100);
    }

    #[test]
    fn test_locked_challenge_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        session.start(Some(ada())).expect("start");

        let err = session
            .submit(&OfflineContentService, &"fe-1".into(), "code")
            .expect_err("locked");
        assert!(matches!(err, SessionError::Locked(_)));
        assert!(matches!(
            session.select_track(&"frontend".into()),
            Err(SessionError::Locked(_))
        ));
    }

    #[test]
    fn test_unlock_helper() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        session.start(Some(ada())).expect("start");

        let dispatch = session.unlock_track(&"frontend".into()).expect("known track");
        assert_eq!(
            dispatch.outcome,
            Outcome::Rejected(RejectReason::InsufficientTokens {
                needed: 250,
                have: 100
            })
        );

        assert!(matches!(
            session.unlock_track(&"marketing".into()),
            Err(SessionError::NotPro(_))
        ));
        assert!(matches!(
            session.unlock_track(&"ghost".into()),
            Err(SessionError::UnknownTrack(_))
        ));
    }

    #[test]
    fn test_redeem_helper() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        session.start(Some(ada())).expect("start");

        let dispatch = session.redeem(&"voucher-10".into()).expect("known reward");
        assert!(!dispatch.is_applied());
        assert!(dispatch.notifications.is_empty());
        assert!(matches!(
            session.redeem(&"yacht".into()),
            Err(SessionError::UnknownReward(_))
        ));
    }

    #[test]
    fn test_generated_track_reloads_after_static() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut session = session(&store);
            session.start(Some(ada())).expect("start");
            let dispatch = session
                .generate_track(&OfflineContentService, "Rust")
                .expect("generated");
            assert!(dispatch.is_applied());
        }

        let mut session = session(&store);
        session.start(Some(ada())).expect("start");
        let tracks = &session.state().all_skill_tracks;
        assert_eq!(tracks.len(), 5);
        assert_eq!(tracks[4].title, "Intro to Rust");
        assert!(tracks[4].is_generated);
        assert_eq!(session.state().generated_skill_tracks.len(), 1);
    }

    #[test]
    fn test_logout_clears_storage() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        session.start(Some(ada())).expect("start");
        session
            .submit(&OfflineContentService, &"gd-2".into(), QUIZ_ANSWER)
            .expect("submit");
        session.flush().expect("flush");
        assert_eq!(store.len(), 1);

        session.logout().expect("logout");
        session.flush().expect("flush");
        assert!(store.is_empty());
        assert!(session.user().is_none());
        assert_eq!(session.state().user_tokens, 100);
    }

    #[test]
    fn test_users_are_isolated() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        session.start(Some(ada())).expect("start");
        session
            .submit(&OfflineContentService, &"gd-2".into(), QUIZ_ANSWER)
            .expect("submit");

        let grace = User::from_display_name("Grace").expect("valid user");
        session.start(Some(grace)).expect("switch user");
        assert_eq!(session.state().user_tokens, 100);

        session.start(Some(ada())).expect("switch back");
        assert_eq!(session.state().user_tokens, 125);
    }

    #[test]
    fn test_punctuated_name_persists_in_file_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store: Arc<dyn ProgressStore> = Arc::new(FileStore::new(dir.path()));
        let catalog = Catalog::builtin().expect("builtin catalog is valid");
        let user = User::from_display_name("AC/DC").expect("valid user");

        {
            let mut session = ProgressSession::new(
                catalog.clone(),
                Arc::clone(&store),
                Box::new(FixedClock(day(0))),
            )
            .expect("session");
            session.start(Some(user.clone())).expect("start");
            session
                .submit(&OfflineContentService, &"gd-2".into(), QUIZ_ANSWER)
                .expect("submit");
            assert_eq!(session.state().user_tokens, 125);
        }

        let mut session = ProgressSession::new(catalog, store, Box::new(FixedClock(day(0))))
            .expect("session");
        session.start(Some(user)).expect("start");
        assert_eq!(session.state().user_tokens, 125);
        assert!(session.state().is_completed(&"gd-2".into()));
    }

    #[test]
    fn test_corrupted_blob_starts_fresh() {
        let store = Arc::new(MemoryStore::new());
        let key = storage_key(&ada().id);
        store.write(&key, "{\"data\":\"{}\",\"checksum\":\"1\"}").expect("write");

        let mut session = session(&store);
        session.start(Some(ada())).expect("start");
        assert_eq!(session.state().user_tokens, 100);
        assert!(store.read(&key).expect("read").is_none());
    }

    #[test]
    fn test_streak_across_days() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        session.start(Some(ada())).expect("start");

        session
            .submit(&OfflineContentService, &"gd-2".into(), QUIZ_ANSWER)
            .expect("submit");
        session.set_clock(Box::new(FixedClock(day(1))));
        let dispatch = session
            .dispatch(Action::CompleteChallenge {
                challenge_id: "es-1".into(),
                reward: 50,
            });
        assert!(dispatch
            .notifications
            .iter()
            .any(|n| n.kind == NotificationKind::StreakIncremented { count: 2 }));
        assert_eq!(session.state().last_activity_date, Some(day(1)));
    }

    #[test]
    fn test_refresh_recommendations() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        session.start(Some(ada())).expect("start");

        session.refresh_recommendations(&OfflineContentService);
        let quest = session.state().daily_quest.clone().expect("daily quest");
        assert_eq!(quest.challenge.id, ChallengeId::new("fe-1"));
        assert!(session.state().recommended_career_path.is_some());
    }

    #[test]
    fn test_certificate() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        assert!(session.certificate(&"language".into()).expect("known").is_none());

        session.start(Some(ada())).expect("start");
        session.dispatch(Action::CompleteChallenge {
            challenge_id: "es-1".into(),
            reward: 50,
        });
        let cert = session
            .certificate(&"language".into())
            .expect("known")
            .expect("eligible");
        assert_eq!(cert.user_name, "Ada");
        assert_eq!(cert.issued_on, day(0));
    }
}
