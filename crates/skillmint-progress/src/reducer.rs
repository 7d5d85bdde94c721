//! The progress state machine.
//!
//! [`reduce`] is a pure function from the current state, an action and the
//! current calendar date to the next state plus the notifications the
//! transition produced. Rejected actions hand back the input state untouched
//! with no notifications.

use chrono::NaiveDate;
use skillmint_common::{ChallengeId, SkillTrackId};

use crate::action::Action;
use crate::catalog::SkillTrack;
use crate::notification::{Notification, NotificationKind};
use crate::persistence::PersistedProgress;
use crate::recommendations::HomeRecommendations;
use crate::state::ProgressState;
use crate::streak::{advance_streak, StreakChange};

/// Why an action left the state unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Not enough tokens.
    InsufficientTokens {
        /// Tokens required
        needed: u64,
        /// Tokens held
        have: u64,
    },
    /// Track already unlocked.
    AlreadyUnlocked(SkillTrackId),
    /// Challenge already completed.
    AlreadyCompleted(ChallengeId),
}

/// Whether a transition changed anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action was applied.
    Applied,
    /// The action was a no-op.
    Rejected(RejectReason),
}

/// Result of one reducer step.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Next state.
    pub state: ProgressState,
    /// Notifications, in the order they were raised.
    pub notifications: Vec<Notification>,
    /// Applied or rejected.
    pub outcome: Outcome,
}

impl Transition {
    fn applied(state: ProgressState, notifications: Vec<Notification>) -> Self {
        Self {
            state,
            notifications,
            outcome: Outcome::Applied,
        }
    }

    fn rejected(state: ProgressState, reason: RejectReason) -> Self {
        Self {
            state,
            notifications: Vec::new(),
            outcome: Outcome::Rejected(reason),
        }
    }

    /// Whether the action was applied.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }
}

/// Applies one action.
#[must_use]
pub fn reduce(state: ProgressState, action: Action, today: NaiveDate) -> Transition {
    match action {
        Action::SelectSkill(track) => Transition::applied(
            ProgressState {
                selected_skill: Some(track),
                ..state
            },
            Vec::new(),
        ),

        Action::DeselectSkill => Transition::applied(
            ProgressState {
                selected_skill: None,
                ..state
            },
            Vec::new(),
        ),

        Action::ResetProgress { static_tracks } => {
            Transition::applied(ProgressState::with_tracks(static_tracks), Vec::new())
        }

        Action::LoadProgress {
            progress,
            all_skill_tracks,
        } => Transition::applied(load_progress(progress, all_skill_tracks), Vec::new()),

        Action::AddGeneratedSkillTrack(track) => {
            let notification = Notification::new(NotificationKind::SkillGenerated {
                title: track.title.clone(),
            });
            let mut next = state;
            next.all_skill_tracks.push(track.clone());
            next.generated_skill_tracks.push(track);
            Transition::applied(next, vec![notification])
        }

        Action::SetHomeRecommendations(recommendations) => {
            let HomeRecommendations {
                daily_quest,
                recommended_skill,
                recommended_career_path,
            } = recommendations;
            Transition::applied(
                ProgressState {
                    daily_quest,
                    recommended_skill,
                    recommended_career_path,
                    ..state
                },
                Vec::new(),
            )
        }

        Action::UnlockProTrack { track_id, cost } => unlock_pro_track(state, track_id, cost),

        Action::CompleteChallenge {
            challenge_id,
            reward,
        } => complete_challenge(state, challenge_id, reward, today),

        Action::RedeemReward { cost, title } => {
            if !state.can_afford(cost) {
                let have = state.user_tokens;
                return Transition::rejected(
                    state,
                    RejectReason::InsufficientTokens { needed: cost, have },
                );
            }
            let notification = Notification::new(NotificationKind::RewardRedeemed { title });
            let mut next = state;
            next.user_tokens -= cost;
            Transition::applied(next, vec![notification])
        }
    }
}

/// Defaults overlaid with persisted fields; transient slots cleared.
fn load_progress(progress: PersistedProgress, all_skill_tracks: Vec<SkillTrack>) -> ProgressState {
    let PersistedProgress {
        user_tokens,
        completed_challenges,
        level,
        xp,
        xp_to_next_level,
        generated_skill_tracks,
        xp_streak,
        last_activity_date,
        unlocked_pro_tracks,
    } = progress;

    ProgressState {
        user_tokens,
        selected_skill: None,
        completed_challenges,
        level,
        xp,
        xp_to_next_level,
        all_skill_tracks,
        generated_skill_tracks,
        daily_quest: None,
        recommended_skill: None,
        recommended_career_path: None,
        xp_streak,
        last_activity_date,
        unlocked_pro_tracks,
    }
}

fn unlock_pro_track(state: ProgressState, track_id: SkillTrackId, cost: u64) -> Transition {
    if !state.can_afford(cost) {
        let have = state.user_tokens;
        return Transition::rejected(state, RejectReason::InsufficientTokens { needed: cost, have });
    }
    if state.unlocked_pro_tracks.contains(&track_id) {
        return Transition::rejected(state, RejectReason::AlreadyUnlocked(track_id));
    }

    // A track missing from the catalog is still unlocked, just silently.
    let notifications = state
        .track(&track_id)
        .map(|track| {
            Notification::new(NotificationKind::ProUnlocked {
                title: track.title.clone(),
            })
        })
        .into_iter()
        .collect();

    let mut next = state;
    next.user_tokens -= cost;
    next.unlocked_pro_tracks.insert(track_id);
    Transition::applied(next, notifications)
}

fn complete_challenge(
    state: ProgressState,
    challenge_id: ChallengeId,
    reward: u64,
    today: NaiveDate,
) -> Transition {
    if state.is_completed(&challenge_id) {
        return Transition::rejected(state, RejectReason::AlreadyCompleted(challenge_id));
    }

    let mut notifications = vec![Notification::new(NotificationKind::ChallengeComplete { reward })];

    let (xp_streak, change) = advance_streak(state.xp_streak, state.last_activity_date, today);
    match change {
        StreakChange::Incremented(count) => {
            notifications.push(Notification::new(NotificationKind::StreakIncremented { count }));
        }
        StreakChange::Reset => notifications.push(Notification::new(NotificationKind::StreakReset)),
        StreakChange::Started | StreakChange::Unchanged => {}
    }

    let (levels, reached) = state.level_progress().award(reward);
    notifications.extend(
        reached
            .into_iter()
            .map(|level| Notification::new(NotificationKind::LevelUp { level })),
    );

    let mut next = state;
    next.completed_challenges.insert(challenge_id);
    next.user_tokens = next.user_tokens.saturating_add(reward);
    next.level = levels.level;
    next.xp = levels.xp;
    next.xp_to_next_level = levels.xp_to_next_level;
    next.xp_streak = xp_streak;
    next.last_activity_date = Some(today);

    Transition::applied(next, notifications)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CareerPath, Catalog};
    use crate::recommendations::DailyQuest;
    use proptest::prelude::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date") + chrono::Duration::days(offset)
    }

    fn catalog() -> Catalog {
        Catalog::builtin().expect("builtin catalog is valid")
    }

    fn fresh() -> ProgressState {
        ProgressState::with_tracks(catalog().tracks)
    }

    fn complete(id: &str, reward: u64) -> Action {
        Action::CompleteChallenge {
            challenge_id: ChallengeId::new(id),
            reward,
        }
    }

    fn kinds(transition: &Transition) -> Vec<NotificationKind> {
        transition.notifications.iter().map(|n| n.kind.clone()).collect()
    }

    #[test]
    fn test_select_and_deselect() {
        let track = catalog().tracks[1].clone();
        let t = reduce(fresh(), Action::SelectSkill(track.clone()), day(0));
        assert_eq!(t.state.selected_skill, Some(track));

        let t = reduce(t.state, Action::DeselectSkill, day(0));
        assert!(t.state.selected_skill.is_none());
        assert!(t.is_applied());
    }

    #[test]
    fn test_reset_progress() {
        let mut state = fresh();
        state.user_tokens = 9000;
        state.completed_challenges.insert(ChallengeId::new("fe-1"));

        let tracks = catalog().tracks;
        let t = reduce(state, Action::ResetProgress { static_tracks: tracks.clone() }, day(0));
        assert_eq!(t.state, ProgressState::with_tracks(tracks));
    }

    #[test]
    fn test_first_completion() {
        let t = reduce(fresh(), complete("dm-1", 50), day(0));
        assert!(t.is_applied());
        assert_eq!(t.state.user_tokens, 150);
        assert_eq!(t.state.xp, 50);
        assert_eq!(t.state.level, 1);
        assert_eq!(t.state.xp_streak, 1);
        assert_eq!(t.state.last_activity_date, Some(day(0)));
        assert_eq!(kinds(&t), vec![NotificationKind::ChallengeComplete { reward: 50 }]);
    }

    #[test]
    fn test_duplicate_completion_rejected() {
        let t = reduce(fresh(), complete("dm-1", 50), day(0));
        let before = t.state.clone();

        let t = reduce(t.state, complete("dm-1", 50), day(1));
        assert_eq!(
            t.outcome,
            Outcome::Rejected(RejectReason::AlreadyCompleted(ChallengeId::new("dm-1")))
        );
        assert!(t.notifications.is_empty());
        assert_eq!(t.state, before);
    }

    #[test]
    fn test_streak_scenario() {
        // Day D, first ever: streak 1, no reset notice.
        let t = reduce(fresh(), complete("fe-1", 10), day(0));
        assert_eq!(t.state.xp_streak, 1);
        assert_eq!(kinds(&t), vec![NotificationKind::ChallengeComplete { reward: 10 }]);

        // Same day: unchanged, no streak notice.
        let t = reduce(t.state, complete("fe-2", 10), day(0));
        assert_eq!(t.state.xp_streak, 1);
        assert_eq!(kinds(&t), vec![NotificationKind::ChallengeComplete { reward: 10 }]);

        // D+1: incremented.
        let t = reduce(t.state, complete("fe-3", 10), day(1));
        assert_eq!(t.state.xp_streak, 2);
        assert_eq!(
            kinds(&t),
            vec![
                NotificationKind::ChallengeComplete { reward: 10 },
                NotificationKind::StreakIncremented { count: 2 },
            ]
        );

        // D+3: gap, reset.
        let t = reduce(t.state, complete("dm-1", 10), day(3));
        assert_eq!(t.state.xp_streak, 1);
        assert_eq!(t.state.last_activity_date, Some(day(3)));
        assert_eq!(
            kinds(&t),
            vec![
                NotificationKind::ChallengeComplete { reward: 10 },
                NotificationKind::StreakReset,
            ]
        );
    }

    #[test]
    fn test_leveling_scenario() {
        let t = reduce(fresh(), complete("fe-3", 260), day(0));
        assert_eq!(t.state.level, 3);
        assert_eq!(t.state.xp, 10);
        assert_eq!(t.state.xp_to_next_level, 200);
        assert_eq!(t.state.user_tokens, 360);
        assert_eq!(
            kinds(&t),
            vec![
                NotificationKind::ChallengeComplete { reward: 260 },
                NotificationKind::LevelUp { level: 2 },
                NotificationKind::LevelUp { level: 3 },
            ]
        );
    }

    #[test]
    fn test_unlock_pro_track() {
        let mut state = fresh();
        state.user_tokens = 300;

        let unlock = Action::UnlockProTrack {
            track_id: SkillTrackId::new("frontend"),
            cost: 250,
        };
        let t = reduce(state, unlock.clone(), day(0));
        assert!(t.is_applied());
        assert_eq!(t.state.user_tokens, 50);
        assert!(t.state.unlocked_pro_tracks.contains(&SkillTrackId::new("frontend")));
        assert_eq!(
            kinds(&t),
            vec![NotificationKind::ProUnlocked {
                title: "Frontend Development".to_string()
            }]
        );

        // Second unlock is a no-op even when affordable.
        let mut state = t.state;
        state.user_tokens = 1000;
        let before = state.clone();
        let t = reduce(state, unlock, day(0));
        assert_eq!(
            t.outcome,
            Outcome::Rejected(RejectReason::AlreadyUnlocked(SkillTrackId::new("frontend")))
        );
        assert_eq!(t.state, before);
    }

    #[test]
    fn test_unlock_insufficient_tokens() {
        let state = fresh();
        let before = state.clone();
        let t = reduce(
            state,
            Action::UnlockProTrack {
                track_id: SkillTrackId::new("frontend"),
                cost: 250,
            },
            day(0),
        );
        assert_eq!(
            t.outcome,
            Outcome::Rejected(RejectReason::InsufficientTokens { needed: 250, have: 100 })
        );
        assert_eq!(t.state, before);
    }

    #[test]
    fn test_unlock_unknown_track_is_silent() {
        let t = reduce(
            fresh(),
            Action::UnlockProTrack {
                track_id: SkillTrackId::new("ghost"),
                cost: 40,
            },
            day(0),
        );
        assert!(t.is_applied());
        assert_eq!(t.state.user_tokens, 60);
        assert!(t.state.unlocked_pro_tracks.contains(&SkillTrackId::new("ghost")));
        assert!(t.notifications.is_empty());
    }

    #[test]
    fn test_redeem_reward() {
        let mut state = fresh();
        state.user_tokens = 1200;
        let t = reduce(
            state,
            Action::RedeemReward {
                cost: 1000,
                title: "10% Discount Voucher".to_string(),
            },
            day(0),
        );
        assert_eq!(t.state.user_tokens, 200);
        assert_eq!(
            kinds(&t),
            vec![NotificationKind::RewardRedeemed {
                title: "10% Discount Voucher".to_string()
            }]
        );
    }

    #[test]
    fn test_redeem_insufficient_is_noop() {
        let state = fresh();
        let before = state.clone();
        let redeem = Action::RedeemReward {
            cost: 1000,
            title: "10% Discount Voucher".to_string(),
        };

        let t = reduce(state, redeem.clone(), day(0));
        assert!(!t.is_applied());
        assert!(t.notifications.is_empty());
        assert_eq!(t.state, before);

        let t = reduce(t.state, redeem, day(0));
        assert_eq!(t.state, before);
    }

    #[test]
    fn test_add_generated_track_appends_without_dedup() {
        let mut track = SkillTrack {
            id: SkillTrackId::new("rust-basics"),
            title: "Rust Basics".to_string(),
            description: String::new(),
            category: crate::catalog::SkillCategory::Other,
            challenges: Vec::new(),
            icon: String::new(),
            is_pro: false,
            is_generated: true,
            unlock_cost: None,
        };

        let t = reduce(fresh(), Action::AddGeneratedSkillTrack(track.clone()), day(0));
        assert_eq!(t.state.all_skill_tracks.len(), 5);
        assert_eq!(t.state.generated_skill_tracks, vec![track.clone()]);
        assert_eq!(
            kinds(&t),
            vec![NotificationKind::SkillGenerated {
                title: "Rust Basics".to_string()
            }]
        );

        track.title = "Rust Basics Again".to_string();
        let t = reduce(t.state, Action::AddGeneratedSkillTrack(track), day(0));
        assert_eq!(t.state.generated_skill_tracks.len(), 2);
        assert_eq!(t.state.all_skill_tracks.len(), 6);
    }

    #[test]
    fn test_set_home_recommendations_overwrites() {
        let catalog = catalog();
        let track = catalog.tracks[0].clone();
        let recs = HomeRecommendations {
            daily_quest: Some(DailyQuest {
                challenge: track.challenges[0].clone(),
                skill_track_id: track.id.clone(),
                skill_track_title: track.title.clone(),
            }),
            recommended_skill: Some(catalog.tracks[2].clone()),
            recommended_career_path: Some(CareerPath {
                id: "stale".into(),
                title: "Stale".to_string(),
                description: String::new(),
                skill_track_ids: Vec::new(),
            }),
        };

        let t = reduce(fresh(), Action::SetHomeRecommendations(recs), day(0));
        assert!(t.state.daily_quest.is_some());
        assert!(t.state.recommended_career_path.is_some());

        let t = reduce(t.state, Action::SetHomeRecommendations(HomeRecommendations::none()), day(0));
        assert!(t.state.daily_quest.is_none());
        assert!(t.state.recommended_skill.is_none());
        assert!(t.state.recommended_career_path.is_none());
    }

    #[test]
    fn test_load_progress_clears_transient() {
        let catalog = catalog();
        let mut state = fresh();
        state.selected_skill = Some(catalog.tracks[0].clone());
        state.recommended_skill = Some(catalog.tracks[1].clone());

        let progress = PersistedProgress {
            user_tokens: 777,
            completed_challenges: [ChallengeId::new("es-1")].into_iter().collect(),
            last_activity_date: Some(day(-1)),
            xp_streak: 3,
            ..PersistedProgress::default()
        };

        let t = reduce(
            state,
            Action::LoadProgress {
                progress,
                all_skill_tracks: catalog.tracks.clone(),
            },
            day(0),
        );
        assert!(t.state.selected_skill.is_none());
        assert!(t.state.recommended_skill.is_none());
        assert_eq!(t.state.user_tokens, 777);
        assert_eq!(t.state.xp_streak, 3);
        assert!(t.state.is_completed(&ChallengeId::new("es-1")));
        assert_eq!(t.state.all_skill_tracks, catalog.tracks);
    }

    #[test]
    fn test_persisted_subset_survives_reload() {
        let t = reduce(fresh(), complete("gd-2", 25), day(0));
        let progress = PersistedProgress::from_state(&t.state);
        let tracks = t.state.all_skill_tracks.clone();

        let reloaded = reduce(
            ProgressState::default_initial(),
            Action::LoadProgress {
                progress,
                all_skill_tracks: tracks,
            },
            day(0),
        );
        assert_eq!(reloaded.state, t.state);
    }

    proptest! {
        #[test]
        fn prop_completions_keep_invariants(
            steps in prop::collection::vec((0usize..12, 0u64..400, 0i64..3), 1..40)
        ) {
            let mut state = ProgressState::default_initial();
            let mut today = day(0);

            for (challenge, reward, advance) in steps {
                today += chrono::Duration::days(advance);
                let before = state.completed_challenges.clone();
                let t = reduce(state, complete(&format!("c-{challenge}"), reward), today);
                state = t.state;

                prop_assert!(before.is_subset(&state.completed_challenges));
                prop_assert!(state.completed_challenges.len() >= before.len());
                prop_assert!(state.xp < state.xp_to_next_level);
                prop_assert!(state.level >= 1);
                prop_assert_eq!(
                    state.xp_to_next_level,
                    crate::leveling::xp_to_next_level(state.level)
                );
            }
        }

        #[test]
        fn prop_level_ups_match_notifications(reward in 0u64..5000) {
            let t = reduce(ProgressState::default_initial(), complete("c", reward), day(0));
            let level_ups = t
                .notifications
                .iter()
                .filter(|n| matches!(n.kind, NotificationKind::LevelUp { .. }))
                .count();
            prop_assert_eq!(level_ups as u32, t.state.level - 1);
            prop_assert!(t.state.xp < t.state.xp_to_next_level);
        }

        #[test]
        fn prop_spending_never_underflows(tokens in 0u64..2000, cost in 0u64..2000) {
            let state = ProgressState { user_tokens: tokens, ..ProgressState::default_initial() };
            let t = reduce(state, Action::RedeemReward { cost, title: "r".to_string() }, day(0));
            if cost > tokens {
                prop_assert!(!t.is_applied());
                prop_assert_eq!(t.state.user_tokens, tokens);
            } else {
                prop_assert_eq!(t.state.user_tokens, tokens - cost);
            }
        }
    }
}
