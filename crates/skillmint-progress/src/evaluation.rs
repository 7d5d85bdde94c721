//! Challenge evaluation and the content-service boundary.
//!
//! Quizzes are graded locally: the first listed option is the correct one.
//! Free-form submissions, track generation and recommendations come from a
//! [`ContentService`]. [`OfflineContentService`] stands in when no remote
//! service is configured.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use skillmint_common::{ChallengeId, SkillTrackId};
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::catalog::{Challenge, ChallengeKind, SkillCategory, SkillTrack};
use crate::recommendations::{HomeRecommendations, RecommendationIds, RecommendationInput};

/// Reward of every challenge in an offline-generated track.
pub const OFFLINE_CHALLENGE_REWARD: u64 = 50;

/// Result of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the submission passed.
    pub passed: bool,
    /// Feedback for the learner.
    pub feedback: String,
}

impl Verdict {
    /// A passing verdict.
    #[must_use]
    pub fn pass(feedback: impl Into<String>) -> Self {
        Self {
            passed: true,
            feedback: feedback.into(),
        }
    }

    /// A failing verdict.
    #[must_use]
    pub fn fail(feedback: impl Into<String>) -> Self {
        Self {
            passed: false,
            feedback: feedback.into(),
        }
    }
}

/// Remote content collaborator.
///
/// Implementations never fail outright: evaluation returns a best-effort
/// verdict and the other operations return `None` when nothing is available.
pub trait ContentService: Send + Sync {
    /// Grades a free-form submission. Never called for quizzes.
    fn evaluate_submission(&self, challenge: &Challenge, submission: &str) -> Verdict;

    /// Generates a new track on `topic`, avoiding `existing_titles`.
    fn generate_skill_track(&self, topic: &str, existing_titles: &[String]) -> Option<SkillTrack>;

    /// Proposes recommendation ids for the given progress.
    fn recommend(&self, input: &RecommendationInput<'_>) -> Option<RecommendationIds>;
}

/// Grades a quiz answer against the first listed option.
#[must_use]
pub fn evaluate_quiz(challenge: &Challenge, answer: &str) -> Verdict {
    match challenge.correct_answer() {
        Some(correct) if correct == answer => Verdict::pass("Correct!"),
        Some(_) => Verdict::fail("That's not quite right. Try again!"),
        None => Verdict::fail("This quiz has no options to choose from."),
    }
}

/// Grades a submission, routing quizzes to [`evaluate_quiz`].
pub fn evaluate(service: &dyn ContentService, challenge: &Challenge, submission: &str) -> Verdict {
    let verdict = match challenge.kind {
        ChallengeKind::Quiz => evaluate_quiz(challenge, submission),
        ChallengeKind::Submission => service.evaluate_submission(challenge, submission),
    };
    debug!(
        "Evaluated {} ({:?}): passed={}",
        challenge.id, challenge.kind, verdict.passed
    );
    verdict
}

/// The action a verdict leads to, if any.
#[must_use]
pub fn completion_action(challenge: &Challenge, verdict: &Verdict) -> Option<Action> {
    verdict.passed.then(|| Action::CompleteChallenge {
        challenge_id: challenge.id.clone(),
        reward: challenge.reward,
    })
}

/// Asks the service for recommendations, falling back to a local choice.
///
/// Returns empty recommendations when every challenge is complete.
pub fn recommend(service: &dyn ContentService, input: &RecommendationInput<'_>) -> HomeRecommendations {
    if input.incomplete_challenges().is_empty() {
        debug!("All challenges complete, clearing recommendations");
        return HomeRecommendations::none();
    }

    match service.recommend(input) {
        Some(ids) => HomeRecommendations::resolve(&ids, input),
        None => {
            info!("Content service offered no recommendations, using local fallback");
            HomeRecommendations::fallback(input)
        }
    }
}

/// Content service that works without a network.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineContentService;

impl OfflineContentService {
    /// Creates the offline service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn slugify(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    for c in topic.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("topic");
    }
    slug
}

impl ContentService for OfflineContentService {
    fn evaluate_submission(&self, challenge: &Challenge, _submission: &str) -> Verdict {
        warn!("No evaluator available for challenge {}", challenge.id);
        Verdict::fail("The AI evaluator is unavailable right now. Please try again later.")
    }

    fn generate_skill_track(&self, topic: &str, existing_titles: &[String]) -> Option<SkillTrack> {
        let topic = topic.trim();
        if topic.is_empty() {
            return None;
        }

        let title = format!("Intro to {topic}");
        if existing_titles.iter().any(|t| t.eq_ignore_ascii_case(&title)) {
            info!("Track {:?} already exists, nothing generated", title);
            return None;
        }

        let slug = slugify(topic);
        let millis = Utc::now().timestamp_millis();
        let track_id = SkillTrackId::new(format!("generated-{slug}-{millis}"));

        Some(SkillTrack {
            id: track_id,
            title,
            description: format!("A starter track on {topic}."),
            category: SkillCategory::Other,
            challenges: vec![Challenge {
                id: ChallengeId::new(format!("generated-{slug}-{millis}-1")),
                title: format!("Explain {topic}"),
                description: format!("In a few sentences, explain what {topic} is and why it matters."),
                reward: OFFLINE_CHALLENGE_REWARD,
                kind: ChallengeKind::Submission,
                evaluation_criteria: "Covers the core idea clearly and accurately.".to_string(),
                quiz_options: Vec::new(),
            }],
            icon: "sparkles".to_string(),
            is_pro: false,
            is_generated: true,
            unlock_cost: None,
        })
    }

    fn recommend(&self, _input: &RecommendationInput<'_>) -> Option<RecommendationIds> {
        None
    }
}
