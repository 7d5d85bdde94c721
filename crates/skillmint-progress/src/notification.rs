//! User-facing notifications produced by progress transitions.
//!
//! The reducer returns notifications as plain values. A front end feeds them
//! into a [`ToastQueue`], which shows each one once and drops it after a fixed
//! lifetime or when the user dismisses it.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// How long a toast stays visible unless dismissed.
pub const DEFAULT_TOAST_LIFETIME: Duration = Duration::from_secs(5);

/// Severity tag used to style a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Something the user achieved
    Success,
    /// Neutral progress information
    Info,
    /// Something went wrong
    Error,
}

/// Notification payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// A generated skill track was added
    SkillGenerated {
        /// Track title
        title: String,
    },
    /// A pro track was unlocked
    ProUnlocked {
        /// Track title
        title: String,
    },
    /// A challenge was completed
    ChallengeComplete {
        /// Tokens/XP awarded
        reward: u64,
    },
    /// The daily streak grew
    StreakIncremented {
        /// New streak length
        count: u32,
    },
    /// The daily streak was broken and restarted
    StreakReset,
    /// A level was reached
    LevelUp {
        /// New level
        level: u32,
    },
    /// A reward was redeemed
    RewardRedeemed {
        /// Reward title
        title: String,
    },
    /// Free-form message raised outside the reducer
    Notice {
        /// Message text
        text: String,
    },
}

impl NotificationKind {
    /// Localization key for the message template.
    #[must_use]
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::SkillGenerated { .. } => "toasts.skill_generated",
            Self::ProUnlocked { .. } => "toasts.pro_unlocked",
            Self::ChallengeComplete { .. } => "toasts.challenge_complete",
            Self::StreakIncremented { .. } => "toasts.streak_increment",
            Self::StreakReset => "toasts.streak_reset",
            Self::LevelUp { .. } => "toasts.level_up",
            Self::RewardRedeemed { .. } => "toasts.reward_redeemed",
            Self::Notice { .. } => "toasts.notice",
        }
    }

    /// Default severity for this kind.
    #[must_use]
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::StreakIncremented { .. }
            | Self::StreakReset
            | Self::LevelUp { .. }
            | Self::Notice { .. } => Severity::Info,
            Self::SkillGenerated { .. }
            | Self::ProUnlocked { .. }
            | Self::ChallengeComplete { .. }
            | Self::RewardRedeemed { .. } => Severity::Success,
        }
    }
}

/// A notification with its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Payload.
    pub kind: NotificationKind,
    /// Severity tag.
    pub severity: Severity,
}

impl Notification {
    /// Creates a notification with the kind's default severity.
    #[must_use]
    pub fn new(kind: NotificationKind) -> Self {
        let severity = kind.default_severity();
        Self { kind, severity }
    }

    /// Creates a free-form notice.
    #[must_use]
    pub fn notice(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind: NotificationKind::Notice { text: text.into() },
            severity,
        }
    }

    /// English rendering of the message.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.kind {
            NotificationKind::SkillGenerated { title } => {
                format!("New skill track \"{title}\" generated!")
            }
            NotificationKind::ProUnlocked { title } => format!("Unlocked {title}!"),
            NotificationKind::ChallengeComplete { reward } => {
                format!("Challenge complete! +{reward} tokens")
            }
            NotificationKind::StreakIncremented { count } => {
                format!("Streak extended: {count} days in a row")
            }
            NotificationKind::StreakReset => "Streak reset. Start a new one today!".to_string(),
            NotificationKind::LevelUp { level } => format!("Level up! You reached level {level}"),
            NotificationKind::RewardRedeemed { title } => format!("Redeemed {title}"),
            NotificationKind::Notice { text } => text.clone(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// A notification currently on screen.
#[derive(Debug, Clone)]
pub struct Toast {
    /// Queue-assigned id, used for dismissal.
    pub id: u64,
    /// The notification shown.
    pub notification: Notification,
    /// When the toast was shown.
    pub shown_at: Instant,
}

/// Visible toasts, expiring after a fixed lifetime.
#[derive(Debug)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    next_id: u64,
    lifetime: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_LIFETIME)
    }
}

impl ToastQueue {
    /// Creates a queue with the given toast lifetime.
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            next_id: 0,
            lifetime,
        }
    }

    /// Toast lifetime.
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Shows a notification, returning its toast id.
    pub fn push(&mut self, notification: Notification, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push_back(Toast {
            id,
            notification,
            shown_at: now,
        });
        id
    }

    /// Shows several notifications in order.
    pub fn extend(&mut self, notifications: impl IntoIterator<Item = Notification>, now: Instant) {
        for notification in notifications {
            self.push(notification, now);
        }
    }

    /// Dismisses a toast. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Removes and returns toasts whose lifetime has elapsed.
    pub fn expire(&mut self, now: Instant) -> Vec<Toast> {
        let lifetime = self.lifetime;
        let (expired, live): (Vec<_>, Vec<_>) = self
            .toasts
            .drain(..)
            .partition(|t| now.saturating_duration_since(t.shown_at) >= lifetime);
        self.toasts = live.into();
        expired
    }

    /// Toasts currently visible, oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    /// Number of visible toasts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Whether no toast is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}
