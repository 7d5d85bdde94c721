//! Subcommands and their terminal output.

use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Subcommand;
use skillmint_common::{ChallengeId, RewardId, SkillTrackId};
use skillmint_progress::profile::{CareerProgress, TrackProgress};
use skillmint_progress::{
    ChallengeKind, ContentService, Dispatch, Notification, Outcome, ProgressSession, RejectReason,
    Severity, ToastQueue,
};
use tracing::debug;

/// What to do for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show level, tokens, streak and completed work
    Status,

    /// List skill tracks with completion and lock state
    Tracks,

    /// List career paths and how far along each one is
    Careers,

    /// List redeemable rewards
    Rewards,

    /// Open a track and list its challenges
    Select {
        /// Track id
        track: String,
    },

    /// Submit an answer for a challenge
    Complete {
        /// Challenge id
        challenge: String,

        /// Quiz answer (one of the listed options)
        #[arg(long, conflicts_with = "submission")]
        answer: Option<String>,

        /// Free-form submission text
        #[arg(long)]
        submission: Option<String>,
    },

    /// Spend tokens to unlock a pro track
    Unlock {
        /// Track id
        track: String,
    },

    /// Spend tokens on a reward
    Redeem {
        /// Reward id
        reward: String,
    },

    /// Generate a new skill track on a topic
    Generate {
        /// Topic to learn
        topic: String,
    },

    /// Refresh the daily quest and recommendations
    Recommend,

    /// Print the certificate for a finished track
    Certificate {
        /// Track id
        track: String,
    },

    /// Delete stored progress and sign out
    Logout,
}

/// Prints notifications through a toast queue.
#[derive(Debug)]
pub struct ToastPrinter {
    queue: ToastQueue,
    printed: Option<u64>,
}

impl ToastPrinter {
    /// Creates a printer whose toasts live for `lifetime`.
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        Self {
            queue: ToastQueue::new(lifetime),
            printed: None,
        }
    }

    /// Queues notifications and prints every toast not yet shown.
    pub fn show(
        &mut self,
        notifications: impl IntoIterator<Item = Notification>,
        out: &mut impl Write,
    ) -> Result<()> {
        let now = Instant::now();
        self.queue.expire(now);
        self.queue.extend(notifications, now);

        for toast in self.queue.visible() {
            if self.printed.is_some_and(|last| toast.id <= last) {
                continue;
            }
            writeln!(
                out,
                "{} {}",
                severity_marker(toast.notification.severity),
                toast.notification
            )?;
            self.printed = Some(toast.id);
        }
        Ok(())
    }
}

fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "[+]",
        Severity::Info => "[i]",
        Severity::Error => "[!]",
    }
}

fn describe_rejection(reason: &RejectReason) -> String {
    match reason {
        RejectReason::InsufficientTokens { needed, have } => {
            format!("Not enough tokens: need {needed}, have {have}")
        }
        RejectReason::AlreadyUnlocked(id) => format!("{id} is already unlocked"),
        RejectReason::AlreadyCompleted(id) => format!("{id} is already completed"),
    }
}

fn report(dispatch: Dispatch, toasts: &mut ToastPrinter, out: &mut impl Write) -> Result<()> {
    if let Outcome::Rejected(reason) = &dispatch.outcome {
        let notice = Notification::notice(describe_rejection(reason), Severity::Error);
        return toasts.show([notice], out);
    }
    toasts.show(dispatch.notifications, out)
}

/// Runs one command against the session.
pub fn execute(
    session: &mut ProgressSession,
    service: &dyn ContentService,
    command: Command,
    toasts: &mut ToastPrinter,
    out: &mut impl Write,
) -> Result<()> {
    debug!("Executing {:?}", command);

    match command {
        Command::Status => print_status(session, out),
        Command::Tracks => print_tracks(session, out),
        Command::Careers => print_careers(session, out),
        Command::Rewards => print_rewards(session, out),

        Command::Select { track } => {
            let id = SkillTrackId::new(track);
            let dispatch = session.select_track(&id)?;
            report(dispatch, toasts, out)?;
            print_challenges(session, out)
        }

        Command::Complete {
            challenge,
            answer,
            submission,
        } => {
            let text = answer.or(submission).unwrap_or_default();
            let result = session.submit(service, &ChallengeId::new(challenge), &text)?;

            let severity = if result.verdict.passed {
                Severity::Success
            } else {
                Severity::Error
            };
            toasts.show([Notification::notice(result.verdict.feedback, severity)], out)?;
            match result.dispatch {
                Some(dispatch) => report(dispatch, toasts, out),
                None => Ok(()),
            }
        }

        Command::Unlock { track } => {
            let dispatch = session.unlock_track(&SkillTrackId::new(track))?;
            report(dispatch, toasts, out)
        }

        Command::Redeem { reward } => {
            let dispatch = session.redeem(&RewardId::new(reward))?;
            report(dispatch, toasts, out)
        }

        Command::Generate { topic } => match session.generate_track(service, &topic) {
            Some(dispatch) => report(dispatch, toasts, out),
            None => toasts.show(
                [Notification::notice(
                    format!("Could not generate a track for \"{topic}\""),
                    Severity::Error,
                )],
                out,
            ),
        },

        Command::Recommend => {
            let dispatch = session.refresh_recommendations(service);
            report(dispatch, toasts, out)?;
            print_recommendations(session, out)
        }

        Command::Certificate { track } => {
            match session.certificate(&SkillTrackId::new(track))? {
                Some(cert) => {
                    writeln!(out, "Certificate of Completion")?;
                    writeln!(out, "  Awarded to: {}", cert.user_name)?;
                    writeln!(out, "  For completing: {}", cert.track_title)?;
                    writeln!(out, "  Issued on: {}", cert.issued_on)?;
                }
                None => writeln!(out, "Finish every challenge in the track to earn its certificate.")?,
            }
            Ok(())
        }

        Command::Logout => {
            session.logout()?;
            writeln!(out, "Progress deleted. Signed out.")?;
            Ok(())
        }
    }
}

fn print_status(session: &ProgressSession, out: &mut impl Write) -> Result<()> {
    let summary = session.summary();
    if let Some(user) = session.user() {
        writeln!(out, "{}", user.name)?;
    }
    writeln!(
        out,
        "Level {} ({}/{} XP)",
        summary.level, summary.xp, summary.xp_to_next_level
    )?;
    writeln!(out, "Tokens: {}", summary.tokens)?;
    writeln!(out, "Streak: {} day(s)", summary.streak)?;
    writeln!(out, "Challenges completed: {}", summary.completed_challenges)?;
    if !summary.completed_tracks.is_empty() {
        writeln!(out, "Tracks completed: {}", summary.completed_tracks.join(", "))?;
    }
    if !summary.unlocked_pro_tracks.is_empty() {
        writeln!(out, "Pro tracks: {}", summary.unlocked_pro_tracks.join(", "))?;
    }
    Ok(())
}

fn print_tracks(session: &ProgressSession, out: &mut impl Write) -> Result<()> {
    let state = session.state();
    for track in &state.all_skill_tracks {
        let progress = TrackProgress::of(track, state);
        let mut tags = Vec::new();
        if state.is_locked(track) {
            tags.push(format!("PRO, {} tokens", track.unlock_cost.unwrap_or_default()));
        } else if track.is_pro {
            tags.push("PRO".to_string());
        }
        if track.is_generated {
            tags.push("generated".to_string());
        }
        if progress.is_complete() {
            tags.push("complete".to_string());
        }

        write!(
            out,
            "{:<24} {:<28} {:<18} {}/{}",
            track.id.as_str(),
            track.title,
            track.category.display_name(),
            progress.completed,
            progress.total
        )?;
        if tags.is_empty() {
            writeln!(out)?;
        } else {
            writeln!(out, "  [{}]", tags.join(", "))?;
        }
    }
    Ok(())
}

fn print_careers(session: &ProgressSession, out: &mut impl Write) -> Result<()> {
    let state = session.state();
    for path in &session.catalog().career_paths {
        let progress = CareerProgress::of(path, state);
        writeln!(
            out,
            "{:<20} {:<28} {}/{} tracks",
            path.id.as_str(),
            path.title,
            progress.completed_tracks.len(),
            progress.total_tracks
        )?;
    }
    Ok(())
}

fn print_rewards(session: &ProgressSession, out: &mut impl Write) -> Result<()> {
    let state = session.state();
    for reward in &session.catalog().rewards {
        let marker = if state.can_afford(reward.cost) { "*" } else { " " };
        writeln!(
            out,
            "{marker} {:<12} {:<28} {} tokens",
            reward.id.as_str(),
            reward.title,
            reward.cost
        )?;
    }
    Ok(())
}

fn print_challenges(session: &ProgressSession, out: &mut impl Write) -> Result<()> {
    let Some(track) = &session.state().selected_skill else {
        return Ok(());
    };
    writeln!(out, "{}: {}", track.title, track.description)?;
    for challenge in &track.challenges {
        let done = if session.state().is_completed(&challenge.id) {
            "x"
        } else {
            " "
        };
        writeln!(
            out,
            "[{done}] {:<10} {} (+{})",
            challenge.id.as_str(),
            challenge.title,
            challenge.reward
        )?;
        writeln!(out, "      {}", challenge.description)?;
        if challenge.kind == ChallengeKind::Quiz {
            for option in &challenge.quiz_options {
                writeln!(out, "      - {option}")?;
            }
        }
    }
    Ok(())
}

fn print_recommendations(session: &ProgressSession, out: &mut impl Write) -> Result<()> {
    let state = session.state();
    match &state.daily_quest {
        Some(quest) => writeln!(
            out,
            "Daily quest: {} ({}, {})",
            quest.challenge.title, quest.skill_track_title, quest.challenge.id
        )?,
        None => writeln!(out, "Daily quest: all caught up!")?,
    }
    if let Some(track) = &state.recommended_skill {
        writeln!(out, "Recommended track: {} ({})", track.title, track.id)?;
    }
    if let Some(path) = &state.recommended_career_path {
        writeln!(out, "Career path: {}", path.title)?;
    }
    Ok(())
}
