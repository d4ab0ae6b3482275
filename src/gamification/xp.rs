//! Activity types and the XP each one is worth

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Kinds of activity that earn XP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    StudySession,
    StudyMinute,
    PerformanceBonus,
    StreakBonus,
    BadgeEarned,
    AchievementShared,
    ForumQuestion,
    ForumAnswer,
    AnswerAccepted,
    UpvoteReceived,
    AnswerUpvoted,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StudySession => "study_session",
            Self::StudyMinute => "study_minute",
            Self::PerformanceBonus => "performance_bonus",
            Self::StreakBonus => "streak_bonus",
            Self::BadgeEarned => "badge_earned",
            Self::AchievementShared => "achievement_shared",
            Self::ForumQuestion => "forum_question",
            Self::ForumAnswer => "forum_answer",
            Self::AnswerAccepted => "answer_accepted",
            Self::UpvoteReceived => "upvote_received",
            Self::AnswerUpvoted => "answer_upvoted",
        }
    }

    /// Parse a stored or user-supplied activity name
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "study_session" => Some(Self::StudySession),
            "study_minute" => Some(Self::StudyMinute),
            "performance_bonus" => Some(Self::PerformanceBonus),
            "streak_bonus" => Some(Self::StreakBonus),
            "badge_earned" => Some(Self::BadgeEarned),
            "achievement_shared" => Some(Self::AchievementShared),
            "forum_question" => Some(Self::ForumQuestion),
            "forum_answer" => Some(Self::ForumAnswer),
            "answer_accepted" => Some(Self::AnswerAccepted),
            "upvote_received" => Some(Self::UpvoteReceived),
            "answer_upvoted" => Some(Self::AnswerUpvoted),
            _ => None,
        }
    }

    pub fn all() -> &'static [ActivityType] {
        &[
            Self::StudySession,
            Self::StudyMinute,
            Self::PerformanceBonus,
            Self::StreakBonus,
            Self::BadgeEarned,
            Self::AchievementShared,
            Self::ForumQuestion,
            Self::ForumAnswer,
            Self::AnswerAccepted,
            Self::UpvoteReceived,
            Self::AnswerUpvoted,
        ]
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// XP rate table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpRates {
    pub study_session: u32,
    pub study_minute: u32,
    pub performance_bonus: u32,
    pub streak_bonus: u32,
    pub badge_earned: u32,
    pub achievement_shared: u32,
    pub forum_question: u32,
    pub forum_answer: u32,
    pub answer_accepted: u32,
    pub upvote_received: u32,
    pub answer_upvoted: u32,
    /// Upper bound on the per-minute part of a study session
    pub study_minute_cap: u32,
}

impl Default for XpRates {
    fn default() -> Self {
        Self {
            study_session: 50,
            study_minute: 1,
            performance_bonus: 20,
            streak_bonus: 100,
            badge_earned: 200,
            achievement_shared: 150,
            forum_question: 75,
            forum_answer: 100,
            answer_accepted: 200,
            upvote_received: 10,
            answer_upvoted: 5,
            study_minute_cap: 500,
        }
    }
}

impl XpRates {
    /// Flat rate of one activity
    pub fn rate(&self, activity: ActivityType) -> u32 {
        match activity {
            ActivityType::StudySession => self.study_session,
            ActivityType::StudyMinute => self.study_minute,
            ActivityType::PerformanceBonus => self.performance_bonus,
            ActivityType::StreakBonus => self.streak_bonus,
            ActivityType::BadgeEarned => self.badge_earned,
            ActivityType::AchievementShared => self.achievement_shared,
            ActivityType::ForumQuestion => self.forum_question,
            ActivityType::ForumAnswer => self.forum_answer,
            ActivityType::AnswerAccepted => self.answer_accepted,
            ActivityType::UpvoteReceived => self.upvote_received,
            ActivityType::AnswerUpvoted => self.answer_upvoted,
        }
    }

    /// XP for one occurrence of `activity`.
    ///
    /// A study session also earns the per-minute rate for `duration_minutes`,
    /// capped at `study_minute_cap`.
    pub fn xp_for(&self, activity: ActivityType, duration_minutes: u32) -> u32 {
        let base = self.rate(activity);
        match activity {
            ActivityType::StudySession => {
                let minutes = duration_minutes
                    .saturating_mul(self.study_minute)
                    .min(self.study_minute_cap);
                base.saturating_add(minutes)
            }
            _ => base,
        }
    }

    /// Same as [`xp_for`](Self::xp_for) for a textual activity name; unknown
    /// names are worth nothing.
    pub fn xp_for_name(&self, activity: &str, duration_minutes: u32) -> u32 {
        match ActivityType::from_str(activity) {
            Some(activity) => self.xp_for(activity, duration_minutes),
            None => {
                warn!(activity, "Unknown activity type, no XP awarded");
                0
            }
        }
    }
}
