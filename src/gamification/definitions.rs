//! Badge requirement types and the seeded badge catalog

use serde::{Deserialize, Serialize};

/// What a badge's `requirement_value` is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    /// Always met once the user exists
    Registration,
    /// Number of study log entries
    StudySessions,
    /// Distinct days with at least one study log
    StudyDays,
    /// Total study minutes / 60
    StudyHours,
    /// Study minutes in the math subject / 60
    MathHours,
    /// Today's study minutes / 60
    DailyHours,
    /// Current run of consecutive study days
    StreakDays,
    MockExams,
    SetGoals,
    /// Mood check-ins
    MotivationSessions,
    /// Accepted friendships
    Friends,
}

impl RequirementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::StudySessions => "study_sessions",
            Self::StudyDays => "study_days",
            Self::StudyHours => "study_hours",
            Self::MathHours => "math_hours",
            Self::DailyHours => "daily_hours",
            Self::StreakDays => "streak_days",
            Self::MockExams => "mock_exams",
            Self::SetGoals => "set_goals",
            Self::MotivationSessions => "motivation_sessions",
            Self::Friends => "friends",
        }
    }

    /// Parse from the stored `requirement_type` column
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "registration" => Some(Self::Registration),
            "study_sessions" => Some(Self::StudySessions),
            "study_days" => Some(Self::StudyDays),
            // total_hours is an older name for the same measure
            "study_hours" | "total_hours" => Some(Self::StudyHours),
            "math_hours" => Some(Self::MathHours),
            "daily_hours" => Some(Self::DailyHours),
            "streak_days" => Some(Self::StreakDays),
            "mock_exams" => Some(Self::MockExams),
            "set_goals" => Some(Self::SetGoals),
            "motivation_sessions" => Some(Self::MotivationSessions),
            "friends" => Some(Self::Friends),
            _ => None,
        }
    }
}

/// A badge as seeded into the catalog
#[derive(Debug, Clone, Copy)]
pub struct BadgeDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: &'static str,
    pub requirement: RequirementType,
    pub requirement_value: i64,
    pub points: i64,
}

const BADGE_POINTS: i64 = 100;

/// Catalog seeded at initialization
pub static DEFAULT_BADGES: &[BadgeDefinition] = &[
    BadgeDefinition {
        name: "Hoş Geldin!",
        description: "MotiKoç ailesine katıldın",
        icon: "👋",
        category: "başlangıç",
        requirement: RequirementType::Registration,
        requirement_value: 1,
        points: BADGE_POINTS,
    },
    BadgeDefinition {
        name: "İlk Adım",
        description: "İlk çalışma seansını tamamla",
        icon: "🎯",
        category: "başlangıç",
        requirement: RequirementType::StudySessions,
        requirement_value: 1,
        points: BADGE_POINTS,
    },
    BadgeDefinition {
        name: "Günün Kahramanı",
        description: "Bir günde 2 saat çalış",
        icon: "⭐",
        category: "çalışma",
        requirement: RequirementType::DailyHours,
        requirement_value: 2,
        points: BADGE_POINTS,
    },
    BadgeDefinition {
        name: "Azimli Öğrenci",
        description: "5 saat çalış",
        icon: "📚",
        category: "çalışma",
        requirement: RequirementType::StudyHours,
        requirement_value: 5,
        points: BADGE_POINTS,
    },
    BadgeDefinition {
        name: "Matematik Sever",
        description: "Matematik konularında 3 saat çalış",
        icon: "🔢",
        category: "matematik",
        requirement: RequirementType::MathHours,
        requirement_value: 3,
        points: BADGE_POINTS,
    },
    BadgeDefinition {
        name: "Sosyal Kelebek",
        description: "3 arkadaş edin",
        icon: "🦋",
        category: "sosyal",
        requirement: RequirementType::Friends,
        requirement_value: 3,
        points: BADGE_POINTS,
    },
    BadgeDefinition {
        name: "Devamlılık",
        description: "3 gün üst üste çalış",
        icon: "🎯",
        category: "devamlılık",
        requirement: RequirementType::StreakDays,
        requirement_value: 3,
        points: BADGE_POINTS,
    },
    BadgeDefinition {
        name: "Düzenli Çalışan",
        description: "5 farklı günde çalış",
        icon: "📅",
        category: "planlama",
        requirement: RequirementType::StudyDays,
        requirement_value: 5,
        points: BADGE_POINTS,
    },
    BadgeDefinition {
        name: "Hedef Odaklı",
        description: "İlk hedefini belirle",
        icon: "🎯",
        category: "hedefler",
        requirement: RequirementType::SetGoals,
        requirement_value: 1,
        points: BADGE_POINTS,
    },
    BadgeDefinition {
        name: "Motivasyon Ustası",
        description: "3 motivasyon seansı tamamla",
        icon: "💪",
        category: "motivasyon",
        requirement: RequirementType::MotivationSessions,
        requirement_value: 3,
        points: BADGE_POINTS,
    },
    BadgeDefinition {
        name: "YKS Savaşçısı",
        description: "Toplam 20 saat çalış",
        icon: "⚔️",
        category: "ileri",
        requirement: RequirementType::StudyHours,
        requirement_value: 20,
        points: BADGE_POINTS,
    },
    BadgeDefinition {
        name: "Deneme Uzmanı",
        description: "İlk deneme sınavını gir",
        icon: "📝",
        category: "sınav",
        requirement: RequirementType::MockExams,
        requirement_value: 1,
        points: BADGE_POINTS,
    },
];

/// Subject whose minutes count toward `math_hours`
pub const MATH_SUBJECT: &str = "Matematik";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_badge_names_are_unique() {
        let names: HashSet<_> = DEFAULT_BADGES.iter().map(|b| b.name).collect();
        assert_eq!(names.len(), DEFAULT_BADGES.len());
    }

    #[test]
    fn test_legacy_total_hours_maps_to_study_hours() {
        assert_eq!(
            RequirementType::from_str("total_hours"),
            Some(RequirementType::StudyHours)
        );
        assert_eq!(RequirementType::from_str("study_plans"), None);
    }
}
