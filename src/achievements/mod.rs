use std::collections::HashSet;

use crate::core::models::ProgressRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementCategory {
    Stars,
    Letters,
    Streak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: AchievementCategory,
    pub requirement: u32,
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        key: "first_star",
        name: "First Star!",
        description: "Earned your first star",
        icon: "⭐",
        category: AchievementCategory::Stars,
        requirement: 1,
    },
    Achievement {
        key: "ten_stars",
        name: "Star Collector",
        description: "Earned 10 stars",
        icon: "🌟",
        category: AchievementCategory::Stars,
        requirement: 10,
    },
    Achievement {
        key: "fifty_stars",
        name: "Shining Bright",
        description: "Earned 50 stars",
        icon: "💫",
        category: AchievementCategory::Stars,
        requirement: 50,
    },
    Achievement {
        key: "hundred_stars",
        name: "Superstar!",
        description: "Earned 100 stars",
        icon: "🏆",
        category: AchievementCategory::Stars,
        requirement: 100,
    },
    Achievement {
        key: "first_mastered",
        name: "Letter Learner",
        description: "Mastered your first letter",
        icon: "📖",
        category: AchievementCategory::Letters,
        requirement: 1,
    },
    Achievement {
        key: "five_mastered",
        name: "Word Builder",
        description: "Mastered 5 letters",
        icon: "📚",
        category: AchievementCategory::Letters,
        requirement: 5,
    },
    Achievement {
        key: "thirteen_mastered",
        name: "Halfway There!",
        description: "Mastered half the alphabet",
        icon: "🎯",
        category: AchievementCategory::Letters,
        requirement: 13,
    },
    Achievement {
        key: "alphabet_master",
        name: "Alphabet Champion",
        description: "Mastered all 26 letters!",
        icon: "👑",
        category: AchievementCategory::Letters,
        requirement: 26,
    },
];

pub fn achievement_by_key(key: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.key == key)
}

pub fn mastered_count(records: &[ProgressRecord]) -> usize {
    records.iter().filter(|r| r.is_mastered()).count()
}

/// Every achievement whose threshold the given totals meet, in table order.
pub fn earned(total_stars: u32, records: &[ProgressRecord]) -> Vec<&'static Achievement> {
    let mastered = mastered_count(records) as u32;

    ACHIEVEMENTS
        .iter()
        .filter(|achievement| match achievement.category {
            AchievementCategory::Stars => total_stars >= achievement.requirement,
            AchievementCategory::Letters => mastered >= achievement.requirement,
            // Streak tracking needs play-date history that is not recorded.
            AchievementCategory::Streak => false,
        })
        .collect()
}

/// Earned achievements whose keys are not already held.
pub fn newly_unlocked(
    total_stars: u32,
    records: &[ProgressRecord],
    unlocked: &HashSet<String>,
) -> Vec<&'static Achievement> {
    earned(total_stars, records)
        .into_iter()
        .filter(|achievement| !unlocked.contains(achievement.key))
        .collect()
}
