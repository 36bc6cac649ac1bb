use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsOverview {
    #[serde(default)]
    pub total_points: u32,
    #[serde(default)]
    pub current_level: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub total_badges: u32,
    pub member_since: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityStats {
    #[serde(default)]
    pub total_mood_logs: u32,
    #[serde(default)]
    pub total_journal_entries: u32,
    #[serde(default)]
    pub total_completed_tasks: u32,
    #[serde(default)]
    pub activity_frequency: Map<String, Value>,
}

/// `GET /api/gamification/stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub overview: StatsOverview,
    #[serde(default)]
    pub activity_stats: ActivityStats,
    #[serde(default)]
    pub personal_bests: Map<String, Value>,
    #[serde(default)]
    pub weekly_progress: Map<String, Value>,
    #[serde(default)]
    pub achievements: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub earned_at: Option<String>,
    pub points: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserLevel {
    #[serde(default)]
    pub current_level: u32,
    #[serde(default)]
    pub total_points: u32,
    #[serde(default)]
    pub points_for_next_level: u32,
}

/// `GET /api/gamification/badges`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgesSummary {
    pub earned_badges: Vec<Badge>,
    #[serde(default)]
    pub new_badges: Vec<Badge>,
    #[serde(default)]
    pub total_badges: u32,
    #[serde(default)]
    pub available_badges: u32,
    #[serde(default)]
    pub user_level: UserLevel,
}

impl BadgesSummary {
    /// Most recent badges for a compact view
    pub fn highlights(&self, n: usize) -> &[Badge] {
        &self.earned_badges[..n.min(self.earned_badges.len())]
    }
}
