use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cta_type: String,
    #[serde(default)]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub status: TaskStatus,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Today's plan from `GET /api/planner/today`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPlan {
    pub date: String,
    pub tasks: Vec<Task>,
    pub generated_at: Option<String>,
    pub total_estimated_minutes: Option<u32>,
}

impl DailyPlan {
    pub fn pending(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.status == TaskStatus::Pending)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count()
    }

    /// Minutes across all tasks, preferring the backend's total
    pub fn estimated_minutes(&self) -> u32 {
        self.total_estimated_minutes
            .unwrap_or_else(|| self.tasks.iter().map(|t| t.estimated_minutes).sum())
    }
}

/// Result of completing or skipping a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub points_earned: u32,
    pub total_completed: Option<u32>,
    pub streak_days: Option<u32>,
}
