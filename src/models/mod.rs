// Typed request and response schemas for the wellness API

pub mod chat;
pub mod envelope;
pub mod gamification;
pub mod journal;
pub mod meditation;
pub mod mood;
pub mod planner;
pub mod profile;

pub use chat::{ChatReply, ChatRequest, ChatSuggestions};
pub use envelope::ApiEnvelope;
pub use gamification::{Badge, BadgesSummary, UserStats};
pub use journal::{JournalCreated, JournalEntry, JournalInsight, JournalPage, JournalRequest};
pub use meditation::{Meditation, MeditationLibrary};
pub use mood::{Mood, MoodLog, MoodLogCreated, MoodLogRequest, MoodLogsPage};
pub use planner::{DailyPlan, Task, TaskStatus, TaskUpdate};
pub use profile::{SignupRequest, UserProfile};
