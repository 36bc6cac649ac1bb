use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meditation {
    pub id: String,
    pub name: String,
    pub url: String,
    pub file_name: Option<String>,
    #[serde(default)]
    pub size_mb: f64,
    pub category: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

/// `GET /api/meditations/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeditationLibrary {
    /// Category name to its meditations, e.g. `sleep`, `stress_relief`
    pub categories: BTreeMap<String, Vec<Meditation>>,
    #[serde(default)]
    pub total_meditations: u32,
    #[serde(default)]
    pub user_completed: u32,
    pub featured_meditation: Option<Meditation>,
}

impl MeditationLibrary {
    /// Non-empty categories with a display title ("stress_relief" -> "STRESS RELIEF")
    pub fn sections(&self) -> impl Iterator<Item = (String, &[Meditation])> {
        self.categories
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(name, items)| (name.replace('_', " ").to_uppercase(), items.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_library_and_sections() {
        let json = r#"{
            "categories": {
                "stress_relief": [{"id": "m_calm", "name": "calm", "file_name": "calm.mp3",
                    "url": "https://cdn.example/calm.mp3", "size_mb": 4.2, "category": "stress_relief",
                    "duration": "Unknown", "description": "Release tension", "completed": true}],
                "sleep": [],
                "focus": [{"id": "m_focus", "name": "focus", "url": "https://cdn.example/focus.mp3"}]
            },
            "total_meditations": 2,
            "user_completed": 1,
            "featured_meditation": null
        }"#;
        let library: MeditationLibrary = serde_json::from_str(json).unwrap();
        let sections: Vec<_> = library.sections().collect();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].0, "FOCUS");
        assert_eq!(sections[1].0, "STRESS RELIEF");
        assert!(sections[1].1[0].completed);
        assert!(library.featured_meditation.is_none());
    }
}
