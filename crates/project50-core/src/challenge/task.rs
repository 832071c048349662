//! Daily tasks and the built-in template registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a daily task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    WakeUp,
    Exercise,
    Reading,
    Learning,
    Diet,
    Journal,
    /// User-defined task with its own title.
    Custom,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 7] = [
        TaskCategory::WakeUp,
        TaskCategory::Exercise,
        TaskCategory::Reading,
        TaskCategory::Learning,
        TaskCategory::Diet,
        TaskCategory::Journal,
        TaskCategory::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskCategory::WakeUp => "Wake up early",
            TaskCategory::Exercise => "Exercise",
            TaskCategory::Reading => "Reading",
            TaskCategory::Learning => "Learning",
            TaskCategory::Diet => "Diet",
            TaskCategory::Journal => "Journal",
            TaskCategory::Custom => "Custom",
        }
    }

    /// Symbol name the presentation layer maps to an icon.
    pub fn icon(&self) -> &'static str {
        match self {
            TaskCategory::WakeUp => "sunrise.fill",
            TaskCategory::Exercise => "figure.run",
            TaskCategory::Reading => "book.fill",
            TaskCategory::Learning => "brain.head.profile",
            TaskCategory::Diet => "leaf.fill",
            TaskCategory::Journal => "note.text",
            TaskCategory::Custom => "star.fill",
        }
    }
}

impl std::str::FromStr for TaskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "wake_up" | "wakeup" => Ok(TaskCategory::WakeUp),
            "exercise" => Ok(TaskCategory::Exercise),
            "reading" => Ok(TaskCategory::Reading),
            "learning" => Ok(TaskCategory::Learning),
            "diet" => Ok(TaskCategory::Diet),
            "journal" => Ok(TaskCategory::Journal),
            "custom" => Ok(TaskCategory::Custom),
            other => Err(format!("unknown task category: {other}")),
        }
    }
}

/// A selectable task template. Pure data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTemplate {
    pub category: TaskCategory,
    pub title: &'static str,
    pub description: &'static str,
}

impl TaskTemplate {
    pub fn icon(&self) -> &'static str {
        self.category.icon()
    }
}

const TEMPLATES: [TaskTemplate; 6] = [
    TaskTemplate {
        category: TaskCategory::WakeUp,
        title: "Wake up early",
        description: "Get up at 6:00 every day",
    },
    TaskTemplate {
        category: TaskCategory::Exercise,
        title: "Exercise",
        description: "One hour of exercise",
    },
    TaskTemplate {
        category: TaskCategory::Reading,
        title: "Reading",
        description: "Read 10 pages",
    },
    TaskTemplate {
        category: TaskCategory::Learning,
        title: "Learning",
        description: "Learn a new skill",
    },
    TaskTemplate {
        category: TaskCategory::Diet,
        title: "Healthy diet",
        description: "Log today's meals",
    },
    TaskTemplate {
        category: TaskCategory::Journal,
        title: "Journal",
        description: "Write down today's thoughts",
    },
];

/// The built-in task templates, in display order.
pub fn templates() -> &'static [TaskTemplate] {
    &TEMPLATES
}

/// Instantiate the templates whose category is in `categories`, in registry order.
pub fn templates_for(categories: &[TaskCategory]) -> Vec<TaskDefinition> {
    TEMPLATES
        .iter()
        .filter(|t| categories.contains(&t.category))
        .map(TaskDefinition::from_template)
        .collect()
}

/// One daily task of a challenge.
///
/// `completed` only describes the current challenge day; the engine clears
/// it whenever the day advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub reminder_time: Option<DateTime<Utc>>,
}

impl TaskDefinition {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: TaskCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            category,
            completed: false,
            reminder_time: None,
        }
    }

    pub fn from_template(template: &TaskTemplate) -> Self {
        Self::new(template.title, template.description, template.category)
    }

    pub fn custom(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, TaskCategory::Custom)
    }

    pub fn with_reminder(mut self, at: DateTime<Utc>) -> Self {
        self.reminder_time = Some(at);
        self
    }

    pub fn icon(&self) -> &'static str {
        self.category.icon()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_one_template_per_builtin_category() {
        let cats: Vec<_> = templates().iter().map(|t| t.category).collect();
        assert_eq!(cats.len(), 6);
        assert!(!cats.contains(&TaskCategory::Custom));
        for cat in &cats {
            assert_eq!(cats.iter().filter(|c| *c == cat).count(), 1);
        }
    }

    #[test]
    fn templates_for_keeps_registry_order() {
        let tasks = templates_for(&[TaskCategory::Journal, TaskCategory::WakeUp]);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].category, TaskCategory::WakeUp);
        assert_eq!(tasks[1].category, TaskCategory::Journal);
        assert!(tasks.iter().all(|t| !t.completed));
        assert_ne!(tasks[0].id, tasks[1].id);
    }

    #[test]
    fn category_parses_cli_spellings() {
        assert_eq!("wake-up".parse::<TaskCategory>(), Ok(TaskCategory::WakeUp));
        assert_eq!("Reading".parse::<TaskCategory>(), Ok(TaskCategory::Reading));
        assert!("gardening".parse::<TaskCategory>().is_err());
    }

    #[test]
    fn task_serialization_uses_snake_case_category() {
        let task = TaskDefinition::custom("Cold shower", "2 minutes");
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["category"], "custom");
        assert_eq!(task.icon(), "star.fill");
    }
}
