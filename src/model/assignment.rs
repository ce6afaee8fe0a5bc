// File: ./src/model/assignment.rs
use super::entity::{Entity, require_text};
use crate::storage::ASSIGNMENTS_KEY;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

// Anything unrecognised in stored data reads back as the default.
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .and_then(|s| s.trim().parse::<Priority>().ok())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub title: String,
    /// Free-text course label; not a reference to a stored course.
    #[serde(default)]
    pub course: String,
    #[serde(rename = "dueDate")]
    pub due: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentFields {
    pub title: String,
    pub course: String,
    pub due: DateTime<Utc>,
    pub description: String,
    pub priority: Priority,
    pub completed: bool,
}

impl AssignmentFields {
    pub fn new(title: &str, due: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            course: String::new(),
            due,
            description: String::new(),
            priority: Priority::default(),
            completed: false,
        }
    }
}

impl Assignment {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due < now
    }
}

impl Entity for Assignment {
    const STORE_KEY: &'static str = ASSIGNMENTS_KEY;
    type Fields = AssignmentFields;

    fn id(&self) -> &str {
        &self.id
    }

    fn build(id: String, fields: AssignmentFields) -> Self {
        Self {
            id,
            title: fields.title.trim().to_string(),
            course: fields.course,
            due: fields.due,
            description: fields.description,
            priority: fields.priority,
            completed: fields.completed,
        }
    }

    fn validate(fields: &AssignmentFields) -> Result<()> {
        require_text(&fields.title, "Assignment title")
    }
}
