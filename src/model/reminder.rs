// File: ./src/model/reminder.rs
use super::entity::{Entity, require_text};
use super::recurrence::RecurrenceEngine;
use crate::storage::REMINDERS_KEY;
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a reminder advances past its anchor.
///
/// Stored as lowercase text. Text that is not one of the known rules is kept
/// as `Invalid` so it survives a load/save cycle; it never produces an
/// occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RepeatRule {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Invalid(String),
}

impl RepeatRule {
    pub fn is_repeating(&self) -> bool {
        matches!(self, Self::Daily | Self::Weekly | Self::Monthly)
    }

    /// Badge text for repeating rules.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Daily => Some("Daily"),
            Self::Weekly => Some("Weekly"),
            Self::Monthly => Some("Monthly"),
            Self::None | Self::Invalid(_) => None,
        }
    }
}

impl From<String> for RepeatRule {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Self::None,
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            _ => Self::Invalid(raw),
        }
    }
}

impl From<RepeatRule> for String {
    fn from(rule: RepeatRule) -> Self {
        match rule {
            RepeatRule::None => "none".to_string(),
            RepeatRule::Daily => "daily".to_string(),
            RepeatRule::Weekly => "weekly".to_string(),
            RepeatRule::Monthly => "monthly".to_string(),
            RepeatRule::Invalid(raw) => raw,
        }
    }
}

/// Opaque id returned by the notification service for one scheduled fire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationHandle(String);

impl NotificationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    #[serde(rename = "date")]
    pub anchor: DateTime<Utc>,
    #[serde(default)]
    pub repeat: RepeatRule,
    /// Live handle in the notification service, if any.
    #[serde(default, rename = "notificationId")]
    pub notification: Option<NotificationHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderFields {
    pub title: String,
    pub anchor: DateTime<Utc>,
    pub repeat: RepeatRule,
}

impl ReminderFields {
    pub fn new(title: &str, anchor: DateTime<Utc>, repeat: RepeatRule) -> Self {
        Self {
            title: title.to_string(),
            anchor,
            repeat,
        }
    }
}

impl Reminder {
    /// Next fire time at or after `now`, computed on the local wall clock so
    /// the time of day survives DST changes. `None` once a one-off reminder
    /// has passed.
    pub fn next_occurrence(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let anchor = self.anchor.with_timezone(&Local);
        let now = now.with_timezone(&Local);
        RecurrenceEngine::next_occurrence(&anchor, &self.repeat, &now)
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn is_completed(&self, now: DateTime<Utc>) -> bool {
        self.next_occurrence(now).is_none()
    }
}

impl Entity for Reminder {
    const STORE_KEY: &'static str = REMINDERS_KEY;
    type Fields = ReminderFields;

    fn id(&self) -> &str {
        &self.id
    }

    fn build(id: String, fields: ReminderFields) -> Self {
        Self {
            id,
            title: fields.title.trim().to_string(),
            anchor: fields.anchor,
            repeat: fields.repeat,
            notification: None,
        }
    }

    fn validate(fields: &ReminderFields) -> Result<()> {
        require_text(&fields.title, "Reminder title")
    }
}
