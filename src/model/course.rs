// File: ./src/model/course.rs
use super::entity::{Entity, require_text};
use crate::storage::COURSES_KEY;
use anyhow::Result;
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    /// Meeting days, Monday first, no duplicates.
    #[serde(default, deserialize_with = "days_value")]
    pub days: Vec<Weekday>,
    #[serde(default, deserialize_with = "time_value")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub credits: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFields {
    pub name: String,
    pub days: Vec<Weekday>,
    pub time: Option<NaiveTime>,
    pub location: String,
    pub credits: Option<u32>,
}

impl Course {
    pub fn meets_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    /// Short schedule line, e.g. "Mon/Wed 09:30 @ Room 101".
    pub fn schedule_summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.days.is_empty() {
            let days: Vec<String> = self.days.iter().map(|d| d.to_string()).collect();
            parts.push(days.join("/"));
        }
        if let Some(t) = self.time {
            parts.push(t.format("%H:%M").to_string());
        }
        let mut line = parts.join(" ");
        if !self.location.trim().is_empty() {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str("@ ");
            line.push_str(self.location.trim());
        }
        line
    }
}

/// Reads typed day text such as "Mon, Wed" or "Tuesday/Thursday".
/// Words that are not weekdays are skipped.
pub fn parse_days(text: &str) -> Vec<Weekday> {
    let days = text
        .split(|c: char| c == ',' || c == '/' || c == '&' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.parse::<Weekday>() {
            Ok(day) => Some(day),
            Err(_) => {
                log::debug!("Ignoring unknown weekday {:?}", token);
                None
            }
        })
        .collect();
    normalize_days(days)
}

const TIME_FORMATS: [&str; 4] = ["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M%p"];

/// Reads a typed start time ("09:30", "9:30 AM", "14:00 - 15:15").
/// Only the start of a range is kept; anything unreadable is `None`.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let start = text.split('-').next()?.trim().to_ascii_uppercase();
    if start.is_empty() {
        return None;
    }
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&start, fmt).ok())
}

// Accepts a list of day names or one free-text string.
fn days_value<'de, D>(deserializer: D) -> std::result::Result<Vec<Weekday>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => parse_days(&s),
        Value::Array(items) => {
            let joined: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            parse_days(&joined.join(","))
        }
        _ => Vec::new(),
    })
}

fn time_value<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => parse_time(&s),
        _ => None,
    })
}

fn normalize_days(mut days: Vec<Weekday>) -> Vec<Weekday> {
    days.sort_by_key(|d| d.num_days_from_monday());
    days.dedup();
    days
}

impl Entity for Course {
    const STORE_KEY: &'static str = COURSES_KEY;
    type Fields = CourseFields;

    fn id(&self) -> &str {
        &self.id
    }

    fn build(id: String, fields: CourseFields) -> Self {
        Self {
            id,
            name: fields.name.trim().to_string(),
            days: normalize_days(fields.days),
            time: fields.time,
            location: fields.location,
            credits: fields.credits,
        }
    }

    fn validate(fields: &CourseFields) -> Result<()> {
        require_text(&fields.name, "Course name")
    }
}
