// File: ./src/model/grade.rs
//! Weighted grade aggregation.
//!
//! Weights and scores are kept as the text the user typed. Anything that does
//! not parse as a finite number counts as 0, so aggregation never fails.
use super::assignment::Assignment;
use super::entity::{Entity, require_text};
use crate::storage::GRADE_COURSES_KEY;
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeComponent {
    pub id: String,
    pub name: String,
    /// Percentage weight as entered, e.g. "40".
    #[serde(default, deserialize_with = "numeric_text")]
    pub weight: String,
    /// Achieved score in percent, empty when not graded yet.
    #[serde(default, deserialize_with = "numeric_text")]
    pub score: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentFields {
    pub name: String,
    pub weight: String,
    pub score: String,
}

impl GradeComponent {
    pub fn new(fields: ComponentFields) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: fields.name.trim().to_string(),
            weight: fields.weight.trim().to_string(),
            score: fields.score.trim().to_string(),
        }
    }

    pub fn validate(fields: &ComponentFields) -> Result<()> {
        require_text(&fields.name, "Component name")?;
        require_text(&fields.weight, "Component weight")
    }

    pub fn weight_value(&self) -> f64 {
        parse_percent(&self.weight)
    }

    pub fn score_value(&self) -> f64 {
        parse_percent(&self.score)
    }

    pub fn is_graded(&self) -> bool {
        !self.score.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCourse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub components: Vec<GradeComponent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeCourseFields {
    pub name: String,
    pub components: Vec<GradeComponent>,
}

impl GradeCourse {
    pub fn grade(&self) -> f64 {
        course_grade(&self.components)
    }

    pub fn component_mut(&mut self, component_id: &str) -> Option<&mut GradeComponent> {
        self.components.iter_mut().find(|c| c.id == component_id)
    }
}

impl Entity for GradeCourse {
    const STORE_KEY: &'static str = GRADE_COURSES_KEY;
    type Fields = GradeCourseFields;

    fn id(&self) -> &str {
        &self.id
    }

    fn build(id: String, fields: GradeCourseFields) -> Self {
        Self {
            id,
            name: fields.name.trim().to_string(),
            components: fields.components,
        }
    }

    fn validate(fields: &GradeCourseFields) -> Result<()> {
        require_text(&fields.name, "Course name")
    }
}

/// Parses a percentage as typed ("85", " 92.5 ", "70%"). Invalid input is 0.
pub fn parse_percent(raw: &str) -> f64 {
    raw.trim()
        .trim_end_matches('%')
        .trim_end()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Weighted course percentage: `earned / total_weight * 100`, or 0 without weight.
///
/// Not clamped to 100: a score above 100 is bonus credit and may lift the
/// course above 100%.
pub fn course_grade(components: &[GradeComponent]) -> f64 {
    let (total_weight, earned) = components.iter().fold((0.0, 0.0), |(total, earned), c| {
        let weight = c.weight_value();
        (total + weight, earned + weight * c.score_value() / 100.0)
    });

    if total_weight > 0.0 {
        earned / total_weight * 100.0
    } else {
        0.0
    }
}

/// Share of completed assignments in `[0, 1]`, 0 for an empty list.
pub fn completion_ratio(assignments: &[Assignment]) -> f64 {
    if assignments.is_empty() {
        return 0.0;
    }
    let done = assignments.iter().filter(|a| a.completed).count();
    done as f64 / assignments.len() as f64
}

// Accepts "40", 40, 40.5 or null; numbers are kept as their text form.
fn numeric_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(weight: &str, score: &str) -> GradeComponent {
        GradeComponent::new(ComponentFields {
            name: "part".to_string(),
            weight: weight.to_string(),
            score: score.to_string(),
        })
    }

    #[test]
    fn parse_percent_variants() {
        assert_eq!(parse_percent("85"), 85.0);
        assert_eq!(parse_percent(" 92.5 "), 92.5);
        assert_eq!(parse_percent("70%"), 70.0);
        assert_eq!(parse_percent(""), 0.0);
        assert_eq!(parse_percent("abc"), 0.0);
        assert_eq!(parse_percent("NaN"), 0.0);
        assert_eq!(parse_percent("inf"), 0.0);
    }

    #[test]
    fn unparseable_inputs_count_as_zero() {
        let grade = course_grade(&[comp("50", "80"), comp("50", "n/a")]);
        assert!((grade - 40.0).abs() < 1e-9);

        // A non-numeric weight removes the component from the total.
        let grade = course_grade(&[comp("heavy", "10"), comp("20", "90")]);
        assert!((grade - 90.0).abs() < 1e-9);
    }

    #[test]
    fn numbers_in_stored_json_are_accepted() {
        let json = r#"{"id":"x","name":"Midterm","weight":30,"score":null}"#;
        let c: GradeComponent = serde_json::from_str(json).unwrap();
        assert_eq!(c.weight, "30");
        assert_eq!(c.score, "");
        assert!(!c.is_graded());
    }

    #[test]
    fn component_needs_name_and_weight() {
        let mut fields = ComponentFields {
            name: "Final".to_string(),
            weight: String::new(),
            score: String::new(),
        };
        assert!(GradeComponent::validate(&fields).is_err());
        fields.weight = "40".to_string();
        assert!(GradeComponent::validate(&fields).is_ok());
    }
}
