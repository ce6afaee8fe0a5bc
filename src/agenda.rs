// File: ./src/agenda.rs
//! Read-side views, recomputed on every call.
use crate::model::{Assignment, Reminder, RepeatRule};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

pub const COMPLETED_LABEL: &str = "Completed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaEntry {
    pub id: String,
    pub title: String,
    pub repeat: RepeatRule,
    /// `None` once a one-off reminder has passed (or the rule is invalid).
    pub next: Option<DateTime<Utc>>,
}

impl AgendaEntry {
    pub fn from_reminder(reminder: &Reminder, now: DateTime<Utc>) -> Self {
        Self {
            id: reminder.id.clone(),
            title: reminder.title.clone(),
            repeat: reminder.repeat.clone(),
            next: reminder.next_occurrence(now),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.next.is_none()
    }

    /// Text for the date line: the next time, or "Completed".
    pub fn when_label(&self) -> String {
        match self.next {
            Some(dt) => dt
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            None => COMPLETED_LABEL.to_string(),
        }
    }

    pub fn repeat_badge(&self) -> Option<&'static str> {
        self.repeat.label()
    }
}

/// Upcoming reminders first (soonest first), then completed ones.
/// Ties are broken by title.
pub fn reminder_agenda(reminders: &[Reminder], now: DateTime<Utc>) -> Vec<AgendaEntry> {
    let mut entries: Vec<AgendaEntry> = reminders
        .iter()
        .map(|r| AgendaEntry::from_reminder(r, now))
        .collect();

    entries.sort_by(|a, b| match (a.next, b.next) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.title.cmp(&b.title)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.title.cmp(&b.title),
    });
    entries
}

/// Assignments ordered by due time, earliest first.
pub fn assignments_by_due(assignments: &[Assignment]) -> Vec<Assignment> {
    let mut sorted = assignments.to_vec();
    sorted.sort_by(|a, b| {
        a.due
            .cmp(&b.due)
            .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssignmentFields, Entity, Priority, ReminderFields};
    use chrono::Duration;

    fn reminder(id: &str, title: &str, anchor: DateTime<Utc>, repeat: RepeatRule) -> Reminder {
        Reminder::build(id.to_string(), ReminderFields::new(title, anchor, repeat))
    }

    #[test]
    fn completed_reminders_sink_to_the_bottom() {
        let now = Utc::now();
        let reminders = vec![
            reminder("1", "Past", now - Duration::days(1), RepeatRule::None),
            reminder("2", "Later", now + Duration::days(3), RepeatRule::None),
            reminder("3", "Soon", now + Duration::hours(1), RepeatRule::None),
            reminder("4", "Broken", now + Duration::hours(1), RepeatRule::Invalid("x".into())),
        ];

        let agenda = reminder_agenda(&reminders, now);
        let titles: Vec<&str> = agenda.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Soon", "Later", "Broken", "Past"]);
        assert_eq!(agenda[3].when_label(), COMPLETED_LABEL);
        assert!(agenda[2].is_completed());
        assert_ne!(agenda[0].when_label(), COMPLETED_LABEL);
    }

    #[test]
    fn repeating_reminders_show_badge() {
        let now = Utc::now();
        let entry = AgendaEntry::from_reminder(
            &reminder("1", "Gym", now - Duration::days(10), RepeatRule::Weekly),
            now,
        );
        assert_eq!(entry.repeat_badge(), Some("Weekly"));
        assert!(!entry.is_completed());
    }

    #[test]
    fn assignments_sorted_by_due() {
        let now = Utc::now();
        let mut late = AssignmentFields::new("Late", now + Duration::days(5));
        late.priority = Priority::High;
        let early = AssignmentFields::new("Early", now + Duration::days(1));
        let mut tie_low = AssignmentFields::new("Tie low", now + Duration::days(2));
        tie_low.priority = Priority::Low;
        let mut tie_high = AssignmentFields::new("Tie high", now + Duration::days(2));
        tie_high.priority = Priority::High;

        let list = vec![
            Assignment::build("a".into(), late),
            Assignment::build("b".into(), tie_low),
            Assignment::build("c".into(), early),
            Assignment::build("d".into(), tie_high),
        ];
        let sorted = assignments_by_due(&list);
        let titles: Vec<&str> = sorted.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Early", "Tie high", "Tie low", "Late"]);
    }
}
