// File: tests/entity_store.rs
use coursemate::context::{AppContext, TestContext};
use coursemate::model::{
    Assignment, AssignmentFields, ComponentFields, Course, CourseFields, Draft, GradeComponent,
    GradeCourse, GradeCourseFields, Priority, Reminder, ReminderFields, RepeatRule,
};
use coursemate::storage::{
    ASSIGNMENTS_KEY, COURSES_KEY, FileStore, GRADE_COURSES_KEY, KeyValueStore, MemoryStore, REMINDERS_KEY,
    SharedBackend,
};
use coursemate::store::{Collection, PlannerStore};
use chrono::{NaiveTime, TimeZone, Utc, Weekday};
use serde_json::Value;
use std::sync::Arc;

fn file_backend(ctx: &Arc<TestContext>) -> SharedBackend {
    let ctx: Arc<dyn AppContext> = ctx.clone();
    Arc::new(FileStore::new(ctx))
}

fn stored_entries(backend: &SharedBackend, key: &str) -> Vec<Value> {
    let raw = backend.get(key).unwrap().unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn test_file_store_roundtrip_all_kinds() {
    let ctx = Arc::new(TestContext::new());
    let backend = file_backend(&ctx);
    let due = Utc.with_ymd_and_hms(2024, 10, 1, 23, 59, 0).unwrap();

    let mut store = PlannerStore::load(backend.clone());
    store
        .courses
        .upsert(Draft::New(CourseFields {
            name: "Linear Algebra".into(),
            days: vec![Weekday::Wed, Weekday::Mon, Weekday::Wed],
            time: NaiveTime::from_hms_opt(9, 30, 0),
            location: "Room 101".into(),
            credits: Some(5),
        }))
        .unwrap();
    store
        .assignments
        .upsert(Draft::New(AssignmentFields {
            title: "Problem set 3".into(),
            course: "Linear Algebra".into(),
            due,
            description: "Exercises 1-12".into(),
            priority: Priority::High,
            completed: true,
        }))
        .unwrap();
    store
        .grade_courses
        .upsert(Draft::New(GradeCourseFields {
            name: "Linear Algebra".into(),
            components: vec![GradeComponent::new(ComponentFields {
                name: "Midterm".into(),
                weight: "40".into(),
                score: "88.5".into(),
            })],
        }))
        .unwrap();
    store
        .reminders
        .upsert(Draft::New(ReminderFields::new("Office hours", due, RepeatRule::Weekly)))
        .unwrap();

    let reloaded = PlannerStore::load(backend);
    assert_eq!(reloaded.courses.items(), store.courses.items());
    assert_eq!(reloaded.assignments.items(), store.assignments.items());
    assert_eq!(reloaded.grade_courses.items(), store.grade_courses.items());
    assert_eq!(reloaded.reminders.items(), store.reminders.items());

    let course = &reloaded.courses.items()[0];
    assert_eq!(course.days, vec![Weekday::Mon, Weekday::Wed]);
    assert_eq!(course.schedule_summary(), "Mon/Wed 09:30 @ Room 101");
    assert!(ctx.get_store_file_path("@courses").unwrap().exists());
}

#[test]
fn test_delete_leaves_other_entries_untouched() {
    let backend: SharedBackend = Arc::new(MemoryStore::new());
    let mut reminders: Collection<Reminder> = Collection::load(backend.clone());
    let at = Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap();

    let ids: Vec<String> = ["One", "Two", "Three"]
        .iter()
        .map(|t| {
            reminders
                .upsert(Draft::New(ReminderFields::new(t, at, RepeatRule::Daily)))
                .unwrap()
                .id
                .clone()
        })
        .collect();

    let before = stored_entries(&backend, REMINDERS_KEY);
    let removed = reminders.delete(&ids[1]).unwrap();
    assert_eq!(removed.title, "Two");
    let after = stored_entries(&backend, REMINDERS_KEY);

    assert_eq!(after.len(), 2);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1], before[2]);

    // Unknown ids are a no-op
    assert!(reminders.delete("missing").is_none());
    assert_eq!(stored_entries(&backend, REMINDERS_KEY), after);
}

#[test]
fn test_update_keeps_position_and_id() {
    let backend: SharedBackend = Arc::new(MemoryStore::new());
    let mut assignments: Collection<Assignment> = Collection::load(backend.clone());
    let due = Utc::now();

    let first = assignments
        .upsert(Draft::New(AssignmentFields::new("First", due)))
        .unwrap()
        .id
        .clone();
    assignments
        .upsert(Draft::New(AssignmentFields::new("Second", due)))
        .unwrap();

    let mut edit = AssignmentFields::new("First, revised", due);
    edit.priority = Priority::Low;
    assignments
        .upsert(Draft::Existing(first.clone(), edit))
        .unwrap();

    let stored = stored_entries(&backend, ASSIGNMENTS_KEY);
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["id"], Value::String(first));
    assert_eq!(stored[0]["title"], "First, revised");
    assert_eq!(stored[0]["priority"], "low");
}

#[test]
fn test_blank_names_are_rejected() {
    let backend: SharedBackend = Arc::new(MemoryStore::new());
    let mut courses: Collection<Course> = Collection::load(backend.clone());
    let mut grades: Collection<GradeCourse> = Collection::load(backend.clone());

    assert!(courses.upsert(Draft::New(CourseFields::default())).is_err());
    assert!(
        grades
            .upsert(Draft::New(GradeCourseFields {
                name: "   ".into(),
                components: Vec::new(),
            }))
            .is_err()
    );
    assert!(backend.get(GRADE_COURSES_KEY).unwrap().is_none());
}

#[test]
fn test_legacy_content_is_tolerated() {
    let backend = Arc::new(MemoryStore::new());
    backend.insert_raw(
        ASSIGNMENTS_KEY,
        r#"[{"id":"1","title":"Old","dueDate":"2024-01-01T00:00:00Z","priority":"urgent"}]"#,
    );
    backend.insert_raw(
        REMINDERS_KEY,
        r#"[{"id":"r","title":"Old","date":"2024-01-01T00:00:00Z","repeat":"yearly"}]"#,
    );
    backend.insert_raw(GRADE_COURSES_KEY, "not json at all");
    backend.insert_raw(
        COURSES_KEY,
        r#"[{"id":"c","name":"History","time":"1:15 PM","days":"Tue, Thu","location":"B12"}]"#,
    );

    let store = PlannerStore::load(backend);
    let assignment = &store.assignments.items()[0];
    assert_eq!(assignment.priority, Priority::Medium);
    assert!(!assignment.completed);

    let reminder = &store.reminders.items()[0];
    assert_eq!(reminder.repeat, RepeatRule::Invalid("yearly".into()));
    assert!(reminder.notification.is_none());

    assert!(store.grade_courses.is_empty());

    let course = &store.courses.items()[0];
    assert_eq!(course.days, vec![Weekday::Tue, Weekday::Thu]);
    assert_eq!(course.time, NaiveTime::from_hms_opt(13, 15, 0));
    assert_eq!(course.location, "B12");
}
