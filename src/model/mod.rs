// File: ./src/model/mod.rs
pub mod assignment;
pub mod course;
pub mod entity;
pub mod grade;
pub mod recurrence;
pub mod reminder;

pub use assignment::{Assignment, AssignmentFields, Priority};
pub use course::{Course, CourseFields, parse_days, parse_time};
pub use entity::{Draft, Entity};
pub use grade::{
    ComponentFields, GradeComponent, GradeCourse, GradeCourseFields, completion_ratio,
    course_grade, parse_percent,
};
pub use recurrence::RecurrenceEngine;
pub use reminder::{NotificationHandle, Reminder, ReminderFields, RepeatRule};
