// File: src/controller.rs
//! Command surface for the front end.
//! Every create/update/delete goes through this controller so that store
//! mutations, persistence and notification scheduling happen in one order.
//!
//! Reminder commands hold the store lock across the binder calls. The new
//! notification handle is written in the same save as the reminder fields, so
//! a stored reminder never points at a cancelled handle. A handle whose cancel
//! failed stays stored until a later save or delete cancels it.
use crate::agenda::{self, AgendaEntry};
use crate::binder::{Binding, NotificationBinder};
use crate::config::Config;
use crate::context::SharedContext;
use crate::model::{
    Assignment, AssignmentFields, ComponentFields, Course, CourseFields, Draft, GradeComponent,
    GradeCourse, GradeCourseFields, NotificationHandle, Reminder, ReminderFields,
    completion_ratio,
};
use crate::notify::{DesktopNotifier, NotificationService, PermissionStatus};
use crate::storage::{FileStore, SharedBackend};
use crate::store::PlannerStore;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct PlannerController<N: NotificationService> {
    pub store: Arc<Mutex<PlannerStore>>,
    binder: Arc<NotificationBinder<N>>,
    config: Config,
}

impl<N: NotificationService> Clone for PlannerController<N> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            binder: self.binder.clone(),
            config: self.config.clone(),
        }
    }
}

impl<N: NotificationService> PlannerController<N> {
    pub fn new(store: PlannerStore, service: Arc<N>, config: Config) -> Self {
        let binder = NotificationBinder::with_body(service, &config.notification_body);
        Self {
            store: Arc::new(Mutex::new(store)),
            binder: Arc::new(binder),
            config,
        }
    }

    /// Loads config and all collections from the context's directories.
    pub fn open(ctx: SharedContext, service: Arc<N>) -> Self {
        let config = Config::load_or_default(ctx.as_ref());
        Self::open_with(ctx, service, config)
    }

    fn open_with(ctx: SharedContext, service: Arc<N>, config: Config) -> Self {
        let backend: SharedBackend = Arc::new(FileStore::new(ctx));
        Self::new(PlannerStore::load(backend), service, config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &Arc<N> {
        self.binder.service()
    }

    /// Startup sequence: ask for permission once, then rebind every reminder.
    pub async fn start(&self) -> PermissionStatus {
        let status = self.binder.request_permission().await;
        let scheduled = self.refresh_reminders(Utc::now()).await;
        log::info!("Startup: permission {:?}, {} reminders scheduled", status, scheduled);
        status
    }

    /// Cancels whatever each reminder was bound to and schedules it afresh.
    ///
    /// Handles from a previous session may be stale; rebinding keeps at most
    /// one live notification per reminder. Returns how many are now scheduled.
    pub async fn refresh_reminders(&self, now: DateTime<Utc>) -> usize {
        let mut store = self.store.lock().await;
        let reminders = store.reminders.items().to_vec();

        let mut handles: HashMap<String, Option<NotificationHandle>> = HashMap::new();
        for reminder in &reminders {
            let binding = self
                .binder
                .update(reminder, reminder.notification.as_ref(), now)
                .await;
            handles.insert(reminder.id.clone(), binding.into_handle());
        }

        let scheduled = handles.values().filter(|h| h.is_some()).count();
        store.reminders.update_all(|r| {
            if let Some(handle) = handles.remove(&r.id) {
                r.notification = handle;
            }
        });
        scheduled
    }

    // --- Courses ---

    pub async fn save_course(&self, draft: Draft<CourseFields>) -> Result<Course> {
        let mut store = self.store.lock().await;
        Ok(store.courses.upsert(draft)?.clone())
    }

    pub async fn delete_course(&self, id: &str) -> Option<Course> {
        self.store.lock().await.courses.delete(id)
    }

    pub async fn courses(&self) -> Vec<Course> {
        self.store.lock().await.courses.items().to_vec()
    }

    // --- Assignments ---

    /// A blank form, preset with the configured default priority.
    pub fn blank_assignment(&self, due: DateTime<Utc>) -> AssignmentFields {
        AssignmentFields {
            priority: self.config.default_priority,
            ..AssignmentFields::new("", due)
        }
    }

    pub async fn save_assignment(&self, draft: Draft<AssignmentFields>) -> Result<Assignment> {
        let mut store = self.store.lock().await;
        Ok(store.assignments.upsert(draft)?.clone())
    }

    /// Flips the completed flag.
    pub async fn toggle_assignment(&self, id: &str) -> Option<Assignment> {
        self.store
            .lock()
            .await
            .assignments
            .update(id, |a| a.completed = !a.completed)
    }

    pub async fn delete_assignment(&self, id: &str) -> Option<Assignment> {
        self.store.lock().await.assignments.delete(id)
    }

    pub async fn assignments_by_due(&self) -> Vec<Assignment> {
        agenda::assignments_by_due(self.store.lock().await.assignments.items())
    }

    pub async fn completion_ratio(&self) -> f64 {
        completion_ratio(self.store.lock().await.assignments.items())
    }

    // --- Grades ---

    pub async fn save_grade_course(&self, draft: Draft<GradeCourseFields>) -> Result<GradeCourse> {
        let mut store = self.store.lock().await;
        Ok(store.grade_courses.upsert(draft)?.clone())
    }

    pub async fn delete_grade_course(&self, id: &str) -> Option<GradeCourse> {
        self.store.lock().await.grade_courses.delete(id)
    }

    pub async fn add_component(
        &self,
        course_id: &str,
        fields: ComponentFields,
    ) -> Result<GradeComponent> {
        GradeComponent::validate(&fields)?;
        let component = GradeComponent::new(fields);
        let added = component.clone();

        let mut store = self.store.lock().await;
        store
            .grade_courses
            .update(course_id, move |c| c.components.push(component))
            .ok_or_else(|| anyhow!("No grade course with id {}", course_id))?;
        Ok(added)
    }

    /// Stores the score text as typed. Non-numeric text counts as 0 in the grade.
    pub async fn set_component_score(
        &self,
        course_id: &str,
        component_id: &str,
        score: &str,
    ) -> Result<GradeComponent> {
        let mut store = self.store.lock().await;
        ensure_component(&store, course_id, component_id)?;

        let course = store
            .grade_courses
            .update(course_id, |c| {
                if let Some(component) = c.component_mut(component_id) {
                    component.score = score.trim().to_string();
                }
            })
            .ok_or_else(|| anyhow!("No grade course with id {}", course_id))?;
        course
            .components
            .into_iter()
            .find(|c| c.id == component_id)
            .ok_or_else(|| anyhow!("No component with id {}", component_id))
    }

    pub async fn remove_component(&self, course_id: &str, component_id: &str) -> Result<()> {
        let mut store = self.store.lock().await;
        ensure_component(&store, course_id, component_id)?;
        store
            .grade_courses
            .update(course_id, |c| c.components.retain(|comp| comp.id != component_id));
        Ok(())
    }

    pub async fn course_grade(&self, id: &str) -> Option<f64> {
        self.store
            .lock()
            .await
            .grade_courses
            .get(id)
            .map(GradeCourse::grade)
    }

    pub async fn grade_courses(&self) -> Vec<GradeCourse> {
        self.store.lock().await.grade_courses.items().to_vec()
    }

    // --- Reminders ---

    /// Saves a reminder and rebinds its notification.
    ///
    /// The previous handle (if any) is cancelled before the new one is
    /// requested. A reminder with no upcoming occurrence is stored unbound.
    /// If the cancel fails the fields are still saved, the old handle stays
    /// bound and no second notification is scheduled.
    pub async fn save_reminder(&self, draft: Draft<ReminderFields>) -> Result<Reminder> {
        self.save_reminder_at(draft, Utc::now()).await
    }

    pub async fn save_reminder_at(
        &self,
        draft: Draft<ReminderFields>,
        now: DateTime<Utc>,
    ) -> Result<Reminder> {
        let mut store = self.store.lock().await;
        let previous = draft
            .id()
            .and_then(|id| store.reminders.get(id))
            .and_then(|r| r.notification.clone());

        let mut reminder = store.reminders.prepare(draft)?;
        let binding = self.binder.update(&reminder, previous.as_ref(), now).await;
        match &binding {
            Binding::Unscheduled | Binding::Cancelled(_) => {
                log::debug!("Reminder {} saved without a notification", reminder.id);
            }
            Binding::Retained(handle) => {
                log::warn!("Reminder {} keeps stale notification {}", reminder.id, handle);
            }
            Binding::Scheduled(_) | Binding::Rescheduled { .. } => {}
        }
        reminder.notification = binding.into_handle();
        Ok(store.reminders.commit(reminder).clone())
    }

    /// Cancels the bound notification, then removes the reminder.
    ///
    /// `Ok(None)` for an unknown id. If the cancel fails the reminder is kept,
    /// so its live notification is still reachable, and an error is returned.
    pub async fn delete_reminder(&self, id: &str) -> Result<Option<Reminder>> {
        let mut store = self.store.lock().await;
        let Some(reminder) = store.reminders.get(id).cloned() else {
            return Ok(None);
        };
        if let Binding::Retained(handle) = self.binder.delete(&reminder).await {
            anyhow::bail!(
                "Could not cancel notification {} of reminder {}; reminder kept",
                handle,
                id
            );
        }
        Ok(store.reminders.delete(id))
    }

    pub async fn reminders(&self) -> Vec<Reminder> {
        self.store.lock().await.reminders.items().to_vec()
    }

    pub async fn reminder_agenda(&self, now: DateTime<Utc>) -> Vec<AgendaEntry> {
        agenda::reminder_agenda(self.store.lock().await.reminders.items(), now)
    }
}

impl PlannerController<DesktopNotifier> {
    /// File-backed planner that shows desktop popups under the configured app name.
    pub fn open_desktop(ctx: SharedContext) -> Self {
        let config = Config::load_or_default(ctx.as_ref());
        let service = Arc::new(DesktopNotifier::new(&config.app_name));
        Self::open_with(ctx, service, config)
    }
}

fn ensure_component(store: &PlannerStore, course_id: &str, component_id: &str) -> Result<()> {
    let course = store
        .grade_courses
        .get(course_id)
        .ok_or_else(|| anyhow!("No grade course with id {}", course_id))?;
    if !course.components.iter().any(|c| c.id == component_id) {
        anyhow::bail!("No component with id {} in {}", component_id, course.name);
    }
    Ok(())
}
