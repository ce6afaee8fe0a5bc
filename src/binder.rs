// File: ./src/binder.rs
//! Keeps each reminder bound to at most one scheduled notification.
//!
//! A reminder moves through `Unscheduled -> Scheduled -> (Rescheduled |
//! Cancelled)`. Any previously bound handle is cancelled, and the cancel
//! awaited, before a new schedule is requested. A failed schedule is logged
//! and leaves the reminder unscheduled.
//!
//! A failed cancel means the old notification may still fire, so nothing new
//! is scheduled and the old handle stays bound (`Retained`). The next update
//! or delete retries the cancel.
use crate::model::{NotificationHandle, Reminder};
use crate::notify::{NotificationService, PermissionStatus};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const DEFAULT_NOTIFICATION_BODY: &str = "Reminder triggered";

/// Outcome of one binder operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// No live notification for the reminder.
    Unscheduled,
    /// A notification was scheduled where none was bound before.
    Scheduled(NotificationHandle),
    /// `previous` was cancelled and replaced by `handle`.
    Rescheduled {
        previous: NotificationHandle,
        handle: NotificationHandle,
    },
    /// The bound notification was cancelled and nothing replaced it.
    Cancelled(NotificationHandle),
    /// Cancelling failed; the handle is still live and stays bound.
    Retained(NotificationHandle),
}

impl Binding {
    /// The handle to store on the reminder after this operation.
    pub fn handle(&self) -> Option<&NotificationHandle> {
        match self {
            Binding::Scheduled(h)
            | Binding::Rescheduled { handle: h, .. }
            | Binding::Retained(h) => Some(h),
            Binding::Unscheduled | Binding::Cancelled(_) => None,
        }
    }

    pub fn into_handle(self) -> Option<NotificationHandle> {
        match self {
            Binding::Scheduled(h)
            | Binding::Rescheduled { handle: h, .. }
            | Binding::Retained(h) => Some(h),
            Binding::Unscheduled | Binding::Cancelled(_) => None,
        }
    }
}

pub struct NotificationBinder<N: NotificationService> {
    service: Arc<N>,
    body: String,
}

impl<N: NotificationService> NotificationBinder<N> {
    pub fn new(service: Arc<N>) -> Self {
        Self::with_body(service, DEFAULT_NOTIFICATION_BODY)
    }

    pub fn with_body(service: Arc<N>, body: &str) -> Self {
        Self {
            service,
            body: body.to_string(),
        }
    }

    pub fn service(&self) -> &Arc<N> {
        &self.service
    }

    /// Asks the service for permission. Errors count as a denial.
    pub async fn request_permission(&self) -> PermissionStatus {
        match self.service.request_permission().await {
            Ok(status) => {
                if status == PermissionStatus::Denied {
                    log::warn!("Notification permission denied; reminders will not fire");
                }
                status
            }
            Err(e) => {
                log::warn!("Notification permission request failed: {}", e);
                PermissionStatus::Denied
            }
        }
    }

    /// Schedules the next occurrence if it lies strictly after `now`.
    pub async fn create(&self, reminder: &Reminder, now: DateTime<Utc>) -> Binding {
        let Some(fire_at) = reminder.next_occurrence(now).filter(|at| *at > now) else {
            log::debug!("Reminder {} has no upcoming occurrence", reminder.id);
            return Binding::Unscheduled;
        };

        match self.service.schedule(&reminder.title, &self.body, fire_at).await {
            Ok(handle) => {
                log::info!(
                    "Scheduled reminder {} at {} as {}",
                    reminder.id,
                    fire_at,
                    handle
                );
                Binding::Scheduled(handle)
            }
            Err(e) => {
                log::error!("Failed to schedule reminder {}: {}", reminder.id, e);
                Binding::Unscheduled
            }
        }
    }

    /// Cancels `previous` (if any), then schedules as [`Self::create`] does.
    /// If the cancel fails, `previous` is returned as `Retained`.
    pub async fn update(
        &self,
        reminder: &Reminder,
        previous: Option<&NotificationHandle>,
        now: DateTime<Utc>,
    ) -> Binding {
        let Some(previous) = previous else {
            return self.create(reminder, now).await;
        };

        if !self.cancel(&reminder.id, previous).await {
            return Binding::Retained(previous.clone());
        }
        match self.create(reminder, now).await {
            Binding::Scheduled(handle) => Binding::Rescheduled {
                previous: previous.clone(),
                handle,
            },
            _ => Binding::Cancelled(previous.clone()),
        }
    }

    /// Cancels the bound handle. A reminder without one is left alone.
    pub async fn delete(&self, reminder: &Reminder) -> Binding {
        let Some(handle) = &reminder.notification else {
            return Binding::Unscheduled;
        };
        if self.cancel(&reminder.id, handle).await {
            Binding::Cancelled(handle.clone())
        } else {
            Binding::Retained(handle.clone())
        }
    }

    /// Returns whether the handle is gone from the service.
    async fn cancel(&self, reminder_id: &str, handle: &NotificationHandle) -> bool {
        match self.service.cancel(handle).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!(
                    "Failed to cancel notification {} of reminder {}: {}",
                    handle,
                    reminder_id,
                    e
                );
                false
            }
        }
    }
}
