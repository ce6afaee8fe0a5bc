// File: ./src/notify.rs
//! The external notification capability and its implementations.
//!
//! The planner only needs three operations: ask for permission, schedule one
//! fire at an instant (getting a handle back) and cancel a handle.
use crate::model::NotificationHandle;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notify_rust::Notification;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep_until};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus>;

    async fn schedule(
        &self,
        title: &str,
        body: &str,
        fire_at: DateTime<Utc>,
    ) -> Result<NotificationHandle>;

    /// Cancelling an unknown or already fired handle is not an error.
    async fn cancel(&self, handle: &NotificationHandle) -> Result<()>;
}

// --- Desktop Implementation ---

/// Shows desktop popups via `notify-rust`, one timer task per handle.
///
/// Must be used from inside a tokio runtime.
#[derive(Debug)]
pub struct DesktopNotifier {
    app_name: String,
    pending: Mutex<HashMap<NotificationHandle, JoinHandle<()>>>,
}

impl DesktopNotifier {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn pending_count(&self) -> usize {
        let mut pending = self.pending.lock().unwrap();
        pending.retain(|_, task| !task.is_finished());
        pending.len()
    }
}

impl Drop for DesktopNotifier {
    fn drop(&mut self) {
        if let Ok(pending) = self.pending.get_mut() {
            for (_, task) in pending.drain() {
                task.abort();
            }
        }
    }
}

#[async_trait]
impl NotificationService for DesktopNotifier {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        // Desktop notification daemons do not gate on a permission prompt.
        Ok(PermissionStatus::Granted)
    }

    async fn schedule(
        &self,
        title: &str,
        body: &str,
        fire_at: DateTime<Utc>,
    ) -> Result<NotificationHandle> {
        let handle = NotificationHandle::new(Uuid::new_v4().to_string());
        let summary = title.to_string();
        let body = body.to_string();
        let app_name = self.app_name.clone();

        let millis_until = (fire_at - Utc::now()).num_milliseconds().max(0) as u64;
        let deadline = Instant::now() + Duration::from_millis(millis_until);

        let task = tokio::spawn(async move {
            sleep_until(deadline).await;
            let shown = tokio::task::spawn_blocking(move || {
                Notification::new()
                    .summary(&summary)
                    .body(&body)
                    .appname(&app_name)
                    .show()
                    .map(|_| ())
            })
            .await;
            match shown {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!("Failed to show notification: {}", e),
                Err(e) => log::warn!("Notification task failed: {}", e),
            }
        });

        let mut pending = self.pending.lock().unwrap();
        pending.retain(|_, t| !t.is_finished());
        pending.insert(handle.clone(), task);
        log::debug!("Scheduled notification {} for {}", handle, fire_at);
        Ok(handle)
    }

    async fn cancel(&self, handle: &NotificationHandle) -> Result<()> {
        if let Some(task) = self.pending.lock().unwrap().remove(handle) {
            task.abort();
            log::debug!("Cancelled notification {}", handle);
        }
        Ok(())
    }
}

// --- In-Memory Implementation ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub handle: NotificationHandle,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    live: Vec<ScheduledNotification>,
    cancelled: Vec<NotificationHandle>,
    deny_permission: bool,
    fail_next_schedule: bool,
    fail_cancel: bool,
    counter: u64,
}

/// Records scheduled notifications instead of delivering them.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    state: Mutex<MemoryState>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behave like a service whose permission prompt was declined:
    /// `schedule` fails until permission is granted again.
    pub fn set_permission_denied(&self, denied: bool) {
        self.state.lock().unwrap().deny_permission = denied;
    }

    pub fn fail_next_schedule(&self) {
        self.state.lock().unwrap().fail_next_schedule = true;
    }

    pub fn set_fail_cancel(&self, fail: bool) {
        self.state.lock().unwrap().fail_cancel = fail;
    }

    pub fn live(&self) -> Vec<ScheduledNotification> {
        self.state.lock().unwrap().live.clone()
    }

    pub fn live_for_title(&self, title: &str) -> Vec<ScheduledNotification> {
        self.live().into_iter().filter(|n| n.title == title).collect()
    }

    pub fn is_live(&self, handle: &NotificationHandle) -> bool {
        self.state
            .lock()
            .unwrap()
            .live
            .iter()
            .any(|n| &n.handle == handle)
    }

    pub fn cancelled(&self) -> Vec<NotificationHandle> {
        self.state.lock().unwrap().cancelled.clone()
    }
}

#[async_trait]
impl NotificationService for MemoryNotifier {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        if self.state.lock().unwrap().deny_permission {
            Ok(PermissionStatus::Denied)
        } else {
            Ok(PermissionStatus::Granted)
        }
    }

    async fn schedule(
        &self,
        title: &str,
        body: &str,
        fire_at: DateTime<Utc>,
    ) -> Result<NotificationHandle> {
        let mut state = self.state.lock().unwrap();
        if state.deny_permission {
            anyhow::bail!("Notification permission denied");
        }
        if state.fail_next_schedule {
            state.fail_next_schedule = false;
            anyhow::bail!("Scheduling failed");
        }
        state.counter += 1;
        let handle = NotificationHandle::new(format!("mem-{}", state.counter));
        state.live.push(ScheduledNotification {
            handle: handle.clone(),
            title: title.to_string(),
            body: body.to_string(),
            fire_at,
        });
        Ok(handle)
    }

    async fn cancel(&self, handle: &NotificationHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_cancel {
            anyhow::bail!("Cancel failed for {}", handle);
        }
        state.live.retain(|n| &n.handle != handle);
        state.cancelled.push(handle.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_notifier_tracks_live_handles() {
        let notifier = MemoryNotifier::new();
        let at = Utc::now() + chrono::Duration::hours(1);
        let h1 = notifier.schedule("A", "body", at).await.unwrap();
        let h2 = notifier.schedule("B", "body", at).await.unwrap();
        assert_ne!(h1, h2);
        assert_eq!(notifier.live().len(), 2);

        notifier.cancel(&h1).await.unwrap();
        assert!(!notifier.is_live(&h1));
        assert!(notifier.is_live(&h2));

        // Idempotent
        notifier.cancel(&h1).await.unwrap();
        assert_eq!(notifier.live().len(), 1);
    }

    #[tokio::test]
    async fn memory_notifier_denied_permission_rejects_schedule() {
        let notifier = MemoryNotifier::new();
        notifier.set_permission_denied(true);
        assert_eq!(
            notifier.request_permission().await.unwrap(),
            PermissionStatus::Denied
        );
        assert!(notifier.schedule("A", "b", Utc::now()).await.is_err());
        assert!(notifier.live().is_empty());
    }

    #[tokio::test]
    async fn desktop_notifier_cancel_aborts_timer() {
        let notifier = DesktopNotifier::new("Coursemate");
        let at = Utc::now() + chrono::Duration::days(1);
        let handle = notifier.schedule("Later", "body", at).await.unwrap();
        assert_eq!(notifier.pending_count(), 1);

        notifier.cancel(&handle).await.unwrap();
        assert_eq!(notifier.pending_count(), 0);

        // Unknown handles are ignored
        notifier
            .cancel(&NotificationHandle::new("missing"))
            .await
            .unwrap();
    }
}
