// File: src/store.rs
//! In-memory entity collections with write-through persistence.
//!
//! The in-memory list is the source of truth for the session. Every mutation
//! rewrites the whole collection under its key; a failed write is logged and
//! the in-memory state is kept as is.
use crate::model::{Assignment, Course, Draft, Entity, GradeCourse, Reminder};
use crate::storage::SharedBackend;
use anyhow::Result;
use uuid::Uuid;

#[derive(Debug)]
pub struct Collection<T: Entity> {
    items: Vec<T>,
    backend: SharedBackend,
}

impl<T: Entity> Collection<T> {
    /// Reads the whole collection. Missing or unreadable content is an empty list.
    pub fn load(backend: SharedBackend) -> Self {
        let items = match backend.get(T::STORE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<T>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    log::warn!("Discarding unreadable {} data: {}", T::STORE_KEY, e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Failed to read {}: {}", T::STORE_KEY, e);
                Vec::new()
            }
        };
        log::debug!("Loaded {} entries from {}", items.len(), T::STORE_KEY);
        Self { items, backend }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|e| e.id() == id)
    }

    /// Writes the full collection, replacing whatever was stored before.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.items)?;
        self.backend.set(T::STORE_KEY, &json)
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            log::error!("Failed to save {}: {}", T::STORE_KEY, e);
        }
    }

    /// Builds the entity a draft describes without storing it.
    ///
    /// New drafts get a fresh id. Existing drafts must refer to a stored id.
    pub fn prepare(&self, draft: Draft<T::Fields>) -> Result<T> {
        T::validate(draft.fields())?;
        match draft {
            Draft::New(fields) => Ok(T::build(Uuid::new_v4().to_string(), fields)),
            Draft::Existing(id, fields) => {
                if self.get(&id).is_none() {
                    anyhow::bail!("No entry with id {} in {}", id, T::STORE_KEY);
                }
                Ok(T::build(id, fields))
            }
        }
    }

    /// Replaces the entry with the same id, or appends it, then persists.
    pub fn commit(&mut self, entity: T) -> &T {
        let idx = match self.items.iter().position(|e| e.id() == entity.id()) {
            Some(idx) => {
                self.items[idx] = entity;
                idx
            }
            None => {
                self.items.push(entity);
                self.items.len() - 1
            }
        };
        self.persist();
        &self.items[idx]
    }

    pub fn upsert(&mut self, draft: Draft<T::Fields>) -> Result<&T> {
        let entity = self.prepare(draft)?;
        Ok(self.commit(entity))
    }

    /// Mutates one entry in place and persists. Returns the updated copy.
    pub fn update<F>(&mut self, id: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let entity = self.items.iter_mut().find(|e| e.id() == id)?;
        f(entity);
        let updated = entity.clone();
        self.persist();
        Some(updated)
    }

    /// Applies `f` to every entry, then persists once.
    pub fn update_all<F>(&mut self, f: F)
    where
        F: FnMut(&mut T),
    {
        self.items.iter_mut().for_each(f);
        self.persist();
    }

    /// Removes exactly the entry with `id` and persists.
    pub fn delete(&mut self, id: &str) -> Option<T> {
        let idx = self.items.iter().position(|e| e.id() == id)?;
        let removed = self.items.remove(idx);
        self.persist();
        Some(removed)
    }
}

/// All planner collections, loaded together at startup.
#[derive(Debug)]
pub struct PlannerStore {
    pub courses: Collection<Course>,
    pub assignments: Collection<Assignment>,
    pub grade_courses: Collection<GradeCourse>,
    pub reminders: Collection<Reminder>,
}

impl PlannerStore {
    pub fn load(backend: SharedBackend) -> Self {
        Self {
            courses: Collection::load(backend.clone()),
            assignments: Collection::load(backend.clone()),
            grade_courses: Collection::load(backend.clone()),
            reminders: Collection::load(backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CourseFields;
    use crate::storage::{COURSES_KEY, KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn course(name: &str) -> CourseFields {
        CourseFields {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn new_drafts_get_unique_ids() {
        let backend = Arc::new(MemoryStore::new());
        let mut courses: Collection<Course> = Collection::load(backend);
        let a = courses.upsert(Draft::New(course("A"))).unwrap().id.clone();
        let b = courses.upsert(Draft::New(course("B"))).unwrap().id.clone();
        assert_ne!(a, b);
        assert_eq!(courses.len(), 2);
    }

    #[test]
    fn existing_draft_replaces_in_place() {
        let backend = Arc::new(MemoryStore::new());
        let mut courses: Collection<Course> = Collection::load(backend);
        let a = courses.upsert(Draft::New(course("A"))).unwrap().id.clone();
        courses.upsert(Draft::New(course("B"))).unwrap();

        courses
            .upsert(Draft::Existing(a.clone(), course("A2")))
            .unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses.items()[0].id, a);
        assert_eq!(courses.items()[0].name, "A2");
    }

    #[test]
    fn existing_draft_for_unknown_id_is_rejected() {
        let backend = Arc::new(MemoryStore::new());
        let mut courses: Collection<Course> = Collection::load(backend.clone());
        let id = courses.upsert(Draft::New(course("A"))).unwrap().id.clone();
        courses.delete(&id).unwrap();

        assert!(courses.upsert(Draft::Existing(id, course("Zombie"))).is_err());
        assert!(courses.is_empty());
    }

    #[test]
    fn failed_write_keeps_memory_state() {
        let backend = Arc::new(MemoryStore::new());
        let mut courses: Collection<Course> = Collection::load(backend.clone());
        courses.upsert(Draft::New(course("Kept"))).unwrap();

        backend.set_fail_writes(true);
        courses.upsert(Draft::New(course("Unsaved"))).unwrap();
        assert_eq!(courses.len(), 2);

        let stored = backend.get(COURSES_KEY).unwrap().unwrap();
        let on_disk: Vec<Course> = serde_json::from_str(&stored).unwrap();
        assert_eq!(on_disk.len(), 1);
    }

    #[test]
    fn corrupt_content_loads_as_empty() {
        let backend = Arc::new(MemoryStore::new());
        backend.insert_raw(COURSES_KEY, "{not json");
        let courses: Collection<Course> = Collection::load(backend);
        assert!(courses.is_empty());
    }
}
