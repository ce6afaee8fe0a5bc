// File: ./src/model/entity.rs
use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A record kind owned by the entity store.
pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// Key under which the whole collection is persisted.
    const STORE_KEY: &'static str;

    /// User-editable fields, i.e. everything except the id and derived state.
    type Fields;

    fn id(&self) -> &str;

    fn build(id: String, fields: Self::Fields) -> Self;

    /// Rejects blank forms before anything is stored.
    fn validate(fields: &Self::Fields) -> Result<()>;
}

/// A save command coming from a form.
///
/// `New` allocates a fresh id, `Existing` replaces the entity with that id.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft<F> {
    New(F),
    Existing(String, F),
}

impl<F> Draft<F> {
    pub fn id(&self) -> Option<&str> {
        match self {
            Draft::New(_) => None,
            Draft::Existing(id, _) => Some(id),
        }
    }

    pub fn fields(&self) -> &F {
        match self {
            Draft::New(f) | Draft::Existing(_, f) => f,
        }
    }
}

pub(crate) fn require_text(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{} must not be empty", what);
    }
    Ok(())
}
