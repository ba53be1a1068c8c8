//! In-process registry of issued documents.
//!
//! An explicitly owned, injectable store constructed at process start and
//! shared through `AppState` — never ambient global state. Records are
//! immutable after issue and disappear by explicit delete or expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;

/// How long an issued document stays downloadable.
pub const DOCUMENT_TTL_HOURS: i64 = 24;

/// A generated artifact held transiently for download. Visible only to its
/// owner; everyone else sees `NotFound`, indistinguishable from a missing
/// id, so document ids cannot be probed for existence or ownership.
#[derive(Debug, Clone)]
pub struct IssuedDocument {
    pub id: Uuid,
    pub owner: Uuid,
    pub payload: Bytes,
    pub content_type: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct DocumentRegistry {
    inner: Arc<Mutex<HashMap<Uuid, IssuedDocument>>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new document for `owner` and returns its opaque id.
    /// Sweeps already-expired records first, so the map stays bounded
    /// without a background task.
    pub fn issue(
        &self,
        owner: Uuid,
        payload: Bytes,
        content_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> IssuedDocument {
        self.issue_at(Utc::now(), owner, payload, content_type.into(), filename.into())
    }

    fn issue_at(
        &self,
        now: DateTime<Utc>,
        owner: Uuid,
        payload: Bytes,
        content_type: String,
        filename: String,
    ) -> IssuedDocument {
        let doc = IssuedDocument {
            id: Uuid::new_v4(),
            owner,
            payload,
            content_type,
            filename,
            created_at: now,
            expires_at: now + Duration::hours(DOCUMENT_TTL_HOURS),
        };

        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, d| d.expires_at > now);
        map.insert(doc.id, doc.clone());

        debug!("Issued document {} for user {owner}", doc.id);
        doc
    }

    /// Returns the document if it exists, has not expired, and belongs to
    /// `requester`. All three failures are the same `NotFound`. Expiry is
    /// checked against the wall clock here, so a document is never served
    /// past its deadline even if no sweep has run.
    pub fn fetch(&self, id: Uuid, requester: Uuid) -> Result<IssuedDocument, AppError> {
        self.fetch_at(Utc::now(), id, requester)
    }

    fn fetch_at(
        &self,
        now: DateTime<Utc>,
        id: Uuid,
        requester: Uuid,
    ) -> Result<IssuedDocument, AppError> {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.get(&id)
            .filter(|d| d.owner == requester && d.expires_at > now)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Removes a document on its owner's request. Non-owners get the same
    /// `NotFound` as for a missing id.
    pub fn delete(&self, id: Uuid, requester: Uuid) -> Result<(), AppError> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match map.get(&id) {
            Some(d) if d.owner == requester => {
                map.remove(&id);
                Ok(())
            }
            _ => Err(not_found(id)),
        }
    }

    /// Removes every record whose expiry has passed. Returns how many were
    /// dropped. Only already-expired records are touched, so this is safe
    /// to run at any time relative to `issue`/`fetch`.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let before = map.len();
        map.retain(|_, d| d.expires_at > now);
        before - map.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Document {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Bytes {
        Bytes::from_static(b"%PDF-1.4 fake document body")
    }

    #[test]
    fn issue_then_fetch_returns_identical_payload() {
        let registry = DocumentRegistry::new();
        let owner = Uuid::new_v4();

        let doc = registry.issue(owner, payload(), "application/pdf", "resume.pdf");
        let fetched = registry.fetch(doc.id, owner).unwrap();

        assert_eq!(fetched.payload, payload());
        assert_eq!(fetched.content_type, "application/pdf");
        assert_eq!(fetched.expires_at - fetched.created_at, Duration::hours(24));
    }

    #[test]
    fn fetch_by_non_owner_is_not_found_not_forbidden() {
        let registry = DocumentRegistry::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let doc = registry.issue(owner, payload(), "application/pdf", "resume.pdf");
        let result = registry.fetch(doc.id, stranger);

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn fetch_past_deadline_is_not_found_without_any_sweep() {
        let registry = DocumentRegistry::new();
        let owner = Uuid::new_v4();
        let issued_at = Utc::now();

        let doc = registry.issue_at(
            issued_at,
            owner,
            payload(),
            "application/pdf".into(),
            "resume.pdf".into(),
        );

        let just_before = issued_at + Duration::hours(24) - Duration::seconds(1);
        assert!(registry.fetch_at(just_before, doc.id, owner).is_ok());

        let just_after = issued_at + Duration::hours(24) + Duration::seconds(1);
        let result = registry.fetch_at(just_after, doc.id, owner);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn sweep_removes_only_expired_records() {
        let registry = DocumentRegistry::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();

        let old = registry.issue_at(
            now - Duration::hours(25),
            owner,
            payload(),
            "application/pdf".into(),
            "old.pdf".into(),
        );
        let fresh = registry.issue_at(
            now,
            owner,
            payload(),
            "application/pdf".into(),
            "fresh.pdf".into(),
        );

        assert_eq!(registry.sweep_expired_at(now), 1);
        assert!(registry.fetch_at(now, fresh.id, owner).is_ok());
        assert!(registry.fetch_at(now, old.id, owner).is_err());
    }

    #[test]
    fn issue_sweeps_lazily() {
        let registry = DocumentRegistry::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();

        registry.issue_at(
            now - Duration::hours(30),
            owner,
            payload(),
            "application/pdf".into(),
            "stale.pdf".into(),
        );
        assert_eq!(registry.len(), 1);

        registry.issue_at(now, owner, payload(), "application/pdf".into(), "new.pdf".into());
        assert_eq!(registry.len(), 1, "stale record dropped during issue");
    }

    #[test]
    fn owner_can_delete_but_stranger_cannot() {
        let registry = DocumentRegistry::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let doc = registry.issue(owner, payload(), "application/pdf", "resume.pdf");

        assert!(matches!(
            registry.delete(doc.id, stranger),
            Err(AppError::NotFound(_))
        ));
        registry.delete(doc.id, owner).unwrap();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.delete(doc.id, owner),
            Err(AppError::NotFound(_))
        ));
    }
}
