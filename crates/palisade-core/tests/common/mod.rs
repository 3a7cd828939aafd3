//! In-memory backend standing in for a live gateway.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use palisade_api::{ApiError, ConfigBackend, RawPayload};

/// Exact-path key/value store with per-verb call counters. Mutation
/// counters let tests assert that idempotent paths touch nothing.
#[derive(Default)]
pub struct FakeBackend {
    store: Mutex<HashMap<String, RawPayload>>,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub edits: AtomicUsize,
    pub deletes: AtomicUsize,
    /// When set, every call fails as unreachable.
    down: AtomicBool,
    /// Number of upcoming calls that fail transiently before recovery.
    flaky_remaining: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, path: &str, value: RawPayload) {
        self.store
            .lock()
            .unwrap()
            .insert(path.to_owned(), value);
    }

    pub fn stored(&self, path: &str) -> Option<RawPayload> {
        self.store.lock().unwrap().get(path).cloned()
    }

    pub fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    pub fn fail_next(&self, calls: usize) {
        self.flaky_remaining.store(calls, Ordering::SeqCst);
    }

    pub fn mutations(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
            + self.edits.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), ApiError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ApiError::Connectivity {
                message: "connection refused".into(),
            });
        }
        if self
            .flaky_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ApiError::Connectivity {
                message: "connection reset by peer".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigBackend for FakeBackend {
    async fn get(&self, path: &str) -> Result<Option<RawPayload>, ApiError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        Ok(self.store.lock().unwrap().get(path).cloned())
    }

    async fn set(&self, path: &str, payload: &RawPayload) -> Result<(), ApiError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        self.store
            .lock()
            .unwrap()
            .insert(path.to_owned(), payload.clone());
        Ok(())
    }

    async fn edit(&self, path: &str, payload: &RawPayload) -> Result<(), ApiError> {
        self.edits.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        self.store
            .lock()
            .unwrap()
            .insert(path.to_owned(), payload.clone());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        match self.store.lock().unwrap().remove(path) {
            Some(_) => Ok(()),
            None => Err(ApiError::Semantic {
                message: "object not present".into(),
                code: Some("7".into()),
            }),
        }
    }
}
