//! Client-side list cache
//!
//! Commands that need a collection more than once (lookups by name, the
//! post-import refresh) go through a `ListCache`. Writes never patch the
//! cached copy; callers invalidate and the next read refetches.

use crate::core::api::{ApiError, Backend, Resource};

/// Lazily fetched copy of one backend collection
#[derive(Debug)]
pub struct ListCache<R: Resource> {
    records: Option<Vec<R>>,
}

impl<R: Resource> Default for ListCache<R> {
    fn default() -> Self {
        Self { records: None }
    }
}

impl<R: Resource> ListCache<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached records, fetching them on first use
    pub fn get<B: Backend>(&mut self, backend: &B) -> Result<&[R], ApiError> {
        if self.records.is_none() {
            self.records = Some(backend.list::<R>()?);
        }
        Ok(self.records.as_deref().unwrap_or(&[]))
    }

    /// Drop the cached copy; the next `get` goes back to the backend
    pub fn invalidate(&mut self) {
        self.records = None;
    }

    /// Invalidate and refetch immediately
    pub fn reload<B: Backend>(&mut self, backend: &B) -> Result<&[R], ApiError> {
        self.invalidate();
        self.get(backend)
    }
}
