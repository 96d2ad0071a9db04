use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

/// String interning pool. Repeated text across millions of rows (stop ids, service ids,
/// headsigns) resolves to one shared allocation for the lifetime of the session.
#[derive(Debug, Default)]
pub struct Deduplicator {
    pool: Mutex<HashSet<Arc<str>>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical instance for `text`, or `None` passed straight through.
    pub fn intern(&self, text: Option<&str>) -> Option<Arc<str>> {
        text.map(|t| self.intern_str(t))
    }

    pub fn intern_str(&self, text: &str) -> Arc<str> {
        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = pool.get(text) {
            return Arc::clone(existing);
        }
        let fresh: Arc<str> = Arc::from(text);
        pool.insert(Arc::clone(&fresh));
        fresh
    }

    /// Number of distinct strings held.
    pub fn len(&self) -> usize {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
