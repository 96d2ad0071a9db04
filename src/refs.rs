use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, PoisonError},
};

/// Session-wide record of `(column, value)` foreign-key pairs already checked.
///
/// Only the first sighting of a pair is validated and reported, so a bad trip id
/// referenced by thousands of stop times yields one diagnostic, and lookups scale
/// with distinct values rather than rows. Repeated valid values are not re-checked
/// either. Pairs are not scoped by table.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    seen: Mutex<HashMap<String, HashSet<String>>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the pair as seen. Returns `true` only the first time it is seen.
    pub fn first_sighting(&self, column: &str, value: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        match seen.get_mut(column) {
            Some(values) if values.contains(value) => false,
            Some(values) => {
                values.insert(value.to_owned());
                true
            }
            None => {
                seen.insert(column.to_owned(), HashSet::from([value.to_owned()]));
                true
            }
        }
    }

    pub fn contains(&self, column: &str, value: &str) -> bool {
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.get(column).is_some_and(|values| values.contains(value))
    }

    /// Total number of distinct pairs seen.
    pub fn len(&self) -> usize {
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
