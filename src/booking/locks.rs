use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::NaiveDate;

/// One mutex per (room, date). Creates for the same room and day queue here instead of
/// on the database write lock.
#[derive(Debug, Default)]
pub struct ClaimLocks {
    inner: Mutex<HashMap<(i64, NaiveDate), Arc<Mutex<()>>>>,
}

impl ClaimLocks {
    pub fn lock_for(&self, room_id: i64, date: NaiveDate) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry((room_id, date)).or_default().clone()
    }

    /// Drops entries for dates the daily reset has purged.
    pub fn prune_before(&self, date: NaiveDate) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.retain(|(_, day), _| *day >= date);
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
