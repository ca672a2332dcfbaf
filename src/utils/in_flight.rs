use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Set of keys (document ids) with an operation currently running.
/// Unlike a keyed mutex, a second caller is refused instead of queued.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    keys: Arc<DashMap<String, ()>>,
}

/// Removes its key from the set when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    keys: Arc<DashMap<String, ()>>,
    key: String,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key`. Returns `None` while another guard for it is alive.
    pub fn try_acquire(&self, key: &str) -> Option<InFlightGuard> {
        match self.keys.entry(key.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(InFlightGuard {
                    keys: self.keys.clone(),
                    key: key.to_string(),
                })
            }
        }
    }

    pub fn is_running(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys.remove(&self.key);
    }
}
