use std::sync::Arc;

use crate::config::Config;
use crate::notification::Notifier;
use crate::store::memory::MemoryStore;
use crate::store::{RoleStore, ServiceStore};

pub struct AppState {
    pub services: Arc<dyn ServiceStore>,
    pub roles: Arc<dyn RoleStore>,
    pub notifier: Notifier,
    pub config: Config,
}

impl AppState {
    /// State backed by one in-memory store for both collections.
    pub fn in_memory(config: Config) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Self {
            services: store.clone(),
            roles: store.clone(),
            notifier: Notifier::new(),
            config,
        };
        (state, store)
    }
}
