use std::{
    any::Any,
    collections::HashMap,
    future::Future,
    sync::{Arc, RwLock},
};

use anyhow::Result;

/// Read cache shared by the file repositories, invalidated wholesale on any
/// write to the store. Entries are typed; a key read back with a different
/// type counts as a miss.
///
/// One instance is built at composition time and handed to every repository,
/// so a write through one of them drops the cached reads of all.
#[derive(Default)]
pub struct StoreCache {
    entries: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl StoreCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        self.entries
            .read()
            .unwrap()
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    pub fn set<T: Clone + Send + Sync + 'static>(&self, key: &str, value: T) {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), Arc::new(value));
    }

    pub fn invalidate(&self) {
        self.entries.write().unwrap().clear();
    }
}

/// Runs `load` only when `key` is absent, caching its result.
pub async fn with_cache<T, F, Fut>(cache: &StoreCache, key: &str, load: F) -> Result<T>
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(value) = cache.get::<T>(key) {
        return Ok(value);
    }

    let value = load().await?;
    cache.set(key, value.clone());
    Ok(value)
}
