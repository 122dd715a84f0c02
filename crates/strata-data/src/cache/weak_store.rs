// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A weak-reference cache of loaded resources, keyed by resource id.

use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use strata_core::loader::Loader;
use strata_core::resource::{ResourceId, ResourceRef, WeakResourceRef};
use strata_core::{OwnerThread, ResourceError, ResourceResult};

/// One cached product: a weak handle plus the loader that produced it.
struct CacheEntry {
    resource: WeakResourceRef,
    loader: Arc<dyn Loader>,
}

impl CacheEntry {
    fn is_dead(&self) -> bool {
        self.resource.strong_count() == 0
    }
}

/// Lookup counters of a [`WeakCacheStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that returned a live resource.
    pub hits: u64,
    /// Lookups that found nothing, or only a dead entry.
    pub misses: u64,
    /// Dead entries removed, lazily or by a sweep.
    pub evictions: u64,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<ResourceId, CacheEntry>,
    stats: CacheStats,
}

/// A central cache mapping resource ids to weakly-held resources.
///
/// The store never keeps a resource alive: whoever loaded it (the caller, the
/// runtime) owns it. Entries whose resource has been reclaimed are detected
/// lazily on [`get`](Self::get) and in batches by
/// [`sweep_unreferenced`](Self::sweep_unreferenced); either way the owning
/// loader is told via [`Loader::on_cache_lost`] before the entry goes away.
pub struct WeakCacheStore {
    owner: OwnerThread,
    state: Mutex<StoreState>,
}

impl WeakCacheStore {
    /// Creates an empty store owned by the calling thread.
    pub fn new() -> Self {
        Self {
            owner: OwnerThread::current(),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Retrieves the live resource cached under `id`.
    ///
    /// A dead entry is evicted on the spot (its loader is notified first) and
    /// reported as a miss.
    pub fn get(&self, id: ResourceId) -> ResourceResult<Option<ResourceRef>> {
        self.owner.check("WeakCacheStore::get")?;

        let lost_loader = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let Some(entry) = state.entries.get(&id) else {
                state.stats.misses += 1;
                return Ok(None);
            };
            if let Some(resource) = entry.resource.upgrade() {
                state.stats.hits += 1;
                return Ok(Some(resource));
            }
            state.stats.misses += 1;
            entry.loader.clone()
        };

        notify_cache_lost(&lost_loader, id);
        self.remove_if_dead(id);
        Ok(None)
    }

    /// Caches `resource` under `id`, produced by `loader`.
    ///
    /// Re-storing an existing id only replaces the weak handle; the entry keeps
    /// its original loader.
    ///
    /// # Errors
    /// Returns [`ResourceError::InvalidArgument`] for the null id.
    pub fn store(
        &self,
        id: ResourceId,
        resource: &ResourceRef,
        loader: Arc<dyn Loader>,
    ) -> ResourceResult<()> {
        self.owner.check("WeakCacheStore::store")?;
        if id.is_null() {
            return Err(ResourceError::InvalidArgument(
                "cannot cache a resource under the null id".to_string(),
            ));
        }

        let weak = Arc::downgrade(resource);
        match self.state.lock().entries.entry(id) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().resource = weak;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    resource: weak,
                    loader,
                });
            }
        }
        Ok(())
    }

    /// Evicts every entry whose resource has been reclaimed.
    ///
    /// The batched counterpart of the lazy eviction in [`get`](Self::get).
    /// A loader that panics while handling its notification is logged and
    /// skipped; the sweep carries on with the remaining entries.
    ///
    /// Returns the number of entries evicted.
    pub fn sweep_unreferenced(&self) -> ResourceResult<usize> {
        self.owner.check("WeakCacheStore::sweep_unreferenced")?;

        let dead: Vec<(ResourceId, Arc<dyn Loader>)> = self
            .state
            .lock()
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_dead())
            .map(|(id, entry)| (*id, entry.loader.clone()))
            .collect();

        let mut evicted = 0;
        for (id, loader) in &dead {
            notify_cache_lost(loader, *id);
            if self.remove_if_dead(*id) {
                evicted += 1;
            }
        }

        if evicted > 0 {
            log::debug!("WeakCacheStore: Swept {evicted} unreferenced entries");
        }
        Ok(evicted)
    }

    /// Returns `true` if an entry exists for `id`, alive or not. Never evicts.
    pub fn contains(&self, id: ResourceId) -> bool {
        self.state.lock().entries.contains_key(&id)
    }

    /// The number of entries, including dead ones not yet evicted.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// A snapshot of the lookup counters.
    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }

    fn remove_if_dead(&self, id: ResourceId) -> bool {
        let mut state = self.state.lock();
        let dead = state.entries.get(&id).is_some_and(CacheEntry::is_dead);
        if dead {
            state.entries.remove(&id);
            state.stats.evictions += 1;
            log::debug!("WeakCacheStore: Evicted reclaimed resource {id}");
        }
        dead
    }
}

impl Default for WeakCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

fn notify_cache_lost(loader: &Arc<dyn Loader>, id: ResourceId) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| loader.on_cache_lost(id)));
    if outcome.is_err() {
        log::warn!(
            "WeakCacheStore: Loader '{}' panicked while handling the loss of {id}",
            loader.name()
        );
    }
}
