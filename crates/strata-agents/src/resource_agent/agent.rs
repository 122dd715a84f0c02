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

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;

use strata_core::loader::{Loader, ProgressSink, Resolver};
use strata_core::resource::{Resource, ResourceHandle, ResourceId, ResourceKey, ResourceRef, ResourceUrl};
use strata_core::runtime::ResourceRuntime;
use strata_core::{OwnerThread, ResourceConfig, ResourceError, ResourceResult};
use strata_data::{RetentionPool, WeakCacheStore};
use strata_lanes::resolve_lane::ResolverChain;

use crate::cleanup_agent::{CleanupHandle, CleanupLevel, TieredCleaner};

type SharedLoad = Shared<BoxFuture<'static, ResourceResult<Option<ResourceRef>>>>;
type InFlightLoads = Arc<Mutex<HashMap<ResourceId, SharedLoad>>>;

/// The entry point for loading resources by key.
///
/// A load checks the cache first, then joins an identical load already in
/// flight, and only then asks the resolver chain for a loader. Fresh
/// products are cached weakly and, unless disabled, handed to the runtime
/// which keeps them alive until a cleanup pass lets them go.
pub struct ResourceAgent {
    owner: OwnerThread,
    config: ResourceConfig,
    resolvers: RwLock<ResolverChain>,
    cache: Arc<WeakCacheStore>,
    runtime: Arc<dyn ResourceRuntime>,
    cleaner: TieredCleaner,
    in_flight: InFlightLoads,
}

impl ResourceAgent {
    /// Creates an agent backed by a [`RetentionPool`].
    pub fn new(config: ResourceConfig) -> Self {
        Self::with_runtime(config, Arc::new(RetentionPool::new()))
    }

    /// Creates an agent backed by the given runtime.
    pub fn with_runtime(config: ResourceConfig, runtime: Arc<dyn ResourceRuntime>) -> Self {
        let cache = Arc::new(WeakCacheStore::new());
        log::info!(
            "ResourceAgent: Initialized for scheme '{}' (dedup: {}, retain: {})",
            config.scheme,
            config.dedup_in_flight_loads,
            config.retain_loaded
        );
        Self {
            owner: OwnerThread::current(),
            cleaner: TieredCleaner::new(cache.clone(), runtime.clone()),
            config,
            resolvers: RwLock::new(ResolverChain::new()),
            cache,
            runtime,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The configuration this agent was created with.
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// The cache of loaded resources.
    pub fn cache(&self) -> &Arc<WeakCacheStore> {
        &self.cache
    }

    /// The runtime owning loaded resources.
    pub fn runtime(&self) -> &Arc<dyn ResourceRuntime> {
        &self.runtime
    }

    /// The cleanup coordinator.
    pub fn cleaner(&self) -> &TieredCleaner {
        &self.cleaner
    }

    /// Appends a resolver; earlier registrations take priority.
    pub fn register_resolver(&self, resolver: Arc<dyn Resolver>) -> ResourceResult<()> {
        self.owner.check("ResourceAgent::register_resolver")?;
        self.resolvers.write().register(resolver)
    }

    /// Removes a resolver. Returns `false` if it was not registered.
    pub fn unregister_resolver(&self, resolver: &Arc<dyn Resolver>) -> ResourceResult<bool> {
        self.owner.check("ResourceAgent::unregister_resolver")?;
        Ok(self.resolvers.write().unregister(resolver))
    }

    /// Returns the cached resource for `key` without loading anything.
    pub fn get_cached(&self, key: &str) -> ResourceResult<Option<ResourceRef>> {
        self.owner.check("ResourceAgent::get_cached")?;
        let key = self.parse_key(key)?;
        self.cache.get(key.id())
    }

    /// Loads the resource for `key`, accepting "no value" as an outcome.
    ///
    /// # Errors
    /// - [`ResourceError::InvalidArgument`] for an unparseable key or a foreign scheme.
    /// - [`ResourceError::NoLoaderAvailable`] if no resolver claims the key.
    /// - Whatever the loader reports for call-level or backend failures.
    pub async fn try_load(&self, key: &str) -> ResourceResult<Option<ResourceRef>> {
        self.try_load_with_progress(key, None).await
    }

    /// Like [`try_load`](Self::try_load), reporting progress to `progress`.
    ///
    /// A call that joins a load already in flight does not receive progress.
    pub async fn try_load_with_progress(
        &self,
        key: &str,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> ResourceResult<Option<ResourceRef>> {
        self.owner.check("ResourceAgent::try_load")?;
        let key = self.parse_key(key)?;
        let id = key.id();

        if let Some(resource) = self.cache.get(id)? {
            return Ok(Some(resource));
        }

        if self.config.dedup_in_flight_loads {
            let joined = self.in_flight.lock().get(&id).cloned();
            if let Some(load) = joined {
                log::debug!("ResourceAgent: Joining in-flight load of '{key}'");
                return load.await;
            }
        }

        let loader = self
            .resolvers
            .read()
            .resolve(id, key.url())
            .ok_or_else(|| ResourceError::NoLoaderAvailable(key.to_string()))?;
        log::debug!("ResourceAgent: Loading '{key}' with '{}'", loader.name());

        let load = load_and_cache(LoadRequest {
            id,
            url: key.url().clone(),
            loader,
            progress,
            cache: self.cache.clone(),
            runtime: self.config.retain_loaded.then(|| self.runtime.clone()),
            in_flight: self
                .config
                .dedup_in_flight_loads
                .then(|| self.in_flight.clone()),
        })
        .boxed();

        if !self.config.dedup_in_flight_loads {
            return load.await;
        }
        let shared = load.shared();
        self.in_flight.lock().insert(id, shared.clone());
        shared.await
    }

    /// Loads the resource for `key` as a `T`, demanding a value.
    ///
    /// # Errors
    /// On top of the [`try_load`](Self::try_load) errors:
    /// - [`ResourceError::LoadFailed`] if the load produced no value.
    /// - [`ResourceError::TypeMismatch`] if the value is not a `T`.
    pub async fn load<T: Resource>(&self, key: &str) -> ResourceResult<ResourceHandle<T>> {
        let resource = self
            .try_load(key)
            .await?
            .ok_or_else(|| ResourceError::LoadFailed(key.to_string()))?;
        ResourceHandle::from_ref(resource).ok_or_else(|| {
            ResourceError::TypeMismatch(format!("'{key}' is not a {}", type_name::<T>()))
        })
    }

    /// Starts a cleanup pass, or joins the one already running.
    pub fn request_cleanup(&self, level: CleanupLevel) -> ResourceResult<CleanupHandle> {
        self.cleaner.request_cleanup(level)
    }

    /// Returns `true` while a load of `key` is in flight.
    pub fn is_loading(&self, key: &str) -> bool {
        ResourceKey::parse(key)
            .map(|key| self.in_flight.lock().contains_key(&key.id()))
            .unwrap_or(false)
    }

    fn parse_key(&self, key: &str) -> ResourceResult<ResourceKey> {
        let key = ResourceKey::parse(key)?;
        if key.url().scheme() != self.config.scheme {
            return Err(ResourceError::InvalidArgument(format!(
                "'{key}' does not use the '{}' scheme",
                self.config.scheme
            )));
        }
        Ok(key)
    }
}

struct LoadRequest {
    id: ResourceId,
    url: ResourceUrl,
    loader: Arc<dyn Loader>,
    progress: Option<Arc<dyn ProgressSink>>,
    cache: Arc<WeakCacheStore>,
    runtime: Option<Arc<dyn ResourceRuntime>>,
    in_flight: Option<InFlightLoads>,
}

async fn load_and_cache(request: LoadRequest) -> ResourceResult<Option<ResourceRef>> {
    let LoadRequest {
        id,
        url,
        loader,
        progress,
        cache,
        runtime,
        in_flight,
    } = request;

    let loaded = loader.load(id, &url, progress.as_deref()).await;

    let stored = match &loaded {
        Ok(Some(resource)) => {
            let stored = cache.store(id, resource, loader.clone());
            if let Some(runtime) = &runtime {
                runtime.adopt(resource);
            }
            stored
        }
        _ => Ok(()),
    };
    if let Some(in_flight) = in_flight {
        in_flight.lock().remove(&id);
    }

    if let Err(error) = &loaded {
        log::warn!("ResourceAgent: Loading '{url}' failed: {error}");
    }
    stored?;
    loaded
}
