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
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use strata_core::bundle::{BundleCatalog, BundleHandle, BundleInfo, BundleStorage};
use strata_core::{OwnerThread, ResourceError, ResourceResult};

type SharedOpen = Shared<BoxFuture<'static, ResourceResult<BundleHandle>>>;

/// The bookkeeping for one open bundle.
struct BundleContext {
    handle: BundleHandle,
    ref_count: usize,
    /// Fixed at open time. The context holds exactly one reference on each.
    dependencies: Vec<String>,
}

enum BundleSlot {
    /// A backend open is in flight. `holders` counts every caller that started
    /// or joined it; they all become holds once it completes.
    Opening { future: SharedOpen, holders: usize },
    Open(BundleContext),
}

struct ManagerInner {
    owner: OwnerThread,
    storage: Arc<dyn BundleStorage>,
    catalog: Arc<dyn BundleCatalog>,
    table: Mutex<HashMap<String, BundleSlot>>,
}

/// Opens bundles with their dependencies and reference-counts them.
///
/// Each bundle name maps to at most one slot: in flight or open. Concurrent
/// opens of one name share a single backend open. A context holds one
/// reference on each declared dependency for as long as it lives; when its
/// own count drops to zero the backend handle is closed and the release
/// cascades into those dependencies.
///
/// Cloning is cheap and yields another view of the same table.
#[derive(Clone)]
pub struct BundleManager {
    inner: Arc<ManagerInner>,
}

impl BundleManager {
    /// Creates a manager owned by the calling thread.
    pub fn new(storage: Arc<dyn BundleStorage>, catalog: Arc<dyn BundleCatalog>) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                owner: OwnerThread::current(),
                storage,
                catalog,
                table: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Looks a bundle up in the catalog.
    pub fn bundle_info(&self, name: &str) -> Option<BundleInfo> {
        self.inner.catalog.bundle_info(name)
    }

    /// Opens `info` and, first, every bundle it depends on.
    ///
    /// If the bundle is already open its count is incremented and the existing
    /// handle returned; if an open is in flight the call joins it. Either way
    /// the dependencies are not opened a second time.
    ///
    /// # Errors
    /// - [`ResourceError::CyclicDependency`] if the dependency graph loops.
    /// - [`ResourceError::MissingDependencyInfo`] if a dependency is not in the catalog.
    /// - [`ResourceError::NotInstalled`] if the backing data of a bundle is absent.
    ///
    /// Nothing stays open after a failure.
    pub async fn open(&self, info: &BundleInfo) -> ResourceResult<BundleHandle> {
        self.inner.owner.check("BundleManager::open")?;
        check_dependency_graph(self.inner.catalog.as_ref(), info)?;
        open_inner(self.inner.clone(), info.clone()).await
    }

    /// Opens the bundle called `name`, as described by the catalog.
    pub async fn open_by_name(&self, name: &str) -> ResourceResult<BundleHandle> {
        let info = self
            .bundle_info(name)
            .ok_or_else(|| ResourceError::UnknownBundle(name.to_string()))?;
        self.open(&info).await
    }

    /// Drops one hold on the bundle behind `handle`.
    ///
    /// Returns `false` if the handle is unknown or already fully released.
    /// In-flight dependencies met during the cascade are skipped.
    pub fn release(&self, handle: &BundleHandle) -> ResourceResult<bool> {
        self.inner.owner.check("BundleManager::release")?;
        Ok(release_handle(&self.inner, handle))
    }

    /// Drops one hold on the open bundle called `name`.
    pub fn release_by_name(&self, name: &str) -> ResourceResult<bool> {
        self.inner.owner.check("BundleManager::release_by_name")?;
        let handle = match self.inner.table.lock().get(name) {
            Some(BundleSlot::Open(context)) => context.handle.clone(),
            _ => return Ok(false),
        };
        Ok(release_handle(&self.inner, &handle))
    }

    /// The reference count of an open bundle. `None` if it is closed or still opening.
    pub fn ref_count(&self, name: &str) -> Option<usize> {
        match self.inner.table.lock().get(name) {
            Some(BundleSlot::Open(context)) => Some(context.ref_count),
            _ => None,
        }
    }

    /// Returns `true` while a backend open for `name` is in flight.
    pub fn is_opening(&self, name: &str) -> bool {
        matches!(
            self.inner.table.lock().get(name),
            Some(BundleSlot::Opening { .. })
        )
    }

    /// Returns `true` if `name` is open.
    pub fn is_open(&self, name: &str) -> bool {
        self.ref_count(name).is_some()
    }

    /// The names of all open bundles, sorted.
    pub fn open_bundles(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .table
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, BundleSlot::Open(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Closes every open bundle regardless of its count.
    ///
    /// In-flight opens are left alone. Returns the number of bundles closed.
    pub fn unload_all(&self) -> ResourceResult<usize> {
        self.inner.owner.check("BundleManager::unload_all")?;
        let closed: Vec<BundleHandle> = {
            let mut table = self.inner.table.lock();
            let names: Vec<String> = table
                .iter()
                .filter(|(_, slot)| matches!(slot, BundleSlot::Open(_)))
                .map(|(name, _)| name.clone())
                .collect();
            names
                .iter()
                .filter_map(|name| match table.remove(name) {
                    Some(BundleSlot::Open(context)) => Some(context.handle),
                    _ => None,
                })
                .collect()
        };

        for handle in &closed {
            self.inner.storage.close(handle);
        }
        log::info!("BundleManager: Unloaded {} bundles", closed.len());
        Ok(closed.len())
    }
}

/// Walks the dependency closure of `info` through the catalog before anything is opened.
fn check_dependency_graph(catalog: &dyn BundleCatalog, info: &BundleInfo) -> ResourceResult<()> {
    fn visit(
        catalog: &dyn BundleCatalog,
        info: &BundleInfo,
        path: &mut Vec<String>,
        done: &mut HashSet<String>,
    ) -> ResourceResult<()> {
        for dependency in &info.dependencies {
            if let Some(start) = path.iter().position(|name| name == dependency) {
                let mut cycle = path[start..].to_vec();
                cycle.push(dependency.clone());
                return Err(ResourceError::CyclicDependency(cycle));
            }
            if done.contains(dependency) {
                continue;
            }
            let dependency_info = catalog.bundle_info(dependency).ok_or_else(|| {
                ResourceError::MissingDependencyInfo {
                    bundle: info.name.clone(),
                    dependency: dependency.clone(),
                }
            })?;

            path.push(dependency.clone());
            visit(catalog, &dependency_info, path, done)?;
            path.pop();
            done.insert(dependency.clone());
        }
        Ok(())
    }

    let mut path = vec![info.name.clone()];
    visit(catalog, info, &mut path, &mut HashSet::new())
}

/// Takes one hold on `info`, joining an open bundle or in-flight open when there is one.
fn open_inner(
    inner: Arc<ManagerInner>,
    info: BundleInfo,
) -> BoxFuture<'static, ResourceResult<BundleHandle>> {
    async move {
        let joined = {
            let mut table = inner.table.lock();
            match table.get_mut(&info.name) {
                Some(BundleSlot::Open(context)) => {
                    context.ref_count += 1;
                    return Ok(context.handle.clone());
                }
                Some(BundleSlot::Opening { future, holders }) => {
                    *holders += 1;
                    Some(future.clone())
                }
                None => None,
            }
        };
        if let Some(future) = joined {
            log::debug!("BundleManager: Joining in-flight open of '{}'", info.name);
            return future.await;
        }

        let future = open_fresh(inner.clone(), info.clone()).boxed().shared();
        inner.table.lock().insert(
            info.name.clone(),
            BundleSlot::Opening {
                future: future.clone(),
                holders: 1,
            },
        );
        future.await
    }
    .boxed()
}

/// Opens the dependencies, then the bundle itself, and installs its context.
async fn open_fresh(inner: Arc<ManagerInner>, info: BundleInfo) -> ResourceResult<BundleHandle> {
    let mut opened = Vec::with_capacity(info.dependencies.len());
    for dependency in &info.dependencies {
        let Some(dependency_info) = inner.catalog.bundle_info(dependency) else {
            let error = ResourceError::MissingDependencyInfo {
                bundle: info.name.clone(),
                dependency: dependency.clone(),
            };
            return abort_open(&inner, &info.name, &opened, error);
        };
        match open_inner(inner.clone(), dependency_info).await {
            Ok(handle) => opened.push(handle),
            Err(error) => return abort_open(&inner, &info.name, &opened, error),
        }
    }

    if !inner.storage.exists(&info) {
        let error = ResourceError::NotInstalled(info.name.clone());
        return abort_open(&inner, &info.name, &opened, error);
    }

    let handle = match inner.storage.open(&info).await {
        Ok(handle) => handle,
        Err(error) => return abort_open(&inner, &info.name, &opened, error),
    };

    let mut table = inner.table.lock();
    let holders = match table.get(&info.name) {
        Some(BundleSlot::Opening { holders, .. }) => *holders,
        _ => 1,
    };
    table.insert(
        info.name.clone(),
        BundleSlot::Open(BundleContext {
            handle: handle.clone(),
            ref_count: holders,
            dependencies: info.dependencies.clone(),
        }),
    );
    log::info!(
        "BundleManager: Opened '{}' ({} holders, {} dependencies)",
        info.name,
        holders,
        info.dependencies.len()
    );
    Ok(handle)
}

/// Forgets the in-flight slot of `name` and rolls back the dependencies it already opened.
fn abort_open(
    inner: &ManagerInner,
    name: &str,
    opened: &[BundleHandle],
    error: ResourceError,
) -> ResourceResult<BundleHandle> {
    inner.table.lock().remove(name);
    for handle in opened {
        release_handle(inner, handle);
    }
    log::warn!("BundleManager: Failed to open '{name}': {error}");
    Err(error)
}

fn release_handle(inner: &ManagerInner, handle: &BundleHandle) -> bool {
    let mut table = inner.table.lock();
    let Some(name) = table.iter().find_map(|(name, slot)| match slot {
        BundleSlot::Open(context) if context.handle.ptr_eq(handle) => Some(name.clone()),
        _ => None,
    }) else {
        log::debug!(
            "BundleManager: Ignoring release of unknown handle for '{}'",
            handle.name()
        );
        return false;
    };

    let mut closed = Vec::new();
    let mut pending = vec![name];
    while let Some(name) = pending.pop() {
        let context = match table.get_mut(&name) {
            Some(BundleSlot::Open(context)) => context,
            Some(BundleSlot::Opening { .. }) => {
                log::warn!("BundleManager: '{name}' is still opening, skipping its release");
                continue;
            }
            None => continue,
        };

        context.ref_count = context.ref_count.saturating_sub(1);
        if context.ref_count > 0 {
            continue;
        }
        if let Some(BundleSlot::Open(context)) = table.remove(&name) {
            pending.extend(context.dependencies);
            closed.push(context.handle);
        }
    }
    drop(table);

    for handle in &closed {
        inner.storage.close(handle);
        log::debug!("BundleManager: Closed '{}'", handle.name());
    }
    true
}
