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

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use strata_core::bundle::{BundleHandle, BundleInfo};
use strata_core::loader::{Loader, ProgressSink, Resolver};
use strata_core::resource::{CompositeResource, ResourceId, ResourceRef, ResourceUrl};
use strata_core::{ResourceError, ResourceResult};
use strata_lanes::decode_lane::DecoderRegistry;
use strata_lanes::pack_lane::{PackArchive, PackEntry, PART_SEPARATOR};

use super::BundleManager;

/// URL host claimed by [`BundleResolver`].
pub const BUNDLE_HOST: &str = "assetbundle";

/// Resolves `res://assetbundle/<bundle>/<entry>` keys to one loader per bundle.
///
/// Loaders are created lazily and memoized by a hash of the bundle's resolved
/// container path. Keys naming a bundle the catalog does not know are left to
/// the next resolver.
pub struct BundleResolver {
    root: PathBuf,
    manager: BundleManager,
    decoders: Arc<DecoderRegistry>,
    loaders: Mutex<HashMap<u64, Arc<BundleLoader>>>,
}

impl BundleResolver {
    /// Creates a resolver for bundles stored under `root`.
    pub fn new(
        root: impl Into<PathBuf>,
        manager: BundleManager,
        decoders: Arc<DecoderRegistry>,
    ) -> Self {
        Self {
            root: root.into(),
            manager,
            decoders,
            loaders: Mutex::new(HashMap::new()),
        }
    }

    /// The number of bundle loaders created so far.
    pub fn loader_count(&self) -> usize {
        self.loaders.lock().len()
    }

    fn container_key(&self, bundle: &str) -> u64 {
        let resolved = self.root.join(bundle);
        let digest = blake3::hash(resolved.to_string_lossy().as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}

impl Resolver for BundleResolver {
    fn resolve(&self, _id: ResourceId, url: &ResourceUrl) -> Option<Arc<dyn Loader>> {
        if url.host() != BUNDLE_HOST {
            return None;
        }
        let segments = url.segments()?;
        let bundle = segments.first()?.as_str();
        let key = self.container_key(bundle);

        let mut loaders = self.loaders.lock();
        if let Some(loader) = loaders.get(&key) {
            return Some(loader.clone());
        }
        let info = self.manager.bundle_info(bundle)?;
        log::debug!("BundleResolver: Creating loader for bundle '{bundle}'");
        let loader = Arc::new(BundleLoader::new(
            info,
            self.manager.clone(),
            self.decoders.clone(),
        ));
        loaders.insert(key, loader.clone());
        Some(loader)
    }
}

#[derive(Default)]
struct LoaderState {
    handle: Option<BundleHandle>,
    produced: HashSet<ResourceId>,
    /// Loads between `acquire` and their outcome. The hold outlives them too.
    pending: usize,
}

/// Loads the entries of one bundle.
///
/// The bundle is opened through the [`BundleManager`] on the first load and
/// held while any resource this loader produced is still cached, or any load
/// is still reading from it. When neither remains, the hold is released.
///
/// The entry path follows the bundle name in the URL. `?part=<name>` loads a
/// single part of a multi-part entry, `?parts` assembles all of them into a
/// [`CompositeResource`].
pub struct BundleLoader {
    bundle: BundleInfo,
    manager: BundleManager,
    decoders: Arc<DecoderRegistry>,
    state: Mutex<LoaderState>,
}

impl BundleLoader {
    /// Creates a loader for `bundle`.
    pub fn new(bundle: BundleInfo, manager: BundleManager, decoders: Arc<DecoderRegistry>) -> Self {
        Self {
            bundle,
            manager,
            decoders,
            state: Mutex::new(LoaderState::default()),
        }
    }

    /// The bundle this loader reads from.
    pub fn bundle(&self) -> &BundleInfo {
        &self.bundle
    }

    /// Returns `true` while this loader holds its bundle open.
    pub fn holds_bundle(&self) -> bool {
        self.state.lock().handle.is_some()
    }

    /// The number of produced resources still tracked.
    pub fn tracked_count(&self) -> usize {
        self.state.lock().produced.len()
    }

    /// The number of loads currently reading from the bundle.
    pub fn pending_loads(&self) -> usize {
        self.state.lock().pending
    }

    /// Takes the bundle for one load. Every call must be paired with [`finish`](Self::finish).
    async fn acquire(&self) -> ResourceResult<BundleHandle> {
        let held = {
            let mut state = self.state.lock();
            state.pending += 1;
            state.handle.clone()
        };
        if let Some(handle) = held {
            return Ok(handle);
        }

        let handle = self.manager.open(&self.bundle).await?;
        let existing = {
            let mut state = self.state.lock();
            match &state.handle {
                Some(existing) => Some(existing.clone()),
                None => {
                    state.handle = Some(handle.clone());
                    None
                }
            }
        };
        match existing {
            // A concurrent load won the race; give our extra hold back.
            Some(existing) => {
                self.manager.release(&handle)?;
                Ok(existing)
            }
            None => Ok(handle),
        }
    }

    /// Ends one acquired load, tracking `produced` if it yielded a resource.
    fn finish(&self, produced: Option<ResourceId>) {
        {
            let mut state = self.state.lock();
            state.pending = state.pending.saturating_sub(1);
            if let Some(id) = produced {
                state.produced.insert(id);
                return;
            }
        }
        self.release_if_unused();
    }

    fn release_if_unused(&self) {
        let handle = {
            let mut state = self.state.lock();
            if !state.produced.is_empty() || state.pending > 0 {
                return;
            }
            state.handle.take()
        };
        if let Some(handle) = handle {
            log::debug!("BundleLoader: Releasing bundle '{}'", self.bundle.name);
            if let Err(error) = self.manager.release(&handle) {
                log::warn!(
                    "BundleLoader: Failed to release bundle '{}': {error}",
                    self.bundle.name
                );
            }
        }
    }

    /// Acquires the bundle and reads `entry` (or its parts) out of it.
    ///
    /// The acquisition counts as pending even when this fails; the caller
    /// settles it with [`finish`](Self::finish).
    async fn load_from_bundle(
        &self,
        url: &ResourceUrl,
        entry: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> ResourceResult<Option<ResourceRef>> {
        let handle = self.acquire().await?;
        let archive = handle.payload::<PackArchive>().cloned().ok_or_else(|| {
            ResourceError::Backend(format!(
                "Bundle '{}' is not backed by a pack archive",
                self.bundle.name
            ))
        })?;

        if let Some(part) = url.query_value("part") {
            let name = format!("{entry}{PART_SEPARATOR}{part}");
            match archive.entry(&name) {
                Some(part_entry) => self.load_entry(&archive, part_entry).await,
                None => Ok(None),
            }
        } else if url.has_query_flag("parts") {
            self.load_composite(&archive, entry, progress).await
        } else {
            match archive.entry(entry) {
                Some(entry) => self.load_entry(&archive, entry).await,
                None => Ok(None),
            }
        }
    }

    async fn load_entry(
        &self,
        archive: &PackArchive,
        entry: &PackEntry,
    ) -> ResourceResult<Option<ResourceRef>> {
        let bytes = archive.read_async(entry).await?;
        match self.decoders.decode(&entry.type_name, bytes) {
            Ok(resource) => Ok(Some(resource)),
            Err(error) => {
                log::warn!(
                    "BundleLoader: Dropping '{}' from '{}': {error}",
                    entry.name,
                    self.bundle.name
                );
                Ok(None)
            }
        }
    }

    async fn load_composite(
        &self,
        archive: &PackArchive,
        entry: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> ResourceResult<Option<ResourceRef>> {
        let parts: Vec<(String, PackEntry)> = archive
            .parts_of(entry)
            .into_iter()
            .map(|(part, entry)| (part.to_string(), entry.clone()))
            .collect();
        if parts.is_empty() {
            log::debug!("BundleLoader: '{entry}' has no parts in '{}'", self.bundle.name);
            return Ok(None);
        }

        let total = parts.len();
        let mut loaded = Vec::with_capacity(total);
        for (index, (part, part_entry)) in parts.into_iter().enumerate() {
            if let Some(resource) = self.load_entry(archive, &part_entry).await? {
                loaded.push((part, resource));
            }
            if let Some(progress) = progress {
                progress.report((index + 1) as f32 / total as f32);
            }
        }

        if loaded.is_empty() {
            return Ok(None);
        }
        let composite: ResourceRef = Arc::new(CompositeResource::new(loaded));
        Ok(Some(composite))
    }
}

#[async_trait]
impl Loader for BundleLoader {
    async fn load(
        &self,
        id: ResourceId,
        url: &ResourceUrl,
        progress: Option<&dyn ProgressSink>,
    ) -> ResourceResult<Option<ResourceRef>> {
        let Some(segments) = url.segments() else {
            log::warn!("BundleLoader: Undecodable path in '{url}'");
            return Ok(None);
        };
        if segments.first() != Some(&self.bundle.name) {
            return Err(ResourceError::InvalidArgument(format!(
                "'{url}' does not address bundle '{}'",
                self.bundle.name
            )));
        }
        let entry = segments[1..].join("/");
        if entry.is_empty() || entry.contains(PART_SEPARATOR) {
            log::warn!("BundleLoader: Malformed entry name in '{url}'");
            return Ok(None);
        }

        let result = self.load_from_bundle(url, &entry, progress).await;
        match result {
            Ok(Some(resource)) => {
                self.finish(Some(id));
                if let Some(progress) = progress {
                    progress.report(1.0);
                }
                Ok(Some(resource))
            }
            other => {
                self.finish(None);
                other
            }
        }
    }

    fn on_cache_lost(&self, id: ResourceId) {
        let tracked = self.state.lock().produced.remove(&id);
        if tracked {
            self.release_if_unused();
        }
    }

    fn name(&self) -> &str {
        &self.bundle.name
    }
}
