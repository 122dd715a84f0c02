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

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use strata_core::bundle::{BundleCatalog, BundleHandle, BundleInfo, BundleManifest, BundleStorage};
use strata_core::loader::{Loader, ProgressSink, Resolver};
use strata_core::resource::{Resource, ResourceId, ResourceRef, ResourceUrl};
use strata_core::{ResourceError, ResourceResult};
use strata_lanes::decode_lane::DecoderRegistry;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// --- Resources ---

#[derive(Debug, PartialEq)]
pub struct Text(pub String);
impl Resource for Text {}

pub fn text_decoders() -> Arc<DecoderRegistry> {
    let mut decoders = DecoderRegistry::new();
    decoders.register("txt", |bytes: &[u8]| -> Result<Text, Box<dyn Error + Send + Sync>> {
        Ok(Text(String::from_utf8(bytes.to_vec())?))
    });
    Arc::new(decoders)
}

// --- Loaders and resolvers ---

/// Produces a fresh `Text` holding the URL path on every call.
#[derive(Default)]
pub struct CountingLoader {
    pub loads: AtomicUsize,
    pub lost: Mutex<Vec<ResourceId>>,
    /// Yield once before answering, so concurrent callers overlap.
    pub yields: bool,
    /// Answer "no value" instead of a resource.
    pub empty: bool,
}

impl CountingLoader {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn lost(&self) -> Vec<ResourceId> {
        self.lost.lock().clone()
    }
}

#[async_trait]
impl Loader for CountingLoader {
    async fn load(
        &self,
        _id: ResourceId,
        url: &ResourceUrl,
        progress: Option<&dyn ProgressSink>,
    ) -> ResourceResult<Option<ResourceRef>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.yields {
            tokio::task::yield_now().await;
        }
        if let Some(progress) = progress {
            progress.report(1.0);
        }
        if self.empty {
            return Ok(None);
        }
        let text: ResourceRef = Arc::new(Text(url.path().to_string()));
        Ok(Some(text))
    }

    fn on_cache_lost(&self, id: ResourceId) {
        self.lost.lock().push(id);
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Claims every key of one host with a fixed loader.
pub struct FixedResolver {
    pub host: &'static str,
    pub loader: Arc<dyn Loader>,
    pub calls: AtomicUsize,
}

impl FixedResolver {
    pub fn new(host: &'static str, loader: Arc<dyn Loader>) -> Arc<Self> {
        Arc::new(Self {
            host,
            loader,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Resolver for FixedResolver {
    fn resolve(&self, _id: ResourceId, url: &ResourceUrl) -> Option<Arc<dyn Loader>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (url.host() == self.host).then(|| self.loader.clone())
    }
}

// --- Bundle storage ---

/// In-memory bundle storage counting backend calls per bundle name.
#[derive(Default)]
pub struct MemoryStorage {
    pub missing: Vec<String>,
    pub opens: Mutex<HashMap<String, usize>>,
    pub closes: Mutex<HashMap<String, usize>>,
}

impl MemoryStorage {
    pub fn opens(&self, name: &str) -> usize {
        self.opens.lock().get(name).copied().unwrap_or(0)
    }

    pub fn closes(&self, name: &str) -> usize {
        self.closes.lock().get(name).copied().unwrap_or(0)
    }
}

#[async_trait]
impl BundleStorage for MemoryStorage {
    fn exists(&self, info: &BundleInfo) -> bool {
        !self.missing.contains(&info.name)
    }

    async fn open(&self, info: &BundleInfo) -> ResourceResult<BundleHandle> {
        *self.opens.lock().entry(info.name.clone()).or_default() += 1;
        tokio::task::yield_now().await;
        if info.name == "corrupt" {
            return Err(ResourceError::Backend("corrupt bundle".to_string()));
        }
        Ok(BundleHandle::new(info.name.clone(), ()))
    }

    fn close(&self, handle: &BundleHandle) {
        *self.closes.lock().entry(handle.name().to_string()).or_default() += 1;
    }
}

pub fn catalog(infos: Vec<BundleInfo>) -> Arc<dyn BundleCatalog> {
    Arc::new(BundleManifest::from_infos(infos))
}

pub fn no_deps(name: &str) -> BundleInfo {
    BundleInfo::new(name, Vec::<String>::new())
}
