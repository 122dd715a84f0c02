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

//! A resource runtime that keeps loaded resources resident until asked to let go.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use strata_core::resource::ResourceRef;
use strata_core::runtime::ResourceRuntime;

/// Strongly retains every adopted resource, like an engine's object table.
///
/// Resources survive the caller dropping its handles until a cleanup pass
/// runs: [`release_unused`](ResourceRuntime::release_unused) lets go of the
/// ones nobody else references, [`collect`](ResourceRuntime::collect) lets go
/// of everything. Once released, a resource lives exactly as long as its
/// outside handles.
#[derive(Default)]
pub struct RetentionPool {
    /// Keyed by allocation address, so adopting the same resource twice is a no-op.
    resident: Mutex<HashMap<usize, ResourceRef>>,
}

fn address(resource: &ResourceRef) -> usize {
    Arc::as_ptr(resource) as *const () as usize
}

impl RetentionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of resources currently retained.
    pub fn resident_count(&self) -> usize {
        self.resident.lock().len()
    }
}

#[async_trait]
impl ResourceRuntime for RetentionPool {
    fn adopt(&self, resource: &ResourceRef) {
        self.resident
            .lock()
            .entry(address(resource))
            .or_insert_with(|| resource.clone());
    }

    async fn release_unused(&self) -> usize {
        let mut resident = self.resident.lock();
        let before = resident.len();
        resident.retain(|_, resource| Arc::strong_count(resource) > 1);
        let released = before - resident.len();
        log::debug!("RetentionPool: Released {released} unused resources");
        released
    }

    async fn collect(&self) -> usize {
        let mut resident = self.resident.lock();
        let released = resident.len();
        resident.clear();
        resident.shrink_to_fit();
        log::debug!("RetentionPool: Collected {released} resources");
        released
    }
}
