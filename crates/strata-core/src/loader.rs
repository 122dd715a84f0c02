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

//! The capability contracts that turn a resource key into a resource.
//!
//! A [`Resolver`] picks the [`Loader`] responsible for a key; the loader then
//! produces the resource asynchronously. Concrete implementations live in
//! `strata-lanes` (files, packs) and `strata-agents` (bundles).

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ResourceResult;
use crate::resource::{ResourceId, ResourceRef, ResourceUrl};

/// Receives loading progress, as a fraction in `0.0..=1.0`.
pub trait ProgressSink: Send + Sync {
    /// Reports the current progress of a load.
    fn report(&self, fraction: f32);
}

impl<F> ProgressSink for F
where
    F: Fn(f32) + Send + Sync,
{
    fn report(&self, fraction: f32) {
        self(fraction)
    }
}

/// A capability that fetches resources for keys of one backend family.
///
/// Loaders may keep private per-instance state (for example the set of ids
/// they have produced from a shared container); only the loader itself
/// mutates it.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Asynchronously produces the resource for `id` / `url`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(resource))` on success.
    /// * `Ok(None)` for every recoverable, content-level failure: a missing
    ///   entry, a malformed entry name, an undecodable payload.
    /// * `Err(_)` only for call-level misuse or a failing backend.
    async fn load(
        &self,
        id: ResourceId,
        url: &ResourceUrl,
        progress: Option<&dyn ProgressSink>,
    ) -> ResourceResult<Option<ResourceRef>>;

    /// Best-effort notification that the cache dropped a resource this loader produced.
    ///
    /// Called once per evicted entry, from the owning thread. Stateful loaders
    /// use it to decide when a shared container can be closed.
    fn on_cache_lost(&self, id: ResourceId);

    /// A short name used in log messages.
    fn name(&self) -> &str {
        "loader"
    }
}

/// A capability that picks the loader responsible for a key.
pub trait Resolver: Send + Sync {
    /// Returns the loader claiming `url`, or `None` to let the next resolver try.
    ///
    /// Resolvers may lazily construct and memoize loaders (for example one per
    /// backing container), but must have no other side effects.
    fn resolve(&self, id: ResourceId, url: &ResourceUrl) -> Option<Arc<dyn Loader>>;
}
