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

use std::collections::HashMap;
use std::sync::Arc;

use strata_core::loader::{Loader, Resolver};
use strata_core::resource::{ResourceId, ResourceUrl};

/// A resolver that routes keys to loaders by their URL host.
///
/// `res://resources/...` and `res://assetbundle/...` can be served by two
/// different loaders registered on a single `HostResolver`.
#[derive(Default)]
pub struct HostResolver {
    routes: HashMap<String, Arc<dyn Loader>>,
}

impl HostResolver {
    /// Creates a resolver with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`route`](Self::route).
    pub fn with_route(mut self, host: impl Into<String>, loader: Arc<dyn Loader>) -> Self {
        self.route(host, loader);
        self
    }

    /// Routes every key whose host is `host` to `loader`, replacing any previous route.
    pub fn route(&mut self, host: impl Into<String>, loader: Arc<dyn Loader>) {
        let host = host.into();
        if self.routes.insert(host.clone(), loader).is_some() {
            log::warn!("HostResolver: Replaced the loader routed for host '{host}'");
        }
    }
}

impl Resolver for HostResolver {
    fn resolve(&self, _id: ResourceId, url: &ResourceUrl) -> Option<Arc<dyn Loader>> {
        self.routes.get(url.host()).cloned()
    }
}
