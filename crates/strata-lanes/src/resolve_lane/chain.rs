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

//! An ordered, deduplicated chain of resolvers.

use std::sync::Arc;

use strata_core::loader::{Loader, Resolver};
use strata_core::resource::{ResourceId, ResourceUrl};
use strata_core::{ResourceError, ResourceResult};

/// The ordered list of registered resolvers.
///
/// Earlier registrations take priority: [`resolve`](Self::resolve) returns
/// the loader of the first resolver that claims a key.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn Resolver>>,
}

impl ResolverChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resolver to the end of the chain.
    ///
    /// # Errors
    /// Returns [`ResourceError::DuplicateRegistration`] if this very instance
    /// is already registered. That is a programming error, not a runtime
    /// condition to recover from.
    pub fn register(&mut self, resolver: Arc<dyn Resolver>) -> ResourceResult<()> {
        if self.contains(&resolver) {
            log::error!("ResolverChain: Resolver registered twice");
            return Err(ResourceError::DuplicateRegistration);
        }
        self.resolvers.push(resolver);
        Ok(())
    }

    /// Removes a registered resolver. Returns `false` if it was not registered.
    pub fn unregister(&mut self, resolver: &Arc<dyn Resolver>) -> bool {
        let before = self.resolvers.len();
        self.resolvers
            .retain(|registered| !same_resolver(registered, resolver));
        self.resolvers.len() != before
    }

    /// Returns `true` if this resolver instance is registered.
    pub fn contains(&self, resolver: &Arc<dyn Resolver>) -> bool {
        self.resolvers
            .iter()
            .any(|registered| same_resolver(registered, resolver))
    }

    /// Returns the loader of the first resolver claiming `url`, in registration order.
    pub fn resolve(&self, id: ResourceId, url: &ResourceUrl) -> Option<Arc<dyn Loader>> {
        self.resolvers
            .iter()
            .find_map(|resolver| resolver.resolve(id, url))
    }

    /// The number of registered resolvers.
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns `true` if no resolver is registered.
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

fn same_resolver(a: &Arc<dyn Resolver>, b: &Arc<dyn Resolver>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
