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

//! The contract of the runtime that actually owns loaded resources.

use async_trait::async_trait;

use crate::resource::ResourceRef;

/// The backing runtime that strongly owns resources and reclaims them at will.
///
/// The cache only holds weak references; whatever keeps a resource alive
/// lives on this side of the boundary. The cleanup tiers ask the runtime to
/// give memory back.
#[async_trait]
pub trait ResourceRuntime: Send + Sync {
    /// Takes (shared) ownership of a freshly loaded resource.
    fn adopt(&self, resource: &ResourceRef);

    /// Releases every resource nobody outside the runtime references anymore.
    ///
    /// Returns the number of resources released.
    async fn release_unused(&self) -> usize;

    /// Forces a full collection pass, dropping everything the runtime itself holds.
    ///
    /// Returns the number of resources released.
    async fn collect(&self) -> usize;
}
