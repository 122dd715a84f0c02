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

//! Provides the foundational traits and primitive types for Strata's resources.
//!
//! This module defines the "common language" for every resource operation:
//! - The [`Resource`] trait: a marker for all types that can be loaded and cached.
//! - [`ResourceKey`] and [`ResourceId`]: URL-shaped keys and their stable 64-bit ids.
//! - [`ResourceRef`] / [`WeakResourceRef`]: the type-erased strong and weak
//!   references that flow between loaders, the cache, and the runtime.
//! - [`ResourceHandle`]: the typed handle handed back to callers.
//!
//! It has no knowledge of how resources are fetched or stored.

mod composite;
mod handle;
mod key;

pub use composite::*;
pub use handle::*;
pub use key::*;

use std::any::Any;
use std::sync::{Arc, Weak};

/// A marker trait for types that can be managed by the resource system.
///
/// The supertraits enforce that resources can be shared between the owner
/// thread and the worker threads performing backend I/O, and that they hold
/// no borrowed data.
///
/// # Examples
///
/// ```
/// use strata_core::resource::Resource;
///
/// struct Texture {
///     // ... fields
/// }
///
/// impl Resource for Texture {}
/// ```
pub trait Resource: Send + Sync + 'static {}

/// A strong, type-erased reference to a loaded resource.
pub type ResourceRef = Arc<dyn Any + Send + Sync>;

/// A non-owning reference to a loaded resource. Must be upgraded before use.
pub type WeakResourceRef = Weak<dyn Any + Send + Sync>;

/// Raw, undecoded bytes. Produced when no decoder is registered for a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBytes(pub Vec<u8>);

impl Resource for RawBytes {}

/// Erases the type of a freshly loaded resource.
pub fn into_ref<A: Resource>(resource: A) -> ResourceRef {
    Arc::new(resource)
}
