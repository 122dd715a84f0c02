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

//! Defines the error taxonomy of the resource system.

use thiserror::Error;

/// A convenience alias for results produced by the resource system.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Every structural failure the resource system can surface to a caller.
///
/// Content-level "not found" conditions are never reported through this type;
/// loaders resolve those to `Ok(None)` instead. The enum is `Clone` so that a
/// memoized in-flight operation can hand the same outcome to every joiner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// A key, id, or other argument was empty or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The same resolver instance was registered twice.
    #[error("Resolver is already registered")]
    DuplicateRegistration,

    /// No registered resolver claimed the key.
    #[error("No loader available for '{0}'")]
    NoLoaderAvailable(String),

    /// The storage backend has no data for the bundle.
    #[error("Bundle '{0}' is not installed")]
    NotInstalled(String),

    /// A dependency declared by a bundle has no catalog entry.
    #[error("Bundle '{bundle}' depends on '{dependency}', which has no bundle info")]
    MissingDependencyInfo {
        /// The bundle declaring the dependency.
        bundle: String,
        /// The dependency name that could not be resolved.
        dependency: String,
    },

    /// A bundle requested by name has no catalog entry.
    #[error("Unknown bundle '{0}'")]
    UnknownBundle(String),

    /// The dependency graph of a bundle loops back on itself.
    #[error("Cyclic bundle dependency: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    /// A public entry point was called away from the owning thread.
    #[error("'{operation}' called outside of the owning thread")]
    WrongThread {
        /// The name of the rejected operation.
        operation: &'static str,
    },

    /// A guaranteed load produced no value.
    #[error("Failed to load '{0}'")]
    LoadFailed(String),

    /// A resource was loaded but is not of the requested type.
    #[error("Resource '{0}' is not of the requested type")]
    TypeMismatch(String),

    /// The backend (file system, decoder, ...) reported a failure.
    #[error("Backend failure: {0}")]
    Backend(String),
}

impl ResourceError {
    /// Wraps any displayable backend failure, keeping its full context chain.
    pub fn backend(error: impl std::fmt::Display) -> Self {
        ResourceError::Backend(format!("{error:#}"))
    }
}
