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

//! # Strata Agents
//!
//! The orchestration layer. Agents own the mutable tables of the resource
//! system and decide when the lanes run:
//!
//! - [`bundle_agent`]: reference-counted bundles with dependency cascades.
//! - [`cleanup_agent`]: the three coalescing cleanup tiers.
//! - [`resource_agent`]: the facade callers load resources through.

#![warn(missing_docs)]

pub mod bundle_agent;
pub mod cleanup_agent;
pub mod resource_agent;

pub use bundle_agent::{BundleLoader, BundleManager, BundleResolver};
pub use cleanup_agent::{CleanupHandle, CleanupLevel, CleanupReport, CleanupState, TieredCleaner};
pub use resource_agent::ResourceAgent;
