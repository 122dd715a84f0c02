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

//! # Strata Core
//!
//! Foundational crate containing the resource keys, loader and storage
//! contracts, and error types shared by every layer of the resource system.
//!
//! Nothing in here knows how a resource is actually fetched or cached; the
//! concrete machinery lives in `strata-data`, `strata-lanes` and
//! `strata-agents`.

#![warn(missing_docs)]

pub mod bundle;
pub mod config;
pub mod error;
pub mod loader;
pub mod resource;
pub mod runtime;
pub mod thread;

pub use config::ResourceConfig;
pub use error::{ResourceError, ResourceResult};
pub use thread::OwnerThread;
