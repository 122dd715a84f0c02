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

//! Acts as the agent for bundles.
//!
//! [`BundleManager`] keeps one reference-counted context per open bundle and
//! opens declared dependencies first. [`BundleResolver`] and [`BundleLoader`]
//! expose bundle entries as resources under the `assetbundle` host.

mod loader;
mod manager;

pub use loader::*;
pub use manager::*;
