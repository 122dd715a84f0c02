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

use async_trait::async_trait;

use super::{BundleHandle, BundleInfo};
use crate::error::ResourceResult;

/// The storage backend that physically opens and closes bundles.
///
/// The bundle manager only orchestrates calls into this contract; it knows
/// nothing about file formats or where the data lives.
#[async_trait]
pub trait BundleStorage: Send + Sync {
    /// Returns `true` if the data backing `info` is present.
    fn exists(&self, info: &BundleInfo) -> bool;

    /// Opens the bundle. May suspend while the backend performs I/O.
    async fn open(&self, info: &BundleInfo) -> ResourceResult<BundleHandle>;

    /// Closes a handle previously returned by [`open`](Self::open).
    fn close(&self, handle: &BundleHandle);
}

/// The source of truth for bundle metadata.
pub trait BundleCatalog: Send + Sync {
    /// Retrieves the metadata of the named bundle.
    fn bundle_info(&self, name: &str) -> Option<BundleInfo>;
}
