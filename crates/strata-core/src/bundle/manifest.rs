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

use super::{BundleCatalog, BundleInfo};
use std::collections::HashMap;

/// The runtime representation of the bundle index (`bundles.bin`).
///
/// The manifest provides fast, in-memory access to the metadata of every
/// bundle the build produced. It is the catalog the bundle manager consults
/// to resolve declared dependency names.
#[derive(Debug, Default)]
pub struct BundleManifest {
    /// The internal index mapping bundle names to their metadata.
    /// This provides O(1) average-time lookups.
    index: HashMap<String, BundleInfo>,
}

impl BundleManifest {
    /// Creates a new `BundleManifest` by parsing an index from its raw bytes.
    ///
    /// # Errors
    /// Returns a `DecodeError` if the byte slice is not a valid, bincode-encoded
    /// list of `BundleInfo`.
    pub fn new(index_bytes: &[u8]) -> Result<Self, bincode::error::DecodeError> {
        let config = bincode::config::standard();
        let (infos, _): (Vec<BundleInfo>, _) =
            bincode::serde::decode_from_slice(index_bytes, config)?;
        Ok(Self::from_infos(infos))
    }

    /// Builds a manifest directly from a list of bundle metadata.
    pub fn from_infos(infos: impl IntoIterator<Item = BundleInfo>) -> Self {
        let index = infos
            .into_iter()
            .map(|info| (info.name.clone(), info))
            .collect();
        Self { index }
    }

    /// Encodes the manifest into the byte format read by [`BundleManifest::new`].
    pub fn encode(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        let mut infos: Vec<&BundleInfo> = self.index.values().collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        bincode::serde::encode_to_vec(&infos, bincode::config::standard())
    }

    /// Retrieves the metadata for a given bundle name.
    pub fn get(&self, name: &str) -> Option<&BundleInfo> {
        self.index.get(name)
    }

    /// The number of bundles in the manifest.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the manifest lists no bundles.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl BundleCatalog for BundleManifest {
    fn bundle_info(&self, name: &str) -> Option<BundleInfo> {
        self.get(name).cloned()
    }
}
