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

use serde::{Deserialize, Serialize};

/// Serializable metadata that describes a bundle and its relationship to other bundles.
///
/// This is the "identity card" the bundle manager needs to open a bundle
/// without touching its data: what it is called and which bundles must be
/// open before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleInfo {
    /// The unique bundle name, also its key in the bundle table.
    pub name: String,

    /// The content hash of the built bundle, if the build pipeline recorded one.
    pub hash: Option<String>,

    /// The names of the bundles this bundle depends on.
    /// Fixed when the bundle is built; never changes while it is open.
    pub dependencies: Vec<String>,

    /// The size of the bundle's data in bytes.
    pub size: u64,
}

impl BundleInfo {
    /// Creates the metadata of a bundle with the given dependencies.
    pub fn new<I, S>(name: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            hash: None,
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            size: 0,
        }
    }
}
