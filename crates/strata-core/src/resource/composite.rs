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

use super::{Resource, ResourceRef};
use std::fmt;

/// A single resource assembled from every part of a multi-part entry
/// (for example all the sprites cut from one sheet).
pub struct CompositeResource {
    parts: Vec<(String, ResourceRef)>,
}

impl CompositeResource {
    /// Assembles a composite from its named parts, keeping their order.
    pub fn new(parts: Vec<(String, ResourceRef)>) -> Self {
        Self { parts }
    }

    /// Looks up a part by name.
    pub fn part(&self, name: &str) -> Option<&ResourceRef> {
        self.parts
            .iter()
            .find(|(part_name, _)| part_name == name)
            .map(|(_, part)| part)
    }

    /// Iterates over the parts in assembly order.
    pub fn parts(&self) -> impl Iterator<Item = (&str, &ResourceRef)> {
        self.parts.iter().map(|(name, part)| (name.as_str(), part))
    }

    /// The number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if the composite has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Resource for CompositeResource {}

impl fmt::Debug for CompositeResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeResource")
            .field("parts", &self.parts.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}
