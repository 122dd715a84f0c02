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

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::{ResourceError, ResourceResult};

/// A stable 64-bit identifier derived from a canonical resource key.
///
/// Equal canonical strings always produce equal ids, across runs and
/// machines. Collisions between different strings are an accepted risk of
/// the hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(u64);

impl ResourceId {
    /// The reserved id of "no resource". Never produced by hashing.
    pub const NULL: ResourceId = ResourceId(0);

    /// Hashes a canonical key string into an id (first 8 bytes of BLAKE3, little endian).
    pub fn from_canonical(canonical: &str) -> Self {
        let hash = blake3::hash(canonical.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        match u64::from_le_bytes(bytes) {
            0 => Self(1),
            value => Self(value),
        }
    }

    /// Wraps a raw id value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns `true` for [`ResourceId::NULL`].
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A parsed, canonicalized resource URL (`scheme://host/path?query`).
///
/// The host selects a routing category (for example `resources` or
/// `assetbundle`); the path and query carry backend-specific addressing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUrl(Url);

impl ResourceUrl {
    /// Parses and canonicalizes a resource URL.
    ///
    /// # Errors
    /// Returns [`ResourceError::InvalidArgument`] for empty or unparseable
    /// text, and for URLs without a host.
    pub fn parse(text: &str) -> ResourceResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ResourceError::InvalidArgument(
                "resource key is empty".to_string(),
            ));
        }
        let url = Url::parse(text)
            .map_err(|e| ResourceError::InvalidArgument(format!("'{text}': {e}")))?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ResourceError::InvalidArgument(format!(
                "'{text}' has no routing host"
            )));
        }
        Ok(Self(url))
    }

    /// The canonical string this URL hashes from.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The URL scheme, without `://`.
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// The routing category.
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// The raw path, including its leading `/`.
    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// The non-empty path segments, in order, percent-decoded.
    ///
    /// Returns `None` if a segment does not decode to UTF-8.
    pub fn segments(&self) -> Option<Vec<String>> {
        let Some(segments) = self.0.path_segments() else {
            return Some(Vec::new());
        };
        segments
            .filter(|s| !s.is_empty())
            .map(|s| {
                percent_decode_str(s)
                    .decode_utf8()
                    .ok()
                    .map(|decoded| decoded.into_owned())
            })
            .collect()
    }

    /// Returns the value of the first query parameter called `name`.
    pub fn query_value(&self, name: &str) -> Option<String> {
        self.0
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Returns `true` if the query mentions `name`, with or without a value.
    pub fn has_query_flag(&self, name: &str) -> bool {
        self.0.query_pairs().any(|(key, _)| key == name)
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource key: the parsed URL together with its derived id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    id: ResourceId,
    url: ResourceUrl,
}

impl ResourceKey {
    /// Parses a key and derives its id from the canonical URL.
    pub fn parse(text: &str) -> ResourceResult<Self> {
        let url = ResourceUrl::parse(text)?;
        Ok(Self {
            id: ResourceId::from_canonical(url.as_str()),
            url,
        })
    }

    /// The stable id used for table lookups.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// The parsed URL.
    pub fn url(&self) -> &ResourceUrl {
        &self.url
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.url, f)
    }
}
