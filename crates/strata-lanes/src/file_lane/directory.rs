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
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_core::loader::{Loader, ProgressSink};
use strata_core::resource::{ResourceId, ResourceRef, ResourceUrl};
use strata_core::{ResourceError, ResourceResult};

use crate::decode_lane::DecoderRegistry;

/// Loads resources from loose files under a root directory.
///
/// The URL path names the file relative to the root, with or without its
/// extension: `res://resources/characters/hero` finds
/// `<root>/characters/hero.txt`. The extension picks the decoder. A missing
/// or undecodable file is a content-level failure and yields `None`.
pub struct DirectoryLoader {
    root: PathBuf,
    decoders: Arc<DecoderRegistry>,
}

impl DirectoryLoader {
    /// Creates a loader serving files under `root`.
    pub fn new(root: impl Into<PathBuf>, decoders: Arc<DecoderRegistry>) -> Self {
        Self {
            root: root.into(),
            decoders,
        }
    }

    /// The directory files are served from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Loader for DirectoryLoader {
    async fn load(
        &self,
        id: ResourceId,
        url: &ResourceUrl,
        progress: Option<&dyn ProgressSink>,
    ) -> ResourceResult<Option<ResourceRef>> {
        let Some(segments) = url.segments().filter(|segments| is_safe_path(segments)) else {
            log::warn!("DirectoryLoader: Malformed resource path in '{url}'");
            return Ok(None);
        };
        if let Some(progress) = progress {
            progress.report(0.0);
        }

        let relative: PathBuf = segments.iter().collect();
        let root = self.root.clone();
        let found = tokio::task::spawn_blocking(move || read_matching_file(&root, &relative))
            .await
            .map_err(ResourceError::backend)?;

        let Some((type_name, bytes)) = found else {
            log::debug!("DirectoryLoader: No file for {id} ('{url}')");
            return Ok(None);
        };

        let resource = match self.decoders.decode(&type_name, bytes) {
            Ok(resource) => resource,
            Err(error) => {
                log::warn!("DirectoryLoader: Dropping '{url}': {error}");
                return Ok(None);
            }
        };
        if let Some(progress) = progress {
            progress.report(1.0);
        }
        Ok(Some(resource))
    }

    fn on_cache_lost(&self, id: ResourceId) {
        log::trace!("DirectoryLoader: Cache lost {id}");
    }

    fn name(&self) -> &str {
        "directory"
    }
}

/// Rejects empty paths and segments that could step outside the root once decoded.
fn is_safe_path(segments: &[String]) -> bool {
    !segments.is_empty()
        && segments
            .iter()
            .all(|s| s != "." && s != ".." && !s.contains(['/', '\\']))
}

/// Finds `relative` under `root`, either verbatim or as the stem of a file in
/// its parent directory. Returns the extension and the file contents.
fn read_matching_file(root: &Path, relative: &Path) -> Option<(String, Vec<u8>)> {
    let exact = root.join(relative);
    let path = if exact.is_file() {
        exact
    } else {
        let parent = exact.parent()?;
        let stem = exact.file_name()?;
        let mut candidates: Vec<PathBuf> = fs::read_dir(parent)
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.file_stem() == Some(stem))
            .collect();
        candidates.sort();
        candidates.into_iter().next()?
    };

    let type_name = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_string();
    match fs::read(&path) {
        Ok(bytes) => Some((type_name, bytes)),
        Err(error) => {
            log::warn!("DirectoryLoader: Failed to read '{}': {error}", path.display());
            None
        }
    }
}
