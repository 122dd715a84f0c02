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
use std::path::{Path, PathBuf};

use strata_core::bundle::{BundleHandle, BundleInfo, BundleStorage};
use strata_core::{ResourceError, ResourceResult};

use super::PackArchive;

/// Bundle storage backed by a directory of pack containers.
///
/// Bundle `name` lives in `<root>/<name>/`. The handle payload of an opened
/// bundle is its [`PackArchive`].
#[derive(Debug, Clone)]
pub struct DirectoryBundleStorage {
    root: PathBuf,
}

impl DirectoryBundleStorage {
    /// Creates a storage rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding all bundle containers.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The container directory of `bundle`.
    pub fn bundle_dir(&self, bundle: &BundleInfo) -> PathBuf {
        self.root.join(&bundle.name)
    }
}

#[async_trait]
impl BundleStorage for DirectoryBundleStorage {
    fn exists(&self, bundle: &BundleInfo) -> bool {
        PackArchive::exists(self.bundle_dir(bundle))
    }

    async fn open(&self, bundle: &BundleInfo) -> ResourceResult<BundleHandle> {
        let dir = self.bundle_dir(bundle);
        let name = bundle.name.clone();
        log::debug!("DirectoryBundleStorage: Opening '{}'", dir.display());

        let archive = tokio::task::spawn_blocking(move || PackArchive::open(dir))
            .await
            .map_err(ResourceError::backend)?
            .map_err(ResourceError::backend)?;
        Ok(BundleHandle::new(name, archive))
    }

    fn close(&self, handle: &BundleHandle) {
        // Archives hold no open files; dropping the last handle frees the index.
        log::debug!("DirectoryBundleStorage: Closed bundle '{}'", handle.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack_lane::PackWriter;

    #[tokio::test]
    async fn test_open_exposes_archive_payload() {
        let root = tempfile::tempdir().unwrap();
        let mut writer = PackWriter::create(root.path().join("ui")).unwrap();
        writer.add("icons/close", "png", &[7]).unwrap();
        writer.finish().unwrap();

        let storage = DirectoryBundleStorage::new(root.path());
        let info = BundleInfo::new("ui", Vec::<String>::new());
        assert!(storage.exists(&info));

        let handle = storage.open(&info).await.unwrap();
        assert_eq!(handle.name(), "ui");
        let archive = handle.payload::<PackArchive>().unwrap();
        assert!(archive.entry("icons/close").is_some());
        storage.close(&handle);
    }

    #[tokio::test]
    async fn test_missing_bundle_does_not_exist() {
        let root = tempfile::tempdir().unwrap();
        let storage = DirectoryBundleStorage::new(root.path());
        let info = BundleInfo::new("nowhere", Vec::<String>::new());
        assert!(!storage.exists(&info));
        assert!(matches!(
            storage.open(&info).await,
            Err(ResourceError::Backend(_))
        ));
    }
}
