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

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_core::{ResourceError, ResourceResult};

use super::{DATA_FILE, INDEX_FILE, PART_SEPARATOR};

/// The location and type of one entry inside `data.pack`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackEntry {
    /// Entry path inside the container, e.g. `characters/hero` or `characters/hero#mesh`.
    pub name: String,
    /// Type name used to pick a decoder, usually the source file extension.
    pub type_name: String,
    /// Byte offset into `data.pack`.
    pub offset: u64,
    /// Byte length of the entry.
    pub size: u64,
}

impl PackEntry {
    /// Splits `hero#mesh` into `("hero", Some("mesh"))`.
    pub fn split_part(&self) -> (&str, Option<&str>) {
        match self.name.split_once(PART_SEPARATOR) {
            Some((entry, part)) => (entry, Some(part)),
            None => (&self.name, None),
        }
    }
}

/// An opened pack container.
///
/// Opening reads only the index; entry data is read on demand. Cloning is
/// cheap, the index is shared.
#[derive(Debug, Clone)]
pub struct PackArchive {
    root: PathBuf,
    entries: Arc<BTreeMap<String, PackEntry>>,
}

impl PackArchive {
    /// Returns `true` if `root` looks like a pack container.
    pub fn exists(root: impl AsRef<Path>) -> bool {
        let root = root.as_ref();
        root.join(INDEX_FILE).is_file() && root.join(DATA_FILE).is_file()
    }

    /// Opens the container at `root` by reading and decoding its index.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let index_path = root.join(INDEX_FILE);
        let index_bytes = fs::read(&index_path)
            .with_context(|| format!("Failed to read pack index '{}'", index_path.display()))?;

        let config = bincode::config::standard();
        let (entries, _): (Vec<PackEntry>, usize) =
            bincode::serde::decode_from_slice(&index_bytes, config)
                .with_context(|| format!("Failed to decode pack index '{}'", index_path.display()))?;

        let data_path = root.join(DATA_FILE);
        if !data_path.is_file() {
            bail!("Pack data file '{}' is missing", data_path.display());
        }

        log::debug!(
            "PackArchive: Opened '{}' with {} entries",
            root.display(),
            entries.len()
        );
        Ok(Self {
            root: root.to_path_buf(),
            entries: Arc::new(
                entries
                    .into_iter()
                    .map(|entry| (entry.name.clone(), entry))
                    .collect(),
            ),
        })
    }

    /// The container directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Looks up an entry by its full name.
    pub fn entry(&self, name: &str) -> Option<&PackEntry> {
        self.entries.get(name)
    }

    /// All entries, ordered by name.
    pub fn entries(&self) -> impl Iterator<Item = &PackEntry> {
        self.entries.values()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the container has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The parts of the multi-part entry `name`, as `(part name, entry)` pairs ordered by part name.
    pub fn parts_of<'a>(&'a self, name: &str) -> Vec<(&'a str, &'a PackEntry)> {
        let prefix = format!("{name}{PART_SEPARATOR}");
        self.entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, entry)| (&key[prefix.len()..], entry))
            .collect()
    }

    /// Reads the raw bytes of `entry` from `data.pack`.
    pub fn read(&self, entry: &PackEntry) -> Result<Vec<u8>> {
        let data_path = self.root.join(DATA_FILE);
        let mut pack_file = File::open(&data_path)
            .with_context(|| format!("Failed to open pack data '{}'", data_path.display()))?;

        let size = usize::try_from(entry.size).context("Entry size does not fit in memory")?;
        let mut buffer = vec![0; size];
        pack_file
            .seek(SeekFrom::Start(entry.offset))
            .context("Failed to seek to entry location in pack file")?;
        pack_file
            .read_exact(&mut buffer)
            .with_context(|| format!("Failed to read entry '{}' from pack file", entry.name))?;
        Ok(buffer)
    }

    /// Reads `entry` on the blocking thread pool.
    pub async fn read_async(&self, entry: &PackEntry) -> ResourceResult<Vec<u8>> {
        let archive = self.clone();
        let entry = entry.clone();
        tokio::task::spawn_blocking(move || archive.read(&entry))
            .await
            .map_err(ResourceError::backend)?
            .map_err(ResourceError::backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack_lane::PackWriter;

    fn sample(dir: &Path) -> PackArchive {
        let mut writer = PackWriter::create(dir).unwrap();
        writer.add("characters/hero", "txt", b"hero").unwrap();
        writer.add("characters/hero#mesh", "bin", &[1, 2, 3]).unwrap();
        writer.add("characters/hero#skin", "bin", &[4, 5]).unwrap();
        writer.add("characters/hero_old", "txt", b"old").unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_open_reads_index_and_data() {
        let dir = tempfile::tempdir().unwrap();
        sample(dir.path());

        assert!(PackArchive::exists(dir.path()));
        let archive = PackArchive::open(dir.path()).unwrap();
        assert_eq!(archive.len(), 4);

        let hero = archive.entry("characters/hero").unwrap();
        assert_eq!(archive.read(hero).unwrap(), b"hero");
        let skin = archive.entry("characters/hero#skin").unwrap();
        assert_eq!(archive.read(skin).unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_parts_are_grouped_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let archive = sample(dir.path());

        let parts: Vec<&str> = archive
            .parts_of("characters/hero")
            .into_iter()
            .map(|(part, _)| part)
            .collect();
        assert_eq!(parts, vec!["mesh", "skin"]);
        assert!(archive.parts_of("characters/hero_old").is_empty());
    }

    #[test]
    fn test_split_part() {
        let entry = PackEntry {
            name: "a/b#c".to_string(),
            type_name: String::new(),
            offset: 0,
            size: 0,
        };
        assert_eq!(entry.split_part(), ("a/b", Some("c")));
    }

    #[test]
    fn test_missing_container_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!PackArchive::exists(dir.path()));
        assert!(PackArchive::open(dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_read_async_matches_blocking_read() {
        let dir = tempfile::tempdir().unwrap();
        let archive = sample(dir.path());
        let mesh = archive.entry("characters/hero#mesh").unwrap().clone();
        assert_eq!(archive.read_async(&mesh).await.unwrap(), vec![1, 2, 3]);
    }
}
