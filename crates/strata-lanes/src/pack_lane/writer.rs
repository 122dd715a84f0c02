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
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{PackArchive, PackEntry, DATA_FILE, INDEX_FILE};

/// Builds a pack container directory entry by entry.
///
/// Data is streamed into `data.pack` as entries are added; the index is
/// written by [`finish`](Self::finish).
pub struct PackWriter {
    root: PathBuf,
    data_file: BufWriter<File>,
    entries: Vec<PackEntry>,
    names: HashSet<String>,
    current_offset: u64,
}

impl PackWriter {
    /// Creates (or truncates) a container at `root`, creating the directory if needed.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create pack directory '{}'", root.display()))?;

        let data_path = root.join(DATA_FILE);
        let data_file = File::create(&data_path)
            .with_context(|| format!("Failed to create data pack at '{}'", data_path.display()))?;

        Ok(Self {
            root: root.to_path_buf(),
            data_file: BufWriter::new(data_file),
            entries: Vec::new(),
            names: HashSet::new(),
            current_offset: 0,
        })
    }

    /// Appends an entry.
    ///
    /// Fails if an entry with the same name was already added.
    pub fn add(&mut self, name: &str, type_name: &str, bytes: &[u8]) -> Result<&mut Self> {
        if !self.names.insert(name.to_string()) {
            bail!("Duplicate pack entry '{name}'");
        }
        self.data_file
            .write_all(bytes)
            .with_context(|| format!("Failed to write entry '{name}'"))?;

        let size = bytes.len() as u64;
        self.entries.push(PackEntry {
            name: name.to_string(),
            type_name: type_name.to_string(),
            offset: self.current_offset,
            size,
        });
        self.current_offset += size;
        Ok(self)
    }

    /// Adds every file under `source_dir`, named by its relative path without
    /// extension and typed by its extension.
    pub fn add_directory(&mut self, source_dir: impl AsRef<Path>) -> Result<&mut Self> {
        let source_dir = source_dir.as_ref();
        if !source_dir.is_dir() {
            bail!("Source directory '{}' does not exist", source_dir.display());
        }
        let mut files: Vec<PathBuf> = WalkDir::new(source_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();
        files.sort();

        for path in files {
            let relative = path
                .strip_prefix(source_dir)
                .context("Walked outside the source directory")?;
            let type_name = relative
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("")
                .to_string();
            let name = relative
                .with_extension("")
                .to_str()
                .context("Invalid path encoding")?
                .replace('\\', "/");

            let bytes = fs::read(&path)
                .with_context(|| format!("Failed to read file '{}'", path.display()))?;
            self.add(&name, &type_name, &bytes)?;
        }
        Ok(self)
    }

    /// Flushes the data file, writes the index and reopens the result.
    pub fn finish(mut self) -> Result<PackArchive> {
        self.data_file.flush().context("Failed to flush data pack")?;

        let config = bincode::config::standard();
        let encoded_index = bincode::serde::encode_to_vec(&self.entries, config)
            .context("Failed to serialize pack index")?;
        let index_path = self.root.join(INDEX_FILE);
        fs::write(&index_path, &encoded_index)
            .with_context(|| format!("Failed to write index file to '{}'", index_path.display()))?;

        log::debug!(
            "PackWriter: Wrote {} entries ({} bytes) to '{}'",
            self.entries.len(),
            self.current_offset,
            self.root.display()
        );
        drop(self.data_file);
        PackArchive::open(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_entry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = PackWriter::create(dir.path()).unwrap();
        writer.add("a", "txt", b"1").unwrap();
        assert!(writer.add("a", "txt", b"2").is_err());
    }

    #[test]
    fn test_add_directory_names_entries_by_relative_stem() {
        let source = tempfile::tempdir().unwrap();
        fs::create_dir_all(source.path().join("characters")).unwrap();
        fs::write(source.path().join("characters/hero.txt"), b"hero").unwrap();
        fs::write(source.path().join("logo.png"), [0x89, 0x50]).unwrap();

        let out = tempfile::tempdir().unwrap();
        let mut writer = PackWriter::create(out.path()).unwrap();
        writer.add_directory(source.path()).unwrap();
        let archive = writer.finish().unwrap();

        let hero = archive.entry("characters/hero").unwrap();
        assert_eq!(hero.type_name, "txt");
        assert_eq!(archive.read(hero).unwrap(), b"hero");
        assert_eq!(archive.entry("logo").unwrap().type_name, "png");
    }

    #[test]
    fn test_add_directory_walks_nested_folders_in_path_order() {
        let source = tempfile::tempdir().unwrap();
        fs::create_dir_all(source.path().join("b/deep/er")).unwrap();
        fs::write(source.path().join("b/deep/er/z.txt"), b"z").unwrap();
        fs::write(source.path().join("b/a.txt"), b"a").unwrap();
        fs::write(source.path().join("a.txt"), b"root").unwrap();

        let out = tempfile::tempdir().unwrap();
        let mut writer = PackWriter::create(out.path()).unwrap();
        writer.add_directory(source.path()).unwrap();
        let archive = writer.finish().unwrap();

        let mut names: Vec<&str> = archive.entries().map(|e| e.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["a", "b/a", "b/deep/er/z"]);
        // Offsets follow the sorted walk order.
        assert_eq!(archive.entry("a").unwrap().offset, 0);
        assert_eq!(archive.entry("b/a").unwrap().offset, 4);
    }

    #[test]
    fn test_missing_source_directory_is_an_error() {
        let out = tempfile::tempdir().unwrap();
        let mut writer = PackWriter::create(out.path().join("pack")).unwrap();
        assert!(writer.add_directory(out.path().join("nowhere")).is_err());
    }
}
