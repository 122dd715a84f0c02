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

//! Pack containers: an `index.bin` table of entries plus a `data.pack` blob.
//!
//! A bundle on disk is a directory holding one pack container. Entries named
//! `<entry>#<part>` are the parts of a multi-part resource `<entry>`.

mod archive;
mod storage;
mod writer;

pub use archive::*;
pub use storage::*;
pub use writer::*;

/// File name of the serialized entry table inside a container directory.
pub const INDEX_FILE: &str = "index.bin";
/// File name of the concatenated entry data inside a container directory.
pub const DATA_FILE: &str = "data.pack";
/// Separator between an entry name and a part name.
pub const PART_SEPARATOR: char = '#';
