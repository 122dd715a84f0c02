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

//! Types and contracts for composite, dependency-declaring bundles.
//!
//! A bundle is a container of resources that can only be opened once all the
//! bundles it depends on are open. This module defines the bundle metadata,
//! the opaque handle returned by an open, and the storage and catalog
//! contracts the bundle manager consumes. The reference counting itself lives
//! in `strata-agents`.

mod handle;
mod info;
mod manifest;
mod storage;

pub use handle::*;
pub use info::*;
pub use manifest::*;
pub use storage::*;
