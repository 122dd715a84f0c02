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

//! # Strata Lanes
//!
//! Hot-path execution pipelines of the resource system: picking a loader for
//! a key, decoding raw bytes into resources, and reading pack containers
//! from disk. Lanes hold no policy; the agents in `strata-agents` decide
//! when to run them.

#![warn(missing_docs)]

pub mod decode_lane;
pub mod file_lane;
pub mod pack_lane;
pub mod resolve_lane;
