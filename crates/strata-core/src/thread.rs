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

//! Owning-thread affinity for the resource system's public entry points.

use crate::error::{ResourceError, ResourceResult};
use std::thread::{self, ThreadId};

/// The execution context that owns a component's tables.
///
/// Captured when a component is constructed. Cache and bundle tables are only
/// ever mutated from this thread; backend I/O may run elsewhere but its
/// results are awaited back here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerThread(ThreadId);

impl OwnerThread {
    /// Captures the calling thread as the owner.
    pub fn current() -> Self {
        Self(thread::current().id())
    }

    /// Returns `true` if the calling thread is the owner.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.0
    }

    /// Fails with [`ResourceError::WrongThread`] unless called from the owner.
    pub fn check(&self, operation: &'static str) -> ResourceResult<()> {
        if self.is_current() {
            Ok(())
        } else {
            log::error!("{operation} called from {:?}, owner is {:?}", thread::current().id(), self.0);
            Err(ResourceError::WrongThread { operation })
        }
    }
}
