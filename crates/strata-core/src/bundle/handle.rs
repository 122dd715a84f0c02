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

use std::any::Any;
use std::fmt;
use std::sync::Arc;

struct BundleHandleInner {
    name: String,
    payload: Box<dyn Any + Send + Sync>,
}

/// An opaque handle to an opened bundle.
///
/// Cloning is cheap. Two handles are the same handle if they share the same
/// allocation; the bundle manager locates contexts by that identity, never
/// by name. The payload is whatever the storage backend needs to read from
/// the bundle (an open archive, a mapped file, ...).
#[derive(Clone)]
pub struct BundleHandle(Arc<BundleHandleInner>);

impl BundleHandle {
    /// Wraps a backend payload for the named bundle.
    pub fn new(name: impl Into<String>, payload: impl Any + Send + Sync) -> Self {
        Self(Arc::new(BundleHandleInner {
            name: name.into(),
            payload: Box::new(payload),
        }))
    }

    /// The name of the bundle this handle was opened for.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Borrows the backend payload as a `T`, if it is one.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.0.payload.downcast_ref::<T>()
    }

    /// Returns `true` if both handles refer to the same open.
    pub fn ptr_eq(&self, other: &BundleHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for BundleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleHandle")
            .field("name", &self.0.name)
            .field("ptr", &Arc::as_ptr(&self.0))
            .finish()
    }
}
