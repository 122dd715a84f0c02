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

use super::{Resource, ResourceRef, WeakResourceRef};
use std::{
    ops::Deref,
    sync::{Arc, Weak},
};

/// A thread-safe, reference-counted handle to a loaded resource.
///
/// This acts as a smart pointer, providing shared ownership of a resource's data.
/// Cloning a handle is cheap, as it only increments the reference count
/// and does not duplicate the underlying data.
///
/// The cache only ever keeps a weak reference; the resource is deallocated
/// when the last handle (and the runtime's retention, if any) is dropped.
#[derive(Debug)]
pub struct ResourceHandle<T: Resource>(Arc<T>);

impl<T: Resource> ResourceHandle<T> {
    /// Creates a new `ResourceHandle` that takes ownership of the resource data.
    pub fn new(resource: T) -> Self {
        Self(Arc::new(resource))
    }

    /// Recovers a typed handle from a type-erased reference.
    ///
    /// Returns `None` if the resource is not a `T`.
    pub fn from_ref(resource: ResourceRef) -> Option<Self> {
        resource.downcast::<T>().ok().map(Self)
    }

    /// Erases the handle's type, sharing the same allocation.
    pub fn to_ref(&self) -> ResourceRef {
        self.0.clone()
    }

    /// Creates a non-owning reference to the same resource.
    pub fn downgrade(&self) -> WeakResourceRef {
        let weak: Weak<T> = Arc::downgrade(&self.0);
        weak
    }

    /// Returns `true` if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Resource> Clone for ResourceHandle<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Resource> Deref for ResourceHandle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Returns `true` if two type-erased references point at the same allocation.
pub fn same_resource(a: &ResourceRef, b: &ResourceRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Mesh(u32);
    impl Resource for Mesh {}

    #[test]
    fn test_handle_round_trips_through_erased_ref() {
        let handle = ResourceHandle::new(Mesh(7));
        let erased = handle.to_ref();
        let back = ResourceHandle::<Mesh>::from_ref(erased).unwrap();
        assert!(back.ptr_eq(&handle));
        assert_eq!(*back, Mesh(7));
    }

    #[test]
    fn test_from_ref_rejects_other_types() {
        let erased: ResourceRef = Arc::new(super::super::RawBytes(vec![1, 2]));
        assert!(ResourceHandle::<Mesh>::from_ref(erased).is_none());
    }

    #[test]
    fn test_downgrade_dies_with_last_handle() {
        let handle = ResourceHandle::new(Mesh(1));
        let weak = handle.downgrade();
        assert!(weak.upgrade().is_some());
        drop(handle);
        assert!(weak.upgrade().is_none());
    }
}
