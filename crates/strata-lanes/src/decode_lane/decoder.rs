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

use std::error::Error;
use strata_core::resource::Resource;

/// A trait for types that can decode one kind of resource from a byte slice.
///
/// This is the CPU side of loading: implementors parse raw file data into an
/// engine-ready resource. Where the bytes come from (a loose file, a pack
/// container) is the loader's business.
pub trait ResourceDecoder<A: Resource> {
    /// Parses `bytes` into an instance of `A`.
    fn decode(&self, bytes: &[u8]) -> Result<A, Box<dyn Error + Send + Sync>>;
}

/// Any matching closure is a decoder.
impl<A, F> ResourceDecoder<A> for F
where
    A: Resource,
    F: Fn(&[u8]) -> Result<A, Box<dyn Error + Send + Sync>>,
{
    fn decode(&self, bytes: &[u8]) -> Result<A, Box<dyn Error + Send + Sync>> {
        self(bytes)
    }
}
