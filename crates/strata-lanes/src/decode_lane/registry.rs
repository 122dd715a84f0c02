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

use std::collections::HashMap;
use std::error::Error;
use std::marker::PhantomData;
use std::sync::Arc;

use strata_core::resource::{RawBytes, Resource, ResourceRef};
use strata_core::{ResourceError, ResourceResult};

use super::ResourceDecoder;

/// Type-erased decoder so decoders of different resource types share one map.
trait AnyDecoder: Send + Sync {
    fn decode_any(&self, bytes: &[u8]) -> Result<ResourceRef, Box<dyn Error + Send + Sync>>;
}

struct DecoderWrapper<A: Resource, D: ResourceDecoder<A>>(D, PhantomData<A>);

impl<A, D> AnyDecoder for DecoderWrapper<A, D>
where
    A: Resource,
    D: ResourceDecoder<A> + Send + Sync,
{
    fn decode_any(&self, bytes: &[u8]) -> Result<ResourceRef, Box<dyn Error + Send + Sync>> {
        let resource: ResourceRef = Arc::new(self.0.decode(bytes)?);
        Ok(resource)
    }
}

/// Maps type names (file extensions, pack entry types) to decoders.
///
/// Type names without a registered decoder decode to [`RawBytes`], so loaders
/// can always hand back something for data nobody taught them to parse.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: HashMap<String, Box<dyn AnyDecoder>>,
}

impl DecoderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `decoder` for `type_name`, replacing any previous one.
    pub fn register<A: Resource>(
        &mut self,
        type_name: &str,
        decoder: impl ResourceDecoder<A> + Send + Sync + 'static,
    ) {
        let wrapped = DecoderWrapper(decoder, PhantomData);
        if self
            .decoders
            .insert(type_name.to_string(), Box::new(wrapped))
            .is_some()
        {
            log::warn!("DecoderRegistry: Replaced decoder for type '{type_name}'");
        }
    }

    /// Returns `true` if a decoder is registered for `type_name`.
    pub fn contains(&self, type_name: &str) -> bool {
        self.decoders.contains_key(type_name)
    }

    /// Decodes `bytes` with the decoder registered for `type_name`.
    ///
    /// # Errors
    /// Returns [`ResourceError::Backend`] when the decoder rejects the data.
    pub fn decode(&self, type_name: &str, bytes: Vec<u8>) -> ResourceResult<ResourceRef> {
        let Some(decoder) = self.decoders.get(type_name) else {
            log::trace!("DecoderRegistry: No decoder for '{type_name}', keeping raw bytes");
            return Ok(Arc::new(RawBytes(bytes)));
        };
        decoder.decode_any(&bytes).map_err(|error| {
            ResourceError::Backend(format!("Failed to decode '{type_name}' data: {error}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::resource::ResourceHandle;

    #[derive(Debug, PartialEq)]
    struct Text(String);
    impl Resource for Text {}

    struct TextDecoder;

    impl ResourceDecoder<Text> for TextDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<Text, Box<dyn Error + Send + Sync>> {
            Ok(Text(String::from_utf8(bytes.to_vec())?))
        }
    }

    #[test]
    fn test_registered_decoder_produces_typed_resource() {
        let mut registry = DecoderRegistry::new();
        registry.register("txt", TextDecoder);

        let resource = registry.decode("txt", b"hero".to_vec()).unwrap();
        let text = ResourceHandle::<Text>::from_ref(resource).unwrap();
        assert_eq!(text.0, "hero");
    }

    #[test]
    fn test_unknown_type_falls_back_to_raw_bytes() {
        let registry = DecoderRegistry::new();
        let resource = registry.decode("bin", vec![1, 2, 3]).unwrap();
        let raw = ResourceHandle::<RawBytes>::from_ref(resource).unwrap();
        assert_eq!(raw.0, vec![1, 2, 3]);
    }

    #[test]
    fn test_decoder_failure_is_a_backend_error() {
        let mut registry = DecoderRegistry::new();
        registry.register("txt", TextDecoder);
        let result = registry.decode("txt", vec![0xff, 0xfe]);
        assert!(matches!(result, Err(ResourceError::Backend(_))));
    }

    #[test]
    fn test_closures_are_decoders() {
        let mut registry = DecoderRegistry::new();
        registry.register("len", |bytes: &[u8]| -> Result<Text, Box<dyn Error + Send + Sync>> {
            Ok(Text(bytes.len().to_string()))
        });
        assert!(registry.contains("len"));
        let resource = registry.decode("len", vec![0; 4]).unwrap();
        assert_eq!(ResourceHandle::<Text>::from_ref(resource).unwrap().0, "4");
    }
}
