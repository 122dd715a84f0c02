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

//! Runtime configuration of the resource system.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ResourceError, ResourceResult};

/// Tunables shared by the resource agent and its collaborators.
///
/// Usually authored as RON next to the game data:
///
/// ```
/// use strata_core::ResourceConfig;
///
/// let config = ResourceConfig::from_ron_str("(scheme: \"asset\", retain_loaded: false)").unwrap();
/// assert_eq!(config.scheme, "asset");
/// assert!(config.dedup_in_flight_loads);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// The only scheme accepted in resource keys (`res` for `res://...`).
    pub scheme: String,
    /// Join concurrent loads of the same uncached key into one backend call.
    pub dedup_in_flight_loads: bool,
    /// Hand freshly loaded resources to the runtime, which then owns them.
    pub retain_loaded: bool,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            scheme: "res".to_string(),
            dedup_in_flight_loads: true,
            retain_loaded: true,
        }
    }
}

impl ResourceConfig {
    /// Parses a configuration from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> ResourceResult<Self> {
        ron::from_str(text).map_err(|e| ResourceError::InvalidArgument(e.to_string()))
    }

    /// Reads and parses a RON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> ResourceResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ResourceError::Backend(format!("Failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_ron_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ResourceConfig::from_ron_str("()").unwrap();
        assert_eq!(config, ResourceConfig::default());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = ResourceConfig::from_ron_str("(scheme: 42)");
        assert!(matches!(result, Err(ResourceError::InvalidArgument(_))));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resources.ron");
        std::fs::write(&path, "(dedup_in_flight_loads: false)").unwrap();

        let config = ResourceConfig::from_file(&path).unwrap();
        assert!(!config.dedup_in_flight_loads);
        assert_eq!(config.scheme, "res");
    }
}
