//! Host configuration.
//!
//! Both structures deserialize from camelCase keys and fill missing fields with their defaults, so a host can embed
//! them in its own settings file.

use crate::env::Environment;
use serde::{Deserialize, Serialize};

/// Builtin table cache configuration.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
  /// Maximum number of tables kept alive; `0` means unbounded.
  pub capacity: usize,
}

impl CacheConfig {
  pub const DEFAULT_CAPACITY: usize = 16;

  pub fn unbounded() -> Self {
    CacheConfig { capacity: 0 }
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    CacheConfig {
      capacity: Self::DEFAULT_CAPACITY,
    }
  }
}

/// Configuration of the builtin environment service.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuiltinConfig {
  pub cache: CacheConfig,

  /// Environment to assume when the host cannot infer one from the shader.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub environment: Option<Environment>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    env::{Feature, FeatureSet},
    stage::{ShaderStage, TargetApi},
  };

  #[test]
  fn defaults() {
    let config: BuiltinConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, BuiltinConfig::default());
    assert_eq!(config.cache.capacity, 16);
    assert_eq!(config.environment, None);
  }

  #[test]
  fn environment() {
    let config: BuiltinConfig = serde_json::from_str(
      r#"{
        "cache": { "capacity": 4 },
        "environment": { "api": "vulkan", "stage": "fragment", "features": ["float16Type"] }
      }"#,
    )
    .unwrap();

    assert_eq!(config.cache, CacheConfig { capacity: 4 });
    assert_eq!(
      config.environment,
      Some(Environment::new(
        TargetApi::Vulkan,
        ShaderStage::Fragment,
        FeatureSet::empty().with(Feature::Float16Type)
      ))
    );
  }

  #[test]
  fn missing_features() {
    let env: Environment = serde_json::from_str(r#"{ "api": "opengl", "stage": "tessControl" }"#).unwrap();
    assert_eq!(env.stage, ShaderStage::TessControl);
    assert!(env.features.is_empty());
  }

  #[test]
  fn serialize() {
    let config = BuiltinConfig {
      cache: CacheConfig::unbounded(),
      environment: None,
    };
    assert_eq!(serde_json::to_string(&config).unwrap(), r#"{"cache":{"capacity":0}}"#);
  }
}
