//! Analysis environments.
//!
//! An [`Environment`] is the immutable context a builtin symbol table is built for: the target API, the shader stage
//! and the set of enabled optional features. Two environments with the same flags are equal and hash the same, which
//! is what the table cache keys on.

use crate::stage::{ShaderStage, TargetApi};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optional language feature (usually an extension) gating part of the builtin declarations.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
  Float16Type,
  Int8Type,
  Int16Type,
  Int64Type,
  Uint8Type,
  Uint16Type,
  Uint64Type,
  RayTracingExt,
  RayTracingNv,
  RayQuery,
  MemoryScopeSemantics,
  ShaderSmBuiltinNv,
}

impl Feature {
  /// Every feature, in declaration order.
  pub const ALL: [Feature; 12] = [
    Feature::Float16Type,
    Feature::Int8Type,
    Feature::Int16Type,
    Feature::Int64Type,
    Feature::Uint8Type,
    Feature::Uint16Type,
    Feature::Uint64Type,
    Feature::RayTracingExt,
    Feature::RayTracingNv,
    Feature::RayQuery,
    Feature::MemoryScopeSemantics,
    Feature::ShaderSmBuiltinNv,
  ];

  /// Name of the predicate macro set when this feature is enabled.
  pub fn macro_name(self) -> &'static str {
    match self {
      Feature::Float16Type => "__GLSLD_FEATURE_ENABLE_FLOAT16_TYPE",
      Feature::Int8Type => "__GLSLD_FEATURE_ENABLE_INT8_TYPE",
      Feature::Int16Type => "__GLSLD_FEATURE_ENABLE_INT16_TYPE",
      Feature::Int64Type => "__GLSLD_FEATURE_ENABLE_INT64_TYPE",
      Feature::Uint8Type => "__GLSLD_FEATURE_ENABLE_UINT8_TYPE",
      Feature::Uint16Type => "__GLSLD_FEATURE_ENABLE_UINT16_TYPE",
      Feature::Uint64Type => "__GLSLD_FEATURE_ENABLE_UINT64_TYPE",
      Feature::RayTracingExt => "__GLSLD_FEATURE_ENABLE_RAY_TRACING_EXT",
      Feature::RayTracingNv => "__GLSLD_FEATURE_ENABLE_RAY_TRACING_NV",
      Feature::RayQuery => "__GLSLD_FEATURE_ENABLE_RAY_QUERY",
      Feature::MemoryScopeSemantics => "__GLSLD_FEATURE_ENABLE_MEMORY_SCOPE_SEMANTICS",
      Feature::ShaderSmBuiltinNv => "__GLSLD_FEATURE_ENABLE_SHADER_SM_BUILTIN_NV",
    }
  }

  pub fn from_macro(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|feature| feature.macro_name() == name)
  }

  /// The set holding only this feature.
  pub fn flag(self) -> FeatureSet {
    match self {
      Feature::Float16Type => FeatureSet::FLOAT16_TYPE,
      Feature::Int8Type => FeatureSet::INT8_TYPE,
      Feature::Int16Type => FeatureSet::INT16_TYPE,
      Feature::Int64Type => FeatureSet::INT64_TYPE,
      Feature::Uint8Type => FeatureSet::UINT8_TYPE,
      Feature::Uint16Type => FeatureSet::UINT16_TYPE,
      Feature::Uint64Type => FeatureSet::UINT64_TYPE,
      Feature::RayTracingExt => FeatureSet::RAY_TRACING_EXT,
      Feature::RayTracingNv => FeatureSet::RAY_TRACING_NV,
      Feature::RayQuery => FeatureSet::RAY_QUERY,
      Feature::MemoryScopeSemantics => FeatureSet::MEMORY_SCOPE_SEMANTICS,
      Feature::ShaderSmBuiltinNv => FeatureSet::SHADER_SM_BUILTIN_NV,
    }
  }
}

bitflags! {
  /// Set of enabled [`Feature`]s.
  ///
  /// Serialized as a list of feature names.
  #[derive(Clone, Copy, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
  #[serde(from = "Vec<Feature>", into = "Vec<Feature>")]
  pub struct FeatureSet: u16 {
    const FLOAT16_TYPE = 1 << 0;
    const INT8_TYPE = 1 << 1;
    const INT16_TYPE = 1 << 2;
    const INT64_TYPE = 1 << 3;
    const UINT8_TYPE = 1 << 4;
    const UINT16_TYPE = 1 << 5;
    const UINT64_TYPE = 1 << 6;
    const RAY_TRACING_EXT = 1 << 7;
    const RAY_TRACING_NV = 1 << 8;
    const RAY_QUERY = 1 << 9;
    const MEMORY_SCOPE_SEMANTICS = 1 << 10;
    const SHADER_SM_BUILTIN_NV = 1 << 11;
  }
}

impl FeatureSet {
  /// Return a copy of this set with `feature` enabled.
  pub fn with(self, feature: Feature) -> Self {
    self.union(feature.flag())
  }

  /// Return a copy of this set with `feature` disabled.
  pub fn without(self, feature: Feature) -> Self {
    self.difference(feature.flag())
  }

  pub fn len(self) -> usize {
    self.bits().count_ones() as usize
  }

  /// Iterate over the enabled features, in declaration order.
  pub fn features(self) -> impl Iterator<Item = Feature> {
    Feature::ALL.into_iter().filter(move |feature| self.contains(feature.flag()))
  }
}

impl From<Feature> for FeatureSet {
  fn from(feature: Feature) -> Self {
    feature.flag()
  }
}

impl FromIterator<Feature> for FeatureSet {
  fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = Feature>,
  {
    iter.into_iter().map(Feature::flag).collect()
  }
}

impl From<Vec<Feature>> for FeatureSet {
  fn from(features: Vec<Feature>) -> Self {
    features.into_iter().collect()
  }
}

impl From<FeatureSet> for Vec<Feature> {
  fn from(set: FeatureSet) -> Self {
    set.features().collect()
  }
}

impl fmt::Debug for FeatureSet {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_set().entries(self.features()).finish()
  }
}

/// A single boolean flag of an [`Environment`].
///
/// Flags are the leaves of [`Predicate`](crate::predicate::Predicate)s.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Flag {
  Api(TargetApi),
  Stage(ShaderStage),
  Feature(Feature),
}

impl Flag {
  /// Look up the flag a predicate macro name designates.
  pub fn from_macro(name: &str) -> Option<Self> {
    TargetApi::from_macro(name)
      .map(Flag::Api)
      .or_else(|| ShaderStage::from_macro(name).map(Flag::Stage))
      .or_else(|| Feature::from_macro(name).map(Flag::Feature))
  }

  pub fn macro_name(self) -> &'static str {
    match self {
      Flag::Api(api) => api.macro_name(),
      Flag::Stage(stage) => stage.macro_name(),
      Flag::Feature(feature) => feature.macro_name(),
    }
  }
}

impl fmt::Display for Flag {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.macro_name())
  }
}

/// Analysis environment.
///
/// Immutable once built; see [`build_environment`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
  pub api: TargetApi,
  pub stage: ShaderStage,
  #[serde(default)]
  pub features: FeatureSet,
}

impl Environment {
  pub fn new(api: TargetApi, stage: ShaderStage, features: FeatureSet) -> Self {
    Environment {
      api,
      stage,
      features,
    }
  }

  /// Whether `flag` is set in this environment.
  pub fn is_set(&self, flag: Flag) -> bool {
    match flag {
      Flag::Api(api) => self.api == api,
      Flag::Stage(stage) => self.stage == stage,
      Flag::Feature(feature) => self.features.contains(feature.flag()),
    }
  }

  /// Return a copy of this environment with `feature` enabled.
  pub fn with_feature(self, feature: Feature) -> Self {
    Environment {
      features: self.features.with(feature),
      ..self
    }
  }

  /// Return a copy of this environment with `feature` disabled.
  pub fn without_feature(self, feature: Feature) -> Self {
    Environment {
      features: self.features.without(feature),
      ..self
    }
  }
}

impl fmt::Display for Environment {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{} {} shader", self.api, self.stage)?;

    if !self.features.is_empty() {
      f.write_str(" with ")?;
      f.debug_list().entries(self.features.features()).finish()?;
    }

    Ok(())
  }
}

/// Build an [`Environment`] from its parts.
pub fn build_environment(
  api: TargetApi,
  stage: ShaderStage,
  features: impl IntoIterator<Item = Feature>,
) -> Environment {
  Environment::new(api, stage, features.into_iter().collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn feature_set() {
    let mut set = FeatureSet::empty();
    assert!(set.is_empty());

    set.insert(Feature::Float16Type.into());
    set.insert(FeatureSet::RAY_QUERY);
    set.insert(Feature::Float16Type.into());

    assert_eq!(set.len(), 2);
    assert!(set.contains(FeatureSet::RAY_QUERY));
    assert!(!set.contains(Feature::Int8Type.flag()));
    assert_eq!(
      set.features().collect::<Vec<_>>(),
      vec![Feature::Float16Type, Feature::RayQuery]
    );
    assert_eq!(format!("{set:?}"), "{Float16Type, RayQuery}");

    set.remove(FeatureSet::FLOAT16_TYPE);
    assert_eq!(set, FeatureSet::empty().with(Feature::RayQuery));
    assert_eq!(set.without(Feature::RayQuery), FeatureSet::empty());
  }

  #[test]
  fn every_feature_has_its_own_flag() {
    let all: FeatureSet = Feature::ALL.into_iter().collect();
    assert_eq!(all, FeatureSet::all());
    assert_eq!(all.len(), Feature::ALL.len());
    assert!(all.features().eq(Feature::ALL));

    for feature in Feature::ALL {
      assert_eq!(feature.flag().len(), 1);
      assert_eq!(FeatureSet::from(feature).features().collect::<Vec<_>>(), vec![feature]);
    }
  }

  #[test]
  fn flags_from_macros() {
    assert_eq!(
      Flag::from_macro("__GLSLD_TARGET_API_VULKAN"),
      Some(Flag::Api(TargetApi::Vulkan))
    );
    assert_eq!(
      Flag::from_macro("__GLSLD_SHADER_STAGE_TESS_CTRL"),
      Some(Flag::Stage(ShaderStage::TessControl))
    );
    assert_eq!(
      Flag::from_macro("__GLSLD_FEATURE_ENABLE_INT64_TYPE"),
      Some(Flag::Feature(Feature::Int64Type))
    );
    assert_eq!(Flag::from_macro("__GLSLD_FEATURE_ENABLE_QUANTUM"), None);

    for feature in Feature::ALL {
      assert_eq!(Feature::from_macro(feature.macro_name()), Some(feature));
    }
  }

  #[test]
  fn environment_flags() {
    let env = build_environment(
      TargetApi::Vulkan,
      ShaderStage::Fragment,
      [Feature::Float16Type],
    );

    assert!(env.is_set(Flag::Api(TargetApi::Vulkan)));
    assert!(!env.is_set(Flag::Api(TargetApi::OpenGl)));
    assert!(env.is_set(Flag::Stage(ShaderStage::Fragment)));
    assert!(env.is_set(Flag::Feature(Feature::Float16Type)));
    assert!(!env.without_feature(Feature::Float16Type).is_set(Flag::Feature(Feature::Float16Type)));
  }

  #[test]
  fn environment_identity() {
    let a = build_environment(
      TargetApi::OpenGl,
      ShaderStage::Compute,
      [Feature::Int8Type, Feature::Int16Type],
    );
    let b = build_environment(
      TargetApi::OpenGl,
      ShaderStage::Compute,
      [Feature::Int16Type, Feature::Int8Type],
    );

    assert_eq!(a, b);
    assert_ne!(a, b.with_feature(Feature::Int64Type));
  }
}
