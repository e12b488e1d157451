//! Shader stages and target APIs.
//!
//! Both are leaves of the [`Environment`](crate::env::Environment) a builtin table is built for. Each variant maps to
//! exactly one predicate macro of the builtin declaration text, e.g. `__GLSLD_SHADER_STAGE_FRAGMENT`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Graphics API the analyzed shader targets.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetApi {
  /// OpenGL (and OpenGL ES) flavored GLSL.
  #[default]
  OpenGl,

  /// Vulkan flavored GLSL.
  Vulkan,
}

impl TargetApi {
  /// Every target API, in declaration order.
  pub const ALL: [TargetApi; 2] = [TargetApi::OpenGl, TargetApi::Vulkan];

  /// Name of the predicate macro set when this API is targeted.
  pub fn macro_name(self) -> &'static str {
    match self {
      TargetApi::OpenGl => "__GLSLD_TARGET_API_OPENGL",
      TargetApi::Vulkan => "__GLSLD_TARGET_API_VULKAN",
    }
  }

  pub fn from_macro(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|api| api.macro_name() == name)
  }
}

impl fmt::Display for TargetApi {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      TargetApi::OpenGl => f.write_str("OpenGL"),
      TargetApi::Vulkan => f.write_str("Vulkan"),
    }
  }
}

/// Shader stage.
///
/// Stages are mutually exclusive: an environment always sits in exactly one of them, which is what makes two builtin
/// definitions guarded by different stages safe to coexist (e.g. `gl_PrimitiveID` is `flat in` in fragment shaders
/// but `out` in geometry shaders).
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShaderStage {
  #[default]
  Vertex,
  Fragment,
  Compute,
  Geometry,
  TessControl,
  TessEval,
  RayGen,
  AnyHit,
  ClosestHit,
  Intersect,
  Miss,
  Callable,
  Task,
  Mesh,
}

impl ShaderStage {
  /// Every shader stage, in declaration order.
  pub const ALL: [ShaderStage; 14] = [
    ShaderStage::Vertex,
    ShaderStage::Fragment,
    ShaderStage::Compute,
    ShaderStage::Geometry,
    ShaderStage::TessControl,
    ShaderStage::TessEval,
    ShaderStage::RayGen,
    ShaderStage::AnyHit,
    ShaderStage::ClosestHit,
    ShaderStage::Intersect,
    ShaderStage::Miss,
    ShaderStage::Callable,
    ShaderStage::Task,
    ShaderStage::Mesh,
  ];

  /// Name of the predicate macro set when analyzing this stage.
  pub fn macro_name(self) -> &'static str {
    match self {
      ShaderStage::Vertex => "__GLSLD_SHADER_STAGE_VERTEX",
      ShaderStage::Fragment => "__GLSLD_SHADER_STAGE_FRAGMENT",
      ShaderStage::Compute => "__GLSLD_SHADER_STAGE_COMPUTE",
      ShaderStage::Geometry => "__GLSLD_SHADER_STAGE_GEOMETRY",
      ShaderStage::TessControl => "__GLSLD_SHADER_STAGE_TESS_CTRL",
      ShaderStage::TessEval => "__GLSLD_SHADER_STAGE_TESS_EVAL",
      ShaderStage::RayGen => "__GLSLD_SHADER_STAGE_RAY_GEN",
      ShaderStage::AnyHit => "__GLSLD_SHADER_STAGE_ANY_HIT",
      ShaderStage::ClosestHit => "__GLSLD_SHADER_STAGE_CLOSEST_HIT",
      ShaderStage::Intersect => "__GLSLD_SHADER_STAGE_RAY_INTERSECT",
      ShaderStage::Miss => "__GLSLD_SHADER_STAGE_RAY_MISS",
      ShaderStage::Callable => "__GLSLD_SHADER_STAGE_RAY_CALLABLE",
      ShaderStage::Task => "__GLSLD_SHADER_STAGE_TASK",
      ShaderStage::Mesh => "__GLSLD_SHADER_STAGE_MESH",
    }
  }

  pub fn from_macro(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|stage| stage.macro_name() == name)
  }

  /// Whether this stage belongs to the ray tracing pipeline.
  pub fn is_ray_tracing(self) -> bool {
    matches!(
      self,
      ShaderStage::RayGen
        | ShaderStage::AnyHit
        | ShaderStage::ClosestHit
        | ShaderStage::Intersect
        | ShaderStage::Miss
        | ShaderStage::Callable
    )
  }
}

impl fmt::Display for ShaderStage {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let name = match self {
      ShaderStage::Vertex => "vertex",
      ShaderStage::Fragment => "fragment",
      ShaderStage::Compute => "compute",
      ShaderStage::Geometry => "geometry",
      ShaderStage::TessControl => "tessellation control",
      ShaderStage::TessEval => "tessellation evaluation",
      ShaderStage::RayGen => "ray generation",
      ShaderStage::AnyHit => "any hit",
      ShaderStage::ClosestHit => "closest hit",
      ShaderStage::Intersect => "intersection",
      ShaderStage::Miss => "miss",
      ShaderStage::Callable => "callable",
      ShaderStage::Task => "task",
      ShaderStage::Mesh => "mesh",
    };

    f.write_str(name)
  }
}
