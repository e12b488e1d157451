//! Embedded builtin declarations.
//!
//! The declaration text is a GLSL-like file where every builtin constant, variable, interface block and function
//! prototype is listed once, gated by `#if` predicates over the `__GLSLD_*` macros. Building the table of an
//! [`Environment`] runs the whole pipeline: directive evaluation, declaration parsing and symbol table construction.

use crate::{
  directive,
  env::Environment,
  error::BuildError,
  parser::DeclParser,
  table::SymbolTable,
};
use std::time::Instant;
use tracing::{debug, debug_span};

pub use crate::env::build_environment;

/// Builtin declaration text shipped with the crate.
pub const SOURCE: &str = include_str!("stdlib.glsl");

/// Build the builtin symbol table of `env` from the embedded declarations.
pub fn build_table(env: &Environment) -> Result<SymbolTable, BuildError> {
  build_table_from_source(SOURCE, env)
}

/// Build the builtin symbol table of `env` from custom declaration text.
///
/// Only the fragments active under `env` are parsed, so integer constants declared in inactive fragments never size
/// the arrays of active ones.
pub fn build_table_from_source(source: &str, env: &Environment) -> Result<SymbolTable, BuildError> {
  let span = debug_span!("build_table", env = %env);
  let _guard = span.enter();
  let start = Instant::now();

  let fragments = directive::evaluate(source, env)?;
  debug!(fragments = fragments.len(), "evaluated directives");

  let mut parser = DeclParser::new();
  let mut declarations = Vec::new();
  for fragment in &fragments {
    declarations.extend(parser.parse(fragment)?);
  }
  debug!(declarations = declarations.len(), "parsed declarations");

  let table = SymbolTable::build(*env, declarations)?;
  debug!(
    symbols = table.len(),
    elapsed_ms = start.elapsed().as_millis() as u64,
    "built symbol table"
  );

  Ok(table)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    env::{Feature, FeatureSet},
    stage::{ShaderStage, TargetApi},
    table::TableError,
  };

  #[test]
  fn every_environment_builds() {
    for api in TargetApi::ALL {
      for stage in ShaderStage::ALL {
        for features in [FeatureSet::empty(), FeatureSet::all()] {
          let env = Environment::new(api, stage, features);
          let table = build_table(&env);
          assert!(table.is_ok(), "{env}: {:?}", table.err());
        }
      }
    }
  }

  #[test]
  fn custom_source() {
    let source = "\
const int n = 4;
#if __GLSLD_SHADER_STAGE_VERTEX
in float weights[n];
#endif
float weight(int i);
";
    let env = build_environment(TargetApi::OpenGl, ShaderStage::Vertex, []);
    let table = build_table_from_source(source, &env).unwrap();
    assert_eq!(table.len(), 3);
    assert!(table.lookup_variable("weights").is_some());

    let env = build_environment(TargetApi::OpenGl, ShaderStage::Fragment, []);
    let table = build_table_from_source(source, &env).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.lookup_variable("weights").is_none());
  }

  #[test]
  fn inactive_constants_do_not_leak() {
    let source = "\
#if __GLSLD_TARGET_API_VULKAN
const int n = 2;
#else
const int n = 3;
#endif
in float xs[n];
";
    let env = build_environment(TargetApi::Vulkan, ShaderStage::Vertex, []);
    let table = build_table_from_source(source, &env).unwrap();
    let xs = table.lookup_variable("xs").unwrap();
    assert_eq!(xs.ty().to_string(), "float[2]");
  }

  #[test]
  fn errors() {
    let env = build_environment(TargetApi::OpenGl, ShaderStage::Vertex, [Feature::Int64Type]);

    let err = build_table_from_source("#if __GLSLD_SHADER_STAGE_VERTEX\nint x;\n", &env).unwrap_err();
    assert!(matches!(err, BuildError::Directive(_)));

    let err = build_table_from_source("in int x = 3;\n", &env).unwrap_err();
    assert!(matches!(err, BuildError::Parse(_)));

    let err = build_table_from_source("const int x = 1;\nconst int x = 2;\n", &env).unwrap_err();
    assert!(matches!(
      err,
      BuildError::Table(TableError::ConflictingDefinition { .. })
    ));
  }
}
