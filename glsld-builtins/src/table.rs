//! Builtin symbol table.
//!
//! A [`SymbolTable`] aggregates parsed [`Declaration`]s by name and is bound to the [`Environment`] it was built
//! for. Every definition keeps its governing predicate, and every query only ever sees the definitions whose
//! predicate holds in that environment.

use crate::{
  env::Environment,
  parser::{Declaration, DeclarationKind},
  predicate::Predicate,
  resolve::{self, ResolveError},
  symbol::{Constant, Signature, Variable},
  types::{StructType, Type},
  value::ConstValue,
};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Kind of symbol a name is bound to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SymbolKind {
  Constant,
  Variable,
  Struct,
  Function,
}

impl fmt::Display for SymbolKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let kind = match self {
      SymbolKind::Constant => "constant",
      SymbolKind::Variable => "variable",
      SymbolKind::Struct => "block",
      SymbolKind::Function => "function",
    };

    f.write_str(kind)
  }
}

/// Inconsistency in the builtin declarations.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TableError {
  #[error("line {line}: `{name}` conflicts with a previous definition visible in the same environment")]
  ConflictingDefinition { name: String, line: usize },

  #[error("line {line}: `{name}` is declared as a {found} but was previously declared as a {expected}")]
  KindMismatch {
    name: String,
    line: usize,
    expected: SymbolKind,
    found: SymbolKind,
  },

  #[error("line {line}: `{signature}` has the same parameters as a signature visible in the same environment")]
  AmbiguousSignature {
    name: String,
    signature: String,
    line: usize,
  },
}

// A definition and the predicate under which it exists.
#[derive(Clone, Debug, PartialEq)]
struct Guarded<T> {
  predicate: Arc<Predicate>,
  value: T,
}

#[derive(Clone, Debug, PartialEq)]
enum Entry {
  Constant(Vec<Guarded<Constant>>),
  Variable(Vec<Guarded<Variable>>),
  Struct(Vec<Guarded<Arc<StructType>>>),
  // signatures carry their own predicate
  Function(Vec<Signature>),
}

impl Entry {
  fn kind(&self) -> SymbolKind {
    match self {
      Entry::Constant(_) => SymbolKind::Constant,
      Entry::Variable(_) => SymbolKind::Variable,
      Entry::Struct(_) => SymbolKind::Struct,
      Entry::Function(_) => SymbolKind::Function,
    }
  }
}

/// Borrowed view of a visible symbol.
#[derive(Clone, Debug, PartialEq)]
pub enum SymbolRef<'a> {
  Constant(&'a Constant),
  Variable(&'a Variable),
  Struct(&'a Arc<StructType>),
  /// Visible overloads of a function, in declaration order.
  Function { name: &'a str, overloads: Vec<&'a Signature> },
}

impl<'a> SymbolRef<'a> {
  pub fn name(&self) -> &'a str {
    match self {
      SymbolRef::Constant(c) => &c.name,
      SymbolRef::Variable(v) => &v.name,
      SymbolRef::Struct(s) => &s.name,
      SymbolRef::Function { name, .. } => *name,
    }
  }

  pub fn kind(&self) -> SymbolKind {
    match self {
      SymbolRef::Constant(_) => SymbolKind::Constant,
      SymbolRef::Variable(_) => SymbolKind::Variable,
      SymbolRef::Struct(_) => SymbolKind::Struct,
      SymbolRef::Function { .. } => SymbolKind::Function,
    }
  }
}

/// Anything usable as a variable in an expression: a variable or a constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VariableRef<'a> {
  Constant {
    constant: &'a Constant,
    predicate: &'a Predicate,
  },
  Variable {
    variable: &'a Variable,
    predicate: &'a Predicate,
  },
}

impl<'a> VariableRef<'a> {
  pub fn name(&self) -> &'a str {
    match *self {
      VariableRef::Constant { constant, .. } => &constant.name,
      VariableRef::Variable { variable, .. } => &variable.name,
    }
  }

  pub fn ty(&self) -> &'a Type {
    match *self {
      VariableRef::Constant { constant, .. } => &constant.ty,
      VariableRef::Variable { variable, .. } => &variable.ty,
    }
  }

  /// Governing predicate of the definition.
  pub fn predicate(&self) -> &'a Predicate {
    match *self {
      VariableRef::Constant { predicate, .. } | VariableRef::Variable { predicate, .. } => predicate,
    }
  }

  /// Compile-time value, for constants.
  pub fn value(&self) -> Option<&'a ConstValue> {
    match *self {
      VariableRef::Constant { constant, .. } => Some(&constant.value),
      VariableRef::Variable { .. } => None,
    }
  }

  pub fn is_constant(&self) -> bool {
    matches!(self, VariableRef::Constant { .. })
  }
}

/// Builtin symbols of an environment.
///
/// Built once with [`SymbolTable::build`], immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolTable {
  env: Environment,
  symbols: IndexMap<String, Entry>,
}

impl SymbolTable {
  /// Aggregate `declarations` into a table bound to `env`.
  ///
  /// Declarations whose predicate does not hold in `env` are checked for consistency like the others, but never
  /// returned by queries.
  pub fn build(env: Environment, declarations: impl IntoIterator<Item = Declaration>) -> Result<Self, TableError> {
    let mut table = SymbolTable {
      env,
      symbols: IndexMap::new(),
    };

    for decl in declarations {
      table.insert(decl)?;
    }

    Ok(table)
  }

  fn insert(&mut self, decl: Declaration) -> Result<(), TableError> {
    let Declaration { predicate, line, kind } = decl;

    let name = match &kind {
      DeclarationKind::Constant(c) => c.name.clone(),
      DeclarationKind::Variable(v) => v.name.clone(),
      DeclarationKind::Struct(s) => s.name.clone(),
      DeclarationKind::Function(f) => f.name.clone(),
    };

    let entry = match self.symbols.get_mut(&name) {
      Some(entry) => entry,

      None => {
        let entry = match kind {
          DeclarationKind::Constant(value) => Entry::Constant(vec![Guarded { predicate, value }]),
          DeclarationKind::Variable(value) => Entry::Variable(vec![Guarded { predicate, value }]),
          DeclarationKind::Struct(value) => Entry::Struct(vec![Guarded { predicate, value }]),
          DeclarationKind::Function(sig) => Entry::Function(vec![sig]),
        };

        self.symbols.insert(name, entry);
        return Ok(());
      }
    };

    match (entry, kind) {
      (Entry::Constant(defs), DeclarationKind::Constant(value)) => {
        insert_alternative(defs, predicate, value, &name, line, Constant::same_definition)
      }

      (Entry::Variable(defs), DeclarationKind::Variable(value)) => {
        insert_alternative(defs, predicate, value, &name, line, Variable::same_definition)
      }

      (Entry::Struct(defs), DeclarationKind::Struct(value)) => {
        insert_alternative(defs, predicate, value, &name, line, |a, b| a == b)
      }

      (Entry::Function(sigs), DeclarationKind::Function(sig)) => insert_overload(sigs, sig, line),

      (entry, kind) => {
        let found = match kind {
          DeclarationKind::Constant(_) => SymbolKind::Constant,
          DeclarationKind::Variable(_) => SymbolKind::Variable,
          DeclarationKind::Struct(_) => SymbolKind::Struct,
          DeclarationKind::Function(_) => SymbolKind::Function,
        };

        Err(TableError::KindMismatch {
          name,
          line,
          expected: entry.kind(),
          found,
        })
      }
    }
  }

  /// Environment the table was built for.
  pub fn environment(&self) -> &Environment {
    &self.env
  }

  /// Look up any visible symbol.
  pub fn lookup(&self, name: &str) -> Option<SymbolRef<'_>> {
    let (name, entry) = self.symbols.get_key_value(name)?;
    self.visible(name, entry)
  }

  pub fn lookup_constant(&self, name: &str) -> Option<&Constant> {
    match self.symbols.get(name)? {
      Entry::Constant(defs) => self.first_visible(defs),
      _ => None,
    }
  }

  /// Look up a variable; builtin constants are read-only variables and are returned too.
  pub fn lookup_variable(&self, name: &str) -> Option<VariableRef<'_>> {
    match self.symbols.get(name)? {
      Entry::Constant(defs) => defs
        .iter()
        .find(|def| def.predicate.eval(&self.env))
        .map(|def| VariableRef::Constant {
          constant: &def.value,
          predicate: &def.predicate,
        }),

      Entry::Variable(defs) => defs
        .iter()
        .find(|def| def.predicate.eval(&self.env))
        .map(|def| VariableRef::Variable {
          variable: &def.value,
          predicate: &def.predicate,
        }),

      _ => None,
    }
  }

  /// Look up the shape of an interface block.
  pub fn lookup_struct(&self, name: &str) -> Option<&Arc<StructType>> {
    match self.symbols.get(name)? {
      Entry::Struct(defs) => self.first_visible(defs),
      _ => None,
    }
  }

  /// Visible overloads of `name`, in declaration order.
  pub fn overloads<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Signature> + 'a {
    let sigs: &[Signature] = match self.symbols.get(name) {
      Some(Entry::Function(sigs)) => sigs,
      _ => &[],
    };

    sigs.iter().filter(move |sig| sig.predicate.eval(&self.env))
  }

  /// Resolve a call to `name` with arguments of types `args`.
  pub fn resolve_call(&self, name: &str, args: &[Type]) -> Result<&Signature, ResolveError> {
    resolve::resolve(self.overloads(name), name, args)
  }

  /// Every visible symbol, in declaration order.
  pub fn symbols(&self) -> impl Iterator<Item = SymbolRef<'_>> + '_ {
    self
      .symbols
      .iter()
      .filter_map(move |(name, entry)| self.visible(name, entry))
  }

  /// Number of visible symbols; each overload set counts once.
  pub fn len(&self) -> usize {
    self.symbols().count()
  }

  pub fn is_empty(&self) -> bool {
    self.symbols().next().is_none()
  }

  fn first_visible<'a, T>(&self, defs: &'a [Guarded<T>]) -> Option<&'a T> {
    defs
      .iter()
      .find(|def| def.predicate.eval(&self.env))
      .map(|def| &def.value)
  }

  fn visible<'a>(&'a self, name: &'a str, entry: &'a Entry) -> Option<SymbolRef<'a>> {
    match entry {
      Entry::Constant(defs) => self.first_visible(defs).map(SymbolRef::Constant),
      Entry::Variable(defs) => self.first_visible(defs).map(SymbolRef::Variable),
      Entry::Struct(defs) => self.first_visible(defs).map(SymbolRef::Struct),
      Entry::Function(sigs) => {
        let overloads: Vec<_> = sigs.iter().filter(|sig| sig.predicate.eval(&self.env)).collect();

        if overloads.is_empty() {
          None
        } else {
          Some(SymbolRef::Function { name, overloads })
        }
      }
    }
  }
}

fn insert_alternative<T>(
  defs: &mut Vec<Guarded<T>>,
  predicate: Arc<Predicate>,
  value: T,
  name: &str,
  line: usize,
  same: impl Fn(&T, &T) -> bool,
) -> Result<(), TableError> {
  for def in defs.iter() {
    if same(&def.value, &value) {
      if def.predicate == predicate {
        return Ok(());
      }
    } else if def.predicate.overlaps(&predicate) {
      return Err(TableError::ConflictingDefinition {
        name: name.to_owned(),
        line,
      });
    }
  }

  defs.push(Guarded { predicate, value });
  Ok(())
}

fn insert_overload(sigs: &mut Vec<Signature>, sig: Signature, line: usize) -> Result<(), TableError> {
  for existing in sigs.iter().filter(|existing| existing.same_params(&sig)) {
    if existing.predicate == sig.predicate {
      trace!(signature = %sig, line = line, "duplicate signature dropped");
      return Ok(());
    }

    if existing.predicate.overlaps(&sig.predicate) {
      return Err(TableError::AmbiguousSignature {
        name: sig.name.clone(),
        signature: sig.to_string(),
        line,
      });
    }
  }

  sigs.push(sig);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    directive::split,
    env::{build_environment, Feature},
    parser::DeclParser,
    stage::{ShaderStage, TargetApi},
    types::{Dim, ScalarKind},
  };

  fn declarations(source: &str) -> Vec<Declaration> {
    let mut parser = DeclParser::new();
    split(source)
      .unwrap()
      .iter()
      .flat_map(|fragment| parser.parse(fragment).unwrap())
      .collect()
  }

  fn table(source: &str, env: Environment) -> Result<SymbolTable, TableError> {
    SymbolTable::build(env, declarations(source))
  }

  fn fragment_env() -> Environment {
    build_environment(TargetApi::OpenGl, ShaderStage::Fragment, [])
  }

  const GATED: &str = "\
const int gl_MaxDrawBuffers = 8;
#if __GLSLD_TARGET_API_VULKAN
const highp int gl_MaxInputAttachments = 1;
#endif
#if __GLSLD_SHADER_STAGE_VERTEX
in int gl_VertexID;
#endif
#if __GLSLD_SHADER_STAGE_FRAGMENT
in vec4 gl_FragCoord;
#endif
#if __GLSLD_SHADER_STAGE_COMPUTE
const highp uvec3 gl_WorkGroupSize = uvec3(1,1,1);
void barrier();
#endif
";

  #[test]
  fn visibility() {
    let table = table(GATED, fragment_env()).unwrap();

    assert!(table.lookup_constant("gl_MaxDrawBuffers").is_some());
    assert!(table.lookup_variable("gl_FragCoord").is_some());
    assert!(table.lookup("gl_VertexID").is_none());
    assert!(table.lookup("gl_MaxInputAttachments").is_none());
    assert!(table.lookup("barrier").is_none());
    assert_eq!(table.overloads("barrier").count(), 0);
    assert_eq!(table.len(), 2);

    let names: Vec<_> = table.symbols().map(|symbol| symbol.name()).collect();
    assert_eq!(names, vec!["gl_MaxDrawBuffers", "gl_FragCoord"]);
  }

  #[test]
  fn constants_are_variables() {
    let env = build_environment(TargetApi::Vulkan, ShaderStage::Compute, []);
    let table = table(GATED, env).unwrap();

    let size = table.lookup_variable("gl_WorkGroupSize").unwrap();
    assert!(size.is_constant());
    assert_eq!(size.ty(), &Type::Vector(ScalarKind::UInt, Dim::D3));
    assert!(size.predicate().eval(&env));
    assert_eq!(
      size.value(),
      Some(&ConstValue::Aggregate(vec![ConstValue::UInt(1); 3]))
    );

    assert!(table.lookup_constant("gl_MaxInputAttachments").is_some());
    assert!(table.resolve_call("barrier", &[]).is_ok());
  }

  #[test]
  fn identical_redeclarations() {
    let source = "\
in vec4 gl_FragCoord;
in vec4 gl_FragCoord;
#if __GLSLD_TARGET_API_VULKAN
in vec4 gl_FragCoord;
#endif
";
    let table = table(source, fragment_env()).unwrap();
    let Some(Entry::Variable(defs)) = table.symbols.get("gl_FragCoord") else {
      panic!("expected a variable");
    };

    // the same definition under another predicate is an alternative
    assert_eq!(defs.len(), 2);
  }

  #[test]
  fn exclusive_definitions() {
    let source = "\
#if __GLSLD_SHADER_STAGE_FRAGMENT
in float gl_ClipDistance[];
#endif
#if __GLSLD_SHADER_STAGE_VERTEX
out gl_PerVertex { vec4 gl_Position; float gl_ClipDistance[]; };
#endif
";
    let table = table(source, fragment_env()).unwrap();
    let clip = table.lookup_variable("gl_ClipDistance").unwrap();
    assert!(!clip.is_constant());

    let VariableRef::Variable { variable, .. } = clip else {
      unreachable!()
    };
    assert_eq!(variable.block, None);
  }

  #[test]
  fn conflicting_definitions() {
    let source = "\
const int gl_MaxDrawBuffers = 8;
#if __GLSLD_TARGET_API_VULKAN
const int gl_MaxDrawBuffers = 4;
#endif
";
    assert_eq!(
      table(source, fragment_env()),
      Err(TableError::ConflictingDefinition {
        name: "gl_MaxDrawBuffers".to_owned(),
        line: 3
      })
    );
  }

  #[test]
  fn kind_mismatch() {
    let err = table("in int foo;\nint foo(int x);", fragment_env()).unwrap_err();
    assert_eq!(
      err,
      TableError::KindMismatch {
        name: "foo".to_owned(),
        line: 2,
        expected: SymbolKind::Variable,
        found: SymbolKind::Function
      }
    );
  }

  #[test]
  fn overloads() {
    let source = "\
float min(float x, float y);
int min(int x, int y);
float min(float x, float y);
#if __GLSLD_FEATURE_ENABLE_FLOAT16_TYPE
float16_t min(float16_t x, float16_t y);
#endif
";
    let env = fragment_env();
    let table_off = table(source, env).unwrap();
    assert_eq!(table_off.overloads("min").count(), 2);

    let table_on = table(source, env.with_feature(Feature::Float16Type)).unwrap();
    assert_eq!(table_on.overloads("min").count(), 3);

    let Some(SymbolRef::Function { overloads, .. }) = table_on.lookup("min") else {
      panic!("expected a function");
    };
    assert_eq!(overloads.len(), 3);
  }

  #[test]
  fn ambiguous_signatures() {
    let source = "\
float f(float x);
#if __GLSLD_TARGET_API_VULKAN
double f(float x);
#endif
";
    let err = table(source, fragment_env()).unwrap_err();
    assert_eq!(
      err,
      TableError::AmbiguousSignature {
        name: "f".to_owned(),
        signature: "double f(float x)".to_owned(),
        line: 3
      }
    );

    // exclusive predicates are fine
    let source = "\
#if __GLSLD_TARGET_API_OPENGL
float f(float x);
#else
double f(float x);
#endif
";
    assert!(table(source, fragment_env()).is_ok());
  }

  #[test]
  fn structs() {
    let source = "\
#if __GLSLD_SHADER_STAGE_TESS_CTRL
in gl_PerVertex { vec4 gl_Position; } gl_in[32];
out gl_PerVertex { vec4 gl_Position; } gl_out[];
#endif
";
    let env = build_environment(TargetApi::OpenGl, ShaderStage::TessControl, []);
    let table = table(source, env).unwrap();

    let shape = table.lookup_struct("gl_PerVertex").unwrap();
    assert_eq!(shape.fields.len(), 1);

    let gl_in = table.lookup_variable("gl_in").unwrap();
    assert_eq!(
      gl_in.ty(),
      &Type::Struct(shape.clone()).array(crate::types::ArraySize::Fixed(32))
    );
  }

  #[test]
  fn resolve_call() {
    let source = "float pow(float x, float y);\ndouble pow(double x, double y);";
    let table = table(source, fragment_env()).unwrap();

    let sig = table.resolve_call("pow", &[Type::FLOAT, Type::FLOAT]).unwrap();
    assert_eq!(sig.return_type, Type::FLOAT);

    let err = table.resolve_call("powf", &[Type::FLOAT]).unwrap_err();
    assert!(matches!(err, ResolveError::UnknownIdentifier { .. }));
  }
}
