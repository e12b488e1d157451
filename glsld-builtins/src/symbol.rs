//! Symbol records.
//!
//! Records are produced by the [parser](crate::parser) and owned by the [`SymbolTable`](crate::table::SymbolTable),
//! which only hands out borrowed views of them.

use crate::{
  predicate::Predicate,
  types::{Direction, QualifierSet, Type},
  value::ConstValue,
};
use std::fmt;
use std::sync::Arc;

/// Builtin constant, e.g. `const int gl_MaxVertexAttribs = 16;`.
#[derive(Clone, Debug, PartialEq)]
pub struct Constant {
  pub name: String,
  pub ty: Type,
  pub qualifiers: QualifierSet,
  pub value: ConstValue,
  pub doc: Option<String>,
}

impl Constant {
  /// Whether both records define the same constant, documentation aside.
  pub fn same_definition(&self, other: &Constant) -> bool {
    self.name == other.name && self.ty == other.ty && self.qualifiers == other.qualifiers && self.value == other.value
  }
}

/// Builtin variable, e.g. `in vec4 gl_FragCoord;`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variable {
  pub name: String,
  pub ty: Type,
  pub qualifiers: QualifierSet,
  pub direction: Option<Direction>,
  /// Interface block the variable is a member of, for members of anonymous blocks such as `gl_Position`.
  pub block: Option<String>,
  pub doc: Option<String>,
}

impl Variable {
  pub fn same_definition(&self, other: &Variable) -> bool {
    self.name == other.name
      && self.ty == other.ty
      && self.qualifiers == other.qualifiers
      && self.block == other.block
  }
}

/// Function parameter.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Parameter {
  pub name: Option<String>,
  pub ty: Type,
  pub qualifiers: QualifierSet,
  pub direction: Direction,
}

/// Builtin function signature.
#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
  pub name: String,
  pub return_type: Type,
  pub params: Vec<Parameter>,
  /// Governing predicate inherited from the fragment the signature was declared in.
  pub predicate: Arc<Predicate>,
  pub doc: Option<String>,
}

impl Signature {
  /// Iterate over the parameter types, in order.
  pub fn param_types(&self) -> impl ExactSizeIterator<Item = &Type> {
    self.params.iter().map(|param| &param.ty)
  }

  /// Whether both signatures have the same parameter-type tuple.
  pub fn same_params(&self, other: &Signature) -> bool {
    self.params.len() == other.params.len() && self.param_types().zip(other.param_types()).all(|(a, b)| a == b)
  }
}

impl fmt::Display for Signature {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    crate::writer::glsl::write_signature(f, self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn param(ty: Type, direction: Direction) -> Parameter {
    Parameter {
      name: None,
      ty,
      qualifiers: QualifierSet::empty(),
      direction,
    }
  }

  #[test]
  fn same_params_ignores_names_and_directions() {
    let a = Signature {
      name: "uaddCarry".to_owned(),
      return_type: Type::UINT,
      params: vec![
        param(Type::UINT, Direction::In),
        param(Type::UINT, Direction::In),
        param(Type::UINT, Direction::Out),
      ],
      predicate: Arc::new(Predicate::True),
      doc: None,
    };
    let mut b = a.clone();
    b.params[2].direction = Direction::In;
    b.params[0].name = Some("x".to_owned());

    assert!(a.same_params(&b));

    b.params.pop();
    assert!(!a.same_params(&b));
  }

  #[test]
  fn variable_identity_ignores_docs() {
    let a = Variable {
      name: "gl_FragCoord".to_owned(),
      ty: Type::from_name("vec4").unwrap(),
      qualifiers: QualifierSet::IN,
      direction: Some(Direction::In),
      block: None,
      doc: None,
    };
    let mut b = a.clone();
    b.doc = Some("Window relative coordinate.".to_owned());
    assert!(a.same_definition(&b));

    b.qualifiers.insert(QualifierSet::FLAT);
    assert!(!a.same_definition(&b));
  }
}
