//! Operator typing.
//!
//! Builtin operators are not declared in the builtin text; their result types are computed here, with the same
//! conversion rules as function calls plus the scalar broadcasting and linear algebra operators allow.

use crate::types::{MatrixDim, ScalarKind, Type};

/// Unary operator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnaryOp {
  /// `+a`
  Identity,
  /// `-a`
  Negate,
  /// `~a`
  BitNot,
  /// `!a`
  LogicalNot,
  PreIncrement,
  PreDecrement,
  PostIncrement,
  PostDecrement,
}

impl UnaryOp {
  pub fn as_str(self) -> &'static str {
    match self {
      UnaryOp::Identity => "+",
      UnaryOp::Negate => "-",
      UnaryOp::BitNot => "~",
      UnaryOp::LogicalNot => "!",
      UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
      UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
    }
  }
}

/// Binary operator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Rem,
  Shl,
  Shr,
  BitAnd,
  BitOr,
  BitXor,
  /// `&&`
  And,
  /// `||`
  Or,
  /// `^^`
  Xor,
  Eq,
  Neq,
  Lt,
  Lte,
  Gt,
  Gte,
}

impl BinaryOp {
  pub fn as_str(self) -> &'static str {
    match self {
      BinaryOp::Add => "+",
      BinaryOp::Sub => "-",
      BinaryOp::Mul => "*",
      BinaryOp::Div => "/",
      BinaryOp::Rem => "%",
      BinaryOp::Shl => "<<",
      BinaryOp::Shr => ">>",
      BinaryOp::BitAnd => "&",
      BinaryOp::BitOr => "|",
      BinaryOp::BitXor => "^",
      BinaryOp::And => "&&",
      BinaryOp::Or => "||",
      BinaryOp::Xor => "^^",
      BinaryOp::Eq => "==",
      BinaryOp::Neq => "!=",
      BinaryOp::Lt => "<",
      BinaryOp::Lte => "<=",
      BinaryOp::Gt => ">",
      BinaryOp::Gte => ">=",
    }
  }
}

/// Type of `op` applied to a value of type `ty`, if the operator applies.
pub fn unary_result(op: UnaryOp, ty: &Type) -> Option<Type> {
  let applies = match op {
    UnaryOp::Identity
    | UnaryOp::Negate
    | UnaryOp::PreIncrement
    | UnaryOp::PreDecrement
    | UnaryOp::PostIncrement
    | UnaryOp::PostDecrement => ty.is_numeric(),

    UnaryOp::BitNot => is_integral_scalar_or_vector(ty),
    UnaryOp::LogicalNot => *ty == Type::BOOL,
  };

  applies.then(|| ty.clone())
}

/// Type of `lhs op rhs`, if the operator applies.
pub fn binary_result(op: BinaryOp, lhs: &Type, rhs: &Type) -> Option<Type> {
  match op {
    BinaryOp::Add | BinaryOp::Sub | BinaryOp::Div => {
      let (lhs, rhs) = common_kind(lhs, rhs)?;
      broadcast(&lhs, &rhs)
    }

    BinaryOp::Mul => {
      let (lhs, rhs) = common_kind(lhs, rhs)?;

      match (&lhs, &rhs) {
        (Type::Matrix(..), Type::Matrix(..) | Type::Vector(..)) | (Type::Vector(..), Type::Matrix(..)) => {
          linear_product(&lhs, &rhs)
        }
        _ => broadcast(&lhs, &rhs),
      }
    }

    BinaryOp::Rem | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
      if !is_integral_scalar_or_vector(lhs) || !is_integral_scalar_or_vector(rhs) {
        return None;
      }

      let (lhs, rhs) = common_kind(lhs, rhs)?;
      broadcast(&lhs, &rhs)
    }

    // the result has the type of the shifted value; the amount only has to match its shape
    BinaryOp::Shl | BinaryOp::Shr => {
      if !is_integral_scalar_or_vector(lhs) || !is_integral_scalar_or_vector(rhs) {
        return None;
      }

      match (lhs, rhs) {
        (_, Type::Scalar(_)) => Some(lhs.clone()),
        (Type::Vector(_, a), Type::Vector(_, b)) if a == b => Some(lhs.clone()),
        _ => None,
      }
    }

    BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
      (*lhs == Type::BOOL && *rhs == Type::BOOL).then_some(Type::BOOL)
    }

    BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
      let numeric_scalars = lhs.is_scalar() && rhs.is_scalar() && lhs.is_numeric() && rhs.is_numeric();
      (numeric_scalars && common_kind(lhs, rhs).is_some()).then_some(Type::BOOL)
    }

    BinaryOp::Eq | BinaryOp::Neq => {
      if matches!(lhs, Type::Opaque(_) | Type::Void) {
        return None;
      }

      let comparable = lhs == rhs
        || common_kind(lhs, rhs)
          .map_or(false, |(lhs, rhs)| lhs == rhs);
      comparable.then_some(Type::BOOL)
    }
  }
}

/// Type of `value[index]`.
pub fn index_result(ty: &Type) -> Option<Type> {
  match ty {
    Type::Array(elem, _) => Some((**elem).clone()),
    Type::Vector(kind, _) => Some(Type::Scalar(*kind)),
    Type::Matrix(kind, dim) => Some(Type::Vector(*kind, dim.rows())),
    _ => None,
  }
}

/// Type of `value.length()`.
///
/// Unsized arrays have a length too; it is only known once the shader or the implementation sizes them.
pub fn length_result(ty: &Type) -> Option<Type> {
  match ty {
    Type::Array(..) | Type::Vector(..) | Type::Matrix(..) => Some(Type::INT),
    _ => None,
  }
}

fn is_integral_scalar_or_vector(ty: &Type) -> bool {
  match ty {
    Type::Scalar(kind) | Type::Vector(kind, _) => kind.is_integral(),
    _ => false,
  }
}

// Convert both operands to their common component kind.
fn common_kind(lhs: &Type, rhs: &Type) -> Option<(Type, Type)> {
  let (a, b) = (lhs.scalar_kind()?, rhs.scalar_kind()?);

  if !a.is_numeric() || !b.is_numeric() {
    return if a == b && a == ScalarKind::Bool {
      Some((lhs.clone(), rhs.clone()))
    } else {
      None
    };
  }

  let kind = if a == b || a.converts_to(b) {
    b
  } else if b.converts_to(a) {
    a
  } else {
    return None;
  };

  Some((lhs.with_scalar_kind(kind)?, rhs.with_scalar_kind(kind)?))
}

// Component-wise operation on operands of the same kind, broadcasting scalars.
fn broadcast(lhs: &Type, rhs: &Type) -> Option<Type> {
  if !lhs.is_numeric() || !rhs.is_numeric() {
    return None;
  }

  match (lhs, rhs) {
    _ if lhs == rhs => Some(lhs.clone()),
    (Type::Scalar(_), _) => Some(rhs.clone()),
    (_, Type::Scalar(_)) => Some(lhs.clone()),
    _ => None,
  }
}

// Matrix / vector products.
fn linear_product(lhs: &Type, rhs: &Type) -> Option<Type> {
  match (lhs, rhs) {
    // column vector
    (Type::Matrix(kind, m), Type::Vector(_, d)) if m.cols() == *d => Some(Type::Vector(*kind, m.rows())),

    // row vector
    (Type::Vector(kind, d), Type::Matrix(_, m)) if m.rows() == *d => Some(Type::Vector(*kind, m.cols())),

    (Type::Matrix(kind, a), Type::Matrix(_, b)) if a.cols() == b.rows() => {
      Some(Type::Matrix(*kind, MatrixDim::new(b.cols(), a.rows())))
    }

    _ => None,
  }
}
