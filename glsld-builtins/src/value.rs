//! Compile-time values of builtin constants.

use crate::types::{ScalarKind, Type};
use std::fmt;

/// Literal value tree of a builtin constant initializer.
///
/// Only literals and literal aggregates are represented; builtin constants never need more. Both brace aggregates
/// (`{ 65535, 65535, 65535 }`) and constructor aggregates (`uvec3(1, 1, 1)`) are stored as [`ConstValue::Aggregate`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
  Bool(bool),
  Int(i64),
  UInt(u64),
  Float(f64),
  Aggregate(Vec<ConstValue>),
}

impl ConstValue {
  /// Integral value, if any; used to resolve array sizes naming constants.
  pub fn as_int(&self) -> Option<i64> {
    match *self {
      ConstValue::Int(i) => Some(i),
      ConstValue::UInt(u) => i64::try_from(u).ok(),
      _ => None,
    }
  }

  /// Convert the literal to the scalar kind of its declared type, e.g. `0` to `0u` for a `uint` constant.
  ///
  /// Returns `None` if the value does not fit the type: wrong family, out of range, or an aggregate whose arity does
  /// not match a vector type.
  pub fn coerce(self, ty: &Type) -> Option<Self> {
    match (self, ty) {
      (ConstValue::Aggregate(values), Type::Vector(kind, dim)) => {
        if values.len() != dim.len() && values.len() != 1 {
          return None;
        }

        let values = values
          .into_iter()
          .map(|v| v.coerce_scalar(*kind))
          .collect::<Option<Vec<_>>>()?;
        Some(ConstValue::Aggregate(values))
      }

      (ConstValue::Aggregate(values), Type::Array(elem, _)) => {
        let values = values
          .into_iter()
          .map(|v| v.coerce(elem))
          .collect::<Option<Vec<_>>>()?;
        Some(ConstValue::Aggregate(values))
      }

      (ConstValue::Aggregate(_), _) => None,

      (value, Type::Scalar(kind)) => value.coerce_scalar(*kind),

      _ => None,
    }
  }

  fn coerce_scalar(self, kind: ScalarKind) -> Option<Self> {
    match (self, kind) {
      (ConstValue::Bool(b), ScalarKind::Bool) => Some(ConstValue::Bool(b)),
      (ConstValue::Int(i), k) if k.is_integral() => {
        if k.is_signed() {
          Some(ConstValue::Int(i))
        } else {
          u64::try_from(i).ok().map(ConstValue::UInt)
        }
      }
      (ConstValue::UInt(u), k) if k.is_integral() => {
        if k.is_signed() {
          i64::try_from(u).ok().map(ConstValue::Int)
        } else {
          Some(ConstValue::UInt(u))
        }
      }
      (ConstValue::Int(i), k) if k.is_floating() => Some(ConstValue::Float(i as f64)),
      (ConstValue::UInt(u), k) if k.is_floating() => Some(ConstValue::Float(u as f64)),
      (ConstValue::Float(x), k) if k.is_floating() => Some(ConstValue::Float(x)),
      _ => None,
    }
  }
}

impl fmt::Display for ConstValue {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    crate::writer::glsl::write_const_value(f, self)
  }
}
