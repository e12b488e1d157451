//! Overload resolution.
//!
//! Call sites are matched against the visible signatures of an overload set:
//!
//! 1. Signatures whose arity differs from the call are dropped.
//! 2. Each argument is classified against its parameter as an exact match, a promotion, another implicit
//!    conversion, or no match at all; a single mismatch drops the signature.
//! 3. A surviving signature wins if it is at least as good as every other one at every position and strictly better
//!    at one. If no such signature exists, the call is ambiguous.
//!
//! Implicit conversions follow a strict widening lattice, see [`conversion`].

use crate::{
  symbol::{Parameter, Signature},
  types::{Direction, Type},
};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;
use tracing::trace;

/// Quality of an argument-to-parameter match. Better matches compare lower.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Conversion {
  /// The types are identical.
  Exact,
  /// Small integers to `int`, `float16_t` or `float` to `double`.
  Promotion,
  /// Any other widening along the family's chain.
  Conversion,
}

/// Cost of converting a value of type `from` to type `to`.
///
/// - Integers widen along `int8_t → uint8_t → int16_t → uint16_t → int → uint → int64_t → uint64_t`.
/// - Floating values widen along `float16_t → float → double`.
/// - Widening `int8_t`, `uint8_t`, `int16_t` or `uint16_t` to `int`, and `float16_t` or `float` to `double`, is a
///   [`Conversion::Promotion`]; every other widening is a [`Conversion::Conversion`].
/// - `bool` never converts, and integer and floating values never mix.
/// - Vectors and matrices convert component-wise if their shapes are identical; scalars are never broadcast.
/// - Any other type only matches itself.
pub fn conversion(from: &Type, to: &Type) -> Option<Conversion> {
  if from == to {
    return Some(Conversion::Exact);
  }

  let (a, b) = match (from, to) {
    (Type::Scalar(a), Type::Scalar(b)) => (*a, *b),
    (Type::Vector(a, a_dim), Type::Vector(b, b_dim)) if a_dim == b_dim => (*a, *b),
    (Type::Matrix(a, a_dim), Type::Matrix(b, b_dim)) if a_dim == b_dim => (*a, *b),
    _ => return None,
  };

  if a.promotes_to(b) {
    Some(Conversion::Promotion)
  } else if a.converts_to(b) {
    Some(Conversion::Conversion)
  } else {
    None
  }
}

/// Classify an argument against a parameter, honoring the parameter direction.
///
/// `out` parameters write back into the argument, so the conversion goes the other way; `inout` parameters go both
/// ways and hence only accept identical types.
pub fn classify(param: &Parameter, arg: &Type) -> Option<Conversion> {
  match param.direction {
    Direction::In => conversion(arg, &param.ty),
    Direction::Out => conversion(&param.ty, arg),
    Direction::InOut => (param.ty == *arg).then_some(Conversion::Exact),
  }
}

/// Failure to resolve a call site.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ResolveError {
  #[error("unknown function `{name}`")]
  UnknownIdentifier { name: String },

  #[error("no overload of `{name}` accepts ({})", TypeList(.args))]
  NoApplicableOverload { name: String, args: Vec<Type> },

  #[error("ambiguous call to `{name}` with ({}): {} candidates", TypeList(.args), .candidates.len())]
  Ambiguous {
    name: String,
    args: Vec<Type>,
    candidates: Vec<Signature>,
  },
}

impl ResolveError {
  /// Whether the call matched nothing at all, as opposed to matching too much.
  pub fn is_no_match(&self) -> bool {
    matches!(
      self,
      ResolveError::UnknownIdentifier { .. } | ResolveError::NoApplicableOverload { .. }
    )
  }
}

struct TypeList<'a>(&'a [Type]);

impl fmt::Display for TypeList<'_> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    for (i, ty) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str(", ")?;
      }

      write!(f, "{}", ty)?;
    }

    Ok(())
  }
}

/// Resolve a call to `name` with arguments of types `args` among `candidates`.
///
/// `candidates` are the visible signatures of the overload set of `name`; an empty set means `name` is not a known
/// function.
pub fn resolve<'a>(
  candidates: impl IntoIterator<Item = &'a Signature>,
  name: &str,
  args: &[Type],
) -> Result<&'a Signature, ResolveError> {
  let mut known = false;
  let mut viable = Vec::new();

  for sig in candidates {
    known = true;

    if sig.params.len() != args.len() {
      continue;
    }

    let ranks = sig
      .params
      .iter()
      .zip(args)
      .map(|(param, arg)| classify(param, arg))
      .collect::<Option<Vec<_>>>();

    if let Some(ranks) = ranks {
      viable.push((sig, ranks));
    }
  }

  if !known {
    trace!(function = name, "unknown function");
    return Err(ResolveError::UnknownIdentifier { name: name.to_owned() });
  }

  let winner = viable.iter().find(|(_, ranks)| {
    viable
      .iter()
      .all(|(_, other)| std::ptr::eq(ranks, other) || compare(ranks, other) == Some(Ordering::Less))
  });

  if let Some((sig, _)) = winner {
    trace!(function = name, signature = %sig, "resolved call");
    return Ok(*sig);
  }

  if viable.is_empty() {
    trace!(function = name, "no applicable overload");
    return Err(ResolveError::NoApplicableOverload {
      name: name.to_owned(),
      args: args.to_vec(),
    });
  }

  // keep the candidates nothing beats
  let candidates: Vec<_> = viable
    .iter()
    .filter(|(_, ranks)| {
      !viable
        .iter()
        .any(|(_, other)| compare(other, ranks) == Some(Ordering::Less))
    })
    .map(|(sig, _)| (*sig).clone())
    .collect();

  trace!(function = name, candidates = candidates.len(), "ambiguous call");
  Err(ResolveError::Ambiguous {
    name: name.to_owned(),
    args: args.to_vec(),
    candidates,
  })
}

// Partial order over per-position ranks: `Less` if `a` is nowhere worse and somewhere better than `b`.
fn compare(a: &[Conversion], b: &[Conversion]) -> Option<Ordering> {
  let mut ordering = Ordering::Equal;

  for (x, y) in a.iter().zip(b) {
    match (ordering, x.cmp(y)) {
      (_, Ordering::Equal) => (),
      (Ordering::Equal, o) => ordering = o,
      (current, o) if current != o => return None,
      _ => (),
    }
  }

  Some(ordering)
}
