//! Build errors.
//!
//! A [`BuildError`] means the builtin declarations themselves are broken: it is never caused by user shader code and
//! should be reported as an internal error by the host.

use crate::{directive::DirectiveError, parser::ParseFailure, table::TableError};
use thiserror::Error;

/// Error raised while building the builtin table of an environment.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum BuildError {
  #[error("malformed directive: {0}")]
  Directive(#[from] DirectiveError),

  #[error("malformed declaration: {0}")]
  Parse(#[from] ParseFailure),

  #[error("inconsistent declarations: {0}")]
  Table(#[from] TableError),
}
