//! Writers.
//!
//! Writers render builtin entities back to source text, e.g. for hover and completion details.

pub mod glsl;
