//! GLSL builtin environments and overload resolution.
//!
//! This crate is the semantic core of a GLSL front end (typically a language server). It knows everything a GLSL
//! shader can use without declaring it: builtin constants such as `gl_MaxDrawBuffers`, builtin variables such as
//! `gl_FragCoord`, interface blocks such as `gl_PerVertex` and the thousands of overloaded builtin functions. On top of
//! that, it resolves call sites and operator expressions against them.
//!
//! # Environments
//!
//! What is builtin depends on the context a shader is analyzed in: the target API (OpenGL or Vulkan), the shader stage
//! and the enabled optional features (mostly extensions). That context is an [`Environment`]:
//!
//! ```
//! use glsld_builtins::{build_environment, Feature, ShaderStage, TargetApi};
//!
//! let env = build_environment(TargetApi::Vulkan, ShaderStage::Fragment, [Feature::Float16Type]);
//! assert_eq!(env.to_string(), "Vulkan fragment shader with [Float16Type]");
//! ```
//!
//! # Builtin tables
//!
//! Builtins are described once, in a GLSL-like declaration file embedded in the crate ([`stdlib::SOURCE`]), where
//! every declaration is gated by `#if` predicates over the environment. Building the [`SymbolTable`] of an
//! environment goes through three steps:
//!
//! 1. [`directive::evaluate`] splits the text into fragments, each carrying the predicate it is gated by, and keeps
//!    the active ones.
//! 2. [`parser::parse`] turns each fragment into declarations.
//! 3. [`SymbolTable::build`] indexes the declarations and rejects inconsistent ones.
//!
//! Building a table is not free, so hosts go through a [`BuiltinCache`], which builds each environment's table once
//! and shares it behind an [`Arc`](std::sync::Arc):
//!
//! ```
//! use glsld_builtins::{build_environment, BuiltinCache, CacheConfig, ShaderStage, TargetApi, Type};
//!
//! let cache = BuiltinCache::new(CacheConfig::default());
//! let env = build_environment(TargetApi::OpenGl, ShaderStage::Fragment, []);
//! let table = cache.get_or_build(&env).unwrap();
//!
//! let frag_coord = table.lookup_variable("gl_FragCoord").unwrap();
//! assert_eq!(frag_coord.ty().to_string(), "vec4");
//!
//! let vec3 = Type::from_name("vec3").unwrap();
//! let normalize = table.resolve_call("normalize", &[vec3]).unwrap();
//! assert_eq!(normalize.to_string(), "vec3 normalize(vec3 x)");
//! ```
//!
//! # Overload resolution
//!
//! [`SymbolTable::resolve_call`] picks the best overload of a function for a list of argument types. Arguments
//! convert implicitly within a scalar family only (`int` to `uint`, `float` to `double`, and so on, with vectors and
//! matrices following their components). Promotions to `int` or `double` are preferred to other conversions. An
//! overload whose every argument is at least as good as any other candidate's, and strictly better at least once, wins. Failing that, the call is ambiguous and the tied candidates are
//! reported. See the [`resolve`] module.
//!
//! Operators are typed by the [`ops`] module.
//!
//! # Errors
//!
//! Errors come in two flavors:
//!
//! - [`BuildError`]: the declaration text itself is broken. This is an internal error of the host.
//! - [`ResolveError`]: user code calls something that does not exist or cannot be resolved. This is a diagnostic.
//!
//! # Logging
//!
//! The crate logs with [`tracing`] and installs no subscriber.

pub mod cache;
pub mod config;
pub mod directive;
pub mod env;
pub mod error;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod predicate;
pub mod resolve;
pub mod stage;
pub mod stdlib;
pub mod symbol;
pub mod table;
pub mod types;
pub mod value;
pub mod writer;

pub use cache::{BuiltinCache, CacheStats};
pub use config::{BuiltinConfig, CacheConfig};
pub use env::{build_environment, Environment, Feature, FeatureSet, Flag};
pub use error::BuildError;
pub use predicate::Predicate;
pub use resolve::{Conversion, ResolveError};
pub use stage::{ShaderStage, TargetApi};
pub use symbol::{Constant, Parameter, Signature, Variable};
pub use table::{SymbolKind, SymbolRef, SymbolTable, TableError, VariableRef};
pub use types::{ArraySize, Dim, Direction, MatrixDim, Qualifier, QualifierSet, ScalarKind, StructType, Type};
pub use value::ConstValue;
