//! Types of builtin entities.
//!
//! [`Type`] is a closed representation of every GLSL type the builtin declarations mention: scalars, vectors and
//! matrices of every scalar kind (including the explicit arithmetic types of `GL_EXT_shader_explicit_arithmetic_types`),
//! opaque types (samplers, images, subpass inputs, acceleration structures, …), interface-block structs and arrays.

use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

/// Kind of a scalar, also used as the component kind of vectors and matrices.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ScalarKind {
  Bool,
  Int,
  UInt,
  Float,
  Double,
  Int8,
  Int16,
  Int64,
  UInt8,
  UInt16,
  UInt64,
  Float16,
}

/// Family a [`ScalarKind`] belongs to. Implicit conversions never cross families.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ScalarFamily {
  Boolean,
  Integral,
  Floating,
}

impl ScalarKind {
  pub const ALL: [ScalarKind; 12] = [
    ScalarKind::Bool,
    ScalarKind::Int,
    ScalarKind::UInt,
    ScalarKind::Float,
    ScalarKind::Double,
    ScalarKind::Int8,
    ScalarKind::Int16,
    ScalarKind::Int64,
    ScalarKind::UInt8,
    ScalarKind::UInt16,
    ScalarKind::UInt64,
    ScalarKind::Float16,
  ];

  /// GLSL name of the scalar type.
  pub fn name(self) -> &'static str {
    match self {
      ScalarKind::Bool => "bool",
      ScalarKind::Int => "int",
      ScalarKind::UInt => "uint",
      ScalarKind::Float => "float",
      ScalarKind::Double => "double",
      ScalarKind::Int8 => "int8_t",
      ScalarKind::Int16 => "int16_t",
      ScalarKind::Int64 => "int64_t",
      ScalarKind::UInt8 => "uint8_t",
      ScalarKind::UInt16 => "uint16_t",
      ScalarKind::UInt64 => "uint64_t",
      ScalarKind::Float16 => "float16_t",
    }
  }

  /// Prefix of vector type names, e.g. `i16` for `i16vec3`.
  pub fn vector_prefix(self) -> &'static str {
    match self {
      ScalarKind::Bool => "b",
      ScalarKind::Int => "i",
      ScalarKind::UInt => "u",
      ScalarKind::Float => "",
      ScalarKind::Double => "d",
      ScalarKind::Int8 => "i8",
      ScalarKind::Int16 => "i16",
      ScalarKind::Int64 => "i64",
      ScalarKind::UInt8 => "u8",
      ScalarKind::UInt16 => "u16",
      ScalarKind::UInt64 => "u64",
      ScalarKind::Float16 => "f16",
    }
  }

  /// Prefix of matrix type names; only floating kinds have matrices.
  pub fn matrix_prefix(self) -> Option<&'static str> {
    match self {
      ScalarKind::Float => Some(""),
      ScalarKind::Double => Some("d"),
      ScalarKind::Float16 => Some("f16"),
      _ => None,
    }
  }

  pub fn family(self) -> ScalarFamily {
    match self {
      ScalarKind::Bool => ScalarFamily::Boolean,
      ScalarKind::Float | ScalarKind::Double | ScalarKind::Float16 => ScalarFamily::Floating,
      _ => ScalarFamily::Integral,
    }
  }

  pub fn is_integral(self) -> bool {
    self.family() == ScalarFamily::Integral
  }

  pub fn is_floating(self) -> bool {
    self.family() == ScalarFamily::Floating
  }

  pub fn is_numeric(self) -> bool {
    self.family() != ScalarFamily::Boolean
  }

  pub fn is_signed(self) -> bool {
    matches!(
      self,
      ScalarKind::Int | ScalarKind::Int8 | ScalarKind::Int16 | ScalarKind::Int64
    ) || self.is_floating()
  }

  /// Position in the widening chain of the kind's family.
  ///
  /// Integral kinds are ordered `int8_t < uint8_t < int16_t < uint16_t < int < uint < int64_t < uint64_t`; floating
  /// kinds are ordered `float16_t < float < double`. `bool` has no rank.
  pub fn rank(self) -> Option<u8> {
    let rank = match self {
      ScalarKind::Bool => return None,
      ScalarKind::Int8 => 0,
      ScalarKind::UInt8 => 1,
      ScalarKind::Int16 => 2,
      ScalarKind::UInt16 => 3,
      ScalarKind::Int => 4,
      ScalarKind::UInt => 5,
      ScalarKind::Int64 => 6,
      ScalarKind::UInt64 => 7,
      ScalarKind::Float16 => 0,
      ScalarKind::Float => 1,
      ScalarKind::Double => 2,
    };

    Some(rank)
  }

  /// Whether a value of this kind is promoted to `to`.
  ///
  /// Promotions are the preferred subset of implicit conversions: small integers to `int`, and `float16_t` or
  /// `float` to `double`.
  pub fn promotes_to(self, to: ScalarKind) -> bool {
    match to {
      ScalarKind::Int => matches!(
        self,
        ScalarKind::Int8 | ScalarKind::Int16 | ScalarKind::UInt8 | ScalarKind::UInt16
      ),
      ScalarKind::Double => matches!(self, ScalarKind::Float16 | ScalarKind::Float),
      _ => false,
    }
  }

  /// Whether a value of this kind implicitly converts to `to`, promotions included.
  ///
  /// Conversions only go up the widening chain of a single family; see [`ScalarKind::rank`].
  pub fn converts_to(self, to: ScalarKind) -> bool {
    if self.family() != to.family() {
      return false;
    }

    match (self.rank(), to.rank()) {
      (Some(from), Some(to)) => from < to,
      _ => false,
    }
  }

  fn from_name(name: &str) -> Option<Self> {
    let kind = match name {
      "bool" => ScalarKind::Bool,
      "int" | "int32_t" => ScalarKind::Int,
      "uint" | "uint32_t" => ScalarKind::UInt,
      "float" | "float32_t" => ScalarKind::Float,
      "double" | "float64_t" => ScalarKind::Double,
      "int8_t" => ScalarKind::Int8,
      "int16_t" => ScalarKind::Int16,
      "int64_t" => ScalarKind::Int64,
      "uint8_t" => ScalarKind::UInt8,
      "uint16_t" => ScalarKind::UInt16,
      "uint64_t" => ScalarKind::UInt64,
      "float16_t" => ScalarKind::Float16,
      _ => return None,
    };

    Some(kind)
  }

  fn from_vector_prefix(prefix: &str) -> Option<Self> {
    let kind = match prefix {
      "b" => ScalarKind::Bool,
      "i" | "i32" => ScalarKind::Int,
      "u" | "u32" => ScalarKind::UInt,
      "" | "f32" => ScalarKind::Float,
      "d" | "f64" => ScalarKind::Double,
      "i8" => ScalarKind::Int8,
      "i16" => ScalarKind::Int16,
      "i64" => ScalarKind::Int64,
      "u8" => ScalarKind::UInt8,
      "u16" => ScalarKind::UInt16,
      "u64" => ScalarKind::UInt64,
      "f16" => ScalarKind::Float16,
      _ => return None,
    };

    Some(kind)
  }
}

/// Dimension of a vector.
///
/// Vectors can have one of three dimensions:
///
/// - [`Dim::D2`]: designates a 2D vector.
/// - [`Dim::D3`]: designates a 3D vector.
/// - [`Dim::D4`]: designates a 4D vector.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Dim {
  /// 2D vector.
  D2,

  /// 3D vector.
  D3,

  /// 4D vector.
  D4,
}

impl Dim {
  pub fn len(self) -> usize {
    match self {
      Dim::D2 => 2,
      Dim::D3 => 3,
      Dim::D4 => 4,
    }
  }

  pub fn from_len(len: usize) -> Option<Self> {
    match len {
      2 => Some(Dim::D2),
      3 => Some(Dim::D3),
      4 => Some(Dim::D4),
      _ => None,
    }
  }
}

/// Matrix dimension.
///
/// Matrices can have several dimensions. Most of the time, you will be interested in squared dimensions, e.g. 2×2, 3×3
/// and 4×4. However, other dimensions exist.
///
/// > Note: matrices are expressed in column-major; `D23` is GLSL’s `mat2x3`, two columns of three rows.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum MatrixDim {
  /// Squared 2 dimension.
  D22,
  /// 2×3 dimension.
  D23,
  /// 2×4 dimension.
  D24,
  /// 3×2 dimension.
  D32,
  /// Squared 3 dimension.
  D33,
  /// 3×4 dimension.
  D34,
  /// 4×2 dimension.
  D42,
  /// 4×3 dimension.
  D43,
  /// Squared 4 dimension.
  D44,
}

impl MatrixDim {
  pub fn new(cols: Dim, rows: Dim) -> Self {
    match (cols, rows) {
      (Dim::D2, Dim::D2) => MatrixDim::D22,
      (Dim::D2, Dim::D3) => MatrixDim::D23,
      (Dim::D2, Dim::D4) => MatrixDim::D24,
      (Dim::D3, Dim::D2) => MatrixDim::D32,
      (Dim::D3, Dim::D3) => MatrixDim::D33,
      (Dim::D3, Dim::D4) => MatrixDim::D34,
      (Dim::D4, Dim::D2) => MatrixDim::D42,
      (Dim::D4, Dim::D3) => MatrixDim::D43,
      (Dim::D4, Dim::D4) => MatrixDim::D44,
    }
  }

  /// Number of columns.
  pub fn cols(self) -> Dim {
    match self {
      MatrixDim::D22 | MatrixDim::D23 | MatrixDim::D24 => Dim::D2,
      MatrixDim::D32 | MatrixDim::D33 | MatrixDim::D34 => Dim::D3,
      MatrixDim::D42 | MatrixDim::D43 | MatrixDim::D44 => Dim::D4,
    }
  }

  /// Number of rows, i.e. the dimension of a column vector.
  pub fn rows(self) -> Dim {
    match self {
      MatrixDim::D22 | MatrixDim::D32 | MatrixDim::D42 => Dim::D2,
      MatrixDim::D23 | MatrixDim::D33 | MatrixDim::D43 => Dim::D3,
      MatrixDim::D24 | MatrixDim::D34 | MatrixDim::D44 => Dim::D4,
    }
  }

  pub fn transpose(self) -> Self {
    MatrixDim::new(self.rows(), self.cols())
  }

  pub fn is_square(self) -> bool {
    self.cols() == self.rows()
  }
}

/// Dimensionality of a sampler or image.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SamplerDim {
  D1,
  D2,
  D3,
  Cube,
  Rect,
  Buffer,
}

impl SamplerDim {
  /// Suffix used in type names, e.g. `2DRect` in `sampler2DRect`.
  pub fn suffix(self) -> &'static str {
    match self {
      SamplerDim::D1 => "1D",
      SamplerDim::D2 => "2D",
      SamplerDim::D3 => "3D",
      SamplerDim::Cube => "Cube",
      SamplerDim::Rect => "2DRect",
      SamplerDim::Buffer => "Buffer",
    }
  }
}

/// Descriptor shared by samplers and images.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SamplerDesc {
  /// Kind of the sampled components: [`ScalarKind::Float`], [`ScalarKind::Int`] or [`ScalarKind::UInt`].
  pub sampled: ScalarKind,
  pub dim: SamplerDim,
  pub array: bool,
  pub multisample: bool,
  /// Always `false` for images.
  pub shadow: bool,
}

/// Opaque types, which can only be passed around and handed to builtin functions.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum OpaqueType {
  Sampler(SamplerDesc),
  Image(SamplerDesc),
  SubpassInput { sampled: ScalarKind, multisample: bool },
  AtomicUint,
  AccelerationStructureExt,
  AccelerationStructureNv,
  RayQueryExt,
}

impl OpaqueType {
  fn from_name(name: &str) -> Option<Self> {
    match name {
      "atomic_uint" => return Some(OpaqueType::AtomicUint),
      "accelerationStructureEXT" => return Some(OpaqueType::AccelerationStructureExt),
      "accelerationStructureNV" => return Some(OpaqueType::AccelerationStructureNv),
      "rayQueryEXT" => return Some(OpaqueType::RayQueryExt),
      _ => (),
    }

    let (sampled, rest) = match name.as_bytes().first() {
      Some(b'i') if !name.starts_with("image") => (ScalarKind::Int, &name[1..]),
      Some(b'u') => (ScalarKind::UInt, &name[1..]),
      _ => (ScalarKind::Float, name),
    };

    if let Some(rest) = rest.strip_prefix("subpassInput") {
      return match rest {
        "" => Some(OpaqueType::SubpassInput {
          sampled,
          multisample: false,
        }),
        "MS" => Some(OpaqueType::SubpassInput {
          sampled,
          multisample: true,
        }),
        _ => None,
      };
    }

    let (is_image, rest) = match (rest.strip_prefix("sampler"), rest.strip_prefix("image")) {
      (Some(rest), _) => (false, rest),
      (_, Some(rest)) => (true, rest),
      _ => return None,
    };

    let (dim, mut rest) = [
      SamplerDim::Rect,
      SamplerDim::D1,
      SamplerDim::D2,
      SamplerDim::D3,
      SamplerDim::Cube,
      SamplerDim::Buffer,
    ]
    .into_iter()
    .find_map(|dim| rest.strip_prefix(dim.suffix()).map(|rest| (dim, rest)))?;

    let mut flag = |suffix: &str| match rest.strip_prefix(suffix) {
      Some(tail) => {
        rest = tail;
        true
      }
      None => false,
    };

    let multisample = flag("MS");
    let array = flag("Array");
    let shadow = flag("Shadow");

    if !rest.is_empty() {
      return None;
    }

    let valid = match dim {
      SamplerDim::D1 => !multisample,
      SamplerDim::D2 => !(multisample && shadow),
      SamplerDim::D3 => !(multisample || array || shadow),
      SamplerDim::Cube => !multisample,
      SamplerDim::Rect => !(multisample || array),
      SamplerDim::Buffer => !(multisample || array || shadow),
    };

    if !valid || (shadow && (is_image || sampled != ScalarKind::Float)) {
      return None;
    }

    let desc = SamplerDesc {
      sampled,
      dim,
      array,
      multisample,
      shadow,
    };

    if is_image {
      Some(OpaqueType::Image(desc))
    } else {
      Some(OpaqueType::Sampler(desc))
    }
  }
}

/// Size of an array.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ArraySize {
  Fixed(u32),
  /// Unsized array, e.g. `gl_ClipDistance[]`; the size is set by the shader or the implementation.
  Implicit,
}

/// Field of a struct or interface block.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct StructField {
  pub name: String,
  pub ty: Type,
  pub qualifiers: QualifierSet,
}

/// Struct type; interface blocks such as `gl_PerVertex` are represented by their shape.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct StructType {
  pub name: String,
  pub fields: Vec<StructField>,
}

impl StructType {
  pub fn field(&self, name: &str) -> Option<&StructField> {
    self.fields.iter().find(|field| field.name == name)
  }
}

/// Type representation.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Type {
  /// Return type of functions returning nothing.
  Void,
  Scalar(ScalarKind),
  Vector(ScalarKind, Dim),
  /// Matrix; the [`MatrixDim`] provides the information required to know the exact dimension of the matrix.
  Matrix(ScalarKind, MatrixDim),
  Opaque(OpaqueType),
  Struct(Arc<StructType>),
  Array(Box<Type>, ArraySize),
}

impl Type {
  pub const BOOL: Type = Type::Scalar(ScalarKind::Bool);
  pub const INT: Type = Type::Scalar(ScalarKind::Int);
  pub const UINT: Type = Type::Scalar(ScalarKind::UInt);
  pub const FLOAT: Type = Type::Scalar(ScalarKind::Float);
  pub const DOUBLE: Type = Type::Scalar(ScalarKind::Double);

  /// Vector of `len` components, or a scalar if `len` is 1.
  pub fn vector(kind: ScalarKind, len: usize) -> Option<Self> {
    if len == 1 {
      Some(Type::Scalar(kind))
    } else {
      Dim::from_len(len).map(|dim| Type::Vector(kind, dim))
    }
  }

  pub fn array(self, size: ArraySize) -> Self {
    Type::Array(Box::new(self), size)
  }

  /// Look a type up by its GLSL name.
  ///
  /// Struct names are not known here; see [`SymbolTable::lookup_struct`](crate::table::SymbolTable::lookup_struct).
  pub fn from_name(name: &str) -> Option<Self> {
    if name == "void" {
      return Some(Type::Void);
    }

    if let Some(kind) = ScalarKind::from_name(name) {
      return Some(Type::Scalar(kind));
    }

    if let Some((prefix, dims)) = name.split_once("vec") {
      let kind = ScalarKind::from_vector_prefix(prefix)?;
      return match dims {
        "2" => Some(Type::Vector(kind, Dim::D2)),
        "3" => Some(Type::Vector(kind, Dim::D3)),
        "4" => Some(Type::Vector(kind, Dim::D4)),
        _ => None,
      };
    }

    if let Some((prefix, dims)) = name.split_once("mat") {
      let kind = match prefix {
        "" | "f32" => ScalarKind::Float,
        "d" | "f64" => ScalarKind::Double,
        "f16" => ScalarKind::Float16,
        _ => return OpaqueType::from_name(name).map(Type::Opaque),
      };

      let dim = |s: &str| match s {
        "2" => Some(Dim::D2),
        "3" => Some(Dim::D3),
        "4" => Some(Dim::D4),
        _ => None,
      };

      let (cols, rows) = match dims.split_once('x') {
        Some((cols, rows)) => (dim(cols)?, dim(rows)?),
        None => {
          let n = dim(dims)?;
          (n, n)
        }
      };

      return Some(Type::Matrix(kind, MatrixDim::new(cols, rows)));
    }

    OpaqueType::from_name(name).map(Type::Opaque)
  }

  /// Component kind of scalars, vectors and matrices.
  pub fn scalar_kind(&self) -> Option<ScalarKind> {
    match *self {
      Type::Scalar(kind) | Type::Vector(kind, _) | Type::Matrix(kind, _) => Some(kind),
      _ => None,
    }
  }

  /// Same shape, different component kind. `None` for types without components.
  pub fn with_scalar_kind(&self, kind: ScalarKind) -> Option<Self> {
    match *self {
      Type::Scalar(_) => Some(Type::Scalar(kind)),
      Type::Vector(_, dim) => Some(Type::Vector(kind, dim)),
      Type::Matrix(_, dim) if kind.matrix_prefix().is_some() => Some(Type::Matrix(kind, dim)),
      _ => None,
    }
  }

  pub fn is_scalar(&self) -> bool {
    matches!(self, Type::Scalar(_))
  }

  pub fn is_void(&self) -> bool {
    matches!(self, Type::Void)
  }

  pub fn is_numeric(&self) -> bool {
    self.scalar_kind().map_or(false, ScalarKind::is_numeric)
  }

  /// Whether the type mentions `kind` anywhere, including struct fields and array elements.
  pub fn mentions(&self, kind: ScalarKind) -> bool {
    match self {
      Type::Scalar(k) | Type::Vector(k, _) | Type::Matrix(k, _) => *k == kind,
      Type::Opaque(OpaqueType::Sampler(desc)) | Type::Opaque(OpaqueType::Image(desc)) => desc.sampled == kind,
      Type::Opaque(OpaqueType::SubpassInput { sampled, .. }) => *sampled == kind,
      Type::Opaque(_) | Type::Void => false,
      Type::Struct(s) => s.fields.iter().any(|field| field.ty.mentions(kind)),
      Type::Array(elem, _) => elem.mentions(kind),
    }
  }
}

impl From<ScalarKind> for Type {
  fn from(kind: ScalarKind) -> Self {
    Type::Scalar(kind)
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    crate::writer::glsl::write_type(f, self)
  }
}

/// Storage, interpolation, precision, memory or parameter qualifier.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Qualifier {
  In,
  Out,
  InOut,
  Patch,
  Flat,
  Const,
  ReadOnly,
  WriteOnly,
  HighP,
  MediumP,
  LowP,
  Volatile,
  Coherent,
  Restrict,
  Uniform,
  Shared,
  Centroid,
  Smooth,
  NoPerspective,
  Invariant,
  Precise,
}

impl Qualifier {
  pub const ALL: [Qualifier; 21] = [
    Qualifier::In,
    Qualifier::Out,
    Qualifier::InOut,
    Qualifier::Patch,
    Qualifier::Flat,
    Qualifier::Const,
    Qualifier::ReadOnly,
    Qualifier::WriteOnly,
    Qualifier::HighP,
    Qualifier::MediumP,
    Qualifier::LowP,
    Qualifier::Volatile,
    Qualifier::Coherent,
    Qualifier::Restrict,
    Qualifier::Uniform,
    Qualifier::Shared,
    Qualifier::Centroid,
    Qualifier::Smooth,
    Qualifier::NoPerspective,
    Qualifier::Invariant,
    Qualifier::Precise,
  ];

  pub fn keyword(self) -> &'static str {
    match self {
      Qualifier::In => "in",
      Qualifier::Out => "out",
      Qualifier::InOut => "inout",
      Qualifier::Patch => "patch",
      Qualifier::Flat => "flat",
      Qualifier::Const => "const",
      Qualifier::ReadOnly => "readonly",
      Qualifier::WriteOnly => "writeonly",
      Qualifier::HighP => "highp",
      Qualifier::MediumP => "mediump",
      Qualifier::LowP => "lowp",
      Qualifier::Volatile => "volatile",
      Qualifier::Coherent => "coherent",
      Qualifier::Restrict => "restrict",
      Qualifier::Uniform => "uniform",
      Qualifier::Shared => "shared",
      Qualifier::Centroid => "centroid",
      Qualifier::Smooth => "smooth",
      Qualifier::NoPerspective => "noperspective",
      Qualifier::Invariant => "invariant",
      Qualifier::Precise => "precise",
    }
  }

  pub fn from_keyword(keyword: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|q| q.keyword() == keyword)
  }

  /// The set holding only this qualifier.
  pub fn flag(self) -> QualifierSet {
    match self {
      Qualifier::In => QualifierSet::IN,
      Qualifier::Out => QualifierSet::OUT,
      Qualifier::InOut => QualifierSet::INOUT,
      Qualifier::Patch => QualifierSet::PATCH,
      Qualifier::Flat => QualifierSet::FLAT,
      Qualifier::Const => QualifierSet::CONST,
      Qualifier::ReadOnly => QualifierSet::READONLY,
      Qualifier::WriteOnly => QualifierSet::WRITEONLY,
      Qualifier::HighP => QualifierSet::HIGHP,
      Qualifier::MediumP => QualifierSet::MEDIUMP,
      Qualifier::LowP => QualifierSet::LOWP,
      Qualifier::Volatile => QualifierSet::VOLATILE,
      Qualifier::Coherent => QualifierSet::COHERENT,
      Qualifier::Restrict => QualifierSet::RESTRICT,
      Qualifier::Uniform => QualifierSet::UNIFORM,
      Qualifier::Shared => QualifierSet::SHARED,
      Qualifier::Centroid => QualifierSet::CENTROID,
      Qualifier::Smooth => QualifierSet::SMOOTH,
      Qualifier::NoPerspective => QualifierSet::NOPERSPECTIVE,
      Qualifier::Invariant => QualifierSet::INVARIANT,
      Qualifier::Precise => QualifierSet::PRECISE,
    }
  }
}

bitflags! {
  /// Set of [`Qualifier`]s attached to a declared entity.
  #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
  pub struct QualifierSet: u32 {
    const IN = 1 << 0;
    const OUT = 1 << 1;
    const INOUT = 1 << 2;
    const PATCH = 1 << 3;
    const FLAT = 1 << 4;
    const CONST = 1 << 5;
    const READONLY = 1 << 6;
    const WRITEONLY = 1 << 7;
    const HIGHP = 1 << 8;
    const MEDIUMP = 1 << 9;
    const LOWP = 1 << 10;
    const VOLATILE = 1 << 11;
    const COHERENT = 1 << 12;
    const RESTRICT = 1 << 13;
    const UNIFORM = 1 << 14;
    const SHARED = 1 << 15;
    const CENTROID = 1 << 16;
    const SMOOTH = 1 << 17;
    const NOPERSPECTIVE = 1 << 18;
    const INVARIANT = 1 << 19;
    const PRECISE = 1 << 20;
  }
}

impl QualifierSet {
  /// Iterate over the qualifiers, in canonical order.
  pub fn qualifiers(self) -> impl Iterator<Item = Qualifier> {
    Qualifier::ALL.into_iter().filter(move |q| self.contains(q.flag()))
  }

  /// Data flow direction, if the set carries one.
  pub fn direction(self) -> Option<Direction> {
    let input = self.contains(QualifierSet::IN);
    let output = self.contains(QualifierSet::OUT);

    if self.contains(QualifierSet::INOUT) || (input && output) {
      Some(Direction::InOut)
    } else if output {
      Some(Direction::Out)
    } else if input {
      Some(Direction::In)
    } else {
      None
    }
  }
}

impl From<Qualifier> for QualifierSet {
  fn from(q: Qualifier) -> Self {
    q.flag()
  }
}

impl FromIterator<Qualifier> for QualifierSet {
  fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = Qualifier>,
  {
    iter.into_iter().map(Qualifier::flag).collect()
  }
}

impl fmt::Debug for QualifierSet {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_set().entries(self.qualifiers().map(Qualifier::keyword)).finish()
  }
}

/// Data flow direction of a parameter or a stage interface variable.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
  In,
  Out,
  InOut,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scalar_names() {
    for kind in ScalarKind::ALL {
      assert_eq!(Type::from_name(kind.name()), Some(Type::Scalar(kind)));
    }

    assert_eq!(Type::from_name("int32_t"), Some(Type::INT));
    assert_eq!(Type::from_name("float64_t"), Some(Type::DOUBLE));
    assert_eq!(Type::from_name("void"), Some(Type::Void));
    assert_eq!(Type::from_name("int128_t"), None);
  }

  #[test]
  fn vector_names() {
    assert_eq!(Type::from_name("vec4"), Some(Type::Vector(ScalarKind::Float, Dim::D4)));
    assert_eq!(Type::from_name("bvec2"), Some(Type::Vector(ScalarKind::Bool, Dim::D2)));
    assert_eq!(Type::from_name("u64vec3"), Some(Type::Vector(ScalarKind::UInt64, Dim::D3)));
    assert_eq!(Type::from_name("f16vec2"), Some(Type::Vector(ScalarKind::Float16, Dim::D2)));
    assert_eq!(Type::from_name("i32vec2"), Some(Type::Vector(ScalarKind::Int, Dim::D2)));
    assert_eq!(Type::from_name("vec5"), None);
    assert_eq!(Type::from_name("xvec2"), None);
  }

  #[test]
  fn matrix_names() {
    assert_eq!(
      Type::from_name("mat3"),
      Some(Type::Matrix(ScalarKind::Float, MatrixDim::D33))
    );
    assert_eq!(
      Type::from_name("mat4x3"),
      Some(Type::Matrix(ScalarKind::Float, MatrixDim::D43))
    );
    assert_eq!(
      Type::from_name("dmat2x4"),
      Some(Type::Matrix(ScalarKind::Double, MatrixDim::D24))
    );
    assert_eq!(
      Type::from_name("f16mat3x2"),
      Some(Type::Matrix(ScalarKind::Float16, MatrixDim::D32))
    );
    assert_eq!(Type::from_name("imat2"), None);
    assert_eq!(Type::from_name("mat5"), None);
  }

  #[test]
  fn matrix_dims() {
    assert_eq!(MatrixDim::D43.cols(), Dim::D4);
    assert_eq!(MatrixDim::D43.rows(), Dim::D3);
    assert_eq!(MatrixDim::D43.transpose(), MatrixDim::D34);
    assert!(MatrixDim::D22.is_square());
  }

  #[test]
  fn opaque_names() {
    assert_eq!(
      Type::from_name("sampler2DArrayShadow"),
      Some(Type::Opaque(OpaqueType::Sampler(SamplerDesc {
        sampled: ScalarKind::Float,
        dim: SamplerDim::D2,
        array: true,
        multisample: false,
        shadow: true,
      })))
    );
    assert_eq!(
      Type::from_name("usampler2DMSArray"),
      Some(Type::Opaque(OpaqueType::Sampler(SamplerDesc {
        sampled: ScalarKind::UInt,
        dim: SamplerDim::D2,
        array: true,
        multisample: true,
        shadow: false,
      })))
    );
    assert_eq!(
      Type::from_name("iimage2DRect"),
      Some(Type::Opaque(OpaqueType::Image(SamplerDesc {
        sampled: ScalarKind::Int,
        dim: SamplerDim::Rect,
        array: false,
        multisample: false,
        shadow: false,
      })))
    );
    assert_eq!(
      Type::from_name("imageCubeArray"),
      Some(Type::Opaque(OpaqueType::Image(SamplerDesc {
        sampled: ScalarKind::Float,
        dim: SamplerDim::Cube,
        array: true,
        multisample: false,
        shadow: false,
      })))
    );
    assert_eq!(
      Type::from_name("usubpassInputMS"),
      Some(Type::Opaque(OpaqueType::SubpassInput {
        sampled: ScalarKind::UInt,
        multisample: true
      }))
    );
    assert_eq!(Type::from_name("atomic_uint"), Some(Type::Opaque(OpaqueType::AtomicUint)));
    assert_eq!(
      Type::from_name("rayQueryEXT"),
      Some(Type::Opaque(OpaqueType::RayQueryExt))
    );

    assert_eq!(Type::from_name("isampler2DShadow"), None);
    assert_eq!(Type::from_name("image2DShadow"), None);
    assert_eq!(Type::from_name("sampler3DArray"), None);
    assert_eq!(Type::from_name("samplerBufferMS"), None);
  }

  #[test]
  fn promotion_chain() {
    use ScalarKind::*;

    assert!(Int.converts_to(UInt));
    assert!(Int.converts_to(Int64));
    assert!(Int8.converts_to(Int));
    assert!(Float16.converts_to(Float));
    assert!(Float.converts_to(Double));

    assert!(!UInt.converts_to(Int));
    assert!(!Int.converts_to(Float));
    assert!(!UInt.converts_to(Double));
    assert!(!Double.converts_to(Float));
    assert!(!Bool.converts_to(Int));
    assert!(!Int.converts_to(Int));

    assert!(UInt8.promotes_to(Int));
    assert!(Int16.promotes_to(Int));
    assert!(Float16.promotes_to(Double));
    assert!(Float.promotes_to(Double));
    assert!(!Float16.promotes_to(Float));
    assert!(!Int.promotes_to(UInt));
    assert!(!UInt8.promotes_to(UInt));
    assert!(!Int.promotes_to(Int64));

    // every promotion is a conversion
    for from in ScalarKind::ALL {
      for to in ScalarKind::ALL {
        assert!(!from.promotes_to(to) || from.converts_to(to), "{from:?} -> {to:?}");
      }
    }
  }

  #[test]
  fn qualifier_direction() {
    let q: QualifierSet = [Qualifier::Patch, Qualifier::Out].into_iter().collect();
    assert_eq!(q.direction(), Some(Direction::Out));

    let q = QualifierSet::INOUT;
    assert_eq!(q.direction(), Some(Direction::InOut));
    assert_eq!((QualifierSet::IN | QualifierSet::OUT).direction(), Some(Direction::InOut));

    let q = QualifierSet::WRITEONLY | QualifierSet::READONLY;
    assert_eq!(q.direction(), None);
    assert_eq!(
      q.qualifiers().map(Qualifier::keyword).collect::<Vec<_>>(),
      vec!["readonly", "writeonly"]
    );
    assert_eq!(format!("{q:?}"), r#"{"readonly", "writeonly"}"#);
  }

  #[test]
  fn qualifier_flags() {
    let all: QualifierSet = Qualifier::ALL.into_iter().collect();
    assert_eq!(all, QualifierSet::all());

    for q in Qualifier::ALL {
      assert_eq!(q.flag().bits().count_ones(), 1);
      assert_eq!(Qualifier::from_keyword(q.keyword()), Some(q));
      assert!(QualifierSet::from(q).qualifiers().eq([q]));
    }
  }

  #[test]
  fn mentions_kind() {
    let f16 = Type::Vector(ScalarKind::Float16, Dim::D3).array(ArraySize::Fixed(2));
    assert!(f16.mentions(ScalarKind::Float16));
    assert!(!Type::FLOAT.mentions(ScalarKind::Float16));
  }
}
