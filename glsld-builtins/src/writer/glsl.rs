//! GLSL writers.

use crate::{
  predicate::Predicate,
  symbol::{Constant, Parameter, Signature, Variable},
  table::SymbolRef,
  types::{ArraySize, MatrixDim, OpaqueType, QualifierSet, SamplerDesc, StructType, Type},
  value::ConstValue,
};
use std::fmt;

// Number of space an indent level represents.
const INDENT_SPACES: usize = 4;

/// Write a [`SymbolRef`] to a [`String`].
pub fn write_symbol_to_str(symbol: &SymbolRef) -> Result<String, fmt::Error> {
  let mut output = String::new();
  write_symbol(&mut output, symbol)?;
  Ok(output)
}

/// Write the declaration of a visible symbol, as it would read in the builtin declarations.
///
/// Function symbols write one prototype per visible overload, one per line.
pub fn write_symbol(f: &mut impl fmt::Write, symbol: &SymbolRef) -> Result<(), fmt::Error> {
  match symbol {
    SymbolRef::Constant(constant) => write_constant(f, constant),
    SymbolRef::Variable(variable) => write_variable(f, variable),
    SymbolRef::Struct(shape) => write_block(f, shape),

    SymbolRef::Function { overloads, .. } => {
      for (i, sig) in overloads.iter().enumerate() {
        if i > 0 {
          f.write_str("\n")?;
        }

        write_signature(f, sig)?;
        f.write_str(";")?;
      }

      Ok(())
    }
  }
}

/// Write a function prototype, without the trailing semicolon.
pub fn write_signature(f: &mut impl fmt::Write, sig: &Signature) -> Result<(), fmt::Error> {
  write_type(f, &sig.return_type)?;
  write!(f, " {}(", sig.name)?;

  if !sig.params.is_empty() {
    write_param(f, &sig.params[0])?;

    for param in &sig.params[1..] {
      f.write_str(", ")?;
      write_param(f, param)?;
    }
  }

  f.write_str(")")
}

fn write_param(f: &mut impl fmt::Write, param: &Parameter) -> Result<(), fmt::Error> {
  write_qualifiers(f, param.qualifiers)?;

  match param.name {
    Some(ref name) => write_declarator(f, &param.ty, name),
    None => write_type(f, &param.ty),
  }
}

pub fn write_constant(f: &mut impl fmt::Write, constant: &Constant) -> Result<(), fmt::Error> {
  write_qualifiers(f, constant.qualifiers)?;
  write_declarator(f, &constant.ty, &constant.name)?;
  f.write_str(" = ")?;
  write_const_value(f, &constant.value)?;
  f.write_str(";")
}

pub fn write_variable(f: &mut impl fmt::Write, variable: &Variable) -> Result<(), fmt::Error> {
  write_qualifiers(f, variable.qualifiers)?;
  write_declarator(f, &variable.ty, &variable.name)?;
  f.write_str(";")
}

fn write_block(f: &mut impl fmt::Write, shape: &StructType) -> Result<(), fmt::Error> {
  write!(f, "{} {{\n", shape.name)?;

  for field in &shape.fields {
    write_indent(f, 1)?;
    write_qualifiers(f, field.qualifiers)?;
    write_declarator(f, &field.ty, &field.name)?;
    f.write_str(";\n")?;
  }

  f.write_str("};")
}

/// Write every qualifier of the set, each followed by a space.
pub fn write_qualifiers(f: &mut impl fmt::Write, qualifiers: QualifierSet) -> Result<(), fmt::Error> {
  for q in qualifiers.qualifiers() {
    write!(f, "{} ", q.keyword())?;
  }

  Ok(())
}

// `float gl_ClipDistance[]`: array dimensions go after the name.
fn write_declarator(f: &mut impl fmt::Write, ty: &Type, name: &str) -> Result<(), fmt::Error> {
  let mut elem = ty;
  let mut sizes = Vec::new();

  while let Type::Array(inner, size) = elem {
    sizes.push(*size);
    elem = inner;
  }

  write_type(f, elem)?;
  write!(f, " {}", name)?;

  for size in sizes {
    write_array_size(f, size)?;
  }

  Ok(())
}

pub fn write_type(f: &mut impl fmt::Write, ty: &Type) -> Result<(), fmt::Error> {
  match ty {
    Type::Void => f.write_str("void"),
    Type::Scalar(kind) => f.write_str(kind.name()),
    Type::Vector(kind, dim) => write!(f, "{}vec{}", kind.vector_prefix(), dim.len()),

    Type::Matrix(kind, dim) => {
      f.write_str(kind.matrix_prefix().unwrap_or_default())?;
      write_matrix_dim(f, *dim)
    }

    Type::Opaque(opaque) => write_opaque_type(f, opaque),
    Type::Struct(shape) => f.write_str(&shape.name),

    Type::Array(elem, size) => {
      write_type(f, elem)?;
      write_array_size(f, *size)
    }
  }
}

fn write_matrix_dim(f: &mut impl fmt::Write, dim: MatrixDim) -> Result<(), fmt::Error> {
  if dim.is_square() {
    write!(f, "mat{}", dim.cols().len())
  } else {
    write!(f, "mat{}x{}", dim.cols().len(), dim.rows().len())
  }
}

fn write_array_size(f: &mut impl fmt::Write, size: ArraySize) -> Result<(), fmt::Error> {
  match size {
    ArraySize::Fixed(n) => write!(f, "[{}]", n),
    ArraySize::Implicit => f.write_str("[]"),
  }
}

fn write_opaque_type(f: &mut impl fmt::Write, opaque: &OpaqueType) -> Result<(), fmt::Error> {
  match opaque {
    OpaqueType::Sampler(desc) => write_sampler_like(f, "sampler", desc),
    OpaqueType::Image(desc) => write_sampler_like(f, "image", desc),

    OpaqueType::SubpassInput { sampled, multisample } => {
      write!(f, "{}subpassInput", sampled.vector_prefix())?;

      if *multisample {
        f.write_str("MS")?;
      }

      Ok(())
    }

    OpaqueType::AtomicUint => f.write_str("atomic_uint"),
    OpaqueType::AccelerationStructureExt => f.write_str("accelerationStructureEXT"),
    OpaqueType::AccelerationStructureNv => f.write_str("accelerationStructureNV"),
    OpaqueType::RayQueryExt => f.write_str("rayQueryEXT"),
  }
}

fn write_sampler_like(f: &mut impl fmt::Write, base: &str, desc: &SamplerDesc) -> Result<(), fmt::Error> {
  write!(f, "{}{}{}", desc.sampled.vector_prefix(), base, desc.dim.suffix())?;

  if desc.multisample {
    f.write_str("MS")?;
  }

  if desc.array {
    f.write_str("Array")?;
  }

  if desc.shadow {
    f.write_str("Shadow")?;
  }

  Ok(())
}

pub fn write_const_value(f: &mut impl fmt::Write, value: &ConstValue) -> Result<(), fmt::Error> {
  match value {
    ConstValue::Bool(b) => write!(f, "{}", b),
    ConstValue::Int(i) => write!(f, "{}", i),
    ConstValue::UInt(u) => write!(f, "{}u", u),
    ConstValue::Float(x) => f.write_str(&write_f64(*x)),

    ConstValue::Aggregate(values) => {
      f.write_str("{")?;

      for (i, value) in values.iter().enumerate() {
        if i > 0 {
          f.write_str(", ")?;
        }

        write_const_value(f, value)?;
      }

      f.write_str("}")
    }
  }
}

fn write_f64(x: f64) -> String {
  if x == 0. {
    return "0.".to_owned();
  }

  let s = x.abs().to_string();
  let sign = if x < 0. { "-" } else { "" };

  if x.trunc() == 0. {
    // 0.5 -> .5
    format!("{}{}", sign, &s[1..])
  } else if x.fract() == 0. {
    format!("{}{}.", sign, s)
  } else {
    format!("{}{}", sign, s)
  }
}

/// Write a predicate as an `#if` condition.
pub fn write_predicate(f: &mut impl fmt::Write, predicate: &Predicate) -> Result<(), fmt::Error> {
  match predicate {
    Predicate::True => f.write_str("1"),
    Predicate::Flag(flag) => f.write_str(flag.macro_name()),

    Predicate::Not(inner) => {
      f.write_str("!")?;
      write_predicate_operand(f, inner)
    }

    Predicate::And(terms) if terms.is_empty() => f.write_str("1"),
    Predicate::Or(terms) if terms.is_empty() => f.write_str("0"),

    Predicate::And(terms) => write_predicate_terms(f, terms, " && "),
    Predicate::Or(terms) => write_predicate_terms(f, terms, " || "),
  }
}

fn write_predicate_terms(f: &mut impl fmt::Write, terms: &[Predicate], sep: &str) -> Result<(), fmt::Error> {
  for (i, term) in terms.iter().enumerate() {
    if i > 0 {
      f.write_str(sep)?;
    }

    write_predicate_operand(f, term)?;
  }

  Ok(())
}

// Operands of `!`, `&&` and `||` get parenthesized unless atomic.
fn write_predicate_operand(f: &mut impl fmt::Write, predicate: &Predicate) -> Result<(), fmt::Error> {
  match predicate {
    Predicate::True | Predicate::Flag(_) | Predicate::Not(_) => write_predicate(f, predicate),
    Predicate::And(terms) | Predicate::Or(terms) if terms.is_empty() => write_predicate(f, predicate),

    _ => {
      f.write_str("(")?;
      write_predicate(f, predicate)?;
      f.write_str(")")
    }
  }
}

fn write_indent(f: &mut impl fmt::Write, indent_lvl: usize) -> Result<(), fmt::Error> {
  write!(f, "{:width$}", "", width = INDENT_SPACES * indent_lvl)
}
