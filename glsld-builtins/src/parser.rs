//! Declaration parser.
//!
//! Turns [`DeclarationFragment`]s into typed [`Declaration`]s. The accepted language is the small subset of GLSL the
//! builtin declaration text is written in:
//!
//! - Function prototypes: `highp uint packUnorm2x16(vec2 v);`, with `in`, `out` and `inout` parameters.
//! - Variables: `flat in int gl_PrimitiveID;`, `patch out float gl_TessLevelOuter[4];`.
//! - Constants with literal initializers: `const ivec3 gl_MaxComputeWorkGroupCount = { 65535, 65535, 65535 };`.
//! - Interface blocks, named or anonymous: `in gl_PerVertex { vec4 gl_Position; … } gl_in[gl_MaxPatchVertices];`.
//!
//! Line comments starting their line right before a declaration become its documentation.

use crate::{
  directive::DeclarationFragment,
  lexer::{LexError, Lexer, Punct, Token, TokenKind},
  predicate::Predicate,
  symbol::{Constant, Parameter, Signature, Variable},
  types::{ArraySize, Direction, Qualifier, QualifierSet, StructField, StructType, Type},
  value::ConstValue,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Parsed declaration with the predicate governing it.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
  pub predicate: Arc<Predicate>,
  /// 1-based line in the whole declaration text.
  pub line: usize,
  pub kind: DeclarationKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeclarationKind {
  Constant(Constant),
  Variable(Variable),
  /// Shape of an interface block.
  Struct(Arc<StructType>),
  Function(Signature),
}

impl Declaration {
  /// Name of the declared symbol.
  pub fn name(&self) -> &str {
    match &self.kind {
      DeclarationKind::Constant(c) => &c.name,
      DeclarationKind::Variable(v) => &v.name,
      DeclarationKind::Struct(s) => &s.name,
      DeclarationKind::Function(f) => &f.name,
    }
  }
}

/// Declaration text that does not match any recognized shape.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("line {line}: {reason}: `{text}`")]
pub struct ParseFailure {
  pub line: usize,
  /// Offending source line.
  pub text: String,
  pub reason: String,
}

/// Parse a fragment with a fresh [`DeclParser`].
pub fn parse(fragment: &DeclarationFragment) -> Result<Vec<Declaration>, ParseFailure> {
  DeclParser::new().parse(fragment)
}

/// Stateful declaration parser.
///
/// The same parser must be used for every fragment of a build, in order: array sizes may name integer constants and
/// variables may use interface blocks declared by earlier fragments.
#[derive(Debug, Default)]
pub struct DeclParser {
  int_constants: HashMap<String, i64>,
  structs: HashMap<String, Arc<StructType>>,
}

impl DeclParser {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse every declaration of `fragment`.
  pub fn parse(&mut self, fragment: &DeclarationFragment) -> Result<Vec<Declaration>, ParseFailure> {
    let tokens = Lexer::new(&fragment.text)
      .collect::<Result<Vec<_>, _>>()
      .map_err(|LexError { line, reason }| failure(fragment, line, reason))?;

    let mut cursor = Cursor {
      fragment,
      tokens: &tokens,
      pos: 0,
    };
    let mut decls = Vec::new();

    loop {
      let doc = cursor.docs();
      if cursor.at_end() {
        break;
      }

      self.declaration(&mut cursor, doc, &mut decls)?;
    }

    Ok(decls)
  }

  fn declaration(
    &mut self,
    cursor: &mut Cursor,
    doc: Option<String>,
    decls: &mut Vec<Declaration>,
  ) -> Result<(), ParseFailure> {
    let line = cursor.line();
    let qualifiers = cursor.qualifiers();
    let type_name = cursor.expect_ident("expected a type name")?;

    if cursor.eat(Punct::LBrace) {
      return self.block(cursor, line, qualifiers, type_name, doc, decls);
    }

    let ty = self.resolve_type(cursor, type_name)?;
    let ty = self.array_suffix(cursor, ty)?;
    let name = cursor.expect_ident("expected a declaration name")?;

    if cursor.eat(Punct::LParen) {
      let params = self.params(cursor)?;
      cursor.expect(Punct::Semicolon)?;

      decls.push(cursor.declaration(
        line,
        DeclarationKind::Function(Signature {
          name: name.to_owned(),
          return_type: ty,
          params,
          predicate: cursor.fragment.predicate.clone(),
          doc,
        }),
      ));

      return Ok(());
    }

    // one or several declarators sharing the type and qualifiers
    let mut name = name;
    loop {
      let ty = self.array_suffix(cursor, ty.clone())?;

      let kind = if qualifiers.contains(QualifierSet::CONST) {
        if !cursor.eat(Punct::Equal) {
          return Err(cursor.fail("constant without initializer"));
        }

        let value = self
          .initializer(cursor)?
          .coerce(&ty)
          .ok_or_else(|| cursor.fail("initializer does not match the declared type"))?;

        if let Some(i) = value.as_int() {
          self.int_constants.insert(name.to_owned(), i);
        }

        DeclarationKind::Constant(Constant {
          name: name.to_owned(),
          ty,
          qualifiers,
          value,
          doc: doc.clone(),
        })
      } else {
        if cursor.peek_punct(Punct::Equal) {
          return Err(cursor.fail("initializer on a non-constant declaration"));
        }

        DeclarationKind::Variable(Variable {
          name: name.to_owned(),
          ty,
          qualifiers,
          direction: qualifiers.direction(),
          block: None,
          doc: doc.clone(),
        })
      };

      decls.push(cursor.declaration(line, kind));

      if !cursor.eat(Punct::Comma) {
        break;
      }

      name = cursor.expect_ident("expected a declaration name")?;
    }

    cursor.expect(Punct::Semicolon)
  }

  fn params(&self, cursor: &mut Cursor) -> Result<Vec<Parameter>, ParseFailure> {
    let mut params = Vec::new();

    if cursor.eat(Punct::RParen) {
      return Ok(params);
    }

    if cursor.peek_ident() == Some("void") && cursor.peek_punct_at(1, Punct::RParen) {
      cursor.bump();
      cursor.bump();
      return Ok(params);
    }

    loop {
      let qualifiers = cursor.qualifiers();
      let type_name = cursor.expect_ident("expected a parameter type")?;
      let ty = self.resolve_type(cursor, type_name)?;
      let ty = self.array_suffix(cursor, ty)?;

      let name = match cursor.peek_ident() {
        Some(name) => {
          cursor.bump();
          Some(name.to_owned())
        }
        None => None,
      };
      let ty = self.array_suffix(cursor, ty)?;

      if has_implicit_size(&ty) {
        return Err(cursor.fail("unsized array parameter"));
      }

      params.push(Parameter {
        name,
        ty,
        qualifiers,
        direction: qualifiers.direction().unwrap_or(Direction::In),
      });

      if !cursor.eat(Punct::Comma) {
        break;
      }
    }

    cursor.expect(Punct::RParen)?;
    Ok(params)
  }

  fn block(
    &mut self,
    cursor: &mut Cursor,
    line: usize,
    qualifiers: QualifierSet,
    block_name: &str,
    doc: Option<String>,
    decls: &mut Vec<Declaration>,
  ) -> Result<(), ParseFailure> {
    let mut fields = Vec::new();

    while !cursor.eat(Punct::RBrace) {
      if cursor.at_end() {
        return Err(cursor.fail("unterminated interface block"));
      }

      let field_qualifiers = cursor.qualifiers();
      let type_name = cursor.expect_ident("expected a field type")?;
      let ty = self.resolve_type(cursor, type_name)?;
      let ty = self.array_suffix(cursor, ty)?;

      loop {
        let name = cursor.expect_ident("expected a field name")?;
        let ty = self.array_suffix(cursor, ty.clone())?;

        fields.push(StructField {
          name: name.to_owned(),
          ty,
          qualifiers: field_qualifiers,
        });

        if !cursor.eat(Punct::Comma) {
          break;
        }
      }

      cursor.expect(Punct::Semicolon)?;
    }

    // unsized fields may only close the block
    let first_unsized = fields.iter().position(|field| has_implicit_size(&field.ty));
    if let Some(first) = first_unsized {
      if fields[first..].iter().any(|field| !has_implicit_size(&field.ty)) {
        return Err(cursor.fail("unsized array field followed by a sized field"));
      }
    }

    let shape = Arc::new(StructType {
      name: block_name.to_owned(),
      fields,
    });
    self.structs.insert(block_name.to_owned(), shape.clone());
    decls.push(cursor.declaration(line, DeclarationKind::Struct(shape.clone())));

    match cursor.peek_ident() {
      Some(instance) => {
        cursor.bump();
        let ty = self.array_suffix(cursor, Type::Struct(shape))?;

        decls.push(cursor.declaration(
          line,
          DeclarationKind::Variable(Variable {
            name: instance.to_owned(),
            ty,
            qualifiers,
            direction: qualifiers.direction(),
            block: None,
            doc,
          }),
        ));
      }

      None => {
        for field in &shape.fields {
          let qualifiers = qualifiers.union(field.qualifiers);

          decls.push(cursor.declaration(
            line,
            DeclarationKind::Variable(Variable {
              name: field.name.clone(),
              ty: field.ty.clone(),
              qualifiers,
              direction: qualifiers.direction(),
              block: Some(block_name.to_owned()),
              doc: doc.clone(),
            }),
          ));
        }
      }
    }

    cursor.expect(Punct::Semicolon)
  }

  fn resolve_type(&self, cursor: &Cursor, name: &str) -> Result<Type, ParseFailure> {
    Type::from_name(name)
      .or_else(|| self.structs.get(name).cloned().map(Type::Struct))
      .ok_or_else(|| cursor.fail(format!("unknown type `{}`", name)))
  }

  // Zero or more `[size]` suffixes; `float a[2][3]` is an array of two arrays of three floats.
  fn array_suffix(&self, cursor: &mut Cursor, ty: Type) -> Result<Type, ParseFailure> {
    let mut sizes = Vec::new();

    while cursor.eat(Punct::LBracket) {
      if cursor.eat(Punct::RBracket) {
        sizes.push(ArraySize::Implicit);
        continue;
      }

      let size = match cursor.bump().map(|token| &token.kind) {
        Some(TokenKind::Int { value, .. }) => *value,
        Some(TokenKind::Ident(name)) => {
          let value = self
            .int_constants
            .get(*name)
            .copied()
            .ok_or_else(|| cursor.fail(format!("unknown array size constant `{}`", name)))?;
          u64::try_from(value).map_err(|_| cursor.fail("negative array size"))?
        }
        _ => return Err(cursor.fail("expected an array size")),
      };

      let size = u32::try_from(size)
        .ok()
        .filter(|size| *size > 0)
        .ok_or_else(|| cursor.fail("invalid array size"))?;
      sizes.push(ArraySize::Fixed(size));
      cursor.expect(Punct::RBracket)?;
    }

    Ok(sizes.into_iter().rev().fold(ty, Type::array))
  }

  fn initializer(&self, cursor: &mut Cursor) -> Result<ConstValue, ParseFailure> {
    if cursor.eat(Punct::LBrace) {
      let values = self.initializer_list(cursor, Punct::RBrace)?;
      return Ok(ConstValue::Aggregate(values));
    }

    let negate = if cursor.eat(Punct::Minus) {
      true
    } else {
      cursor.eat(Punct::Plus);
      false
    };

    let value = match cursor.bump().map(|token| token.kind.clone()) {
      Some(TokenKind::Int { value, unsigned: true }) => ConstValue::UInt(value),
      Some(TokenKind::Int { value, .. }) => {
        ConstValue::Int(i64::try_from(value).map_err(|_| cursor.fail("integer literal out of range"))?)
      }
      Some(TokenKind::Float(x)) => ConstValue::Float(x),
      Some(TokenKind::Ident("true")) => ConstValue::Bool(true),
      Some(TokenKind::Ident("false")) => ConstValue::Bool(false),

      // constructor aggregate, e.g. `uvec3(1, 1, 1)`
      Some(TokenKind::Ident(ctor)) if Type::from_name(ctor).is_some() && cursor.peek_punct(Punct::LParen) => {
        cursor.bump();
        ConstValue::Aggregate(self.initializer_list(cursor, Punct::RParen)?)
      }

      Some(TokenKind::Ident(name)) => self
        .int_constants
        .get(name)
        .map(|i| ConstValue::Int(*i))
        .ok_or_else(|| cursor.fail(format!("unknown constant `{}`", name)))?,

      _ => return Err(cursor.fail("expected a literal initializer")),
    };

    if !negate {
      return Ok(value);
    }

    match value {
      ConstValue::Int(i) => Ok(ConstValue::Int(-i)),
      ConstValue::Float(x) => Ok(ConstValue::Float(-x)),
      _ => Err(cursor.fail("cannot negate this literal")),
    }
  }

  fn initializer_list(&self, cursor: &mut Cursor, close: Punct) -> Result<Vec<ConstValue>, ParseFailure> {
    let mut values = Vec::new();

    if cursor.eat(close) {
      return Ok(values);
    }

    loop {
      values.push(self.initializer(cursor)?);

      if !cursor.eat(Punct::Comma) {
        break;
      }
    }

    cursor.expect(close)?;
    Ok(values)
  }
}

fn has_implicit_size(ty: &Type) -> bool {
  match ty {
    Type::Array(elem, size) => *size == ArraySize::Implicit || has_implicit_size(elem),
    _ => false,
  }
}

fn failure(fragment: &DeclarationFragment, relative_line: usize, reason: impl Into<String>) -> ParseFailure {
  let text = fragment
    .text
    .lines()
    .nth(relative_line.saturating_sub(1))
    .unwrap_or_default()
    .trim()
    .to_owned();

  ParseFailure {
    line: fragment.line + relative_line.saturating_sub(1),
    text,
    reason: reason.into(),
  }
}

// Token cursor. Documentation tokens are invisible to everything but `docs`.
struct Cursor<'f, 't> {
  fragment: &'f DeclarationFragment<'f>,
  tokens: &'t [Token<'f>],
  pos: usize,
}

impl<'f, 't> Cursor<'f, 't> {
  fn skip_docs(&self, mut pos: usize) -> usize {
    while let Some(Token {
      kind: TokenKind::Doc(_),
      ..
    }) = self.tokens.get(pos)
    {
      pos += 1;
    }

    pos
  }

  fn nth(&self, n: usize) -> Option<&'t Token<'f>> {
    let mut pos = self.skip_docs(self.pos);
    for _ in 0..n {
      pos = self.skip_docs(pos + 1);
    }

    self.tokens.get(pos)
  }

  fn at_end(&self) -> bool {
    self.nth(0).is_none()
  }

  fn bump(&mut self) -> Option<&'t Token<'f>> {
    let pos = self.skip_docs(self.pos);
    let token = self.tokens.get(pos);
    self.pos = pos + 1;
    token
  }

  fn line(&self) -> usize {
    self
      .nth(0)
      .or_else(|| self.tokens.last())
      .map_or(1, |token| token.line)
  }

  // Consecutive documentation lines at the cursor, joined.
  fn docs(&mut self) -> Option<String> {
    let mut lines = Vec::new();

    while let Some(Token {
      kind: TokenKind::Doc(doc),
      ..
    }) = self.tokens.get(self.pos)
    {
      let doc: &'f str = *doc;
      lines.push(doc.strip_prefix(' ').unwrap_or(doc).trim_end());
      self.pos += 1;
    }

    if lines.is_empty() {
      None
    } else {
      Some(lines.join("\n"))
    }
  }

  fn peek_ident(&self) -> Option<&'f str> {
    match self.nth(0) {
      Some(Token {
        kind: TokenKind::Ident(ident),
        ..
      }) => Some(*ident),
      _ => None,
    }
  }

  fn peek_punct(&self, punct: Punct) -> bool {
    self.peek_punct_at(0, punct)
  }

  fn peek_punct_at(&self, n: usize, punct: Punct) -> bool {
    matches!(self.nth(n), Some(Token { kind: TokenKind::Punct(p), .. }) if *p == punct)
  }

  fn eat(&mut self, punct: Punct) -> bool {
    if self.peek_punct(punct) {
      self.bump();
      true
    } else {
      false
    }
  }

  fn expect(&mut self, punct: Punct) -> Result<(), ParseFailure> {
    if self.eat(punct) {
      Ok(())
    } else {
      Err(self.fail(format!("expected `{}`", punct.as_str())))
    }
  }

  fn expect_ident(&mut self, reason: &'static str) -> Result<&'f str, ParseFailure> {
    match self.peek_ident() {
      Some(ident) => {
        self.bump();
        Ok(ident)
      }
      None => Err(self.fail(reason)),
    }
  }

  fn qualifiers(&mut self) -> QualifierSet {
    let mut qualifiers = QualifierSet::empty();

    while let Some(q) = self.peek_ident().and_then(Qualifier::from_keyword) {
      qualifiers.insert(q.flag());
      self.bump();
    }

    qualifiers
  }

  fn fail(&self, reason: impl Into<String>) -> ParseFailure {
    let mut reason = reason.into();
    match self.nth(0) {
      Some(token) => reason.push_str(&format!(" (found `{}`)", token.kind)),
      None => reason.push_str(" (found end of input)"),
    }

    failure(self.fragment, self.line(), reason)
  }

  fn declaration(&self, line: usize, kind: DeclarationKind) -> Declaration {
    Declaration {
      predicate: self.fragment.predicate.clone(),
      line: self.fragment.line + line - 1,
      kind,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    env::Feature,
    types::{Dim, ScalarKind},
  };

  fn parse_text(text: &str) -> Vec<Declaration> {
    parse(&DeclarationFragment::unconditional(text)).unwrap()
  }

  fn single(text: &str) -> DeclarationKind {
    let mut decls = parse_text(text);
    assert_eq!(decls.len(), 1);
    decls.remove(0).kind
  }

  fn vec(kind: ScalarKind, dim: Dim) -> Type {
    Type::Vector(kind, dim)
  }

  #[test]
  fn function_prototype() {
    let DeclarationKind::Function(sig) = single("// Returns x to the y.\nfloat pow(float x, float y);") else {
      panic!("expected a function");
    };

    assert_eq!(sig.name, "pow");
    assert_eq!(sig.return_type, Type::FLOAT);
    assert_eq!(sig.param_types().cloned().collect::<Vec<_>>(), vec![Type::FLOAT, Type::FLOAT]);
    assert_eq!(sig.params[0].name.as_deref(), Some("x"));
    assert_eq!(sig.params[1].direction, Direction::In);
    assert_eq!(sig.doc.as_deref(), Some("Returns x to the y."));
  }

  #[test]
  fn function_qualifiers() {
    let DeclarationKind::Function(sig) = single("highp uint uaddCarry(highp uint x, highp uint y, out lowp uint carry);")
    else {
      panic!("expected a function");
    };

    assert_eq!(sig.return_type, Type::UINT);
    assert_eq!(sig.params[2].direction, Direction::Out);
    assert!(sig.params[2].qualifiers.contains(QualifierSet::LOWP));

    let DeclarationKind::Function(sig) = single("int atomicAdd(inout int mem, int data);") else {
      panic!("expected a function");
    };
    assert_eq!(sig.params[0].direction, Direction::InOut);

    let DeclarationKind::Function(sig) = single("int imageSamples(readonly writeonly image2DMS image_);") else {
      panic!("expected a function");
    };
    assert_eq!(sig.params[0].direction, Direction::In);
    assert!(sig.params[0].qualifiers.contains(QualifierSet::READONLY));
    assert!(sig.params[0].qualifiers.contains(QualifierSet::WRITEONLY));
  }

  #[test]
  fn empty_parameter_lists() {
    let DeclarationKind::Function(sig) = single("void barrier();") else {
      panic!("expected a function");
    };
    assert!(sig.params.is_empty());
    assert_eq!(sig.return_type, Type::Void);

    let DeclarationKind::Function(sig) = single("void EmitVertex(void);") else {
      panic!("expected a function");
    };
    assert!(sig.params.is_empty());
  }

  #[test]
  fn constants() {
    let decls = parse_text(
      "const int gl_MinProgramTexelOffset = -8;\n\
       const uint gl_RayFlagsOpaqueEXT = 1U;\n\
       const int gl_SemanticsMakeVisible = 0x4000;\n\
       const int gl_MaxGeometryVaryingComponents = 64; // deprecated\n\
       const highp int gl_MaxInputAttachments = 1;",
    );

    let values: Vec<_> = decls
      .iter()
      .map(|d| match &d.kind {
        DeclarationKind::Constant(c) => c.value.clone(),
        _ => panic!("expected a constant"),
      })
      .collect();

    assert_eq!(
      values,
      vec![
        ConstValue::Int(-8),
        ConstValue::UInt(1),
        ConstValue::Int(0x4000),
        ConstValue::Int(64),
        ConstValue::Int(1)
      ]
    );

    // trailing comments are not documentation
    for decl in &decls {
      let DeclarationKind::Constant(c) = &decl.kind else {
        unreachable!()
      };
      assert_eq!(c.doc, None);
    }

    assert_eq!(decls[3].line, 4);
  }

  #[test]
  fn aggregate_constants() {
    let DeclarationKind::Constant(c) = single("const highp uvec3 gl_WorkGroupSize = uvec3(1,1,1);") else {
      panic!("expected a constant");
    };
    assert_eq!(c.ty, vec(ScalarKind::UInt, Dim::D3));
    assert_eq!(
      c.value,
      ConstValue::Aggregate(vec![ConstValue::UInt(1), ConstValue::UInt(1), ConstValue::UInt(1)])
    );

    let DeclarationKind::Constant(c) = single("const ivec3 gl_MaxComputeWorkGroupCount = { 65535, 65535, 65535 };")
    else {
      panic!("expected a constant");
    };
    assert_eq!(
      c.value,
      ConstValue::Aggregate(vec![ConstValue::Int(65535); 3])
    );
  }

  #[test]
  fn variables() {
    let DeclarationKind::Variable(v) = single("patch out float gl_TessLevelOuter[4];") else {
      panic!("expected a variable");
    };
    assert_eq!(v.ty, Type::FLOAT.array(ArraySize::Fixed(4)));
    assert_eq!(v.direction, Some(Direction::Out));
    assert!(v.qualifiers.contains(QualifierSet::PATCH));

    let DeclarationKind::Variable(v) = single("flat in  int  gl_SampleMaskIn[];") else {
      panic!("expected a variable");
    };
    assert_eq!(v.ty, Type::INT.array(ArraySize::Implicit));

    let DeclarationKind::Variable(v) = single("in highp volatile uint gl_WarpIDNV;") else {
      panic!("expected a variable");
    };
    assert!(v.qualifiers.contains(QualifierSet::VOLATILE));
    assert_eq!(v.direction, Some(Direction::In));
  }

  #[test]
  fn several_declarators() {
    let decls = parse_text("in float a, b[2];");
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[1].name(), "b");

    let DeclarationKind::Variable(b) = &decls[1].kind else {
      panic!("expected a variable");
    };
    assert_eq!(b.ty, Type::FLOAT.array(ArraySize::Fixed(2)));
  }

  const PER_VERTEX_OUT: &str = "\
out gl_PerVertex {
    vec4 gl_Position;
    float gl_PointSize;
    float gl_ClipDistance[];
    float gl_CullDistance[];
    // vec4 gl_SecondaryPositionNV;
};
";

  #[test]
  fn anonymous_block() {
    let decls = parse_text(PER_VERTEX_OUT);
    let names: Vec<_> = decls.iter().map(Declaration::name).collect();
    assert_eq!(
      names,
      vec!["gl_PerVertex", "gl_Position", "gl_PointSize", "gl_ClipDistance", "gl_CullDistance"]
    );

    let DeclarationKind::Struct(shape) = &decls[0].kind else {
      panic!("expected a struct");
    };
    assert_eq!(shape.fields.len(), 4);

    let DeclarationKind::Variable(position) = &decls[1].kind else {
      panic!("expected a variable");
    };
    assert_eq!(position.ty, vec(ScalarKind::Float, Dim::D4));
    assert_eq!(position.direction, Some(Direction::Out));
    assert_eq!(position.block.as_deref(), Some("gl_PerVertex"));
  }

  #[test]
  fn named_block_with_constant_size() {
    let text = "\
const int gl_MaxPatchVertices = 32;
in gl_PerVertex {
    vec4 gl_Position;
    float gl_ClipDistance[];
} gl_in[gl_MaxPatchVertices];
in gl_PerVertex {
    vec4 gl_Position;
    float gl_ClipDistance[];
} gl_out[];
";
    let decls = parse_text(text);
    let names: Vec<_> = decls.iter().map(Declaration::name).collect();
    assert_eq!(names, vec!["gl_MaxPatchVertices", "gl_PerVertex", "gl_in", "gl_PerVertex", "gl_out"]);

    let DeclarationKind::Variable(gl_in) = &decls[2].kind else {
      panic!("expected a variable");
    };
    let DeclarationKind::Struct(shape) = &decls[1].kind else {
      panic!("expected a struct");
    };
    assert_eq!(gl_in.ty, Type::Struct(shape.clone()).array(ArraySize::Fixed(32)));
    assert_eq!(gl_in.block, None);

    let DeclarationKind::Variable(gl_out) = &decls[4].kind else {
      panic!("expected a variable");
    };
    assert_eq!(gl_out.ty, Type::Struct(shape.clone()).array(ArraySize::Implicit));
  }

  #[test]
  fn constants_persist_across_fragments() {
    let mut parser = DeclParser::new();
    parser
      .parse(&DeclarationFragment::unconditional("const int gl_MaxPatchVertices = 32;"))
      .unwrap();

    let decls = parser
      .parse(&DeclarationFragment::unconditional(
        "in gl_PerVertex { vec4 gl_Position; } gl_in[gl_MaxPatchVertices];",
      ))
      .unwrap();
    assert_eq!(decls.len(), 2);

    assert!(parse(&DeclarationFragment::unconditional(
      "in gl_PerVertex { vec4 gl_Position; } gl_in[gl_MaxPatchVertices];"
    ))
    .is_err());
  }

  #[test]
  fn predicate_and_lines_are_inherited() {
    let fragment = DeclarationFragment {
      predicate: Arc::new(Predicate::flag(Feature::Float16Type)),
      line: 10,
      text: "\nfloat16_t abs(float16_t x);\n\nf16vec2 abs(f16vec2 x);\n".into(),
    };
    let decls = parse(&fragment).unwrap();

    assert_eq!(decls[0].line, 11);
    assert_eq!(decls[1].line, 13);
    assert_eq!(*decls[1].predicate, Predicate::flag(Feature::Float16Type));

    let DeclarationKind::Function(sig) = &decls[1].kind else {
      panic!("expected a function");
    };
    assert_eq!(sig.predicate, decls[1].predicate);
  }

  #[test]
  fn failures() {
    let fail = |text: &str| parse(&DeclarationFragment::unconditional(text)).unwrap_err();

    assert!(fail("vec9 v;").reason.contains("unknown type"));
    assert!(fail("float f(float x)").reason.contains("expected `;`"));
    assert!(fail("const int a;").reason.contains("without initializer"));
    assert!(fail("in int a = 1;").reason.contains("non-constant"));
    assert!(fail("float f(float x[]);").reason.contains("unsized"));
    assert!(fail("out B { float a[]; float b; };").reason.contains("unsized"));
    assert!(fail("const uint a = -1;").reason.contains("does not match"));
    assert!(fail("int a[N];").reason.contains("unknown array size"));
    assert!(fail("int a[0];").reason.contains("invalid array size"));
    assert!(fail("bool f(rayQueryEXT rayQuery committed);").reason.contains("expected `)`"));

    let failure = fail("int a;\nint b c;");
    assert_eq!(failure.line, 2);
    assert_eq!(failure.text, "int b c;");
  }

  #[test]
  fn trailing_comments_only() {
    assert!(parse_text("// nothing to see here\n").is_empty());
  }
}
