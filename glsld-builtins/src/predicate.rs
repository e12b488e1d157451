//! Governing predicates.
//!
//! The builtin declaration text gates declarations behind `#if` conditions. Instead of substituting macros textually,
//! conditions are parsed into a [`Predicate`] tree once and evaluated against an [`Environment`] afterwards.

use crate::{
  env::{Environment, Feature, FeatureSet, Flag},
  stage::{ShaderStage, TargetApi},
};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Boolean expression over [`Environment`] flags.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum Predicate {
  /// Always holds; governs top-level declarations.
  #[default]
  True,

  /// Holds if the flag is set.
  Flag(Flag),

  /// Negation.
  Not(Box<Predicate>),

  /// Conjunction. An empty conjunction holds.
  And(Vec<Predicate>),

  /// Disjunction. An empty disjunction never holds.
  Or(Vec<Predicate>),
}

impl Predicate {
  /// A predicate that never holds.
  pub fn never() -> Self {
    Predicate::Or(Vec::new())
  }

  pub fn flag(flag: impl Into<Flag>) -> Self {
    Predicate::Flag(flag.into())
  }

  /// Conjunction of `self` and `rhs`, flattening nested conjunctions and dropping [`Predicate::True`].
  pub fn and(self, rhs: Predicate) -> Self {
    match (self, rhs) {
      (Predicate::True, p) | (p, Predicate::True) => p,
      (Predicate::And(mut a), Predicate::And(b)) => {
        a.extend(b);
        Predicate::And(a)
      }
      (Predicate::And(mut a), p) => {
        a.push(p);
        Predicate::And(a)
      }
      (p, Predicate::And(mut b)) => {
        b.insert(0, p);
        Predicate::And(b)
      }
      (a, b) => Predicate::And(vec![a, b]),
    }
  }

  /// Disjunction of `self` and `rhs`, flattening nested disjunctions.
  pub fn or(self, rhs: Predicate) -> Self {
    match (self, rhs) {
      (Predicate::True, _) | (_, Predicate::True) => Predicate::True,
      (Predicate::Or(mut a), Predicate::Or(b)) => {
        a.extend(b);
        Predicate::Or(a)
      }
      (Predicate::Or(mut a), p) => {
        a.push(p);
        Predicate::Or(a)
      }
      (p, Predicate::Or(mut b)) => {
        b.insert(0, p);
        Predicate::Or(b)
      }
      (a, b) => Predicate::Or(vec![a, b]),
    }
  }

  #[allow(clippy::should_implement_trait)]
  pub fn not(self) -> Self {
    match self {
      Predicate::Not(p) => *p,
      p => Predicate::Not(Box::new(p)),
    }
  }

  /// Evaluate the predicate under `env`.
  pub fn eval(&self, env: &Environment) -> bool {
    match self {
      Predicate::True => true,
      Predicate::Flag(flag) => env.is_set(*flag),
      Predicate::Not(p) => !p.eval(env),
      Predicate::And(ps) => ps.iter().all(|p| p.eval(env)),
      Predicate::Or(ps) => ps.iter().any(|p| p.eval(env)),
    }
  }

  /// Collect every flag the predicate mentions.
  pub fn flags(&self) -> BTreeSet<Flag> {
    let mut flags = BTreeSet::new();
    self.collect_flags(&mut flags);
    flags
  }

  fn collect_flags(&self, flags: &mut BTreeSet<Flag>) {
    match self {
      Predicate::True => (),
      Predicate::Flag(flag) => {
        flags.insert(*flag);
      }
      Predicate::Not(p) => p.collect_flags(flags),
      Predicate::And(ps) | Predicate::Or(ps) => {
        for p in ps {
          p.collect_flags(flags);
        }
      }
    }
  }

  /// Whether `self` and `other` can both hold under a single environment.
  ///
  /// Exhaustive over every target API and shader stage, and over every combination of the features either predicate
  /// mentions; features neither mentions cannot change the outcome.
  pub fn overlaps(&self, other: &Predicate) -> bool {
    let features: Vec<Feature> = self
      .flags()
      .into_iter()
      .chain(other.flags())
      .filter_map(|flag| match flag {
        Flag::Feature(feature) => Some(feature),
        _ => None,
      })
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();

    for api in TargetApi::ALL {
      for stage in ShaderStage::ALL {
        for mask in 0..(1u32 << features.len()) {
          let enabled: FeatureSet = features
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, feature)| *feature)
            .collect();
          let env = Environment::new(api, stage, enabled);

          if self.eval(&env) && other.eval(&env) {
            return true;
          }
        }
      }
    }

    false
  }

  /// Whether some environment satisfies the predicate.
  pub fn is_satisfiable(&self) -> bool {
    self.overlaps(&Predicate::True)
  }

  /// Parse the condition of an `#if` directive.
  ///
  /// Accepts `||`, `&&`, `!`, parentheses, `defined(MACRO)`, `defined MACRO`, bare macro names and integer literals
  /// (zero is false, anything else true). Every macro must name a known [`Flag`].
  pub fn parse(condition: &str) -> Result<Self, PredicateError> {
    let tokens = tokenize(condition)?;
    let mut parser = CondParser {
      source: condition,
      tokens: &tokens,
      pos: 0,
    };

    let predicate = parser.parse_or()?;
    if parser.pos != tokens.len() {
      return Err(parser.malformed("trailing tokens"));
    }

    Ok(predicate)
  }
}

impl From<TargetApi> for Flag {
  fn from(api: TargetApi) -> Self {
    Flag::Api(api)
  }
}

impl From<ShaderStage> for Flag {
  fn from(stage: ShaderStage) -> Self {
    Flag::Stage(stage)
  }
}

impl From<Feature> for Flag {
  fn from(feature: Feature) -> Self {
    Flag::Feature(feature)
  }
}

impl fmt::Display for Predicate {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    crate::writer::glsl::write_predicate(f, self)
  }
}

/// Error raised while parsing a directive condition.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PredicateError {
  #[error("unknown predicate macro `{0}`")]
  UnknownMacro(String),

  #[error("malformed condition `{condition}`: {reason}")]
  Malformed {
    condition: String,
    reason: &'static str,
  },
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum CondToken<'a> {
  Ident(&'a str),
  Int(u64),
  OrOr,
  AndAnd,
  Bang,
  LParen,
  RParen,
}

fn tokenize(condition: &str) -> Result<Vec<CondToken<'_>>, PredicateError> {
  let malformed = |reason| PredicateError::Malformed {
    condition: condition.to_owned(),
    reason,
  };

  let bytes = condition.as_bytes();
  let mut tokens = Vec::new();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];

    match c {
      b' ' | b'\t' | b'\r' => i += 1,
      b'(' => {
        tokens.push(CondToken::LParen);
        i += 1;
      }
      b')' => {
        tokens.push(CondToken::RParen);
        i += 1;
      }
      b'!' => {
        tokens.push(CondToken::Bang);
        i += 1;
      }
      b'|' if bytes.get(i + 1) == Some(&b'|') => {
        tokens.push(CondToken::OrOr);
        i += 2;
      }
      b'&' if bytes.get(i + 1) == Some(&b'&') => {
        tokens.push(CondToken::AndAnd);
        i += 2;
      }
      b'0'..=b'9' => {
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
          i += 1;
        }

        let value = condition[start..i]
          .parse()
          .map_err(|_| malformed("integer literal out of range"))?;
        tokens.push(CondToken::Int(value));
      }
      c if c == b'_' || c.is_ascii_alphabetic() => {
        let start = i;
        while i < bytes.len() && (bytes[i] == b'_' || bytes[i].is_ascii_alphanumeric()) {
          i += 1;
        }

        tokens.push(CondToken::Ident(&condition[start..i]));
      }
      _ => return Err(malformed("unexpected character")),
    }
  }

  Ok(tokens)
}

struct CondParser<'a, 't> {
  source: &'a str,
  tokens: &'t [CondToken<'a>],
  pos: usize,
}

impl<'a, 't> CondParser<'a, 't> {
  fn malformed(&self, reason: &'static str) -> PredicateError {
    PredicateError::Malformed {
      condition: self.source.to_owned(),
      reason,
    }
  }

  fn peek(&self) -> Option<&CondToken<'a>> {
    self.tokens.get(self.pos)
  }

  fn bump(&mut self) -> Option<&CondToken<'a>> {
    let token = self.tokens.get(self.pos);
    self.pos += 1;
    token
  }

  fn eat(&mut self, token: &CondToken) -> bool {
    if self.peek() == Some(token) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn parse_or(&mut self) -> Result<Predicate, PredicateError> {
    let mut lhs = self.parse_and()?;

    while self.eat(&CondToken::OrOr) {
      let rhs = self.parse_and()?;
      lhs = lhs.or(rhs);
    }

    Ok(lhs)
  }

  fn parse_and(&mut self) -> Result<Predicate, PredicateError> {
    let mut lhs = self.parse_unary()?;

    while self.eat(&CondToken::AndAnd) {
      let rhs = self.parse_unary()?;
      lhs = lhs.and(rhs);
    }

    Ok(lhs)
  }

  fn parse_unary(&mut self) -> Result<Predicate, PredicateError> {
    if self.eat(&CondToken::Bang) {
      return Ok(self.parse_unary()?.not());
    }

    self.parse_primary()
  }

  fn parse_primary(&mut self) -> Result<Predicate, PredicateError> {
    match self.bump().cloned() {
      Some(CondToken::LParen) => {
        let inner = self.parse_or()?;

        if !self.eat(&CondToken::RParen) {
          return Err(self.malformed("missing closing parenthesis"));
        }

        Ok(inner)
      }

      Some(CondToken::Int(0)) => Ok(Predicate::never()),
      Some(CondToken::Int(_)) => Ok(Predicate::True),

      Some(CondToken::Ident("defined")) => {
        let parenthesized = self.eat(&CondToken::LParen);

        let name = match self.bump() {
          Some(CondToken::Ident(name)) => *name,
          _ => return Err(self.malformed("expected a macro name after `defined`")),
        };

        if parenthesized && !self.eat(&CondToken::RParen) {
          return Err(self.malformed("missing closing parenthesis"));
        }

        flag_predicate(name)
      }

      Some(CondToken::Ident(name)) => flag_predicate(name),

      Some(_) => Err(self.malformed("unexpected operator")),
      None => Err(self.malformed("unexpected end of condition")),
    }
  }
}

fn flag_predicate(name: &str) -> Result<Predicate, PredicateError> {
  Flag::from_macro(name)
    .map(Predicate::Flag)
    .ok_or_else(|| PredicateError::UnknownMacro(name.to_owned()))
}
