//! Directive evaluation.
//!
//! The builtin declaration text interleaves declarations with `#if` / `#elif` / `#else` / `#endif` blocks. This
//! module splits such text into [`DeclarationFragment`]s, each carrying the conjunction of every enclosing condition as
//! its governing [`Predicate`], and selects the fragments active under a given [`Environment`].
//!
//! A fragment is a maximal run of lines under one predicate. A nested block does not end the run around it, and
//! neither does the `#endif` / `#if` pair between two adjacent blocks with the same condition:
//!
//! ```text
//! #if S
//! A          // S
//! #if V
//! B          // S && V
//! #endif
//! C          // S, same fragment as A
//! #endif
//! ```

use crate::{
  env::{Environment, Flag},
  predicate::{Predicate, PredicateError},
};
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;

/// Declaration text governed by a single predicate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeclarationFragment<'a> {
  /// Conjunction of every enclosing condition.
  pub predicate: Arc<Predicate>,

  /// 1-based line of the first line of `text` in the whole source.
  pub line: usize,

  /// Declaration text. Directive lines and lines of nested blocks are left empty, so line `n` of `text` is line
  /// `line + n - 1` of the source. Borrowed when the run has no such gap.
  pub text: Cow<'a, str>,
}

impl<'a> DeclarationFragment<'a> {
  /// A fragment governed by [`Predicate::True`] starting at line 1.
  pub fn unconditional(text: &'a str) -> Self {
    DeclarationFragment {
      predicate: Arc::new(Predicate::True),
      line: 1,
      text: Cow::Borrowed(text),
    }
  }

  pub fn is_active(&self, env: &Environment) -> bool {
    self.predicate.eval(env)
  }
}

/// Error raised on malformed directive structure.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DirectiveError {
  #[error("line {line}: {source}")]
  Condition {
    line: usize,
    #[source]
    source: PredicateError,
  },

  #[error("line {line}: #{directive} without a matching #if")]
  Unbalanced {
    line: usize,
    directive: &'static str,
  },

  #[error("line {line}: #{directive} after #else")]
  AfterElse {
    line: usize,
    directive: &'static str,
  },

  #[error("line {line}: #if is never closed")]
  Unterminated { line: usize },

  #[error("line {line}: unknown directive #{directive}")]
  UnknownDirective { line: usize, directive: String },
}

// One open #if chain.
struct Frame {
  parent: Arc<Predicate>,
  // disjunction of every condition seen so far in the chain
  taken: Predicate,
  current: Arc<Predicate>,
  seen_else: bool,
  line: usize,
}

// Fragment still accepting lines.
struct Run<'a> {
  predicate: Arc<Predicate>,
  // stack depth the run was opened at
  depth: usize,
  text: Cow<'a, str>,
  // byte offsets of the borrowed text and of the end of its last line
  start: usize,
  end: usize,
  line: usize,
  last_line: usize,
}

impl<'a> Run<'a> {
  fn extend(&mut self, source: &'a str, start: usize, end: usize, line: usize) {
    if matches!(self.text, Cow::Borrowed(_)) && start == self.end {
      self.text = Cow::Borrowed(&source[self.start..end]);
    } else {
      let text = self.text.to_mut();
      text.extend(std::iter::repeat('\n').take(line - self.last_line - 1));
      text.push_str(&source[start..end]);
    }

    self.end = end;
    self.last_line = line;
  }

  fn into_fragment(self) -> DeclarationFragment<'a> {
    DeclarationFragment {
      predicate: self.predicate,
      line: self.line,
      text: self.text,
    }
  }
}

struct Splitter<'a> {
  source: &'a str,
  stack: Vec<Frame>,
  fragments: Vec<DeclarationFragment<'a>>,
  root: Arc<Predicate>,
  // open runs, outermost first
  runs: Vec<Run<'a>>,
}

impl<'a> Splitter<'a> {
  fn top(&self) -> &Arc<Predicate> {
    self.stack.last().map(|frame| &frame.current).unwrap_or(&self.root)
  }

  // Predicate in effect at stack depth `depth`, if that depth is still open.
  fn context(&self, depth: usize) -> Option<&Arc<Predicate>> {
    match depth {
      0 => Some(&self.root),
      _ => self.stack.get(depth - 1).map(|frame| &frame.current),
    }
  }

  // A run stays open across lines of its own predicate and lines of blocks nested in it.
  fn encloses(&self, run: &Run<'_>, depth: usize, predicate: &Predicate) -> bool {
    *run.predicate == *predicate || (run.depth < depth && self.context(run.depth) == Some(&run.predicate))
  }

  fn push_line(&mut self, start: usize, end: usize, line: usize) {
    let source = self.source;
    let depth = self.stack.len();
    let predicate = self.top().clone();

    // blank lines never open nor close a run
    if source[start..end].trim().is_empty() {
      if let Some(run) = self
        .runs
        .iter_mut()
        .find(|run| run.end == start && *run.predicate == *predicate)
      {
        run.extend(source, start, end, line);
      }

      return;
    }

    let (open, closed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.runs)
      .into_iter()
      .partition(|run| self.encloses(run, depth, &predicate));
    self.runs = open;
    self.fragments.extend(closed.into_iter().map(Run::into_fragment));

    if let Some(run) = self.runs.iter_mut().find(|run| *run.predicate == *predicate) {
      run.extend(source, start, end, line);
      return;
    }

    self.runs.push(Run {
      predicate,
      depth,
      text: Cow::Borrowed(&source[start..end]),
      start,
      end,
      line,
      last_line: line,
    });
  }

  fn finish(mut self) -> Vec<DeclarationFragment<'a>> {
    self.fragments.extend(self.runs.drain(..).map(Run::into_fragment));
    self.fragments.sort_by_key(|fragment| fragment.line);
    self.fragments
  }

  fn directive(&mut self, line: usize, directive: &str, rest: &str) -> Result<(), DirectiveError> {
    let condition = |text: &str| Predicate::parse(text).map_err(|source| DirectiveError::Condition { line, source });
    let known_macro = |text: &str| {
      let name = text.trim();
      Flag::from_macro(name).map(Predicate::Flag).ok_or_else(|| DirectiveError::Condition {
        line,
        source: PredicateError::UnknownMacro(name.to_owned()),
      })
    };

    match directive {
      "if" | "ifdef" | "ifndef" => {
        let cond = match directive {
          "if" => condition(rest)?,
          "ifdef" => known_macro(rest)?,
          _ => known_macro(rest)?.not(),
        };

        let parent = self.top().clone();
        let current = Arc::new(parent.as_ref().clone().and(cond.clone()));
        self.stack.push(Frame {
          parent,
          taken: cond,
          current,
          seen_else: false,
          line,
        });
      }

      "elif" => {
        let cond = condition(rest)?;
        let frame = self.stack.last_mut().ok_or(DirectiveError::Unbalanced {
          line,
          directive: "elif",
        })?;

        if frame.seen_else {
          return Err(DirectiveError::AfterElse {
            line,
            directive: "elif",
          });
        }

        let current = frame
          .parent
          .as_ref()
          .clone()
          .and(frame.taken.clone().not())
          .and(cond.clone());
        frame.current = Arc::new(current);
        frame.taken = std::mem::take(&mut frame.taken).or(cond);
      }

      "else" => {
        let frame = self.stack.last_mut().ok_or(DirectiveError::Unbalanced {
          line,
          directive: "else",
        })?;

        if frame.seen_else {
          return Err(DirectiveError::AfterElse {
            line,
            directive: "else",
          });
        }

        frame.seen_else = true;
        frame.current = Arc::new(frame.parent.as_ref().clone().and(frame.taken.clone().not()));
      }

      "endif" => {
        self.stack.pop().ok_or(DirectiveError::Unbalanced {
          line,
          directive: "endif",
        })?;
      }

      _ => {
        return Err(DirectiveError::UnknownDirective {
          line,
          directive: directive.to_owned(),
        })
      }
    }

    Ok(())
  }
}

// Split a directive line (without its leading `#`) into the directive name and the rest of the line.
fn split_directive(line: &str) -> (&str, &str) {
  let line = line.trim_start();
  let end = line
    .find(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
    .unwrap_or(line.len());

  (&line[..end], &line[end..])
}

/// Split `source` into every declaration fragment it contains, whatever their predicates.
pub fn split(source: &str) -> Result<Vec<DeclarationFragment<'_>>, DirectiveError> {
  let mut splitter = Splitter {
    source,
    stack: Vec::new(),
    fragments: Vec::new(),
    root: Arc::new(Predicate::True),
    runs: Vec::new(),
  };

  let mut offset = 0;
  for (i, raw_line) in source.split_inclusive('\n').enumerate() {
    let line = i + 1;
    let start = offset;
    offset += raw_line.len();

    match raw_line.trim_start().strip_prefix('#') {
      Some(directive_line) => {
        let (directive, rest) = split_directive(directive_line.trim_end());
        splitter.directive(line, directive, rest)?;
      }

      None => splitter.push_line(start, offset, line),
    }
  }

  if let Some(frame) = splitter.stack.last() {
    return Err(DirectiveError::Unterminated { line: frame.line });
  }

  Ok(splitter.finish())
}

/// Yield, in source order, the fragments of `source` active under `env`.
pub fn evaluate<'a>(source: &'a str, env: &Environment) -> Result<Vec<DeclarationFragment<'a>>, DirectiveError> {
  let mut fragments = split(source)?;
  fragments.retain(|fragment| fragment.is_active(env));
  Ok(fragments)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    env::Feature,
    stage::{ShaderStage, TargetApi},
  };

  const SOURCE: &str = "\
const int a = 1;

#if __GLSLD_SHADER_STAGE_VERTEX
in int v;
#if __GLSLD_TARGET_API_VULKAN
in int vk;
#endif
in int after;
#endif
const int b = 2;
";

  #[test]
  fn split_nested() {
    let fragments = split(SOURCE).unwrap();
    let texts: Vec<_> = fragments.iter().map(|f| f.text.trim()).collect();

    assert_eq!(
      texts,
      vec![
        "const int a = 1;\n\n\n\n\n\n\n\n\nconst int b = 2;",
        "in int v;\n\n\n\nin int after;",
        "in int vk;",
      ]
    );

    assert_eq!(*fragments[0].predicate, Predicate::True);
    assert_eq!(*fragments[1].predicate, Predicate::flag(ShaderStage::Vertex));
    assert_eq!(
      *fragments[2].predicate,
      Predicate::flag(ShaderStage::Vertex).and(Predicate::flag(TargetApi::Vulkan))
    );

    assert_eq!(fragments[0].line, 1);
    assert_eq!(fragments[1].line, 4);
    assert_eq!(fragments[2].line, 6);

    // lines keep their position in the source
    assert_eq!(fragments[0].text.lines().nth(9), Some("const int b = 2;"));
    assert_eq!(fragments[1].text.lines().nth(4), Some("in int after;"));
  }

  #[test]
  fn nested_block_does_not_split_its_parent() {
    let source = "\
#if __GLSLD_SHADER_STAGE_VERTEX
int a;
#if __GLSLD_TARGET_API_VULKAN
int b;
#endif
int c;
#endif
";
    let fragments = split(source).unwrap();
    let outer = Predicate::flag(ShaderStage::Vertex);

    assert_eq!(fragments.len(), 2);
    assert_eq!(*fragments[0].predicate, outer);
    assert_eq!(fragments[0].line, 2);
    assert_eq!(fragments[0].text, "int a;\n\n\n\nint c;\n");
    assert_eq!(*fragments[1].predicate, outer.and(Predicate::flag(TargetApi::Vulkan)));
    assert_eq!(fragments[1].line, 4);
    assert!(matches!(fragments[1].text, Cow::Borrowed("int b;\n")));
  }

  #[test]
  fn adjacent_blocks_merge() {
    let source = "\
#if __GLSLD_FEATURE_ENABLE_INT8_TYPE
int8_t a;
#endif

#if __GLSLD_FEATURE_ENABLE_INT8_TYPE
int8_t b;
#endif
int c;
#if __GLSLD_FEATURE_ENABLE_INT8_TYPE
int8_t d;
#endif
";
    let fragments = split(source).unwrap();
    let texts: Vec<_> = fragments.iter().map(|f| (f.line, &*f.text)).collect();

    // `int c;` sits between the second and the third block
    assert_eq!(
      texts,
      vec![
        (2, "int8_t a;\n\n\n\nint8_t b;\n"),
        (8, "int c;\n"),
        (10, "int8_t d;\n"),
      ]
    );
  }

  #[test]
  fn contiguous_runs_are_borrowed() {
    let source = "int a;\n\nint b;\n#if __GLSLD_TARGET_API_VULKAN\nint c;\n#endif\n";
    let fragments = split(source).unwrap();

    assert!(matches!(fragments[0].text, Cow::Borrowed("int a;\n\nint b;\n")));
    assert!(matches!(fragments[1].text, Cow::Borrowed("int c;\n")));
  }

  #[test]
  fn evaluate_filters() {
    let env = Environment::new(TargetApi::OpenGl, ShaderStage::Vertex, Default::default());
    let fragments = evaluate(SOURCE, &env).unwrap();
    let texts: Vec<_> = fragments.iter().map(|f| f.text.split_whitespace().collect::<Vec<_>>().join(" ")).collect();
    assert_eq!(texts, vec!["const int a = 1; const int b = 2;", "in int v; in int after;"]);

    let env = Environment::new(TargetApi::Vulkan, ShaderStage::Fragment, Default::default());
    let fragments = evaluate(SOURCE, &env).unwrap();
    assert_eq!(fragments.len(), 1);
    assert_eq!(*fragments[0].predicate, Predicate::True);
  }

  #[test]
  fn elif_else_chain() {
    let source = "\
#if __GLSLD_FEATURE_ENABLE_INT8_TYPE
int8_t x;
#elif __GLSLD_FEATURE_ENABLE_INT16_TYPE
int16_t x;
#else
int x;
#endif
";
    let pick = |features: &[Feature]| {
      let env = Environment::new(
        TargetApi::OpenGl,
        ShaderStage::Vertex,
        features.iter().copied().collect(),
      );
      let fragments = evaluate(source, &env).unwrap();
      assert_eq!(fragments.len(), 1);
      fragments[0].text.trim().to_owned()
    };

    assert_eq!(pick(&[Feature::Int8Type, Feature::Int16Type]), "int8_t x;");
    assert_eq!(pick(&[Feature::Int16Type]), "int16_t x;");
    assert_eq!(pick(&[]), "int x;");
  }

  #[test]
  fn ifdef_ifndef() {
    let source = "#ifdef __GLSLD_TARGET_API_VULKAN\nint a;\n#endif\n#ifndef __GLSLD_TARGET_API_VULKAN\nint b;\n#endif\n";
    let env = Environment::new(TargetApi::Vulkan, ShaderStage::Vertex, Default::default());
    let fragments = evaluate(source, &env).unwrap();
    let texts: Vec<_> = fragments.iter().map(|f| f.text.trim()).collect();

    assert_eq!(texts, vec!["int a;"]);
  }

  #[test]
  fn structural_errors() {
    assert_eq!(
      split("#endif\n"),
      Err(DirectiveError::Unbalanced {
        line: 1,
        directive: "endif"
      })
    );
    assert_eq!(
      split("int a;\n#if __GLSLD_TARGET_API_VULKAN\nint b;\n"),
      Err(DirectiveError::Unterminated { line: 2 })
    );
    assert_eq!(
      split("#if 1\n#else\n#else\n#endif\n"),
      Err(DirectiveError::AfterElse {
        line: 3,
        directive: "else"
      })
    );
    assert_eq!(
      split("#if 1\n#else\n#elif 1\n#endif\n"),
      Err(DirectiveError::AfterElse {
        line: 3,
        directive: "elif"
      })
    );
    assert!(matches!(
      split("#pragma once\n"),
      Err(DirectiveError::UnknownDirective { line: 1, .. })
    ));
  }

  #[test]
  fn unknown_macro_is_fatal() {
    assert_eq!(
      split("#if __GLSLD_SHADER_STAGE_PIXEL\nint a;\n#endif\n"),
      Err(DirectiveError::Condition {
        line: 1,
        source: PredicateError::UnknownMacro("__GLSLD_SHADER_STAGE_PIXEL".to_owned())
      })
    );
  }
}
