//! Tokenizer for builtin declaration text.

use std::fmt;

/// Punctuation recognized in declarations.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Punct {
  LBrace,
  RBrace,
  LParen,
  RParen,
  LBracket,
  RBracket,
  Semicolon,
  Comma,
  Equal,
  Minus,
  Plus,
}

impl Punct {
  pub fn as_str(self) -> &'static str {
    match self {
      Punct::LBrace => "{",
      Punct::RBrace => "}",
      Punct::LParen => "(",
      Punct::RParen => ")",
      Punct::LBracket => "[",
      Punct::RBracket => "]",
      Punct::Semicolon => ";",
      Punct::Comma => ",",
      Punct::Equal => "=",
      Punct::Minus => "-",
      Punct::Plus => "+",
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind<'a> {
  Ident(&'a str),
  /// Integer literal; `unsigned` is set by a `u` / `U` suffix.
  Int { value: u64, unsigned: bool },
  Float(f64),
  Punct(Punct),
  /// Line comment starting its line, without the leading `//`.
  Doc(&'a str),
}

impl fmt::Display for TokenKind<'_> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      TokenKind::Ident(ident) => f.write_str(ident),
      TokenKind::Int { value, unsigned } => write!(f, "{}{}", value, if *unsigned { "u" } else { "" }),
      TokenKind::Float(x) => write!(f, "{:?}", x),
      TokenKind::Punct(p) => f.write_str(p.as_str()),
      TokenKind::Doc(doc) => write!(f, "//{}", doc),
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token<'a> {
  pub kind: TokenKind<'a>,
  /// 1-based line, relative to the start of the tokenized text.
  pub line: usize,
}

/// Lexical error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LexError {
  pub line: usize,
  pub reason: &'static str,
}

/// Tokenize `text` entirely.
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, LexError> {
  Lexer::new(text).collect()
}

/// Iterator over the tokens of a piece of declaration text.
pub struct Lexer<'a> {
  src: &'a str,
  pos: usize,
  line: usize,
  // only whitespace seen since the last newline
  line_start: bool,
}

impl<'a> Lexer<'a> {
  pub fn new(src: &'a str) -> Self {
    Lexer {
      src,
      pos: 0,
      line: 1,
      line_start: true,
    }
  }

  fn peek_byte(&self, offset: usize) -> Option<u8> {
    self.src.as_bytes().get(self.pos + offset).copied()
  }

  fn error(&self, reason: &'static str) -> LexError {
    LexError {
      line: self.line,
      reason,
    }
  }

  // Skip whitespace and non-documentation comments; return a documentation comment if one is met.
  fn skip_trivia(&mut self) -> Result<Option<Token<'a>>, LexError> {
    while let Some(c) = self.peek_byte(0) {
      match c {
        b'\n' => {
          self.pos += 1;
          self.line += 1;
          self.line_start = true;
        }

        c if c.is_ascii_whitespace() => self.pos += 1,

        b'/' if self.peek_byte(1) == Some(b'/') => {
          let start = self.pos + 2;
          let end = self.src[start..]
            .find('\n')
            .map_or(self.src.len(), |i| start + i);
          self.pos = end;

          if self.line_start {
            let doc = self.src[start..end].trim_end_matches('\r');
            return Ok(Some(Token {
              kind: TokenKind::Doc(doc),
              line: self.line,
            }));
          }
        }

        b'/' if self.peek_byte(1) == Some(b'*') => {
          let start = self.pos + 2;
          let end = self.src[start..]
            .find("*/")
            .map(|i| start + i)
            .ok_or_else(|| self.error("unterminated block comment"))?;

          self.line += self.src[self.pos..end].matches('\n').count();
          self.pos = end + 2;
          self.line_start = false;
        }

        _ => break,
      }
    }

    Ok(None)
  }

  fn ident(&mut self) -> Token<'a> {
    let start = self.pos;
    while let Some(c) = self.peek_byte(0) {
      if c == b'_' || c.is_ascii_alphanumeric() {
        self.pos += 1;
      } else {
        break;
      }
    }

    Token {
      kind: TokenKind::Ident(&self.src[start..self.pos]),
      line: self.line,
    }
  }

  fn number(&mut self) -> Result<Token<'a>, LexError> {
    let bytes = self.src.as_bytes();
    let start = self.pos;
    let line = self.line;

    // hexadecimal
    if bytes[start] == b'0' && matches!(self.peek_byte(1), Some(b'x') | Some(b'X')) {
      self.pos += 2;
      let digits_start = self.pos;
      while self.peek_byte(0).map_or(false, |c| c.is_ascii_hexdigit()) {
        self.pos += 1;
      }

      let value = u64::from_str_radix(&self.src[digits_start..self.pos], 16)
        .map_err(|_| self.error("invalid hexadecimal literal"))?;
      let unsigned = self.int_suffix();
      return self.finish_number(TokenKind::Int { value, unsigned }, line);
    }

    let mut is_float = false;
    while self.peek_byte(0).map_or(false, |c| c.is_ascii_digit()) {
      self.pos += 1;
    }

    if self.peek_byte(0) == Some(b'.') {
      is_float = true;
      self.pos += 1;
      while self.peek_byte(0).map_or(false, |c| c.is_ascii_digit()) {
        self.pos += 1;
      }
    }

    if matches!(self.peek_byte(0), Some(b'e') | Some(b'E')) {
      is_float = true;
      self.pos += 1;
      if matches!(self.peek_byte(0), Some(b'+') | Some(b'-')) {
        self.pos += 1;
      }
      while self.peek_byte(0).map_or(false, |c| c.is_ascii_digit()) {
        self.pos += 1;
      }
    }

    let text = &self.src[start..self.pos];

    if is_float {
      let value = text.parse().map_err(|_| self.error("invalid floating literal"))?;

      // f, F, lf, LF
      match (self.peek_byte(0), self.peek_byte(1)) {
        (Some(b'l'), Some(b'f')) | (Some(b'L'), Some(b'F')) => self.pos += 2,
        (Some(b'f'), _) | (Some(b'F'), _) => self.pos += 1,
        _ => (),
      }

      return self.finish_number(TokenKind::Float(value), line);
    }

    let value = if text.len() > 1 && text.starts_with('0') {
      u64::from_str_radix(&text[1..], 8).map_err(|_| self.error("invalid octal literal"))?
    } else {
      text.parse().map_err(|_| self.error("integer literal out of range"))?
    };
    let unsigned = self.int_suffix();

    self.finish_number(TokenKind::Int { value, unsigned }, line)
  }

  fn int_suffix(&mut self) -> bool {
    if matches!(self.peek_byte(0), Some(b'u') | Some(b'U')) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn finish_number(&self, kind: TokenKind<'a>, line: usize) -> Result<Token<'a>, LexError> {
    // reject things like `12abc`
    match self.peek_byte(0) {
      Some(c) if c == b'_' || c.is_ascii_alphanumeric() => Err(self.error("invalid numeric literal suffix")),
      _ => Ok(Token { kind, line }),
    }
  }
}

impl<'a> Iterator for Lexer<'a> {
  type Item = Result<Token<'a>, LexError>;

  fn next(&mut self) -> Option<Self::Item> {
    match self.skip_trivia() {
      Ok(Some(doc)) => return Some(Ok(doc)),
      Ok(None) => (),
      Err(e) => {
        // do not loop on the same error
        self.pos = self.src.len();
        return Some(Err(e));
      }
    }

    let c = self.peek_byte(0)?;
    self.line_start = false;

    let punct = match c {
      b'{' => Some(Punct::LBrace),
      b'}' => Some(Punct::RBrace),
      b'(' => Some(Punct::LParen),
      b')' => Some(Punct::RParen),
      b'[' => Some(Punct::LBracket),
      b']' => Some(Punct::RBracket),
      b';' => Some(Punct::Semicolon),
      b',' => Some(Punct::Comma),
      b'=' => Some(Punct::Equal),
      b'-' => Some(Punct::Minus),
      b'+' => Some(Punct::Plus),
      _ => None,
    };

    if let Some(punct) = punct {
      self.pos += 1;
      return Some(Ok(Token {
        kind: TokenKind::Punct(punct),
        line: self.line,
      }));
    }

    let token = match c {
      c if c == b'_' || c.is_ascii_alphabetic() => Ok(self.ident()),
      c if c.is_ascii_digit() => self.number(),
      b'.' if self.peek_byte(1).map_or(false, |c| c.is_ascii_digit()) => self.number(),
      _ => Err(self.error("unexpected character")),
    };

    if token.is_err() {
      self.pos = self.src.len();
    }

    Some(token)
  }
}
