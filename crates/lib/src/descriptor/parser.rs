//! Line-oriented Earthfile parser.
//!
//! Only the structure the analysis needs is recognized: `VERSION`, the base
//! recipe, `name:` target headers and the `IF`/`FOR`/`WAIT`/`WITH` blocks.
//! Command arguments are kept as raw tokens (quotes included).

use std::collections::HashSet;

use thiserror::Error;

use super::ast::{
  Command, DescriptorSpec, ElseIf, ForStatement, IfStatement, Recipe, Statement, Target, WaitStatement,
  WithStatement,
};

/// Commands whose first `KEY=VALUE` argument is split into `KEY`, `=`, `VALUE`.
const KEY_VALUE_COMMANDS: &[&str] = &["ARG", "ENV", "LET", "SET"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
  pub line: usize,
  pub message: String,
}

impl SyntaxError {
  fn new(line: usize, message: impl Into<String>) -> Self {
    Self {
      line,
      message: message.into(),
    }
  }
}

/// A logical line: continuations joined, comments and blank lines dropped.
#[derive(Debug)]
struct Line {
  number: usize,
  indented: bool,
  tokens: Vec<String>,
}

impl Line {
  fn keyword(&self) -> &str {
    self.tokens.first().map(String::as_str).unwrap_or_default()
  }

  fn target_header(&self) -> Option<&str> {
    if self.indented || self.tokens.len() != 1 {
      return None;
    }
    let name = self.tokens[0].strip_suffix(':')?;
    let valid = !name.is_empty()
      && name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    valid.then_some(name)
  }
}

/// Parse Earthfile source text.
pub fn parse(source: &str) -> Result<DescriptorSpec, SyntaxError> {
  let lines = logical_lines(source)?;
  Parser { lines, pos: 0 }.parse_spec()
}

fn logical_lines(source: &str) -> Result<Vec<Line>, SyntaxError> {
  let mut lines = Vec::new();
  let mut pending: Option<(usize, bool, String)> = None;

  for (idx, raw) in source.lines().enumerate() {
    let trimmed = raw.trim();
    let (start, indented, mut text) = match pending.take() {
      Some(continued) => continued,
      None => {
        if trimmed.is_empty() || trimmed.starts_with('#') {
          continue;
        }
        (idx + 1, raw.starts_with(char::is_whitespace), String::new())
      }
    };

    if let Some(body) = trimmed.strip_suffix('\\') {
      text.push_str(body);
      text.push(' ');
      pending = Some((start, indented, text));
      continue;
    }

    text.push_str(trimmed);
    push_line(&mut lines, start, indented, &text)?;
  }

  if let Some((start, indented, text)) = pending {
    push_line(&mut lines, start, indented, &text)?;
  }

  Ok(lines)
}

fn push_line(lines: &mut Vec<Line>, number: usize, indented: bool, text: &str) -> Result<(), SyntaxError> {
  let tokens = tokenize(text).map_err(|message| SyntaxError::new(number, message))?;
  if !tokens.is_empty() {
    lines.push(Line {
      number,
      indented,
      tokens,
    });
  }
  Ok(())
}

/// Split on whitespace outside of quotes. A `#` at the start of a token ends the line.
fn tokenize(text: &str) -> Result<Vec<String>, String> {
  let mut tokens = Vec::new();
  let mut current = String::new();
  let mut in_token = false;
  let mut quote: Option<char> = None;
  let mut chars = text.chars();

  while let Some(c) = chars.next() {
    if let Some(q) = quote {
      current.push(c);
      if c == '\\' {
        if let Some(escaped) = chars.next() {
          current.push(escaped);
        }
      } else if c == q {
        quote = None;
      }
      continue;
    }

    match c {
      c if c.is_whitespace() => {
        if in_token {
          tokens.push(std::mem::take(&mut current));
          in_token = false;
        }
      }
      '#' if !in_token => break,
      '"' | '\'' => {
        quote = Some(c);
        current.push(c);
        in_token = true;
      }
      '\\' => {
        current.push(c);
        if let Some(escaped) = chars.next() {
          current.push(escaped);
        }
        in_token = true;
      }
      _ => {
        current.push(c);
        in_token = true;
      }
    }
  }

  if let Some(q) = quote {
    return Err(format!("unterminated {} quote", q));
  }
  if in_token {
    tokens.push(current);
  }
  Ok(tokens)
}

fn command_from_tokens(mut tokens: Vec<String>) -> Command {
  let name = tokens.remove(0);
  if KEY_VALUE_COMMANDS.contains(&name.as_str()) {
    split_key_value(&mut tokens);
  }
  Command { name, args: tokens }
}

/// `KEY=VALUE` -> `KEY`, `=`, `VALUE` for the first non-flag argument.
fn split_key_value(args: &mut Vec<String>) {
  let Some(idx) = args.iter().position(|a| !a.starts_with("--")) else {
    return;
  };
  let arg = &args[idx];
  if arg == "=" {
    return;
  }
  if let Some((key, value)) = arg.split_once('=') {
    let (key, value) = (key.to_string(), value.to_string());
    args.splice(idx..=idx, [key, "=".to_string(), value]);
  }
}

enum IfBranch {
  ElseIf,
  Else,
  End,
  Other,
}

struct Parser {
  lines: Vec<Line>,
  pos: usize,
}

impl Parser {
  fn peek(&self) -> Option<&Line> {
    self.lines.get(self.pos)
  }

  fn advance(&mut self) -> Vec<String> {
    let tokens = std::mem::take(&mut self.lines[self.pos].tokens);
    self.pos += 1;
    tokens
  }

  fn parse_spec(mut self) -> Result<DescriptorSpec, SyntaxError> {
    let mut spec = DescriptorSpec::default();

    if let Some(line) = self.peek()
      && !line.indented
      && line.keyword() == "VERSION"
    {
      let tokens = self.advance();
      spec.version = Some(command_from_tokens(tokens));
    }

    spec.base_recipe = self.parse_block()?;

    let mut seen = HashSet::new();
    while let Some(line) = self.peek() {
      let number = line.number;
      let Some(name) = line.target_header().map(str::to_string) else {
        return Err(SyntaxError::new(number, format!("unexpected {}", line.keyword())));
      };
      self.pos += 1;

      if !seen.insert(name.clone()) {
        return Err(SyntaxError::new(number, format!("duplicate target '{}'", name)));
      }

      let recipe = self.parse_block()?;
      spec.targets.push(Target { name, recipe });
    }

    Ok(spec)
  }

  /// Parse statements up to the next target header, `END`/`ELSE`, or end of input.
  /// Block keywords are left for the caller to consume.
  fn parse_block(&mut self) -> Result<Recipe, SyntaxError> {
    let mut recipe = Recipe::new();

    while let Some(line) = self.peek() {
      if line.target_header().is_some() {
        break;
      }
      let number = line.number;
      let keyword = line.keyword().to_string();

      match keyword.as_str() {
        "END" | "ELSE" => break,
        "IF" => recipe.push(Statement::If(self.parse_if()?)),
        "FOR" => {
          let mut args = self.advance();
          args.remove(0);
          let body = self.parse_nested(number, "FOR")?;
          recipe.push(Statement::For(ForStatement { args, body }));
        }
        "WAIT" => {
          let mut args = self.advance();
          args.remove(0);
          let body = self.parse_nested(number, "WAIT")?;
          recipe.push(Statement::Wait(WaitStatement { args, body }));
        }
        "WITH" => {
          let mut tokens = self.advance();
          if tokens.len() < 2 {
            return Err(SyntaxError::new(number, "WITH requires a command"));
          }
          tokens.remove(0);
          let command = command_from_tokens(tokens);
          let body = self.parse_nested(number, "WITH")?;
          recipe.push(Statement::With(WithStatement { command, body }));
        }
        _ => {
          let tokens = self.advance();
          recipe.push(Statement::Command(command_from_tokens(tokens)));
        }
      }
    }

    Ok(recipe)
  }

  fn parse_nested(&mut self, opened: usize, what: &str) -> Result<Recipe, SyntaxError> {
    let body = self.parse_block()?;
    self.expect_end(opened, what)?;
    Ok(body)
  }

  fn parse_if(&mut self) -> Result<IfStatement, SyntaxError> {
    let opened = self.peek().map(|l| l.number).unwrap_or_default();
    let mut tokens = self.advance();
    tokens.remove(0);

    let mut stmt = IfStatement {
      expression: tokens,
      if_body: self.parse_block()?,
      else_ifs: Vec::new(),
      else_body: None,
    };

    loop {
      let branch = self.peek().map(|line| match (line.keyword(), line.tokens.get(1).map(String::as_str)) {
        ("ELSE", Some("IF")) => (line.number, IfBranch::ElseIf),
        ("ELSE", _) => (line.number, IfBranch::Else),
        ("END", _) => (line.number, IfBranch::End),
        _ => (line.number, IfBranch::Other),
      });

      match branch {
        Some((number, IfBranch::ElseIf)) => {
          if stmt.else_body.is_some() {
            return Err(SyntaxError::new(number, "ELSE IF after ELSE"));
          }
          let tokens = self.advance();
          let body = self.parse_block()?;
          stmt.else_ifs.push(ElseIf {
            expression: tokens[2..].to_vec(),
            body,
          });
        }
        Some((number, IfBranch::Else)) => {
          if stmt.else_body.is_some() {
            return Err(SyntaxError::new(number, "duplicate ELSE"));
          }
          self.advance();
          stmt.else_body = Some(self.parse_block()?);
        }
        Some((_, IfBranch::End)) => {
          self.advance();
          return Ok(stmt);
        }
        Some((_, IfBranch::Other)) | None => {
          return Err(SyntaxError::new(opened, "IF block is missing END"));
        }
      }
    }
  }

  fn expect_end(&mut self, opened: usize, what: &str) -> Result<(), SyntaxError> {
    match self.peek() {
      Some(line) if line.keyword() == "END" => {
        self.advance();
        Ok(())
      }
      Some(line) if line.keyword() == "ELSE" => Err(SyntaxError::new(line.number, "ELSE outside of IF")),
      _ => Err(SyntaxError::new(opened, format!("{} block is missing END", what))),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cmd(name: &str, args: &[&str]) -> Statement {
    Statement::Command(Command::new(name, args.iter().copied()))
  }

  #[test]
  fn parses_version_base_and_targets() {
    let spec = parse(
      r#"VERSION 0.7
FROM alpine:3.18
ARG TOP=../..

deps:
    COPY go.mod go.sum ./

build:
    FROM +deps
    COPY --dir src ./
"#,
    )
    .unwrap();

    assert_eq!(spec.version, Some(Command::new("VERSION", ["0.7"])));
    assert_eq!(
      spec.base_recipe,
      vec![cmd("FROM", &["alpine:3.18"]), cmd("ARG", &["TOP", "=", "../.."])]
    );
    assert_eq!(spec.targets.len(), 2);
    assert_eq!(spec.targets[0].name, "deps");
    assert_eq!(spec.targets[0].recipe, vec![cmd("COPY", &["go.mod", "go.sum", "./"])]);
    assert_eq!(spec.targets[1].name, "build");
    assert_eq!(
      spec.targets[1].recipe,
      vec![cmd("FROM", &["+deps"]), cmd("COPY", &["--dir", "src", "./"])]
    );
  }

  #[test]
  fn parses_nested_blocks() {
    let spec = parse(
      r#"VERSION 0.7
test:
    IF [ "$MODE" = "a" ]
        COPY a.txt .
    ELSE IF [ "$MODE" = "b" ]
        COPY b.txt .
    ELSE
        FOR f IN x y
            COPY $f .
        END
    END
    WAIT
        BUILD +lint
    END
    WITH DOCKER --load img=+image
        RUN docker run img
    END
"#,
    )
    .unwrap();

    let recipe = &spec.targets[0].recipe;
    assert_eq!(recipe.len(), 3);

    let Statement::If(stmt) = &recipe[0] else {
      panic!("expected IF, got {:?}", recipe[0]);
    };
    assert_eq!(stmt.expression, vec!["[", "\"$MODE\"", "=", "\"a\"", "]"]);
    assert_eq!(stmt.if_body, vec![cmd("COPY", &["a.txt", "."])]);
    assert_eq!(stmt.else_ifs.len(), 1);
    assert_eq!(stmt.else_ifs[0].body, vec![cmd("COPY", &["b.txt", "."])]);
    let else_body = stmt.else_body.as_ref().unwrap();
    let Statement::For(for_stmt) = &else_body[0] else {
      panic!("expected FOR");
    };
    assert_eq!(for_stmt.args, vec!["f", "IN", "x", "y"]);
    assert_eq!(for_stmt.body, vec![cmd("COPY", &["$f", "."])]);

    let Statement::Wait(wait) = &recipe[1] else {
      panic!("expected WAIT");
    };
    assert_eq!(wait.body, vec![cmd("BUILD", &["+lint"])]);

    let Statement::With(with) = &recipe[2] else {
      panic!("expected WITH");
    };
    assert_eq!(with.command, Command::new("DOCKER", ["--load", "img=+image"]));
    assert_eq!(with.body, vec![cmd("RUN", &["docker", "run", "img"])]);
  }

  #[test]
  fn joins_continuations_and_skips_comments() {
    let spec = parse(
      "VERSION 0.7\n# a comment\napp:\n    # indented comment\n    COPY a.txt \\\n        b.txt \\\n        dest/ # trailing\n",
    )
    .unwrap();
    assert_eq!(spec.targets[0].recipe, vec![cmd("COPY", &["a.txt", "b.txt", "dest/"])]);
  }

  #[test]
  fn keeps_quoted_whitespace_in_one_token() {
    let spec = parse("VERSION 0.7\nARG MSG=\"hello world\"\n").unwrap();
    assert_eq!(spec.base_recipe, vec![cmd("ARG", &["MSG", "=", "\"hello world\""])]);
  }

  #[test]
  fn rejects_duplicate_targets() {
    let err = parse("VERSION 0.7\na:\n    RUN true\na:\n    RUN false\n").unwrap_err();
    assert_eq!(err.line, 4);
    assert!(err.message.contains("duplicate target"));
  }

  #[test]
  fn rejects_missing_end() {
    let err = parse("VERSION 0.7\na:\n    FOR x IN y\n        RUN echo\nb:\n    RUN true\n").unwrap_err();
    assert_eq!(err.line, 3);
    assert!(err.message.contains("missing END"));
  }

  #[test]
  fn rejects_stray_end() {
    let err = parse("VERSION 0.7\na:\n    RUN true\n    END\n").unwrap_err();
    assert_eq!(err.line, 4);
  }

  #[test]
  fn rejects_unterminated_quote() {
    let err = parse("VERSION 0.7\na:\n    RUN echo \"oops\n").unwrap_err();
    assert!(err.message.contains("unterminated"));
  }
}
