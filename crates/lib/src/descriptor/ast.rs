//! Syntax tree of an Earthfile.
//!
//! A file is a `VERSION` statement, a base recipe and a list of named targets.
//! Every recipe is an ordered list of [`Statement`]s; control constructs own
//! nested recipes for each of their branches.

/// A recipe: ordered statements of a target or of the base scope.
pub type Recipe = Vec<Statement>;

/// A simple command such as `COPY src dst` or `BUILD +test`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
  pub name: String,
  pub args: Vec<String>,
}

impl Command {
  pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
    Self {
      name: name.into(),
      args: args.into_iter().map(Into::into).collect(),
    }
  }
}

impl std::fmt::Display for Command {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {}", self.name, self.args.join(" "))
  }
}

/// One statement of a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
  Command(Command),
  With(WithStatement),
  If(IfStatement),
  For(ForStatement),
  Wait(WaitStatement),
}

/// `WITH DOCKER ... END`. `command` holds the command following `WITH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithStatement {
  pub command: Command,
  pub body: Recipe,
}

/// `IF ... ELSE IF ... ELSE ... END`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStatement {
  pub expression: Vec<String>,
  pub if_body: Recipe,
  pub else_ifs: Vec<ElseIf>,
  pub else_body: Option<Recipe>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElseIf {
  pub expression: Vec<String>,
  pub body: Recipe,
}

/// `FOR ... END`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForStatement {
  pub args: Vec<String>,
  pub body: Recipe,
}

/// `WAIT ... END`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitStatement {
  pub args: Vec<String>,
  pub body: Recipe,
}

/// A named target and its recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
  pub name: String,
  pub recipe: Recipe,
}

/// A whole Earthfile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescriptorSpec {
  pub version: Option<Command>,
  pub base_recipe: Recipe,
  pub targets: Vec<Target>,
}
