//! `BUILD` statement collection.

use std::sync::Arc;

use super::first_positional;
use crate::descriptor::{Command, Descriptor, StmtVisitor, Target, walk_recipe};

/// A `BUILD` statement of a target.
#[derive(Debug, Clone)]
pub struct BuildCmd {
  /// Earthfile syntax of the statement.
  pub line: String,

  /// Earthfile in which the statement resides.
  pub descriptor: Arc<Descriptor>,

  /// The referenced target, as written.
  pub target: String,
}

/// Collect the `BUILD` statements of `target` in traversal order.
///
/// Referenced targets are not followed, and `FROM` statements are ignored.
pub fn collect_build_commands(descriptor: &Arc<Descriptor>, target: &Target) -> Vec<BuildCmd> {
  let mut collector = BuildCollector {
    descriptor,
    cmds: Vec::new(),
  };
  // The visitor never fails
  let _ = walk_recipe(&target.recipe, &mut collector);
  collector.cmds
}

struct BuildCollector<'a> {
  descriptor: &'a Arc<Descriptor>,
  cmds: Vec<BuildCmd>,
}

impl StmtVisitor for BuildCollector<'_> {
  type Error = std::convert::Infallible;

  fn visit_command(&mut self, command: &Command) -> Result<(), Self::Error> {
    if command.name != "BUILD" {
      return Ok(());
    }
    if let Some(target) = first_positional(&command.args) {
      self.cmds.push(BuildCmd {
        line: command.to_string(),
        descriptor: Arc::clone(self.descriptor),
        target: target.to_string(),
      });
    }
    Ok(())
  }
}
