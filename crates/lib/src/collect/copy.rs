//! `COPY` statement collection.

use std::sync::Arc;

use tracing::{trace, warn};

use super::first_positional;
use crate::consts::{SENTINEL_COPY_LINE, TARGET_MARKER};
use crate::descriptor::{Command, Descriptor, StmtVisitor, Target, walk_recipe};
use crate::inputs::{ResolveError, ResolveStack};

/// One source/destination pair of a `COPY` statement.
///
/// A statement with several sources yields one `CopyCmd` per source, all
/// sharing the destination.
#[derive(Debug, Clone)]
pub struct CopyCmd {
  /// Earthfile syntax of the statement.
  pub line: String,

  /// Earthfile in which the statement resides.
  pub descriptor: Arc<Descriptor>,

  /// Whether `--dir` was passed.
  pub dir_opt: bool,

  pub from: String,
  pub to: String,
}

impl CopyCmd {
  /// Whether this entry stands for a followed `FROM +target` rather than a real `COPY`.
  pub fn is_sentinel(&self) -> bool {
    self.line == SENTINEL_COPY_LINE
  }
}

/// Collect every `COPY` statement of `target`, in traversal order.
///
/// A `FROM` referencing another target adds a sentinel entry whose source is
/// the referenced Earthfile, followed by everything that target copies.
pub fn collect_copy_commands(descriptor: &Arc<Descriptor>, target: &Target) -> Result<Vec<CopyCmd>, ResolveError> {
  let mut stack = ResolveStack::new();
  stack.enter(descriptor, &target.name)?;
  let cmds = collect_copy_commands_in(descriptor, target, &mut stack);
  stack.leave();
  cmds
}

/// Like [`collect_copy_commands`], for a target the caller has already
/// pushed onto `stack`.
pub fn collect_copy_commands_in(
  descriptor: &Arc<Descriptor>,
  target: &Target,
  stack: &mut ResolveStack,
) -> Result<Vec<CopyCmd>, ResolveError> {
  let mut collector = CopyCollector {
    descriptor,
    stack,
    cmds: Vec::new(),
  };
  walk_recipe(&target.recipe, &mut collector)?;
  Ok(collector.cmds)
}

struct CopyCollector<'a> {
  descriptor: &'a Arc<Descriptor>,
  stack: &'a mut ResolveStack,
  cmds: Vec<CopyCmd>,
}

impl StmtVisitor for CopyCollector<'_> {
  type Error = ResolveError;

  fn visit_command(&mut self, command: &Command) -> Result<(), ResolveError> {
    match command.name.as_str() {
      "FROM" => self.visit_from(command),
      "COPY" => {
        self.visit_copy(command);
        Ok(())
      }
      "BUILD" => {
        warn!(
          dir = %self.descriptor.dir.display(),
          line = %command,
          "skipping BUILD command while collecting COPY commands"
        );
        Ok(())
      }
      _ => Ok(()),
    }
  }
}

impl CopyCollector<'_> {
  fn visit_copy(&mut self, command: &Command) {
    let flags = command.args.iter().take_while(|a| a.starts_with("--")).count();
    let dir_opt = command.args[..flags].iter().any(|a| a == "--dir");
    let Some((to, sources)) = command.args[flags..].split_last().filter(|(_, sources)| !sources.is_empty()) else {
      warn!(dir = %self.descriptor.dir.display(), line = %command, "ignoring COPY without source and destination");
      return;
    };

    let line = command.to_string();
    for from in sources {
      self.cmds.push(CopyCmd {
        line: line.clone(),
        descriptor: Arc::clone(self.descriptor),
        dir_opt,
        from: from.clone(),
        to: to.clone(),
      });
    }
  }

  fn visit_from(&mut self, command: &Command) -> Result<(), ResolveError> {
    let Some(base) = first_positional(&command.args) else {
      return Ok(());
    };
    // Image references are not targets
    if !base.contains(TARGET_MARKER) {
      return Ok(());
    }

    let reference = self.descriptor.expand_args(base);
    let (ref_descriptor, ref_target) =
      self
        .descriptor
        .target(&reference)
        .map_err(|source| ResolveError::Target {
          target: reference.clone(),
          dir: self.descriptor.dir.clone(),
          source: Box::new(source.into()),
        })?;

    trace!(from = %reference, file = %ref_descriptor.path.display(), "following FROM target");

    self.cmds.push(CopyCmd {
      line: SENTINEL_COPY_LINE.to_string(),
      descriptor: Arc::clone(self.descriptor),
      dir_opt: false,
      from: ref_descriptor.path.display().to_string(),
      to: String::new(),
    });

    self.stack.enter(&ref_descriptor, &ref_target.name)?;
    let nested = collect_copy_commands_in(&ref_descriptor, &ref_target, self.stack);
    self.stack.leave();
    self.cmds.extend(nested?);
    Ok(())
  }
}
