//! Depth-first traversal of recipes.

use super::ast::{Command, ForStatement, IfStatement, Statement, WaitStatement, WithStatement};

/// Callbacks invoked by [`walk_recipe`]. Every hook defaults to a no-op, so
/// visitors implement only the statements they care about.
pub trait StmtVisitor {
  type Error;

  fn visit_command(&mut self, _command: &Command) -> Result<(), Self::Error> {
    Ok(())
  }

  fn visit_with(&mut self, _stmt: &WithStatement) -> Result<(), Self::Error> {
    Ok(())
  }

  fn visit_if(&mut self, _stmt: &IfStatement) -> Result<(), Self::Error> {
    Ok(())
  }

  fn visit_for(&mut self, _stmt: &ForStatement) -> Result<(), Self::Error> {
    Ok(())
  }

  fn visit_wait(&mut self, _stmt: &WaitStatement) -> Result<(), Self::Error> {
    Ok(())
  }
}

/// Walk `recipe` in source order, descending into every branch of every
/// control construct after invoking the construct-level hook.
///
/// The command that follows `WITH` is reported through `visit_command` too.
/// The first error returned by a hook stops the walk.
pub fn walk_recipe<V: StmtVisitor + ?Sized>(recipe: &[Statement], visitor: &mut V) -> Result<(), V::Error> {
  for stmt in recipe {
    match stmt {
      Statement::Command(command) => visitor.visit_command(command)?,
      Statement::With(with) => {
        visitor.visit_with(with)?;
        visitor.visit_command(&with.command)?;
        walk_recipe(&with.body, visitor)?;
      }
      Statement::If(stmt) => {
        visitor.visit_if(stmt)?;
        walk_recipe(&stmt.if_body, visitor)?;
        for branch in &stmt.else_ifs {
          walk_recipe(&branch.body, visitor)?;
        }
        if let Some(body) = &stmt.else_body {
          walk_recipe(body, visitor)?;
        }
      }
      Statement::For(stmt) => {
        visitor.visit_for(stmt)?;
        walk_recipe(&stmt.body, visitor)?;
      }
      Statement::Wait(stmt) => {
        visitor.visit_wait(stmt)?;
        walk_recipe(&stmt.body, visitor)?;
      }
    }
  }
  Ok(())
}
