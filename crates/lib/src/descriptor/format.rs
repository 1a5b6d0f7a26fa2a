//! Earthfile pretty-printer.

use super::ast::{Command, DescriptorSpec, Recipe, Statement};

const INDENT: &str = "    ";

/// Render a whole Earthfile.
pub fn format_descriptor(spec: &DescriptorSpec) -> String {
  let mut out = String::new();

  if let Some(version) = &spec.version {
    out.push_str(&format_command(&version.name, &version.args));
    out.push_str("\n\n");
  }

  if !spec.base_recipe.is_empty() {
    format_recipe(&mut out, 0, &spec.base_recipe);
    out.push('\n');
  }

  for (idx, target) in spec.targets.iter().enumerate() {
    if idx > 0 {
      out.push('\n');
    }
    out.push_str(&target.name);
    out.push_str(":\n");
    format_recipe(&mut out, 1, &target.recipe);
  }

  out
}

/// Render one command. `=` is glued to its neighbours, as in `ENV X=Y`.
pub fn format_command(name: &str, args: &[String]) -> String {
  let mut out = String::from(name);
  if args.is_empty() {
    return out;
  }
  out.push(' ');

  for (idx, arg) in args.iter().enumerate() {
    out.push_str(arg);
    let next_is_eq = args.get(idx + 1).is_some_and(|next| next == "=");
    let is_last = idx + 1 == args.len();
    if arg != "=" && !next_is_eq && !is_last {
      out.push(' ');
    }
  }
  out
}

fn format_recipe(out: &mut String, depth: usize, recipe: &Recipe) {
  for stmt in recipe {
    match stmt {
      Statement::Command(command) => line(out, depth, &format_command(&command.name, &command.args)),
      Statement::With(with) => {
        line(out, depth, &format_with(&with.command));
        format_recipe(out, depth + 1, &with.body);
        line(out, depth, "END");
      }
      Statement::If(stmt) => {
        line(out, depth, &format_command("IF", &stmt.expression));
        format_recipe(out, depth + 1, &stmt.if_body);
        for branch in &stmt.else_ifs {
          line(out, depth, &format_command("ELSE IF", &branch.expression));
          format_recipe(out, depth + 1, &branch.body);
        }
        if let Some(body) = &stmt.else_body {
          line(out, depth, "ELSE");
          format_recipe(out, depth + 1, body);
        }
        line(out, depth, "END");
      }
      Statement::For(stmt) => {
        line(out, depth, &format_command("FOR", &stmt.args));
        format_recipe(out, depth + 1, &stmt.body);
        line(out, depth, "END");
      }
      Statement::Wait(stmt) => {
        line(out, depth, &format_command("WAIT", &stmt.args));
        format_recipe(out, depth + 1, &stmt.body);
        line(out, depth, "END");
      }
    }
  }
}

fn format_with(command: &Command) -> String {
  format!("WITH {}", format_command(&command.name, &command.args))
}

fn line(out: &mut String, depth: usize, text: &str) {
  out.push_str(&INDENT.repeat(depth));
  out.push_str(text);
  out.push('\n');
}
