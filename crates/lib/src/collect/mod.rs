//! Statement collectors built on [`walk_recipe`](crate::descriptor::walk_recipe).
//!
//! - [`copy`] gathers `COPY` statements, following `FROM +target` references
//! - [`build`] gathers `BUILD` statements without following them

pub mod build;
pub mod copy;

pub use build::{BuildCmd, collect_build_commands};
pub use copy::{CopyCmd, collect_copy_commands, collect_copy_commands_in};

/// The first argument that is not a `--flag`.
pub(crate) fn first_positional(args: &[String]) -> Option<&str> {
  args.iter().map(String::as_str).find(|a| !a.starts_with("--"))
}
