//! Shared utilities.
//!
//! Lexical path handling and test helpers.

pub mod paths;

#[cfg(test)]
pub mod testutil;
