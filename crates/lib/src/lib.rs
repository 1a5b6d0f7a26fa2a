//! stratus-lib: Earthfile dependency analysis
//!
//! This crate answers two questions about a tree of Earthfiles:
//! - which files does a target depend on (`inputs`)
//! - which targets must be rebuilt for a given set of changed files (`impact`)
//!
//! It also maps Go package imports onto the `COPY` statements an Earthfile
//! should declare (`godeps`).

pub mod changes;
pub mod collect;
pub mod consts;
pub mod descriptor;
pub mod godeps;
pub mod impact;
pub mod inputs;
pub mod util;
