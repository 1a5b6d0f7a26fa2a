//! End-to-end tests running the stratus binary against temporary projects.

mod common;

mod changes_tests;
mod gocopies_tests;
mod inputs_tests;
