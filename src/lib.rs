pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod session;

pub use application::{guardrail, lookup, runner};
pub use domain::types;
