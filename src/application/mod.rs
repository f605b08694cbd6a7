pub mod guardrail;
pub mod lookup;
pub mod runner;
