use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "weathervane",
    version,
    about = "Stateful weather lookup with per-session unit preference and guardrail stages"
)]
pub struct Cli {
    #[arg(long)]
    pub config: Option<String>,
    #[arg(long)]
    pub session: Option<String>,
    #[arg(long, value_enum, default_value_t = Scenario::Stateful)]
    pub scenario: Scenario,
}

/// Scripted demo conversation to run.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Scenario {
    /// Unit-switch conversation: Celsius turn, flip to Fahrenheit, repeat.
    Stateful,
    /// Request-level keyword veto conversation.
    KeywordGuardrail,
    /// Argument-level blocked-location veto conversation.
    LocationGuardrail,
}
