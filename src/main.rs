use clap::Parser;
use serde_json::json;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};
use weathervane::cli::{Cli, Scenario};
use weathervane::config::AppConfig;
use weathervane::guardrail::{BlockedLocationGuardrail, GuardrailChain, KeywordGuardrail};
use weathervane::lookup::{LookupService, StaticWeatherTable, WeatherProvider};
use weathervane::runner::WeatherRunner;
use weathervane::session::{
    InMemorySessionService, SessionScope, SessionService, SessionState,
};
use weathervane::types::{Unit, WeatherRecord};

const APP_NAME: &str = "weathervane";
const USER_ID: &str = "demo_user";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    info!("Starting weathervane");
    let cli = Cli::parse();
    debug!(?cli.scenario, config = ?cli.config, session = ?cli.session, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let config = AppConfig::load(config_path)?;
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    } else {
        info!("Loaded configuration using default path or defaults");
    }

    let mut table = StaticWeatherTable::new();
    for entry in &config.locations {
        table.insert(
            &entry.name,
            WeatherRecord::new(entry.temperature_celsius, entry.condition.clone()),
        );
    }
    debug!(locations = table.len(), "Weather table prepared");

    let guardrails = GuardrailChain::new()
        .with_guard(KeywordGuardrail::new(config.blocked_keyword.clone()))
        .with_guard(BlockedLocationGuardrail::new(
            config.blocked_locations.clone(),
        ));

    let sessions = Arc::new(InMemorySessionService::new());
    let runner = WeatherRunner::new(LookupService::new(table), guardrails, sessions.clone());

    let scope = match cli.session.clone() {
        Some(id) => SessionScope::new(APP_NAME, USER_ID, id),
        None => SessionScope::generate(APP_NAME, USER_ID),
    };
    let initial = SessionState {
        unit_preference: config.initial_unit,
        ..Default::default()
    };
    sessions.create_session(scope.clone(), initial).await?;
    info!(session = %scope, "Session created for demo conversation");

    match cli.scenario {
        Scenario::Stateful => run_stateful(&runner, sessions.as_ref(), &scope).await?,
        Scenario::KeywordGuardrail => run_keyword_guardrail(&runner, sessions.as_ref(), &scope).await?,
        Scenario::LocationGuardrail => {
            run_location_guardrail(&runner, sessions.as_ref(), &scope).await?
        }
    }

    info!("Scenario finished");
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

async fn run_stateful<P: WeatherProvider>(
    runner: &WeatherRunner<P>,
    sessions: &dyn SessionService,
    scope: &SessionScope,
) -> Result<(), Box<dyn Error>> {
    run_turn(runner, scope, "What's the weather in London?", "London").await?;

    // Flip the stored preference directly, the way an embedding application
    // would between turns.
    let mut state = sessions.get_session(scope).await?.state;
    state.unit_preference = Some(Unit::Fahrenheit);
    sessions.save_state(scope, state).await?;
    info!(session = %scope, "Unit preference switched to Fahrenheit");

    run_turn(runner, scope, "Tell me the weather in New York.", "New York").await?;
    print_final_state(sessions, scope).await
}

async fn run_keyword_guardrail<P: WeatherProvider>(
    runner: &WeatherRunner<P>,
    sessions: &dyn SessionService,
    scope: &SessionScope,
) -> Result<(), Box<dyn Error>> {
    run_turn(runner, scope, "What is the weather in London?", "London").await?;
    run_turn(
        runner,
        scope,
        "BLOCK the request for weather in Tokyo",
        "Tokyo",
    )
    .await?;
    print_final_state(sessions, scope).await
}

async fn run_location_guardrail<P: WeatherProvider>(
    runner: &WeatherRunner<P>,
    sessions: &dyn SessionService,
    scope: &SessionScope,
) -> Result<(), Box<dyn Error>> {
    run_turn(runner, scope, "What's the weather in New York?", "New York").await?;
    run_turn(runner, scope, "How about Paris?", "Paris").await?;
    run_turn(runner, scope, "Tell me the weather in London.", "London").await?;
    print_final_state(sessions, scope).await
}

async fn run_turn<P: WeatherProvider>(
    runner: &WeatherRunner<P>,
    scope: &SessionScope,
    query: &str,
    location: &str,
) -> Result<(), Box<dyn Error>> {
    let outcome = runner.run_turn(scope, query, location).await?;
    let output = json!({
        "query": query,
        "outcome": outcome,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn print_final_state(
    sessions: &dyn SessionService,
    scope: &SessionScope,
) -> Result<(), Box<dyn Error>> {
    let session = sessions.get_session(scope).await?;
    let output = json!({
        "session_id": scope.session_id,
        "final_state": session.state,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
