use super::guardrail::{GuardrailChain, GuardrailStage, Rejection, TurnInput};
use super::lookup::{LookupService, WeatherProvider};
use crate::domain::types::LookupResult;
use crate::session::{SessionError, SessionScope, SessionService, SessionState};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Extras key under which the runner records the most recent report.
pub const LAST_REPORT_KEY: &str = "last_weather_report";

/// Outcome of one conversational turn. A guardrail veto is distinct from a
/// lookup miss: blocked turns never reached the weather table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    Blocked { rejection: Rejection },
    Completed { result: LookupResult },
}

impl TurnOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, TurnOutcome::Blocked { .. })
    }
}

/// Drives one turn end to end: request-stage guardrails against the raw
/// query, argument-stage guardrails against the extracted location, then the
/// lookup, then a single state write-back. The lookup itself knows nothing
/// about guardrails.
pub struct WeatherRunner<P: WeatherProvider> {
    lookup: LookupService<P>,
    guardrails: GuardrailChain,
    sessions: Arc<dyn SessionService>,
}

impl<P: WeatherProvider> WeatherRunner<P> {
    pub fn new(
        lookup: LookupService<P>,
        guardrails: GuardrailChain,
        sessions: Arc<dyn SessionService>,
    ) -> Self {
        Self {
            lookup,
            guardrails,
            sessions,
        }
    }

    /// `location` is the argument already extracted from `query` by the
    /// dispatching collaborator; extraction is not this runner's job.
    pub async fn run_turn(
        &self,
        scope: &SessionScope,
        query: &str,
        location: &str,
    ) -> Result<TurnOutcome, SessionError> {
        let session = self.sessions.get_session(scope).await?;
        let mut state = session.state;
        let input = TurnInput { query, location };
        debug!(session = %scope, query, location, "Turn started");

        let outcome = if let Some(rejection) =
            self.guardrails
                .check(GuardrailStage::Request, &input, &mut state)
        {
            TurnOutcome::Blocked { rejection }
        } else if let Some(rejection) =
            self.guardrails
                .check(GuardrailStage::Argument, &input, &mut state)
        {
            TurnOutcome::Blocked { rejection }
        } else {
            let result = self.lookup.lookup(location, &mut state);
            if let LookupResult::Success { report } = &result {
                state
                    .extras
                    .insert(LAST_REPORT_KEY.to_string(), Value::String(report.clone()));
            }
            TurnOutcome::Completed { result }
        };

        // Guardrail flag writes persist even when the turn is vetoed.
        self.sessions.save_state(scope, state).await?;
        info!(session = %scope, blocked = outcome.is_blocked(), "Turn finished");
        Ok(outcome)
    }
}
