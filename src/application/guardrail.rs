use crate::domain::types::LocationKey;
use crate::session::SessionState;
use serde::Serialize;
use tracing::{debug, warn};

/// Pipeline position at which a guardrail inspects the turn. Request-stage
/// guards see the raw query before any argument handling; argument-stage
/// guards see the extracted location before the table is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardrailStage {
    Request,
    Argument,
}

/// What one turn looks like to a guardrail before the lookup runs.
#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub query: &'a str,
    pub location: &'a str,
}

/// Veto emitted by a guardrail. Kept distinct from `LookupResult` so callers
/// never conflate a blocked turn with a lookup miss.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub guardrail: String,
    pub message: String,
}

pub trait Guardrail: Send + Sync {
    fn name(&self) -> &str;
    fn stage(&self) -> GuardrailStage;
    fn evaluate(&self, input: &TurnInput<'_>, state: &mut SessionState) -> Option<Rejection>;
}

/// Ordered list of guardrails. The caller runs the stages in a fixed order;
/// within a stage, guards run in registration order and the first rejection
/// short-circuits the rest.
#[derive(Default)]
pub struct GuardrailChain {
    guards: Vec<Box<dyn Guardrail>>,
}

impl GuardrailChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guard(mut self, guard: impl Guardrail + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    pub fn check(
        &self,
        stage: GuardrailStage,
        input: &TurnInput<'_>,
        state: &mut SessionState,
    ) -> Option<Rejection> {
        for guard in self.guards.iter().filter(|g| g.stage() == stage) {
            if let Some(rejection) = guard.evaluate(input, state) {
                warn!(guardrail = guard.name(), ?stage, "Guardrail vetoed the turn");
                return Some(rejection);
            }
            debug!(guardrail = guard.name(), ?stage, "Guardrail passed");
        }
        None
    }
}

/// Request-level guardrail: rejects any query containing a blocked keyword,
/// matched as a case-insensitive substring, and records that it fired.
pub struct KeywordGuardrail {
    keyword: String,
    keyword_lower: String,
}

impl KeywordGuardrail {
    pub fn new(keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        let keyword_lower = keyword.to_lowercase();
        Self {
            keyword,
            keyword_lower,
        }
    }
}

impl Guardrail for KeywordGuardrail {
    fn name(&self) -> &str {
        "block_keyword"
    }

    fn stage(&self) -> GuardrailStage {
        GuardrailStage::Request
    }

    fn evaluate(&self, input: &TurnInput<'_>, state: &mut SessionState) -> Option<Rejection> {
        if !input.query.to_lowercase().contains(&self.keyword_lower) {
            return None;
        }
        state.keyword_block_triggered = true;
        Some(Rejection {
            guardrail: self.name().to_string(),
            message: format!(
                "I cannot process this request because it contains the blocked keyword '{}'.",
                self.keyword
            ),
        })
    }
}

/// Argument-level guardrail: rejects specific locations before the weather
/// table is ever consulted. Comparison uses the normalized location key.
pub struct BlockedLocationGuardrail {
    blocked: Vec<LocationKey>,
}

impl BlockedLocationGuardrail {
    pub fn new(locations: impl IntoIterator<Item = String>) -> Self {
        Self {
            blocked: locations
                .into_iter()
                .map(|location| LocationKey::normalize(&location))
                .collect(),
        }
    }
}

impl Guardrail for BlockedLocationGuardrail {
    fn name(&self) -> &str {
        "block_location"
    }

    fn stage(&self) -> GuardrailStage {
        GuardrailStage::Argument
    }

    fn evaluate(&self, input: &TurnInput<'_>, state: &mut SessionState) -> Option<Rejection> {
        let key = LocationKey::normalize(input.location);
        if !self.blocked.contains(&key) {
            return None;
        }
        state.location_block_triggered = true;
        Some(Rejection {
            guardrail: self.name().to_string(),
            message: format!(
                "Policy restriction: weather checks for '{}' are currently disabled.",
                input.location
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(query: &'a str, location: &'a str) -> TurnInput<'a> {
        TurnInput { query, location }
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        let guard = KeywordGuardrail::new("BLOCK");
        let mut state = SessionState::default();

        let rejection = guard
            .evaluate(&input("please block the request for Tokyo", "Tokyo"), &mut state)
            .expect("keyword triggers");
        assert_eq!(rejection.guardrail, "block_keyword");
        assert!(rejection.message.contains("'BLOCK'"));
        assert!(state.keyword_block_triggered);
    }

    #[test]
    fn keyword_pass_leaves_state_untouched() {
        let guard = KeywordGuardrail::new("BLOCK");
        let mut state = SessionState::default();

        assert!(
            guard
                .evaluate(&input("What's the weather in London?", "London"), &mut state)
                .is_none()
        );
        assert!(!state.keyword_block_triggered);
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn blocked_location_matches_normalized_argument() {
        let guard = BlockedLocationGuardrail::new(vec!["Paris".to_string()]);
        let mut state = SessionState::default();

        let rejection = guard
            .evaluate(&input("How about Paris?", "  PARIS "), &mut state)
            .expect("location triggers");
        assert_eq!(rejection.guardrail, "block_location");
        assert!(state.location_block_triggered);
        assert!(state.last_location_checked.is_none());
    }

    #[test]
    fn unblocked_location_passes() {
        let guard = BlockedLocationGuardrail::new(vec!["Paris".to_string()]);
        let mut state = SessionState::default();

        assert!(
            guard
                .evaluate(&input("Weather in London?", "London"), &mut state)
                .is_none()
        );
        assert!(!state.location_block_triggered);
    }

    #[test]
    fn chain_runs_only_requested_stage() {
        let chain = GuardrailChain::new()
            .with_guard(KeywordGuardrail::new("BLOCK"))
            .with_guard(BlockedLocationGuardrail::new(vec!["Paris".to_string()]));
        let mut state = SessionState::default();

        // Request stage ignores the blocked location argument.
        let turn = input("How about Paris?", "Paris");
        assert!(
            chain
                .check(GuardrailStage::Request, &turn, &mut state)
                .is_none()
        );
        assert!(!state.location_block_triggered);

        let rejection = chain
            .check(GuardrailStage::Argument, &turn, &mut state)
            .expect("argument stage rejects");
        assert_eq!(rejection.guardrail, "block_location");
        assert!(state.location_block_triggered);
    }

    #[test]
    fn first_rejection_in_a_stage_wins() {
        struct Tagger {
            tag: &'static str,
        }

        impl Guardrail for Tagger {
            fn name(&self) -> &str {
                self.tag
            }

            fn stage(&self) -> GuardrailStage {
                GuardrailStage::Request
            }

            fn evaluate(
                &self,
                _input: &TurnInput<'_>,
                _state: &mut SessionState,
            ) -> Option<Rejection> {
                Some(Rejection {
                    guardrail: self.tag.to_string(),
                    message: String::new(),
                })
            }
        }

        let chain = GuardrailChain::new()
            .with_guard(Tagger { tag: "first" })
            .with_guard(Tagger { tag: "second" });
        let mut state = SessionState::default();

        let rejection = chain
            .check(GuardrailStage::Request, &input("q", "l"), &mut state)
            .expect("rejects");
        assert_eq!(rejection.guardrail, "first");
    }
}
