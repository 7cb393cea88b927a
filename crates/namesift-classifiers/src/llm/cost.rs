//! Cost monitoring circuit breaker for paid inference

use parking_lot::Mutex;
use serde::Serialize;

/// Safety margin: one call costing more than this multiple of the expected
/// per-classification spend halts further requests even before the session
/// cap is reached
const RUNAWAY_COST_FACTOR: f64 = 5.0;

/// Static price table: (model prefix, input $/1k tokens, output $/1k tokens).
/// Unknown models price at 0.
const MODEL_PRICES: &[(&str, f64, f64)] = &[
    ("gpt-4o-mini", 0.000_15, 0.000_60),
    ("gpt-4o", 0.002_50, 0.010_00),
    ("gpt-4.1-mini", 0.000_40, 0.001_60),
    ("claude-3-5-haiku", 0.000_80, 0.004_00),
    ("claude-3-haiku", 0.000_25, 0.001_25),
    ("claude-sonnet", 0.003_00, 0.015_00),
];

/// Per-call cost from the static price table
pub fn calculate_cost(model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
    // Longest matching prefix wins so "gpt-4o-mini" is not priced as "gpt-4o"
    let price = MODEL_PRICES
        .iter()
        .filter(|(prefix, _, _)| model.starts_with(prefix))
        .max_by_key(|(prefix, _, _)| prefix.len());

    match price {
        Some((_, input, output)) => {
            (prompt_tokens as f64 / 1000.0) * input + (completion_tokens as f64 / 1000.0) * output
        }
        None => 0.0,
    }
}

#[derive(Debug, Default)]
struct CostState {
    session_cost: f64,
    classification_count: u64,
    max_call_cost: f64,
}

/// Circuit breaker tracking cumulative session spend and per-call spend.
///
/// Shared across concurrent batch workers as a single counter; checked
/// before every network call. A denied check is an operational condition,
/// not an error: the LLM layer returns no result and the cascade carries on.
pub struct CostMonitor {
    session_limit: f64,
    per_classification_limit: f64,
    state: Mutex<CostState>,
}

impl CostMonitor {
    pub fn new(session_limit: f64, per_classification_limit: f64) -> Self {
        Self {
            session_limit,
            per_classification_limit,
            state: Mutex::new(CostState::default()),
        }
    }

    /// Whether another paid request may be issued
    pub fn should_allow_request(&self) -> bool {
        let state = self.state.lock();
        if state.session_cost >= self.session_limit {
            return false;
        }
        if state.max_call_cost > RUNAWAY_COST_FACTOR * self.per_classification_limit {
            return false;
        }
        true
    }

    /// Record one call's spend
    pub fn track_usage(&self, cost: f64) {
        let mut state = self.state.lock();
        state.session_cost += cost;
        state.classification_count += 1;
        if cost > state.max_call_cost {
            state.max_call_cost = cost;
        }
    }

    /// Cumulative session spend in dollars
    pub fn session_cost(&self) -> f64 {
        self.state.lock().session_cost
    }

    /// Number of tracked calls
    pub fn classification_count(&self) -> u64 {
        self.state.lock().classification_count
    }

    /// Mean spend per tracked call
    pub fn average_cost(&self) -> f64 {
        let state = self.state.lock();
        if state.classification_count == 0 {
            0.0
        } else {
            state.session_cost / state.classification_count as f64
        }
    }

    /// Reset the session counters (explicit caller action)
    pub fn reset(&self) {
        *self.state.lock() = CostState::default();
    }

    /// Snapshot for observability
    pub fn snapshot(&self) -> CostSnapshot {
        let state = self.state.lock();
        CostSnapshot {
            session_cost: state.session_cost,
            classification_count: state.classification_count,
            max_call_cost: state.max_call_cost,
            session_limit: self.session_limit,
            per_classification_limit: self.per_classification_limit,
        }
    }
}

/// Point-in-time view of the monitor's counters
#[derive(Debug, Clone, Serialize)]
pub struct CostSnapshot {
    pub session_cost: f64,
    pub classification_count: u64,
    pub max_call_cost: f64,
    pub session_limit: f64,
    pub per_classification_limit: f64,
}
