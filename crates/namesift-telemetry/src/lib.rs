//! Namesift Telemetry
//!
//! Lock-free session statistics shared across concurrent cascade workers:
//! per-method hit counters, average confidence and latency, and cumulative
//! LLM spend, exposed as snapshot structs with derived rates.

pub mod stats;

pub use stats::{SessionSnapshot, SessionStats};
