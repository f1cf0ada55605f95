//! Environment-driven trace switches.
//!
//! `MICROINFER_TRACE=1` records a trace event per executed operator,
//! `MICROINFER_TRACE=full` additionally times every call. The variable is
//! read once per process. Output goes through `tracing`; installing a
//! subscriber is left to the application.
use std::env;
use std::sync::OnceLock;

pub const TRACE_ENV: &str = "MICROINFER_TRACE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceLevel {
    Off,
    Basic,
    Full,
}

static TRACE_LEVEL: OnceLock<TraceLevel> = OnceLock::new();

pub fn parse_trace_level(value: &str) -> TraceLevel {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" => TraceLevel::Basic,
        "full" => TraceLevel::Full,
        _ => TraceLevel::Off,
    }
}

pub fn trace_level() -> TraceLevel {
    *TRACE_LEVEL.get_or_init(|| {
        env::var(TRACE_ENV)
            .ok()
            .as_deref()
            .map(parse_trace_level)
            .unwrap_or(TraceLevel::Off)
    })
}

pub fn trace_basic_enabled() -> bool {
    matches!(trace_level(), TraceLevel::Basic | TraceLevel::Full)
}

pub fn trace_full_enabled() -> bool {
    matches!(trace_level(), TraceLevel::Full)
}
