use std::env;

use tracing::warn;

use crate::logging;
use crate::tensor::Device;

pub const ARENA_LIMIT_ENV: &str = "MICROINFER_ARENA_LIMIT";

/// Per-executor settings. All fields are plain values fixed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Device stamped on every tensor view the executor hands out.
    pub device: Device,
    /// Upper bound on the arena in bytes.
    pub arena_limit: Option<usize>,
    /// Record a [`TraceEvent`](super::TraceEvent) per executed operator.
    pub trace: bool,
    /// Time each operator call. Only reported through trace events.
    pub timer: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            device: Device::cpu(0),
            arena_limit: None,
            trace: false,
            timer: false,
        }
    }
}

impl ExecutorConfig {
    /// Defaults overridden by `MICROINFER_ARENA_LIMIT` and `MICROINFER_TRACE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = env::var(ARENA_LIMIT_ENV) {
            config.arena_limit = parse_limit(&value);
        }
        config.trace = logging::trace_basic_enabled();
        config.timer = logging::trace_full_enabled();
        config
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn with_arena_limit(mut self, bytes: usize) -> Self {
        self.arena_limit = Some(bytes);
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_timer(mut self, timer: bool) -> Self {
        self.timer = timer;
        self
    }
}

fn parse_limit(value: &str) -> Option<usize> {
    match value.trim().parse::<usize>() {
        Ok(limit) => Some(limit),
        Err(err) => {
            warn!(value, %err, "ignoring malformed {}", ARENA_LIMIT_ENV);
            None
        }
    }
}
