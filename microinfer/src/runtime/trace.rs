use std::time::Duration;

use serde::ser::{SerializeStruct, Serializer};

/// Execution trace record for a single operator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub op_index: usize,
    pub op_name: String,
    pub inputs: Vec<String>,
    pub output: String,
    pub micros: String,
    pub micros_parts: [u64; 3],
}

impl serde::Serialize for TraceEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("TraceEvent", 5)?;
        state.serialize_field("op_index", &self.op_index)?;
        state.serialize_field("op_name", &self.op_name)?;
        state.serialize_field("inputs", &self.inputs)?;
        state.serialize_field("output", &self.output)?;
        state.serialize_field("micros", &self.micros_parts)?;
        state.end()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TraceTiming {
    pub micros: String,
    pub micros_parts: [u64; 3],
}

pub(crate) fn format_trace_timing(duration: Duration) -> TraceTiming {
    let total_ns = duration.as_nanos();
    let ms = (total_ns / 1_000_000) as u64;
    let us = ((total_ns / 1_000) % 1_000) as u64;
    let ns = (total_ns % 1_000) as u64;
    TraceTiming {
        micros: format!("{ms}ms {us}us {ns}ns"),
        micros_parts: [ms, us, ns],
    }
}
