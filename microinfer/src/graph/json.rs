use serde_json::Value;

use crate::error::Result;
use crate::graph::GraphDescription;

pub struct GraphSerialize;

impl GraphSerialize {
    pub fn json(graph: &GraphDescription) -> Result<Value> {
        Ok(serde_json::to_value(graph)?)
    }
}

pub struct GraphDeserialize;

impl GraphDeserialize {
    pub fn from_json(value: Value) -> Result<GraphDescription> {
        Ok(serde_json::from_value(value)?)
    }
}

impl GraphDescription {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
