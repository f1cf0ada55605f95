use std::fmt;

use serde::{Deserialize, Serialize};

/// Device type, numbered like the DLPack device codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum DeviceKind {
    Cpu = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    pub kind: DeviceKind,
    pub id: i32,
}

impl Device {
    pub const fn cpu(id: i32) -> Self {
        Self {
            kind: DeviceKind::Cpu,
            id,
        }
    }
}

impl Default for Device {
    fn default() -> Self {
        Device::cpu(0)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DeviceKind::Cpu => write!(f, "cpu({})", self.id),
        }
    }
}
