mod arena;
mod config;
mod executor;
mod trace;

pub use arena::{Arena, Slot, SplitArena, StoragePlan, ARENA_ALIGN};
pub use config::{ExecutorConfig, ARENA_LIMIT_ENV};
pub use executor::{ExecutorState, GraphExecutor};
pub use trace::TraceEvent;
