pub mod gateway;
pub mod timestamp;

pub use gateway::Gateway;
pub use timestamp::{ResolveTimestamp, TimestampInput, TimestampResolver};
