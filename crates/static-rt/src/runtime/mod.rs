//! Execution harness: run contexts, frames and plans.

mod context;
mod frame;
mod plan;

pub use context::{op_closure, OpClosure, RunContext};
pub use frame::ExecutionFrame;
pub use plan::StaticPlan;
