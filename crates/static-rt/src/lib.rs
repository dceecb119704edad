//! Static per-node dispatch for fixed tensor graphs.
//!
//! A planner walks a [`graph::Graph`] once, asks the [`classify`] module how each node should
//! run, and binds one [`runtime::OpClosure`] per node:
//!
//! * out-of-place nodes get a closure from the [`registry::OperatorRegistry`]; it computes into
//!   an output buffer that is kept and reused across runs of the same frame,
//! * native nodes (views and container construction) get a closure from the
//!   [`native::NativeRegistry`]; these alias or move values and never copy element data,
//! * everything else is a generic-fallback node that this engine refuses to execute.
//!
//! Registries are process-wide, built once by explicit startup tables, and read-only afterwards.

pub mod classify;
pub mod config;
pub mod dispatch;
mod env;
pub mod error;
pub mod graph;
pub mod native;
pub mod ops;
pub mod registry;
pub mod runtime;
pub mod value;

pub use classify::{Classifier, Strategy};
pub use config::{OutputPolicy, RuntimeOptions};
pub use error::{RuntimeError, RuntimeResult};
pub use graph::{Graph, GraphBuilder, Node, NodeInput, TupleType, ValueId, ValueType};
pub use runtime::{ExecutionFrame, OpClosure, RunContext, StaticPlan};
pub use value::{Scalar, TupleValue, Value};

pub use static_rt_tensor::{DType, MemoryFormat, Tensor};
