use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::{RuntimeError, RuntimeResult};
use crate::graph::Node;
use crate::value::Value;

/// Execution closure bound to one node at plan time and invoked once per run.
pub type OpClosure = Arc<dyn Fn(&mut RunContext<'_>) -> RuntimeResult<()> + Send + Sync>;

/// Wraps a closure literal into an [`OpClosure`].
///
/// Going through this helper lets the compiler infer the higher-ranked lifetime of the
/// context argument.
pub fn op_closure<F>(f: F) -> OpClosure
where
    F: Fn(&mut RunContext<'_>) -> RuntimeResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Slot access for exactly one node during one run.
///
/// Inputs borrow the frame for the whole call, so a closure may hold input references while
/// it mutates its output slots.
pub struct RunContext<'a> {
    node: &'a Node,
    inputs: SmallVec<[&'a Value; 6]>,
    outputs: &'a mut [Value],
}

impl<'a> RunContext<'a> {
    pub fn new(node: &'a Node, inputs: SmallVec<[&'a Value; 6]>, outputs: &'a mut [Value]) -> Self {
        RunContext {
            node,
            inputs,
            outputs,
        }
    }

    /// Static metadata of the node being executed.
    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn input(&self, index: usize) -> RuntimeResult<&'a Value> {
        self.inputs.get(index).copied().ok_or_else(|| {
            RuntimeError::invariant(format!(
                "{} reads input {} but declares {} inputs",
                self.node.kind(),
                index,
                self.inputs.len()
            ))
        })
    }

    /// Trailing input that may be missing or hold `None`; both read as absent.
    pub fn optional_input(&self, index: usize) -> Option<&'a Value> {
        self.inputs
            .get(index)
            .copied()
            .filter(|value| !value.is_none())
    }

    pub fn output(&mut self, index: usize) -> RuntimeResult<&mut Value> {
        let declared = self.outputs.len();
        let node: &'a Node = self.node;
        self.outputs.get_mut(index).ok_or_else(|| {
            RuntimeError::invariant(format!(
                "{} writes output {} but declares {} outputs",
                node.kind(),
                index,
                declared
            ))
        })
    }
}
