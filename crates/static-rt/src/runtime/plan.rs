use std::mem;

use smallvec::SmallVec;

use crate::classify::{Classifier, Strategy};
use crate::config::RuntimeOptions;
use crate::dispatch::fallback_operation;
use crate::error::{RuntimeError, RuntimeResult};
use crate::graph::{Graph, Node, NodeInput};
use crate::runtime::{ExecutionFrame, OpClosure, RunContext};
use crate::value::Value;

struct PlannedNode {
    strategy: Strategy,
    closure: OpClosure,
}

/// A graph whose nodes have been classified once and bound to closures.
///
/// The plan itself is immutable and can be shared across threads; every concurrent execution
/// brings its own [`ExecutionFrame`].
pub struct StaticPlan {
    graph: Graph,
    nodes: Vec<PlannedNode>,
    options: RuntimeOptions,
}

impl StaticPlan {
    /// Plans `graph` against the process-wide registries.
    pub fn new(graph: Graph, options: RuntimeOptions) -> RuntimeResult<Self> {
        Self::with_classifier(graph, options, Classifier::global())
    }

    /// Plans `graph` against explicit registries.
    ///
    /// Fails with [`RuntimeError::Unimplemented`] on the first fallback node unless
    /// [`RuntimeOptions::allow_fallback`] is set.
    pub fn with_classifier(
        graph: Graph,
        options: RuntimeOptions,
        classifier: Classifier<'_>,
    ) -> RuntimeResult<Self> {
        let mut nodes = Vec::with_capacity(graph.nodes().len());
        for (index, node) in graph.nodes().iter().enumerate() {
            let strategy = classifier.classify(node);
            tracing::debug!(node = index, op = node.kind(), ?strategy, "classified node");
            let closure = plan_node(node, strategy, &options, &classifier)
                .map_err(|err| err.in_node(index, node.kind()))?;
            nodes.push(PlannedNode { strategy, closure });
        }
        let fallbacks = nodes
            .iter()
            .filter(|planned| planned.strategy == Strategy::Fallback)
            .count();
        if fallbacks > 0 {
            tracing::warn!(
                fallbacks,
                "plan contains nodes the static runtime cannot execute"
            );
        }
        Ok(StaticPlan {
            graph,
            nodes,
            options,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Strategy chosen for each node, in graph order.
    pub fn strategies(&self) -> impl Iterator<Item = Strategy> + '_ {
        self.nodes.iter().map(|planned| planned.strategy)
    }

    /// Indices of nodes left to the generic fallback.
    pub fn fallback_nodes(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, planned)| planned.strategy == Strategy::Fallback)
            .map(|(index, _)| index)
            .collect()
    }

    /// Fresh frame sized for this plan's graph.
    pub fn new_frame(&self) -> ExecutionFrame {
        ExecutionFrame::new(self.graph.num_values())
    }

    /// Runs every node in order and returns the graph outputs.
    ///
    /// Returned tensors alias buffers owned by `frame` and are overwritten by the next run on
    /// the same frame. The first failing node aborts the run.
    pub fn run(&self, frame: &mut ExecutionFrame, inputs: Vec<Value>) -> RuntimeResult<Vec<Value>> {
        if frame.len() != self.graph.num_values() {
            return Err(RuntimeError::invariant(format!(
                "frame holds {} slots but the graph defines {} values",
                frame.len(),
                self.graph.num_values()
            )));
        }
        if inputs.len() != self.graph.inputs().len() {
            return Err(RuntimeError::invariant(format!(
                "graph expects {} inputs, got {}",
                self.graph.inputs().len(),
                inputs.len()
            )));
        }
        for (id, value) in self.graph.inputs().iter().zip(inputs) {
            frame.slots_mut()[id.index()] = value;
        }

        for (index, (node, planned)) in self.graph.nodes().iter().zip(&self.nodes).enumerate() {
            tracing::trace!(node = index, op = node.kind(), "executing node");
            run_node(node, &planned.closure, frame)
                .map_err(|err| err.in_node(index, node.kind()))?;
        }

        let slots = frame.slots();
        Ok(self
            .graph
            .outputs()
            .iter()
            .map(|id| slots[id.index()].clone())
            .collect())
    }
}

fn plan_node(
    node: &Node,
    strategy: Strategy,
    options: &RuntimeOptions,
    classifier: &Classifier<'_>,
) -> RuntimeResult<OpClosure> {
    match strategy {
        Strategy::Native => classifier.natives().generate(node, options),
        Strategy::OutOfPlace => classifier.registry().generate(node, options),
        Strategy::Fallback if options.allow_fallback => Ok(fallback_operation(node)),
        Strategy::Fallback => Err(RuntimeError::Unimplemented {
            op: node.kind().to_string(),
        }),
    }
}

/// Invokes `closure` with the node's slots. Output values are moved out of the frame for the
/// call and moved back afterwards, also when the closure fails.
fn run_node(node: &Node, closure: &OpClosure, frame: &mut ExecutionFrame) -> RuntimeResult<()> {
    let mut outputs: SmallVec<[Value; 2]> = node
        .outputs()
        .iter()
        .map(|output| mem::take(&mut frame.slots_mut()[output.id.index()]))
        .collect();

    let result = {
        let slots = frame.slots();
        let inputs = node
            .inputs()
            .iter()
            .map(|input| match input {
                NodeInput::Value(id) => &slots[id.index()],
                NodeInput::Constant(value) => value,
            })
            .collect();
        let mut ctx = RunContext::new(node, inputs, &mut outputs);
        (**closure)(&mut ctx)
    };

    let slots = frame.slots_mut();
    for (output, value) in node.outputs().iter().zip(outputs) {
        slots[output.id.index()] = value;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::StaticPlan;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn plan_is_shareable() {
        assert_send_sync::<StaticPlan>();
    }
}
