//! Immutable graph and node records consumed by the planner.
//!
//! Graph construction and validation belong to the caller; [`GraphBuilder`] only checks that
//! every referenced value is defined before use.

use std::fmt;
use std::sync::Arc;

use crate::error::{RuntimeError, RuntimeResult};
use crate::value::Value;

/// Identifier of a value slot inside one graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Tuple type, optionally named with one name per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleType {
    name: Option<String>,
    field_names: Vec<String>,
}

impl TupleType {
    pub fn unnamed() -> Self {
        TupleType {
            name: None,
            field_names: Vec::new(),
        }
    }

    pub fn named<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TupleType {
            name: Some(name.into()),
            field_names: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }
}

/// Static type of a node output.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    Tensor,
    Int,
    Float,
    Bool,
    Scalar,
    List(Box<ValueType>),
    Tuple(Arc<TupleType>),
    Any,
}

impl ValueType {
    pub fn list_of(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }
}

/// Where a node input comes from.
#[derive(Debug, Clone)]
pub enum NodeInput {
    /// Output of a graph input or an earlier node.
    Value(ValueId),
    /// Value known when the graph was built.
    Constant(Value),
}

impl NodeInput {
    pub fn constant(value: impl Into<Value>) -> Self {
        NodeInput::Constant(value.into())
    }
}

impl From<ValueId> for NodeInput {
    fn from(value: ValueId) -> Self {
        NodeInput::Value(value)
    }
}

#[derive(Debug, Clone)]
pub struct NodeOutput {
    pub id: ValueId,
    pub ty: ValueType,
}

/// One operation instance. Never mutated after graph construction.
#[derive(Debug, Clone)]
pub struct Node {
    kind: Arc<str>,
    inputs: Vec<NodeInput>,
    outputs: Vec<NodeOutput>,
}

impl Node {
    pub fn new(kind: &str, inputs: Vec<NodeInput>, outputs: Vec<NodeOutput>) -> Self {
        Node {
            kind: Arc::from(kind),
            inputs,
            outputs,
        }
    }

    /// Operation identifier, e.g. `aten::add`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn inputs(&self) -> &[NodeInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeOutput] {
        &self.outputs
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Input `index` when it is a graph-time constant.
    pub fn constant_input(&self, index: usize) -> Option<&Value> {
        match self.inputs.get(index)? {
            NodeInput::Constant(value) => Some(value),
            NodeInput::Value(_) => None,
        }
    }

    pub fn output_type(&self, index: usize) -> Option<&ValueType> {
        self.outputs.get(index).map(|output| &output.ty)
    }
}

/// Topologically ordered node list plus graph inputs and outputs.
#[derive(Debug, Clone)]
pub struct Graph {
    inputs: Vec<ValueId>,
    nodes: Vec<Node>,
    outputs: Vec<ValueId>,
    num_values: usize,
}

impl Graph {
    pub fn inputs(&self) -> &[ValueId] {
        &self.inputs
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }

    /// Number of value slots an execution frame needs.
    pub fn num_values(&self) -> usize {
        self.num_values
    }
}

/// Incremental graph construction in topological order.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    defined: Vec<bool>,
    inputs: Vec<ValueId>,
    nodes: Vec<Node>,
    outputs: Vec<ValueId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_value(&mut self) -> ValueId {
        let id = ValueId(self.defined.len() as u32);
        self.defined.push(true);
        id
    }

    fn check_defined(&self, id: ValueId) -> RuntimeResult<()> {
        if self.defined.get(id.index()).copied().unwrap_or(false) {
            Ok(())
        } else {
            Err(RuntimeError::invariant(format!(
                "value {} is used before it is defined",
                id
            )))
        }
    }

    pub fn add_input(&mut self) -> ValueId {
        let id = self.fresh_value();
        self.inputs.push(id);
        id
    }

    /// Appends a node and returns the ids of its outputs, one per entry of `output_types`.
    pub fn add_node(
        &mut self,
        kind: &str,
        inputs: Vec<NodeInput>,
        output_types: Vec<ValueType>,
    ) -> RuntimeResult<Vec<ValueId>> {
        for input in &inputs {
            if let NodeInput::Value(id) = input {
                self.check_defined(*id)?;
            }
        }
        let outputs: Vec<NodeOutput> = output_types
            .into_iter()
            .map(|ty| NodeOutput {
                id: self.fresh_value(),
                ty,
            })
            .collect();
        let ids = outputs.iter().map(|output| output.id).collect();
        self.nodes.push(Node::new(kind, inputs, outputs));
        Ok(ids)
    }

    /// Single-output convenience over [`GraphBuilder::add_node`].
    pub fn add_op(
        &mut self,
        kind: &str,
        inputs: Vec<NodeInput>,
        output_type: ValueType,
    ) -> RuntimeResult<ValueId> {
        let ids = self.add_node(kind, inputs, vec![output_type])?;
        Ok(ids[0])
    }

    pub fn mark_output(&mut self, id: ValueId) -> RuntimeResult<()> {
        self.check_defined(id)?;
        self.outputs.push(id);
        Ok(())
    }

    pub fn build(self) -> Graph {
        Graph {
            num_values: self.defined.len(),
            inputs: self.inputs,
            nodes: self.nodes,
            outputs: self.outputs,
        }
    }
}
