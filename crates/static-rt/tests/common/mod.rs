#![allow(dead_code)]

use anyhow::{anyhow, Result};
use static_rt::{
    DType, Graph, GraphBuilder, NodeInput, RuntimeOptions, StaticPlan, Tensor, Value, ValueType,
};

/// Graph made of one node fed by `dynamic` graph inputs followed by `constants`.
pub fn single_op(
    kind: &str,
    dynamic: usize,
    constants: Vec<Value>,
    outputs: Vec<ValueType>,
) -> Result<Graph> {
    let mut builder = GraphBuilder::new();
    let mut inputs: Vec<NodeInput> = (0..dynamic)
        .map(|_| NodeInput::Value(builder.add_input()))
        .collect();
    inputs.extend(constants.into_iter().map(NodeInput::Constant));
    for id in builder.add_node(kind, inputs, outputs)? {
        builder.mark_output(id)?;
    }
    Ok(builder.build())
}

pub fn plan(graph: Graph) -> Result<StaticPlan> {
    Ok(StaticPlan::new(graph, RuntimeOptions::default())?)
}

pub fn tensor(sizes: &[usize], values: &[f32]) -> Result<Tensor> {
    Ok(Tensor::from_f32(sizes, values.to_vec())?)
}

pub fn arange(sizes: &[usize]) -> Result<Tensor> {
    let numel: usize = sizes.iter().product();
    let values: Vec<f64> = (0..numel).map(|v| v as f64).collect();
    Ok(Tensor::from_f64(DType::F32, sizes, &values)?)
}

/// Runs `plan` on a fresh frame and returns its only output tensor.
pub fn run_once(plan: &StaticPlan, inputs: Vec<Value>) -> Result<Tensor> {
    let mut frame = plan.new_frame();
    let outputs = plan.run(&mut frame, inputs)?;
    first_tensor(outputs)
}

pub fn first_tensor(outputs: Vec<Value>) -> Result<Tensor> {
    match outputs.into_iter().next() {
        Some(Value::Tensor(tensor)) => Ok(tensor),
        Some(other) => Err(anyhow!("expected a tensor output, got {}", other.kind_name())),
        None => Err(anyhow!("graph produced no outputs")),
    }
}
