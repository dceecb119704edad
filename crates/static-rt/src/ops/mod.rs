//! Out-of-place operators.
//!
//! Every closure here follows the same buffer lifecycle. The first call allocates an empty
//! output tensor; later calls keep that tensor and hand it to the kernel through an
//! [`OutputResolver`] chosen by [`OutputPolicy`]. Storage only grows, so a stable shape sequence
//! never reallocates after the first run.

mod arithmetic;
mod concat;
mod copy;
mod pointwise;

use static_rt_tensor::kernels::{CapacityAwareOutput, OutputResolver, ResizingOutput};
use static_rt_tensor::{DType, Tensor, TensorResult};

use crate::config::OutputPolicy;
use crate::error::{RuntimeError, RuntimeResult};
use crate::graph::Node;
use crate::registry::OperatorFunctor;
use crate::runtime::RunContext;
use crate::value::Value;

/// Identifiers of the built-in operators.
pub mod names {
    pub const ADD: &str = "aten::add";
    pub const MUL: &str = "aten::mul";
    pub const ADDMM: &str = "aten::addmm";
    pub const BMM: &str = "aten::bmm";
    pub const CLAMP: &str = "aten::clamp";
    pub const NAN_TO_NUM: &str = "aten::nan_to_num";
    pub const CAT: &str = "aten::cat";
    pub const STACK: &str = "aten::stack";
    pub const TANH: &str = "aten::tanh";
    pub const SIGMOID: &str = "aten::sigmoid";
    pub const RELU: &str = "aten::relu";
    pub const LEAKY_RELU: &str = "aten::leaky_relu";
    pub const LOGIT: &str = "aten::logit";
    pub const CLONE: &str = "aten::clone";
}

/// Startup table for the process-wide operator registry.
///
/// Elementwise operators may overwrite an input or their previous output. Operators whose
/// output aliases several inputs or is read while it is written do not reuse inputs.
pub static BUILTIN_OPERATORS: &[OperatorFunctor] = &[
    OperatorFunctor::new(names::ADD, arithmetic::generate_add),
    OperatorFunctor::new(names::MUL, arithmetic::generate_mul),
    OperatorFunctor::new(names::ADDMM, arithmetic::generate_addmm).with_reuse(false, true),
    OperatorFunctor::new(names::BMM, arithmetic::generate_bmm).with_reuse(false, true),
    OperatorFunctor::new(names::CLAMP, pointwise::generate_clamp),
    OperatorFunctor::new(names::NAN_TO_NUM, pointwise::generate_nan_to_num),
    OperatorFunctor::new(names::CAT, concat::generate_cat).with_reuse(false, true),
    OperatorFunctor::new(names::STACK, concat::generate_stack).with_reuse(false, true),
    OperatorFunctor::new(names::TANH, pointwise::generate_tanh),
    OperatorFunctor::new(names::SIGMOID, pointwise::generate_sigmoid),
    OperatorFunctor::new(names::RELU, pointwise::generate_relu),
    OperatorFunctor::new(names::LEAKY_RELU, pointwise::generate_leaky_relu),
    OperatorFunctor::new(names::LOGIT, pointwise::generate_logit),
    OperatorFunctor::new(names::CLONE, copy::generate_clone).with_reuse(false, true),
];

/// Runs `kernel` against output slot 0.
///
/// An empty slot gets a fresh tensor of `dtype`. An existing tensor keeps its storage; under
/// [`OutputPolicy::ResetThenResize`] its shape is first reset to `[0]` so the kernel always
/// recomputes the geometry, under [`OutputPolicy::CapacityAware`] it is only touched when the
/// requested geometry differs.
pub(crate) fn write_output<K>(
    ctx: &mut RunContext<'_>,
    dtype: DType,
    policy: OutputPolicy,
    kernel: K,
) -> RuntimeResult<()>
where
    K: FnOnce(&mut dyn OutputResolver) -> TensorResult<()>,
{
    let slot = ctx.output(0)?;
    if slot.is_none() {
        *slot = Value::Tensor(Tensor::empty(dtype));
    }
    let out = slot.to_tensor_mut()?;
    match policy {
        OutputPolicy::ResetThenResize => {
            out.resize_(&[0]);
            kernel(&mut ResizingOutput::new(out))?;
        }
        OutputPolicy::CapacityAware => kernel(&mut CapacityAwareOutput::new(out))?,
    }
    Ok(())
}

/// Optional floating-point argument, bound at generation time when the node carries it as a
/// constant and read from its slot on every call otherwise.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FloatArg {
    Bound(Option<f64>),
    Dynamic(usize),
}

impl FloatArg {
    pub(crate) fn from_node(node: &Node, index: usize) -> RuntimeResult<Self> {
        if index >= node.num_inputs() {
            return Ok(FloatArg::Bound(None));
        }
        match node.constant_input(index) {
            Some(value) => Ok(FloatArg::Bound(optional_f64(Some(value))?)),
            None => Ok(FloatArg::Dynamic(index)),
        }
    }

    pub(crate) fn resolve(self, ctx: &RunContext<'_>) -> RuntimeResult<Option<f64>> {
        match self {
            FloatArg::Bound(value) => Ok(value),
            FloatArg::Dynamic(index) => optional_f64(ctx.optional_input(index)),
        }
    }
}

/// Numeric value of an optional scalar argument; `None` values read as absent.
pub(crate) fn optional_f64(value: Option<&Value>) -> RuntimeResult<Option<f64>> {
    match value {
        None | Some(Value::None) => Ok(None),
        Some(value) => Ok(Some(value.to_scalar()?.to_f64())),
    }
}

pub(crate) fn optional_int(ctx: &RunContext<'_>, index: usize, default: i64) -> RuntimeResult<i64> {
    match ctx.optional_input(index) {
        Some(value) => value.to_int(),
        None => Ok(default),
    }
}

/// Rejects nodes whose input count falls outside `min..=max` at generation time.
pub(crate) fn expect_arity(node: &Node, min: usize, max: usize) -> RuntimeResult<()> {
    let arity = node.num_inputs();
    if arity < min || arity > max {
        return Err(RuntimeError::invariant(format!(
            "{} expects between {} and {} inputs, got {}",
            node.kind(),
            min,
            max,
            arity
        )));
    }
    Ok(())
}
