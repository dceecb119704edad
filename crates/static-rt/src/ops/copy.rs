use static_rt_tensor::{kernels, Tensor};

use super::expect_arity;
use crate::config::RuntimeOptions;
use crate::error::RuntimeResult;
use crate::graph::Node;
use crate::runtime::{op_closure, OpClosure};
use crate::value::Value;

/// `aten::clone(self, memory_format=None)`.
///
/// Resizes the cached output to the input's shape and copies every element. The memory
/// format argument is ignored.
pub(crate) fn generate_clone(node: &Node, _options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 2)?;
    Ok(op_closure(|ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let slot = ctx.output(0)?;
        if slot.is_none() {
            *slot = Value::Tensor(Tensor::empty(input.dtype()));
        }
        let out = slot.to_tensor_mut()?;
        kernels::resize_as_(out, input);
        kernels::copy_(out, input)?;
        Ok(())
    }))
}
