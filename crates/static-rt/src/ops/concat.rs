use static_rt_tensor::{kernels, DType, Tensor};

use super::{expect_arity, optional_int, write_output};
use crate::config::RuntimeOptions;
use crate::error::{RuntimeError, RuntimeResult};
use crate::graph::Node;
use crate::runtime::{op_closure, OpClosure};

fn first_dtype(op: &str, tensors: &[Tensor]) -> RuntimeResult<DType> {
    tensors
        .first()
        .map(Tensor::dtype)
        .ok_or_else(|| RuntimeError::ShapeMismatch(format!("{} expects a non-empty list", op)))
}

/// `aten::cat(tensors, dim=0)`.
pub(crate) fn generate_cat(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 2)?;
    let policy = options.output_policy;
    Ok(op_closure(move |ctx| {
        let tensors = ctx.input(0)?.to_tensor_list()?;
        let dim = optional_int(ctx, 1, 0)?;
        let dtype = first_dtype("cat", tensors)?;
        write_output(ctx, dtype, policy, |out| kernels::cat_out(out, tensors, dim))
    }))
}

/// `aten::stack(tensors, dim=0)`: inserts `dim` into every input, then concatenates.
pub(crate) fn generate_stack(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 2)?;
    let policy = options.output_policy;
    let check_shapes = options.check_stack_shapes;
    Ok(op_closure(move |ctx| {
        let tensors = ctx.input(0)?.to_tensor_list()?;
        let dim = optional_int(ctx, 1, 0)?;
        let dtype = first_dtype("stack", tensors)?;
        if check_shapes {
            check_equal_shapes(tensors)?;
        }
        let expanded = tensors
            .iter()
            .map(|tensor| tensor.unsqueeze(dim))
            .collect::<Result<Vec<_>, _>>()?;
        write_output(ctx, dtype, policy, |out| {
            kernels::cat_out(out, &expanded, dim)
        })
    }))
}

fn check_equal_shapes(tensors: &[Tensor]) -> RuntimeResult<()> {
    let Some(first) = tensors.first() else {
        return Ok(());
    };
    for (position, tensor) in tensors.iter().enumerate().skip(1) {
        if tensor.sizes() != first.sizes() {
            return Err(RuntimeError::ShapeMismatch(format!(
                "stack expects each tensor to be equal size, but got {:?} at entry 0 and {:?} at entry {}",
                first.sizes(),
                tensor.sizes(),
                position
            )));
        }
    }
    Ok(())
}
