use static_rt_tensor::{wrap_dim, Tensor};

use crate::config::RuntimeOptions;
use crate::error::{RuntimeError, RuntimeResult};
use crate::graph::Node;
use crate::ops::{expect_arity, optional_int};
use crate::runtime::{op_closure, OpClosure, RunContext};
use crate::value::Value;

fn set_tensor(ctx: &mut RunContext<'_>, tensor: Tensor) -> RuntimeResult<()> {
    *ctx.output(0)? = Value::Tensor(tensor);
    Ok(())
}

/// `aten::transpose(self, dim0, dim1)`.
pub(crate) fn generate_transpose(node: &Node, _: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 3, 3)?;
    Ok(op_closure(|ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let dim0 = ctx.input(1)?.to_int()?;
        let dim1 = ctx.input(2)?.to_int()?;
        set_tensor(ctx, input.transpose(dim0, dim1)?)
    }))
}

/// `aten::flatten(self, start_dim=0, end_dim=-1)`.
pub(crate) fn generate_flatten(node: &Node, _: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 3)?;
    Ok(op_closure(|ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let start = optional_int(ctx, 1, 0)?;
        let end = optional_int(ctx, 2, -1)?;
        set_tensor(ctx, input.flatten(start, end)?)
    }))
}

pub(crate) fn generate_permute(node: &Node, _: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 2, 2)?;
    Ok(op_closure(|ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let dims = ctx.input(1)?.to_int_list()?;
        set_tensor(ctx, input.permute(dims)?)
    }))
}

/// `aten::reshape(self, shape)`. Copies only when the source layout admits no view.
pub(crate) fn generate_reshape(node: &Node, _: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 2, 2)?;
    Ok(op_closure(|ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let shape = ctx.input(1)?.to_int_list()?;
        set_tensor(ctx, input.reshape(shape)?)
    }))
}

/// `aten::slice(self, dim=0, start=None, end=None, step=1)`.
pub(crate) fn generate_slice(node: &Node, _: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 5)?;
    Ok(op_closure(|ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let dim = optional_int(ctx, 1, 0)?;
        let start = ctx.optional_input(2).map(Value::to_int).transpose()?;
        let end = ctx.optional_input(3).map(Value::to_int).transpose()?;
        let step = optional_int(ctx, 4, 1)?;
        set_tensor(ctx, input.slice(dim, start, end, step)?)
    }))
}

/// `aten::narrow(self, dim, start, length)` as the view `[start, start + length)`.
///
/// `start` may be an int or a one-element tensor. Negative starts count from the end, except
/// that `start == size` is accepted as the end position.
pub(crate) fn generate_narrow(node: &Node, _: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 4, 4)?;
    Ok(op_closure(|ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let dim = ctx.input(1)?.to_int()?;
        let start = match ctx.input(2)? {
            Value::Tensor(tensor) => tensor.item_i64()?,
            other => other.to_int()?,
        };
        let length = ctx.input(3)?.to_int()?;
        if input.dim() == 0 {
            return Err(RuntimeError::OutOfRange(
                "narrow() cannot be applied to a 0-dim tensor.".to_string(),
            ));
        }
        let axis = wrap_dim(dim, input.dim())?;
        let size = input.sizes()[axis] as i64;
        let start = if start < 0 && start != size {
            wrap_start(start, size)?
        } else {
            start
        };
        if length < 0 || start > size - length {
            return Err(RuntimeError::OutOfRange(format!(
                "start ({}) + length ({}) exceeds dimension size ({}).",
                start, length, size
            )));
        }
        set_tensor(ctx, input.slice(axis as i64, Some(start), Some(start + length), 1)?)
    }))
}

/// Wraps a negative start the way dimension indices wrap, so an empty axis counts as size one.
fn wrap_start(start: i64, size: i64) -> RuntimeResult<i64> {
    let size = size.max(1);
    if start < -size {
        return Err(RuntimeError::OutOfRange(format!(
            "start out of range (expected to be in range of [{}, {}], but got {})",
            -size,
            size - 1,
            start
        )));
    }
    Ok(start + size)
}

/// `aten::to(self, dtype, non_blocking, copy, memory_format)`, five-input form only.
///
/// Aliases the source when dtype and layout already match and `copy` is false.
pub(crate) fn generate_to(node: &Node, _: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 5, 5)?;
    Ok(op_closure(|ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let dtype = ctx.input(1)?.to_scalar_type()?;
        // Host tensors have no asynchronous copies.
        let _non_blocking = ctx.input(2)?.to_bool()?;
        let copy = ctx.input(3)?.to_bool()?;
        let memory_format = ctx
            .optional_input(4)
            .map(Value::to_memory_format)
            .transpose()?;
        set_tensor(ctx, input.to(dtype, copy, memory_format)?)
    }))
}

#[cfg(test)]
mod tests {
    use super::wrap_start;

    #[test]
    fn wrap_start_counts_from_end() {
        assert_eq!(wrap_start(-3, 10).unwrap(), 7);
        assert_eq!(wrap_start(-10, 10).unwrap(), 0);
        assert!(wrap_start(-11, 10).is_err());
        assert_eq!(wrap_start(-1, 0).unwrap(), 0);
        assert!(wrap_start(-2, 0).is_err());
    }
}
