use static_rt_tensor::kernels;

use super::{expect_arity, write_output, FloatArg};
use crate::config::RuntimeOptions;
use crate::error::RuntimeResult;
use crate::graph::Node;
use crate::runtime::{op_closure, OpClosure};

/// `aten::add(self, other, alpha=1)`.
pub(crate) fn generate_add(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 2, 3)?;
    let alpha = FloatArg::from_node(node, 2)?;
    let policy = options.output_policy;
    Ok(op_closure(move |ctx| {
        let lhs = ctx.input(0)?.to_tensor()?;
        let rhs = ctx.input(1)?.to_tensor()?;
        let alpha = alpha.resolve(ctx)?.unwrap_or(1.0);
        write_output(ctx, lhs.dtype(), policy, |out| {
            kernels::add_out(out, lhs, rhs, alpha)
        })
    }))
}

pub(crate) fn generate_mul(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 2, 2)?;
    let policy = options.output_policy;
    Ok(op_closure(move |ctx| {
        let lhs = ctx.input(0)?.to_tensor()?;
        let rhs = ctx.input(1)?.to_tensor()?;
        write_output(ctx, lhs.dtype(), policy, |out| kernels::mul_out(out, lhs, rhs))
    }))
}

/// `aten::addmm(self, mat1, mat2, beta=1, alpha=1)`.
pub(crate) fn generate_addmm(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 3, 5)?;
    let beta = FloatArg::from_node(node, 3)?;
    let alpha = FloatArg::from_node(node, 4)?;
    let policy = options.output_policy;
    Ok(op_closure(move |ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let mat1 = ctx.input(1)?.to_tensor()?;
        let mat2 = ctx.input(2)?.to_tensor()?;
        let beta = beta.resolve(ctx)?.unwrap_or(1.0);
        let alpha = alpha.resolve(ctx)?.unwrap_or(1.0);
        write_output(ctx, mat1.dtype(), policy, |out| {
            kernels::addmm_out(out, input, mat1, mat2, beta, alpha)
        })
    }))
}

pub(crate) fn generate_bmm(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 2, 2)?;
    let policy = options.output_policy;
    Ok(op_closure(move |ctx| {
        let lhs = ctx.input(0)?.to_tensor()?;
        let rhs = ctx.input(1)?.to_tensor()?;
        write_output(ctx, lhs.dtype(), policy, |out| kernels::bmm_out(out, lhs, rhs))
    }))
}
