use static_rt_tensor::kernels;

use super::{expect_arity, write_output, FloatArg};
use crate::config::RuntimeOptions;
use crate::error::RuntimeResult;
use crate::graph::Node;
use crate::runtime::{op_closure, OpClosure};

const DEFAULT_NEGATIVE_SLOPE: f64 = 0.01;

/// `aten::clamp(self, min=None, max=None)`.
pub(crate) fn generate_clamp(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 3)?;
    let min = FloatArg::from_node(node, 1)?;
    let max = FloatArg::from_node(node, 2)?;
    let policy = options.output_policy;
    Ok(op_closure(move |ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let min = min.resolve(ctx)?;
        let max = max.resolve(ctx)?;
        write_output(ctx, input.dtype(), policy, |out| {
            kernels::clamp_out(out, input, min, max)
        })
    }))
}

/// `aten::nan_to_num(self, nan=0, posinf=+inf, neginf=-inf)`.
pub(crate) fn generate_nan_to_num(
    node: &Node,
    options: &RuntimeOptions,
) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 4)?;
    let nan = FloatArg::from_node(node, 1)?;
    let posinf = FloatArg::from_node(node, 2)?;
    let neginf = FloatArg::from_node(node, 3)?;
    let policy = options.output_policy;
    Ok(op_closure(move |ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let nan = nan.resolve(ctx)?.unwrap_or(0.0);
        let posinf = posinf.resolve(ctx)?.unwrap_or(f64::INFINITY);
        let neginf = neginf.resolve(ctx)?.unwrap_or(f64::NEG_INFINITY);
        write_output(ctx, input.dtype(), policy, |out| {
            kernels::nan_to_num_out(out, input, nan, posinf, neginf)
        })
    }))
}

pub(crate) fn generate_tanh(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 1)?;
    let policy = options.output_policy;
    Ok(op_closure(move |ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        write_output(ctx, input.dtype(), policy, |out| kernels::tanh_out(out, input))
    }))
}

pub(crate) fn generate_sigmoid(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 1)?;
    let policy = options.output_policy;
    Ok(op_closure(move |ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        write_output(ctx, input.dtype(), policy, |out| {
            kernels::sigmoid_out(out, input)
        })
    }))
}

pub(crate) fn generate_relu(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 1)?;
    let policy = options.output_policy;
    Ok(op_closure(move |ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        write_output(ctx, input.dtype(), policy, |out| kernels::relu_out(out, input))
    }))
}

/// `aten::leaky_relu(self, negative_slope=0.01)`.
///
/// A constant slope is folded into the closure; otherwise it is read on every call.
pub(crate) fn generate_leaky_relu(
    node: &Node,
    options: &RuntimeOptions,
) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 2)?;
    let policy = options.output_policy;
    match FloatArg::from_node(node, 1)? {
        FloatArg::Bound(slope) => {
            let slope = slope.unwrap_or(DEFAULT_NEGATIVE_SLOPE);
            Ok(op_closure(move |ctx| {
                let input = ctx.input(0)?.to_tensor()?;
                write_output(ctx, input.dtype(), policy, |out| {
                    kernels::leaky_relu_out(out, input, slope)
                })
            }))
        }
        dynamic @ FloatArg::Dynamic(_) => Ok(op_closure(move |ctx| {
            let input = ctx.input(0)?.to_tensor()?;
            let slope = dynamic.resolve(ctx)?.unwrap_or(DEFAULT_NEGATIVE_SLOPE);
            write_output(ctx, input.dtype(), policy, |out| {
                kernels::leaky_relu_out(out, input, slope)
            })
        })),
    }
}

/// `aten::logit(self, eps=None)`. A negative `eps` disables clamping.
pub(crate) fn generate_logit(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 2)?;
    let eps = FloatArg::from_node(node, 1)?;
    let policy = options.output_policy;
    Ok(op_closure(move |ctx| {
        let input = ctx.input(0)?.to_tensor()?;
        let eps = eps.resolve(ctx)?.filter(|eps| *eps >= 0.0);
        write_output(ctx, input.dtype(), policy, |out| {
            kernels::logit_out(out, input, eps)
        })
    }))
}
