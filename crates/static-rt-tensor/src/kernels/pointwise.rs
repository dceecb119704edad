//! Elementwise arithmetic, clamping and activation kernels.

use super::{broadcast_shapes, broadcast_values, emit, OutputResolver};
use crate::error::{TensorError, TensorResult};
use crate::tensor::Tensor;

fn binary_out(
    out: &mut dyn OutputResolver,
    lhs: &Tensor,
    rhs: &Tensor,
    op: impl Fn(f64, f64) -> f64,
) -> TensorResult<()> {
    let sizes = broadcast_shapes(lhs.sizes(), rhs.sizes())?;
    let a = broadcast_values(lhs, &sizes)?;
    let b = broadcast_values(rhs, &sizes)?;
    let values: Vec<f64> = a.iter().zip(&b).map(|(x, y)| op(*x, *y)).collect();
    emit(out, &sizes, &values)
}

fn unary_out(
    out: &mut dyn OutputResolver,
    input: &Tensor,
    op: impl Fn(f64) -> f64,
) -> TensorResult<()> {
    let values: Vec<f64> = input.to_f64_vec().into_iter().map(op).collect();
    emit(out, input.sizes(), &values)
}

fn require_floating(op: &'static str, input: &Tensor) -> TensorResult<()> {
    if !input.dtype().is_floating_point() {
        return Err(TensorError::UnsupportedDType {
            op,
            dtype: input.dtype(),
        });
    }
    Ok(())
}

/// `lhs + alpha * rhs` with broadcasting.
pub fn add_out(
    out: &mut dyn OutputResolver,
    lhs: &Tensor,
    rhs: &Tensor,
    alpha: f64,
) -> TensorResult<()> {
    binary_out(out, lhs, rhs, |x, y| x + alpha * y)
}

pub fn mul_out(out: &mut dyn OutputResolver, lhs: &Tensor, rhs: &Tensor) -> TensorResult<()> {
    binary_out(out, lhs, rhs, |x, y| x * y)
}

/// Clamps into `[min, max]`; at least one bound must be given. NaN propagates.
pub fn clamp_out(
    out: &mut dyn OutputResolver,
    input: &Tensor,
    min: Option<f64>,
    max: Option<f64>,
) -> TensorResult<()> {
    if min.is_none() && max.is_none() {
        return Err(TensorError::invalid(
            "clamp",
            "at least one of 'min' or 'max' must not be None",
        ));
    }
    unary_out(out, input, |x| {
        if x.is_nan() {
            return x;
        }
        let lower = min.map_or(x, |m| x.max(m));
        max.map_or(lower, |m| lower.min(m))
    })
}

/// Replaces NaN, positive infinity and negative infinity with the given values.
pub fn nan_to_num_out(
    out: &mut dyn OutputResolver,
    input: &Tensor,
    nan: f64,
    posinf: f64,
    neginf: f64,
) -> TensorResult<()> {
    unary_out(out, input, |x| {
        if x.is_nan() {
            nan
        } else if x == f64::INFINITY {
            posinf
        } else if x == f64::NEG_INFINITY {
            neginf
        } else {
            x
        }
    })
}

/// `x <= threshold ? value : x`.
pub fn threshold_out(
    out: &mut dyn OutputResolver,
    input: &Tensor,
    threshold: f64,
    value: f64,
) -> TensorResult<()> {
    unary_out(out, input, |x| if x <= threshold { value } else { x })
}

pub fn relu_out(out: &mut dyn OutputResolver, input: &Tensor) -> TensorResult<()> {
    threshold_out(out, input, 0.0, 0.0)
}

pub fn sigmoid_out(out: &mut dyn OutputResolver, input: &Tensor) -> TensorResult<()> {
    require_floating("sigmoid", input)?;
    unary_out(out, input, |x| 1.0 / (1.0 + (-x).exp()))
}

pub fn tanh_out(out: &mut dyn OutputResolver, input: &Tensor) -> TensorResult<()> {
    require_floating("tanh", input)?;
    unary_out(out, input, f64::tanh)
}

pub fn leaky_relu_out(
    out: &mut dyn OutputResolver,
    input: &Tensor,
    negative_slope: f64,
) -> TensorResult<()> {
    unary_out(out, input, |x| if x > 0.0 { x } else { x * negative_slope })
}

/// `ln(x / (1 - x))`, with `x` clamped to `[eps, 1 - eps]` when `eps` is given.
pub fn logit_out(
    out: &mut dyn OutputResolver,
    input: &Tensor,
    eps: Option<f64>,
) -> TensorResult<()> {
    require_floating("logit", input)?;
    unary_out(out, input, |x| {
        let z = match eps {
            Some(eps) => x.clamp(eps, 1.0 - eps),
            None => x,
        };
        (z / (1.0 - z)).ln()
    })
}
