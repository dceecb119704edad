use super::{broadcast_values, emit, OutputResolver};
use crate::error::{TensorError, TensorResult};
use crate::tensor::Tensor;

/// Dense `[n, k] x [k, p]` product accumulated into `dst`.
fn matmul_into(dst: &mut [f64], lhs: &[f64], rhs: &[f64], n: usize, k: usize, p: usize) {
    for row in 0..n {
        for inner in 0..k {
            let a = lhs[row * k + inner];
            if a == 0.0 {
                continue;
            }
            let rhs_row = &rhs[inner * p..(inner + 1) * p];
            let dst_row = &mut dst[row * p..(row + 1) * p];
            for (d, b) in dst_row.iter_mut().zip(rhs_row) {
                *d += a * b;
            }
        }
    }
}

fn expect_rank(op: &'static str, tensor: &Tensor, rank: usize) -> TensorResult<()> {
    if tensor.dim() != rank {
        return Err(TensorError::shape(format!(
            "{} expects {}-D tensors, got sizes {:?}",
            op,
            rank,
            tensor.sizes()
        )));
    }
    Ok(())
}

/// Batched matrix product of `[b, n, k]` and `[b, k, p]`.
pub fn bmm_out(out: &mut dyn OutputResolver, lhs: &Tensor, rhs: &Tensor) -> TensorResult<()> {
    expect_rank("bmm", lhs, 3)?;
    expect_rank("bmm", rhs, 3)?;
    let (batch, n, k) = (lhs.sizes()[0], lhs.sizes()[1], lhs.sizes()[2]);
    let p = rhs.sizes()[2];
    if rhs.sizes()[0] != batch || rhs.sizes()[1] != k {
        return Err(TensorError::shape(format!(
            "bmm operand sizes are incompatible: {:?} and {:?}",
            lhs.sizes(),
            rhs.sizes()
        )));
    }
    let a = lhs.to_f64_vec();
    let b = rhs.to_f64_vec();
    let mut values = vec![0.0; batch * n * p];
    for index in 0..batch {
        matmul_into(
            &mut values[index * n * p..(index + 1) * n * p],
            &a[index * n * k..(index + 1) * n * k],
            &b[index * k * p..(index + 1) * k * p],
            n,
            k,
            p,
        );
    }
    emit(out, &[batch, n, p], &values)
}

/// `beta * input + alpha * (mat1 @ mat2)`, where `input` broadcasts to `[n, p]`.
///
/// With `beta == 0` the input is ignored entirely, so NaNs in it do not propagate.
pub fn addmm_out(
    out: &mut dyn OutputResolver,
    input: &Tensor,
    mat1: &Tensor,
    mat2: &Tensor,
    beta: f64,
    alpha: f64,
) -> TensorResult<()> {
    expect_rank("addmm", mat1, 2)?;
    expect_rank("addmm", mat2, 2)?;
    let (n, k) = (mat1.sizes()[0], mat1.sizes()[1]);
    let p = mat2.sizes()[1];
    if mat2.sizes()[0] != k {
        return Err(TensorError::shape(format!(
            "mat1 and mat2 shapes cannot be multiplied ({}x{} and {}x{})",
            n,
            k,
            mat2.sizes()[0],
            p
        )));
    }
    let mut product = vec![0.0; n * p];
    matmul_into(&mut product, &mat1.to_f64_vec(), &mat2.to_f64_vec(), n, k, p);

    let values: Vec<f64> = if beta == 0.0 {
        product.iter().map(|v| alpha * v).collect()
    } else {
        let bias = broadcast_values(input, &[n, p])?;
        bias.iter()
            .zip(&product)
            .map(|(c, v)| beta * c + alpha * v)
            .collect()
    };
    emit(out, &[n, p], &values)
}
