use anyhow::Result;
use static_rt_tensor::kernels::{
    add_out, addmm_out, bmm_out, cat_out, clamp_out, copy_, leaky_relu_out, logit_out, mul_out,
    nan_to_num_out, relu_out, resize_as_, sigmoid_out, CapacityAwareOutput, OutputResolver,
    ResizingOutput,
};
use static_rt_tensor::{DType, Tensor};

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-5, "{actual:?} vs {expected:?}");
    }
}

#[test]
fn add_broadcasts_and_scales() -> Result<()> {
    let lhs = Tensor::from_f32(&[2, 2], vec![1.0, 2.0, 3.0, 4.0])?;
    let rhs = Tensor::from_f32(&[2], vec![10.0, 20.0])?;
    let mut out = Tensor::empty(DType::F32);
    add_out(&mut ResizingOutput::new(&mut out), &lhs, &rhs, 0.5)?;
    assert_eq!(out.sizes(), &[2, 2]);
    assert_close(&out.to_f32_vec(), &[6.0, 12.0, 8.0, 14.0]);
    Ok(())
}

#[test]
fn mul_rejects_incompatible_shapes() -> Result<()> {
    let lhs = Tensor::from_f32(&[3], vec![1.0, 2.0, 3.0])?;
    let rhs = Tensor::from_f32(&[2], vec![1.0, 2.0])?;
    let mut out = Tensor::empty(DType::F32);
    assert!(mul_out(&mut ResizingOutput::new(&mut out), &lhs, &rhs).is_err());
    Ok(())
}

#[test]
fn addmm_combines_bias_and_product() -> Result<()> {
    let bias = Tensor::from_f32(&[2], vec![1.0, -1.0])?;
    let mat1 = Tensor::from_f32(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
    let mat2 = Tensor::from_f32(&[3, 2], vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0])?;
    let mut out = Tensor::empty(DType::F32);
    addmm_out(
        &mut ResizingOutput::new(&mut out),
        &bias,
        &mat1,
        &mat2,
        2.0,
        1.0,
    )?;
    assert_eq!(out.sizes(), &[2, 2]);
    assert_close(&out.to_f32_vec(), &[6.0, 3.0, 12.0, 9.0]);
    Ok(())
}

#[test]
fn bmm_multiplies_each_batch() -> Result<()> {
    let lhs = Tensor::from_f32(&[2, 1, 2], vec![1.0, 2.0, 3.0, 4.0])?;
    let rhs = Tensor::from_f32(&[2, 2, 1], vec![1.0, 1.0, 2.0, 0.5])?;
    let mut out = Tensor::empty(DType::F32);
    bmm_out(&mut ResizingOutput::new(&mut out), &lhs, &rhs)?;
    assert_eq!(out.sizes(), &[2, 1, 1]);
    assert_close(&out.to_f32_vec(), &[3.0, 8.0]);
    Ok(())
}

#[test]
fn clamp_requires_a_bound_and_keeps_nan() -> Result<()> {
    let input = Tensor::from_f32(&[4], vec![-2.0, 0.5, 3.0, f32::NAN])?;
    let mut out = Tensor::empty(DType::F32);
    clamp_out(&mut ResizingOutput::new(&mut out), &input, Some(0.0), Some(1.0))?;
    let values = out.to_f32_vec();
    assert_close(&values[..3], &[0.0, 0.5, 1.0]);
    assert!(values[3].is_nan());
    assert!(clamp_out(&mut ResizingOutput::new(&mut out), &input, None, None).is_err());
    Ok(())
}

#[test]
fn nan_to_num_replaces_non_finite_values() -> Result<()> {
    let input = Tensor::from_f64(
        DType::F64,
        &[4],
        &[f64::NAN, f64::INFINITY, -1.0, f64::NEG_INFINITY],
    )?;
    let mut out = Tensor::empty(DType::F64);
    nan_to_num_out(&mut ResizingOutput::new(&mut out), &input, 0.0, 9.0, -9.0)?;
    assert_eq!(out.to_f64_vec(), vec![0.0, 9.0, -1.0, -9.0]);
    Ok(())
}

#[test]
fn activations_match_reference_values() -> Result<()> {
    let input = Tensor::from_f32(&[3], vec![-1.0, 0.0, 2.0])?;
    let mut out = Tensor::empty(DType::F32);

    relu_out(&mut ResizingOutput::new(&mut out), &input)?;
    assert_close(&out.to_f32_vec(), &[0.0, 0.0, 2.0]);

    leaky_relu_out(&mut ResizingOutput::new(&mut out), &input, 0.1)?;
    assert_close(&out.to_f32_vec(), &[-0.1, 0.0, 2.0]);

    sigmoid_out(&mut ResizingOutput::new(&mut out), &input)?;
    assert_close(&out.to_f32_vec(), &[0.268_941_42, 0.5, 0.880_797_1]);

    let ints = Tensor::from_i64(&[2], vec![1, 2])?;
    let mut int_out = Tensor::empty(DType::I64);
    assert!(sigmoid_out(&mut ResizingOutput::new(&mut int_out), &ints).is_err());
    Ok(())
}

#[test]
fn logit_clamps_only_with_eps() -> Result<()> {
    let input = Tensor::from_f64(DType::F64, &[2], &[0.0, 0.5])?;
    let mut out = Tensor::empty(DType::F64);
    logit_out(&mut ResizingOutput::new(&mut out), &input, Some(0.25))?;
    let values = out.to_f64_vec();
    assert!((values[0] - (0.25f64 / 0.75).ln()).abs() < 1e-12);
    assert_eq!(values[1], 0.0);

    logit_out(&mut ResizingOutput::new(&mut out), &input, None)?;
    assert_eq!(out.to_f64_vec()[0], f64::NEG_INFINITY);
    Ok(())
}

#[test]
fn cat_joins_along_inner_axis() -> Result<()> {
    let a = Tensor::from_f32(&[2, 1], vec![1.0, 2.0])?;
    let b = Tensor::from_f32(&[2, 2], vec![3.0, 4.0, 5.0, 6.0])?;
    let mut out = Tensor::empty(DType::F32);
    cat_out(&mut ResizingOutput::new(&mut out), &[a.clone(), b.clone()], -1)?;
    assert_eq!(out.sizes(), &[2, 3]);
    assert_close(&out.to_f32_vec(), &[1.0, 3.0, 4.0, 2.0, 5.0, 6.0]);
    assert!(cat_out(&mut ResizingOutput::new(&mut out), &[a, b], 0).is_err());
    Ok(())
}

#[test]
fn capacity_aware_resolver_skips_matching_geometry() -> Result<()> {
    let mut out = Tensor::zeros(DType::F32, &[2, 3]);
    let before = out.storage_id();
    {
        let mut resolver = CapacityAwareOutput::new(&mut out);
        resolver.set_output(&[2, 3], None)?;
        assert_eq!(resolver.output().sizes(), &[2, 3]);
        resolver.set_output(&[6], None)?;
        assert_eq!(resolver.output().sizes(), &[6]);
    }
    assert_eq!(out.storage_id(), before);
    Ok(())
}

#[test]
fn copy_requires_matching_sizes() -> Result<()> {
    let src = Tensor::from_f32(&[2, 2], vec![1.0, 2.0, 3.0, 4.0])?;
    let mut dst = Tensor::empty(DType::F32);
    assert!(copy_(&mut dst, &src).is_err());
    resize_as_(&mut dst, &src);
    copy_(&mut dst, &src)?;
    assert_eq!(dst.to_f32_vec(), src.to_f32_vec());
    Ok(())
}
