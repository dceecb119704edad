mod common;

use std::sync::Arc;

use anyhow::Result;
use static_rt::{
    DType, GraphBuilder, NodeInput, RuntimeError, Tensor, TupleType, Value, ValueType,
};

use common::{arange, run_once, single_op};

fn view_of(kind: &str, constants: Vec<Value>, source: &Tensor) -> Result<Tensor> {
    let plan = common::plan(single_op(kind, 1, constants, vec![ValueType::Tensor])?)?;
    run_once(&plan, vec![source.clone().into()])
}

#[test]
fn views_alias_their_source() -> Result<()> {
    let source = arange(&[2, 3, 4])?;
    let cases: Vec<(&str, Vec<Value>, Vec<usize>)> = vec![
        ("aten::transpose", vec![Value::Int(0), Value::Int(2)], vec![4, 3, 2]),
        ("aten::flatten", vec![Value::Int(1), Value::Int(-1)], vec![2, 12]),
        ("aten::permute", vec![Value::IntList(vec![1, 2, 0])], vec![3, 4, 2]),
        ("aten::reshape", vec![Value::IntList(vec![6, -1])], vec![6, 4]),
        (
            "aten::slice",
            vec![Value::Int(2), Value::Int(1), Value::None, Value::Int(2)],
            vec![2, 3, 2],
        ),
    ];
    for (kind, constants, sizes) in cases {
        let view = view_of(kind, constants, &source)?;
        assert!(view.shares_storage(&source), "{kind} copied its input");
        assert_eq!(view.sizes(), sizes.as_slice(), "{kind}");
    }
    Ok(())
}

#[test]
fn slice_view_reads_strided_elements() -> Result<()> {
    let source = arange(&[6])?;
    let view = view_of(
        "aten::slice",
        vec![Value::Int(0), Value::Int(-4), Value::None, Value::Int(2)],
        &source,
    )?;
    assert_eq!(view.to_f32_vec(), vec![2.0, 4.0]);
    Ok(())
}

#[test]
fn narrow_wraps_negative_start() -> Result<()> {
    let source = arange(&[10])?;
    let graph = {
        let mut builder = GraphBuilder::new();
        let input = builder.add_input();
        let start = builder.add_input();
        let out = builder.add_op(
            "aten::narrow",
            vec![
                input.into(),
                NodeInput::constant(0i64),
                start.into(),
                NodeInput::constant(2i64),
            ],
            ValueType::Tensor,
        )?;
        builder.mark_output(out)?;
        builder.build()
    };
    let plan = common::plan(graph)?;

    let wrapped = run_once(&plan, vec![source.clone().into(), Value::Int(-3)])?;
    let direct = run_once(&plan, vec![source.clone().into(), Value::Int(7)])?;
    assert_eq!(wrapped.to_f32_vec(), vec![7.0, 8.0]);
    assert_eq!(wrapped.to_f32_vec(), direct.to_f32_vec());
    assert!(wrapped.shares_storage(&source));

    let from_tensor = run_once(
        &plan,
        vec![source.clone().into(), Tensor::scalar_i64(7).into()],
    )?;
    assert_eq!(from_tensor.to_f32_vec(), direct.to_f32_vec());

    let err = run_once(&plan, vec![source.clone().into(), Value::Int(9)])
        .unwrap_err()
        .downcast::<RuntimeError>()?;
    match err.root() {
        RuntimeError::OutOfRange(message) => {
            assert_eq!(message, "start (9) + length (2) exceeds dimension size (10).")
        }
        other => panic!("expected out-of-range, got {other:?}"),
    }

    let end = run_once(&plan, vec![source.into(), Value::Int(8)])?;
    assert_eq!(end.to_f32_vec(), vec![8.0, 9.0]);
    Ok(())
}

#[test]
fn narrow_rejects_zero_dim_and_negative_length() -> Result<()> {
    let scalar = Tensor::scalar_i64(1);
    let err = narrow_at_dim0(&scalar, 0, 1)
        .unwrap_err()
        .downcast::<RuntimeError>()?;
    assert!(matches!(err.root(), RuntimeError::OutOfRange(_)), "{err}");

    let source = arange(&[4])?;
    let err = narrow_at_dim0(&source, 0, -1)
        .unwrap_err()
        .downcast::<RuntimeError>()?;
    assert!(matches!(err.root(), RuntimeError::OutOfRange(_)), "{err}");

    let err = narrow_at_dim0(&source, -5, 1)
        .unwrap_err()
        .downcast::<RuntimeError>()?;
    assert!(matches!(err.root(), RuntimeError::OutOfRange(_)), "{err}");
    Ok(())
}

#[test]
fn narrow_wraps_negative_start_on_an_empty_axis() -> Result<()> {
    let empty = arange(&[0])?;
    let view = narrow_at_dim0(&empty, -1, 0)?;
    assert_eq!(view.sizes(), &[0]);
    assert!(view.shares_storage(&empty));

    let err = narrow_at_dim0(&empty, -2, 0)
        .unwrap_err()
        .downcast::<RuntimeError>()?;
    match err.root() {
        RuntimeError::OutOfRange(message) => assert_eq!(
            message,
            "start out of range (expected to be in range of [-1, 0], but got -2)"
        ),
        other => panic!("expected out-of-range, got {other:?}"),
    }
    Ok(())
}

fn narrow_at_dim0(source: &Tensor, start: i64, length: i64) -> Result<Tensor> {
    let plan = common::plan(single_op(
        "aten::narrow",
        1,
        vec![Value::Int(0), Value::Int(start), Value::Int(length)],
        vec![ValueType::Tensor],
    )?)?;
    run_once(&plan, vec![source.clone().into()])
}

#[test]
fn list_unpack_fills_outputs_in_order() -> Result<()> {
    let graph = single_op(
        "prim::ListUnpack",
        1,
        vec![],
        vec![ValueType::Tensor, ValueType::Tensor, ValueType::Tensor],
    )?;
    let plan = common::plan(graph)?;
    let parts = vec![arange(&[1])?, arange(&[2])?, arange(&[3])?];
    let mut frame = plan.new_frame();
    let outputs = plan.run(&mut frame, vec![Value::TensorList(parts.clone())])?;
    assert_eq!(outputs.len(), 3);
    for (output, part) in outputs.iter().zip(&parts) {
        let tensor = output.to_tensor()?;
        assert!(tensor.shares_storage(part));
        assert_eq!(tensor.sizes(), part.sizes());
    }

    let err = plan
        .run(&mut frame, vec![Value::TensorList(parts[..2].to_vec())])
        .unwrap_err();
    assert!(matches!(err.root(), RuntimeError::ShapeMismatch(_)), "{err}");
    Ok(())
}

#[test]
fn named_tuple_keeps_field_names() -> Result<()> {
    let ty = Arc::new(TupleType::named("Pair", ["left", "right"]));
    let graph = single_op(
        "prim::TupleConstruct",
        1,
        vec![Value::Int(5)],
        vec![ValueType::Tuple(ty)],
    )?;
    let plan = common::plan(graph)?;
    let mut frame = plan.new_frame();
    let source = arange(&[2])?;
    let outputs = plan.run(&mut frame, vec![source.clone().into()])?;
    let tuple = outputs[0].to_tuple()?;
    assert_eq!(tuple.len(), 2);
    assert_eq!(tuple.tuple_type().map(|t| t.name()), Some(Some("Pair")));
    assert_eq!(tuple.field("right").map(Value::to_int).transpose()?, Some(5));
    assert!(tuple
        .field("left")
        .map(|value| value.to_tensor())
        .transpose()?
        .is_some_and(|tensor| tensor.shares_storage(&source)));
    Ok(())
}

#[test]
fn unnamed_tuple_and_int_list_construct() -> Result<()> {
    let mut builder = GraphBuilder::new();
    let input = builder.add_input();
    let shape = builder.add_op(
        "prim::ListConstruct",
        vec![NodeInput::constant(3i64), NodeInput::constant(-1i64)],
        ValueType::list_of(ValueType::Int),
    )?;
    let reshaped = builder.add_op(
        "aten::reshape",
        vec![input.into(), shape.into()],
        ValueType::Tensor,
    )?;
    let pair = builder.add_op(
        "prim::TupleConstruct",
        vec![reshaped.into(), shape.into()],
        ValueType::Tuple(Arc::new(TupleType::unnamed())),
    )?;
    builder.mark_output(pair)?;
    let plan = common::plan(builder.build())?;

    let mut frame = plan.new_frame();
    let outputs = plan.run(&mut frame, vec![arange(&[6])?.into()])?;
    let tuple = outputs[0].to_tuple()?;
    assert!(tuple.tuple_type().is_none());
    assert_eq!(tuple.elements()[0].to_tensor()?.sizes(), &[3, 2]);
    assert_eq!(tuple.elements()[1].to_int_list()?, &[3, -1]);
    Ok(())
}

#[test]
fn conversion_aliases_unless_something_changes() -> Result<()> {
    let source = arange(&[3])?;
    let same = view_of(
        "aten::to",
        vec![
            Value::ScalarType(DType::F32),
            Value::Bool(false),
            Value::Bool(false),
            Value::None,
        ],
        &source,
    )?;
    assert!(same.shares_storage(&source));

    let converted = view_of(
        "aten::to",
        vec![
            Value::ScalarType(DType::I64),
            Value::Bool(false),
            Value::Bool(false),
            Value::None,
        ],
        &source,
    )?;
    assert_eq!(converted.dtype(), DType::I64);
    assert_eq!(converted.to_i64_vec(), vec![0, 1, 2]);

    let copied = view_of(
        "aten::to",
        vec![
            Value::ScalarType(DType::F32),
            Value::Bool(false),
            Value::Bool(true),
            Value::None,
        ],
        &source,
    )?;
    assert!(!copied.shares_storage(&source));

    let big = (1i64 << 53) + 1;
    let wide = Tensor::from_i64(&[2], vec![big, i64::MIN])?;
    let exact = view_of(
        "aten::to",
        vec![
            Value::ScalarType(DType::I64),
            Value::Bool(false),
            Value::Bool(true),
            Value::None,
        ],
        &wide,
    )?;
    assert!(!exact.shares_storage(&wide));
    assert_eq!(exact.to_i64_vec(), vec![big, i64::MIN]);
    Ok(())
}
