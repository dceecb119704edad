mod common;

use anyhow::Result;
use static_rt::classify::{self, Classifier};
use static_rt::graph::NodeOutput;
use static_rt::native::NativeRegistry;
use static_rt::ops::names;
use static_rt::registry::{global_registry, OperatorFunctor, OperatorRegistry};
use static_rt::{
    DType, Node, NodeInput, RuntimeError, RuntimeOptions, Strategy, Value, ValueId, ValueType,
};

fn node_with_inputs(kind: &str, arity: usize) -> Node {
    let inputs = (0..arity)
        .map(|index| NodeInput::Value(ValueId(index as u32)))
        .collect();
    let outputs = vec![NodeOutput {
        id: ValueId(arity as u32),
        ty: ValueType::Tensor,
    }];
    Node::new(kind, inputs, outputs)
}

fn minimal_arity(name: &str) -> usize {
    match name {
        names::ADDMM => 3,
        names::ADD | names::MUL | names::BMM => 2,
        _ => 1,
    }
}

#[test]
fn every_registered_operator_generates_a_closure() -> Result<()> {
    let registry = global_registry();
    assert!(!registry.is_empty());
    for name in registry.names() {
        assert!(registry.has(name), "{name} missing from has()");
        let node = node_with_inputs(name, minimal_arity(name));
        registry.generate(&node, &RuntimeOptions::default())?;
        assert!(classify::can_run_out_of_place(&node));
        assert_eq!(classify::classify(&node), Strategy::OutOfPlace);
    }
    Ok(())
}

#[test]
fn reuse_flags_follow_the_functor() -> Result<()> {
    let add = node_with_inputs(names::ADD, 2);
    assert!(classify::can_reuse_input_buffer(&add)?);
    assert!(classify::can_reuse_output_buffer(&add)?);

    let cat = node_with_inputs(names::CAT, 1);
    assert!(!classify::can_reuse_input_buffer(&cat)?);
    assert!(classify::can_reuse_output_buffer(&cat)?);
    Ok(())
}

#[test]
fn reuse_query_on_unregistered_operator_is_an_invariant_violation() {
    let node = node_with_inputs("aten::softmax", 1);
    assert!(!classify::can_run_out_of_place(&node));
    let err = classify::can_reuse_output_buffer(&node).unwrap_err();
    assert!(matches!(err, RuntimeError::InvariantViolation(_)), "{err}");
}

#[test]
fn duplicate_registration_is_rejected() -> Result<()> {
    let mut registry = OperatorRegistry::with_builtin_operators();
    let existing = *registry
        .functor(names::RELU)
        .expect("relu is a builtin operator");
    let err = registry.register(existing).unwrap_err();
    assert!(matches!(err, RuntimeError::InvariantViolation(_)));

    let mut empty = OperatorRegistry::new();
    empty.register(OperatorFunctor::new("test::relu_alias", |node, options| {
        global_registry().generate(
            &Node::new(names::RELU, node.inputs().to_vec(), node.outputs().to_vec()),
            options,
        )
    }))?;
    assert!(empty.has("test::relu_alias"));
    assert!(!empty.has(names::RELU));
    Ok(())
}

#[test]
fn generate_on_missing_operator_reports_it() {
    let registry = OperatorRegistry::new();
    let node = node_with_inputs(names::ADD, 2);
    let err = match registry.generate(&node, &RuntimeOptions::default()) {
        Ok(_) => panic!("empty registry generated a closure"),
        Err(err) => err,
    };
    assert!(matches!(err, RuntimeError::UnregisteredOperation { ref op } if op == names::ADD));
}

#[test]
fn conversion_is_native_only_in_five_input_form() -> Result<()> {
    let full = common::single_op(
        "aten::to",
        1,
        vec![
            Value::ScalarType(DType::F64),
            Value::Bool(false),
            Value::Bool(false),
            Value::None,
        ],
        vec![ValueType::Tensor],
    )?;
    assert_eq!(classify::classify(&full.nodes()[0]), Strategy::Native);

    let short = common::single_op(
        "aten::to",
        1,
        vec![
            Value::ScalarType(DType::F64),
            Value::Bool(false),
            Value::Bool(false),
        ],
        vec![ValueType::Tensor],
    )?;
    let node = &short.nodes()[0];
    assert!(!classify::can_run_natively(node));
    assert_eq!(classify::classify(node), Strategy::Fallback);
    Ok(())
}

#[test]
fn view_and_container_operations_are_native() {
    for kind in [
        "aten::transpose",
        "aten::narrow",
        "aten::reshape",
        "aten::slice",
        "aten::flatten",
        "aten::permute",
        "prim::TupleConstruct",
        "prim::ListConstruct",
        "prim::ListUnpack",
    ] {
        let node = node_with_inputs(kind, 2);
        assert_eq!(classify::classify(&node), Strategy::Native, "{kind}");
        assert!(!classify::can_run_out_of_place(&node), "{kind}");
    }
}

#[test]
fn local_registries_classify_independently() {
    let registry = OperatorRegistry::new();
    let natives = NativeRegistry::new();
    let classifier = Classifier::new(&registry, &natives);
    let node = node_with_inputs(names::ADD, 2);
    assert_eq!(classifier.classify(&node), Strategy::Fallback);
    assert_eq!(Classifier::global().classify(&node), Strategy::OutOfPlace);
}
