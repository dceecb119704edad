use crate::config::RuntimeOptions;
use crate::error::{RuntimeError, RuntimeResult};
use crate::graph::{Node, ValueType};
use crate::ops::expect_arity;
use crate::runtime::{op_closure, OpClosure, RunContext};
use crate::value::{TupleValue, Value};

fn collect_inputs(ctx: &RunContext<'_>) -> RuntimeResult<Vec<Value>> {
    (0..ctx.num_inputs())
        .map(|index| ctx.input(index).cloned())
        .collect()
}

/// `prim::TupleConstruct`: packs every input into one tuple, keeping field names when the
/// output type is a named tuple.
pub(crate) fn generate_tuple_construct(
    node: &Node,
    _: &RuntimeOptions,
) -> RuntimeResult<OpClosure> {
    let named = match node.output_type(0) {
        Some(ValueType::Tuple(ty)) if ty.name().is_some() => Some(ty.clone()),
        _ => None,
    };
    Ok(op_closure(move |ctx| {
        let elements = collect_inputs(ctx)?;
        let tuple = match &named {
            Some(ty) => TupleValue::named(elements, ty.clone())?,
            None => TupleValue::new(elements),
        };
        *ctx.output(0)? = Value::Tuple(tuple);
        Ok(())
    }))
}

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Tensors,
    Ints,
    Generic,
}

/// `prim::ListConstruct`: the list representation follows the declared element type.
pub(crate) fn generate_list_construct(
    node: &Node,
    _: &RuntimeOptions,
) -> RuntimeResult<OpClosure> {
    let kind = match node.output_type(0) {
        Some(ValueType::List(element)) => match element.as_ref() {
            ValueType::Tensor => ListKind::Tensors,
            ValueType::Int => ListKind::Ints,
            _ => ListKind::Generic,
        },
        _ => ListKind::Generic,
    };
    Ok(op_closure(move |ctx| {
        let list = match kind {
            ListKind::Tensors => Value::TensorList(
                (0..ctx.num_inputs())
                    .map(|index| ctx.input(index)?.to_tensor().cloned())
                    .collect::<RuntimeResult<_>>()?,
            ),
            ListKind::Ints => Value::IntList(
                (0..ctx.num_inputs())
                    .map(|index| ctx.input(index)?.to_int())
                    .collect::<RuntimeResult<_>>()?,
            ),
            ListKind::Generic => Value::List(collect_inputs(ctx)?),
        };
        *ctx.output(0)? = list;
        Ok(())
    }))
}

/// `prim::ListUnpack`: spreads one list over the node's outputs positionally.
pub(crate) fn generate_list_unpack(node: &Node, _: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    expect_arity(node, 1, 1)?;
    Ok(op_closure(|ctx| {
        let list = ctx.input(0)?;
        let len = list.list_len()?;
        if len != ctx.num_outputs() {
            return Err(RuntimeError::ShapeMismatch(format!(
                "expected {} elements in a list but found {}",
                ctx.num_outputs(),
                len
            )));
        }
        for index in 0..len {
            *ctx.output(index)? = list.list_element(index)?;
        }
        Ok(())
    }))
}
