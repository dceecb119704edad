//! Closure lookup for planned nodes, with the unimplemented fallback as the last resort.

use crate::config::RuntimeOptions;
use crate::error::{RuntimeError, RuntimeResult};
use crate::graph::Node;
use crate::native::global_native_registry;
use crate::registry::global_registry;
use crate::runtime::{op_closure, OpClosure};

/// Closure for a node neither table covers. Every invocation fails with
/// [`RuntimeError::Unimplemented`].
pub fn fallback_operation(node: &Node) -> OpClosure {
    let op = node.kind().to_string();
    op_closure(move |_| Err(RuntimeError::Unimplemented { op: op.clone() }))
}

/// Registered out-of-place closure for `node`, or the fallback closure.
pub fn get_out_of_place_operation(
    node: &Node,
    options: &RuntimeOptions,
) -> RuntimeResult<OpClosure> {
    let registry = global_registry();
    if registry.has(node.kind()) {
        return registry.generate(node, options);
    }
    Ok(fallback_operation(node))
}

/// Native closure for `node`, or the fallback closure.
pub fn get_native_operation(node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
    let natives = global_native_registry();
    if natives.supports(node) {
        return natives.generate(node, options);
    }
    Ok(fallback_operation(node))
}
