//! Native dispatch for view and container operations.
//!
//! Closures built here only alias storage or move values; none of them copies element data,
//! with the one exception of `aten::reshape` on a layout that admits no view.
//! The table is kept structurally symmetric with [`crate::registry::OperatorRegistry`].

mod containers;
mod views;

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::config::RuntimeOptions;
use crate::error::{RuntimeError, RuntimeResult};
use crate::graph::Node;
use crate::registry::GenerateFn;
use crate::runtime::OpClosure;

/// Identifiers of the native operations.
pub mod names {
    pub const TRANSPOSE: &str = "aten::transpose";
    pub const FLATTEN: &str = "aten::flatten";
    pub const PERMUTE: &str = "aten::permute";
    pub const RESHAPE: &str = "aten::reshape";
    pub const SLICE: &str = "aten::slice";
    pub const NARROW: &str = "aten::narrow";
    pub const TO: &str = "aten::to";
    pub const TUPLE_CONSTRUCT: &str = "prim::TupleConstruct";
    pub const LIST_CONSTRUCT: &str = "prim::ListConstruct";
    pub const LIST_UNPACK: &str = "prim::ListUnpack";
}

/// Native table entry: identifier, optional exact arity and closure generator.
#[derive(Clone, Copy)]
pub struct NativeOperation {
    name: &'static str,
    required_inputs: Option<usize>,
    generate: GenerateFn,
}

impl NativeOperation {
    pub const fn new(name: &'static str, generate: GenerateFn) -> Self {
        NativeOperation {
            name,
            required_inputs: None,
            generate,
        }
    }

    /// Restricts the entry to nodes with exactly `inputs` inputs.
    pub const fn with_required_inputs(self, inputs: usize) -> Self {
        NativeOperation {
            required_inputs: Some(inputs),
            ..self
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn required_inputs(&self) -> Option<usize> {
        self.required_inputs
    }

    /// Whether `node` satisfies this entry's arity precondition.
    pub fn accepts(&self, node: &Node) -> bool {
        self.required_inputs
            .map_or(true, |inputs| node.num_inputs() == inputs)
    }

    pub fn generate(&self, node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
        (self.generate)(node, options)
    }
}

impl fmt::Debug for NativeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeOperation")
            .field("name", &self.name)
            .field("required_inputs", &self.required_inputs)
            .finish_non_exhaustive()
    }
}

/// Startup table for the process-wide native registry.
///
/// `aten::to` is only native in its five-input form; shorter forms need default inference
/// and go to the generic fallback.
pub static BUILTIN_NATIVE_OPERATIONS: &[NativeOperation] = &[
    NativeOperation::new(names::TRANSPOSE, views::generate_transpose),
    NativeOperation::new(names::FLATTEN, views::generate_flatten),
    NativeOperation::new(names::PERMUTE, views::generate_permute),
    NativeOperation::new(names::RESHAPE, views::generate_reshape),
    NativeOperation::new(names::SLICE, views::generate_slice),
    NativeOperation::new(names::NARROW, views::generate_narrow),
    NativeOperation::new(names::TO, views::generate_to).with_required_inputs(5),
    NativeOperation::new(names::TUPLE_CONSTRUCT, containers::generate_tuple_construct),
    NativeOperation::new(names::LIST_CONSTRUCT, containers::generate_list_construct),
    NativeOperation::new(names::LIST_UNPACK, containers::generate_list_unpack),
];

/// Identifier to native closure generator, disjoint from the operator registry.
#[derive(Debug, Default)]
pub struct NativeRegistry {
    operations: HashMap<&'static str, NativeOperation>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_operations() -> Self {
        let mut registry = NativeRegistry::new();
        for operation in BUILTIN_NATIVE_OPERATIONS {
            let previous = registry.operations.insert(operation.name(), *operation);
            debug_assert!(
                previous.is_none(),
                "duplicate native operation {}",
                operation.name()
            );
        }
        tracing::debug!(operations = registry.len(), "native registry populated");
        registry
    }

    pub fn register(&mut self, operation: NativeOperation) -> RuntimeResult<()> {
        if self.operations.contains_key(operation.name()) {
            return Err(RuntimeError::invariant(format!(
                "native operation {} is already registered",
                operation.name()
            )));
        }
        self.operations.insert(operation.name(), operation);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn operation(&self, name: &str) -> Option<&NativeOperation> {
        self.operations.get(name)
    }

    /// True when `node` is in the table and meets the entry's arity precondition.
    pub fn supports(&self, node: &Node) -> bool {
        self.operation(node.kind())
            .is_some_and(|operation| operation.accepts(node))
    }

    /// Builds the closure for `node`; nodes the table does not support are unimplemented.
    pub fn generate(&self, node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
        match self.operation(node.kind()) {
            Some(operation) if operation.accepts(node) => operation.generate(node, options),
            _ => Err(RuntimeError::Unimplemented {
                op: node.kind().to_string(),
            }),
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.operations.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

static GLOBAL_NATIVE_REGISTRY: OnceLock<NativeRegistry> = OnceLock::new();

pub fn global_native_registry() -> &'static NativeRegistry {
    GLOBAL_NATIVE_REGISTRY.get_or_init(NativeRegistry::with_builtin_operations)
}
