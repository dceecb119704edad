//! Static, side-effect-free classification of nodes into execution strategies.

use crate::error::{RuntimeError, RuntimeResult};
use crate::graph::Node;
use crate::native::{global_native_registry, NativeRegistry};
use crate::registry::{global_registry, OperatorFunctor, OperatorRegistry};

/// How a node is executed by a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// View or container operation that aliases or moves values.
    Native,
    /// Registered operator computing into a reusable output buffer.
    OutOfPlace,
    /// Not executable here; must be routed to the generic interpreter.
    Fallback,
}

/// Classifier bound to an operator registry and a native table.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'r> {
    registry: &'r OperatorRegistry,
    natives: &'r NativeRegistry,
}

impl Classifier<'static> {
    /// Classifier over the process-wide registries.
    pub fn global() -> Self {
        Classifier::new(global_registry(), global_native_registry())
    }
}

impl<'r> Classifier<'r> {
    pub fn new(registry: &'r OperatorRegistry, natives: &'r NativeRegistry) -> Self {
        Classifier { registry, natives }
    }

    pub fn registry(&self) -> &'r OperatorRegistry {
        self.registry
    }

    pub fn natives(&self) -> &'r NativeRegistry {
        self.natives
    }

    pub fn can_run_out_of_place(&self, node: &Node) -> bool {
        self.registry.has(node.kind())
    }

    fn functor(&self, node: &Node) -> RuntimeResult<&'r OperatorFunctor> {
        self.registry.functor(node.kind()).ok_or_else(|| {
            RuntimeError::invariant(format!(
                "buffer reuse queried for unregistered operator {}",
                node.kind()
            ))
        })
    }

    /// Only defined for registered operators.
    pub fn can_reuse_input_buffer(&self, node: &Node) -> RuntimeResult<bool> {
        Ok(self.functor(node)?.can_reuse_input())
    }

    /// Only defined for registered operators.
    pub fn can_reuse_output_buffer(&self, node: &Node) -> RuntimeResult<bool> {
        Ok(self.functor(node)?.can_reuse_output())
    }

    /// True for allow-listed view and container operations whose arity precondition holds.
    pub fn can_run_natively(&self, node: &Node) -> bool {
        self.natives.supports(node)
    }

    pub fn classify(&self, node: &Node) -> Strategy {
        if self.can_run_natively(node) {
            Strategy::Native
        } else if self.can_run_out_of_place(node) {
            Strategy::OutOfPlace
        } else {
            Strategy::Fallback
        }
    }
}

pub fn can_run_out_of_place(node: &Node) -> bool {
    Classifier::global().can_run_out_of_place(node)
}

pub fn can_reuse_input_buffer(node: &Node) -> RuntimeResult<bool> {
    Classifier::global().can_reuse_input_buffer(node)
}

pub fn can_reuse_output_buffer(node: &Node) -> RuntimeResult<bool> {
    Classifier::global().can_reuse_output_buffer(node)
}

pub fn can_run_natively(node: &Node) -> bool {
    Classifier::global().can_run_natively(node)
}

pub fn classify(node: &Node) -> Strategy {
    Classifier::global().classify(node)
}
