//! Operator registry: operation identifier to out-of-place closure generator.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::config::RuntimeOptions;
use crate::error::{RuntimeError, RuntimeResult};
use crate::graph::Node;
use crate::ops::BUILTIN_OPERATORS;
use crate::runtime::OpClosure;

/// Signature shared by out-of-place and native closure generators.
pub type GenerateFn = fn(&Node, &RuntimeOptions) -> RuntimeResult<OpClosure>;

/// Registry entry pairing buffer-reuse capabilities with a closure generator.
#[derive(Clone, Copy)]
pub struct OperatorFunctor {
    name: &'static str,
    can_reuse_input: bool,
    can_reuse_output: bool,
    generate: GenerateFn,
}

impl OperatorFunctor {
    /// Functor that may reuse both its input and its previous output buffer.
    pub const fn new(name: &'static str, generate: GenerateFn) -> Self {
        OperatorFunctor {
            name,
            can_reuse_input: true,
            can_reuse_output: true,
            generate,
        }
    }

    pub const fn with_reuse(self, input: bool, output: bool) -> Self {
        OperatorFunctor {
            can_reuse_input: input,
            can_reuse_output: output,
            ..self
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn can_reuse_input(&self) -> bool {
        self.can_reuse_input
    }

    pub fn can_reuse_output(&self) -> bool {
        self.can_reuse_output
    }

    pub fn generate(&self, node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
        (self.generate)(node, options)
    }
}

impl fmt::Debug for OperatorFunctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorFunctor")
            .field("name", &self.name)
            .field("can_reuse_input", &self.can_reuse_input)
            .field("can_reuse_output", &self.can_reuse_output)
            .finish_non_exhaustive()
    }
}

/// Write-once, read-many map from operation identifier to [`OperatorFunctor`].
///
/// The process-wide instance is built from [`BUILTIN_OPERATORS`] on first use. Local
/// registries can be assembled with [`OperatorRegistry::register`] before planning starts.
#[derive(Debug, Default)]
pub struct OperatorRegistry {
    functors: HashMap<&'static str, OperatorFunctor>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in operator.
    pub fn with_builtin_operators() -> Self {
        let mut registry = OperatorRegistry::new();
        for functor in BUILTIN_OPERATORS {
            let previous = registry.functors.insert(functor.name(), *functor);
            debug_assert!(
                previous.is_none(),
                "duplicate builtin operator {}",
                functor.name()
            );
        }
        tracing::debug!(operators = registry.len(), "operator registry populated");
        registry
    }

    /// Adds a functor. Each identifier may be registered once.
    pub fn register(&mut self, functor: OperatorFunctor) -> RuntimeResult<()> {
        if self.functors.contains_key(functor.name()) {
            return Err(RuntimeError::invariant(format!(
                "operator {} is already registered",
                functor.name()
            )));
        }
        self.functors.insert(functor.name(), functor);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.functors.contains_key(name)
    }

    pub fn functor(&self, name: &str) -> Option<&OperatorFunctor> {
        self.functors.get(name)
    }

    /// Looks up the functor for `node` and runs its generator.
    pub fn generate(&self, node: &Node, options: &RuntimeOptions) -> RuntimeResult<OpClosure> {
        let functor =
            self.functor(node.kind())
                .ok_or_else(|| RuntimeError::UnregisteredOperation {
                    op: node.kind().to_string(),
                })?;
        functor.generate(node, options)
    }

    /// Registered identifiers in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functors.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functors.is_empty()
    }
}

static GLOBAL_REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();

/// Process-wide registry of built-in operators.
pub fn global_registry() -> &'static OperatorRegistry {
    GLOBAL_REGISTRY.get_or_init(OperatorRegistry::with_builtin_operators)
}
