use static_rt_tensor::TensorError;
use thiserror::Error;

/// Failures raised while planning or executing nodes.
///
/// None of these are retried inside the engine; each aborts the current execution.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Planner or caller broke an engine contract (unregistered capability query,
    /// slot index outside the declared arity, malformed graph).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// A value slot held a different kind of value than the accessor asked for.
    #[error("type mismatch: expected {expected} but found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    /// An index or offset argument fell outside the bounds of the tensor it addresses.
    #[error("{0}")]
    OutOfRange(String),
    /// The node must be routed to the generic interpreter instead.
    #[error("{op} cannot be executed by the static runtime")]
    Unimplemented { op: String },
    /// The operator registry was asked to generate a closure for an unknown identifier.
    #[error("no operator functor registered for {op}")]
    UnregisteredOperation { op: String },
    /// Inputs disagree on a shape or length the operation requires to match.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// A kernel or view rejected its arguments.
    #[error(transparent)]
    Tensor(#[from] TensorError),
    /// Wraps a failure with the position and identifier of the node that raised it.
    #[error("node {index} ({op}) failed: {source}")]
    Node {
        index: usize,
        op: String,
        #[source]
        source: Box<RuntimeError>,
    },
}

impl RuntimeError {
    pub fn invariant(message: impl Into<String>) -> Self {
        RuntimeError::InvariantViolation(message.into())
    }

    /// Attaches the failing node's position and operation to an error.
    pub fn in_node(self, index: usize, op: &str) -> Self {
        RuntimeError::Node {
            index,
            op: op.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping node context wrappers.
    pub fn root(&self) -> &RuntimeError {
        match self {
            RuntimeError::Node { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Convenience alias for results returned by the runtime.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
