//! Planner and closure-generation options.

use serde::{Deserialize, Serialize};

use crate::env;

/// How out-of-place closures hand their cached output buffer to a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputPolicy {
    /// Reset the cached output to shape `[0]` and let the kernel resize it. Storage is kept,
    /// so only the metadata is touched twice.
    #[default]
    ResetThenResize,
    /// Hand the cached output over unchanged; the kernel only reshapes it when the requested
    /// geometry differs from the current one.
    CapacityAware,
}

/// Options applied while generating closures for a plan.
///
/// Closures capture the values they need at generation time, so changing options only
/// affects plans built afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
    pub output_policy: OutputPolicy,
    /// Verify that every input to a stacking node has the same shape before stacking.
    pub check_stack_shapes: bool,
    /// Build plans that contain generic-fallback nodes instead of rejecting them up front.
    /// Such plans still fail once execution reaches a fallback node.
    pub allow_fallback: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        RuntimeOptions {
            output_policy: OutputPolicy::default(),
            check_stack_shapes: cfg!(debug_assertions),
            allow_fallback: false,
        }
    }
}

impl RuntimeOptions {
    /// Defaults overridden by `STATIC_RT_OUTPUT_POLICY`, `STATIC_RT_CHECK_SHAPES` and
    /// `STATIC_RT_ALLOW_FALLBACK`. The environment is read once per process.
    pub fn from_env() -> Self {
        let mut options = RuntimeOptions::default();
        if let Some(policy) = env::output_policy_override() {
            options.output_policy = policy;
        }
        if let Some(check) = env::check_shapes_override() {
            options.check_stack_shapes = check;
        }
        if let Some(allow) = env::allow_fallback_override() {
            options.allow_fallback = allow;
        }
        options
    }

    pub fn with_output_policy(mut self, policy: OutputPolicy) -> Self {
        self.output_policy = policy;
        self
    }

    pub fn with_stack_shape_checks(mut self, enabled: bool) -> Self {
        self.check_stack_shapes = enabled;
        self
    }

    pub fn with_fallback_allowed(mut self, allowed: bool) -> Self {
        self.allow_fallback = allowed;
        self
    }
}
