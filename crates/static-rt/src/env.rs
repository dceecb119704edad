use std::env;
use std::sync::OnceLock;

use crate::config::OutputPolicy;

static OUTPUT_POLICY: OnceLock<Option<OutputPolicy>> = OnceLock::new();
static CHECK_SHAPES: OnceLock<Option<bool>> = OnceLock::new();
static ALLOW_FALLBACK: OnceLock<Option<bool>> = OnceLock::new();

fn parse_bool(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
}

fn read_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

pub(crate) fn parse_output_policy(value: &str) -> Option<OutputPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "reset" | "reset_then_resize" => Some(OutputPolicy::ResetThenResize),
        "capacity" | "capacity_aware" => Some(OutputPolicy::CapacityAware),
        _ => None,
    }
}

pub(crate) fn output_policy_override() -> Option<OutputPolicy> {
    *OUTPUT_POLICY.get_or_init(|| {
        let raw = read_var("STATIC_RT_OUTPUT_POLICY")?;
        let policy = parse_output_policy(&raw);
        if policy.is_none() {
            tracing::warn!(value = %raw, "ignoring unknown STATIC_RT_OUTPUT_POLICY");
        }
        policy
    })
}

pub(crate) fn check_shapes_override() -> Option<bool> {
    *CHECK_SHAPES.get_or_init(|| read_var("STATIC_RT_CHECK_SHAPES").map(|v| parse_bool(&v)))
}

pub(crate) fn allow_fallback_override() -> Option<bool> {
    *ALLOW_FALLBACK.get_or_init(|| read_var("STATIC_RT_ALLOW_FALLBACK").map(|v| parse_bool(&v)))
}
