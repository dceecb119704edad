use crate::value::Value;

/// Value slots of one in-flight execution.
///
/// Output buffers cached by out-of-place closures live here, so one frame per concurrent
/// execution keeps runs from contending on the same storage. A frame must not be shared by
/// two runs at once; `StaticPlan::run` takes it mutably.
#[derive(Debug, Clone, Default)]
pub struct ExecutionFrame {
    slots: Vec<Value>,
}

impl ExecutionFrame {
    pub fn new(num_values: usize) -> Self {
        ExecutionFrame {
            slots: vec![Value::None; num_values],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&Value> {
        self.slots.get(index)
    }

    pub(crate) fn slots(&self) -> &[Value] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Value] {
        &mut self.slots
    }
}
