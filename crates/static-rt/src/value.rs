//! Runtime values held in value slots.

use std::sync::Arc;

use static_rt_tensor::{DType, MemoryFormat, Tensor};

use crate::error::{RuntimeError, RuntimeResult};
use crate::graph::TupleType;

/// Number-like argument accepted by arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v,
            Scalar::Bool(v) => f64::from(u8::from(v)),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

/// Tuple value; named tuples keep their type so fields can be looked up by name.
#[derive(Debug, Clone)]
pub struct TupleValue {
    elements: Vec<Value>,
    ty: Option<Arc<TupleType>>,
}

impl TupleValue {
    pub fn new(elements: Vec<Value>) -> Self {
        TupleValue { elements, ty: None }
    }

    /// Tuple tagged with a named type. The field count must match the element count.
    pub fn named(elements: Vec<Value>, ty: Arc<TupleType>) -> RuntimeResult<Self> {
        if ty.field_names().len() != elements.len() {
            return Err(RuntimeError::invariant(format!(
                "named tuple {:?} declares {} fields but got {} elements",
                ty.name(),
                ty.field_names().len(),
                elements.len()
            )));
        }
        Ok(TupleValue {
            elements,
            ty: Some(ty),
        })
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.elements.get(index)
    }

    pub fn tuple_type(&self) -> Option<&Arc<TupleType>> {
        self.ty.as_ref()
    }

    /// Element bound to `name` in a named tuple.
    pub fn field(&self, name: &str) -> Option<&Value> {
        let ty = self.ty.as_ref()?;
        let position = ty.field_names().iter().position(|field| field == name)?;
        self.elements.get(position)
    }
}

/// Closed set of values a slot can hold.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Tensor(Tensor),
    TensorList(Vec<Tensor>),
    Scalar(Scalar),
    Int(i64),
    Double(f64),
    Bool(bool),
    ScalarType(DType),
    MemoryFormat(MemoryFormat),
    IntList(Vec<i64>),
    List(Vec<Value>),
    Tuple(TupleValue),
}

impl Value {
    /// Tag name used in type-mismatch reports.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Tensor(_) => "Tensor",
            Value::TensorList(_) => "TensorList",
            Value::Scalar(_) => "Scalar",
            Value::Int(_) => "Int",
            Value::Double(_) => "Double",
            Value::Bool(_) => "Bool",
            Value::ScalarType(_) => "ScalarType",
            Value::MemoryFormat(_) => "MemoryFormat",
            Value::IntList(_) => "IntList",
            Value::List(_) => "List",
            Value::Tuple(_) => "Tuple",
        }
    }

    fn mismatch(&self, expected: &'static str) -> RuntimeError {
        RuntimeError::TypeMismatch {
            expected,
            actual: self.kind_name(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self, Value::Tensor(_))
    }

    pub fn to_tensor(&self) -> RuntimeResult<&Tensor> {
        match self {
            Value::Tensor(tensor) => Ok(tensor),
            other => Err(other.mismatch("Tensor")),
        }
    }

    pub fn to_tensor_mut(&mut self) -> RuntimeResult<&mut Tensor> {
        match self {
            Value::Tensor(tensor) => Ok(tensor),
            other => Err(other.mismatch("Tensor")),
        }
    }

    pub fn to_tensor_list(&self) -> RuntimeResult<&[Tensor]> {
        match self {
            Value::TensorList(tensors) => Ok(tensors),
            other => Err(other.mismatch("TensorList")),
        }
    }

    /// Accepts scalars as well as plain int, double and bool values.
    pub fn to_scalar(&self) -> RuntimeResult<Scalar> {
        match self {
            Value::Scalar(scalar) => Ok(*scalar),
            Value::Int(v) => Ok(Scalar::Int(*v)),
            Value::Double(v) => Ok(Scalar::Float(*v)),
            Value::Bool(v) => Ok(Scalar::Bool(*v)),
            other => Err(other.mismatch("Scalar")),
        }
    }

    pub fn to_int(&self) -> RuntimeResult<i64> {
        match self {
            Value::Int(v) | Value::Scalar(Scalar::Int(v)) => Ok(*v),
            other => Err(other.mismatch("Int")),
        }
    }

    pub fn to_double(&self) -> RuntimeResult<f64> {
        match self {
            Value::Double(v) | Value::Scalar(Scalar::Float(v)) => Ok(*v),
            other => Err(other.mismatch("Double")),
        }
    }

    pub fn to_bool(&self) -> RuntimeResult<bool> {
        match self {
            Value::Bool(v) | Value::Scalar(Scalar::Bool(v)) => Ok(*v),
            other => Err(other.mismatch("Bool")),
        }
    }

    pub fn to_scalar_type(&self) -> RuntimeResult<DType> {
        match self {
            Value::ScalarType(dtype) => Ok(*dtype),
            other => Err(other.mismatch("ScalarType")),
        }
    }

    pub fn to_memory_format(&self) -> RuntimeResult<MemoryFormat> {
        match self {
            Value::MemoryFormat(format) => Ok(*format),
            other => Err(other.mismatch("MemoryFormat")),
        }
    }

    pub fn to_int_list(&self) -> RuntimeResult<&[i64]> {
        match self {
            Value::IntList(values) => Ok(values),
            other => Err(other.mismatch("IntList")),
        }
    }

    pub fn to_tuple(&self) -> RuntimeResult<&TupleValue> {
        match self {
            Value::Tuple(tuple) => Ok(tuple),
            other => Err(other.mismatch("Tuple")),
        }
    }

    /// Number of elements of any list-like value.
    pub fn list_len(&self) -> RuntimeResult<usize> {
        match self {
            Value::TensorList(items) => Ok(items.len()),
            Value::IntList(items) => Ok(items.len()),
            Value::List(items) => Ok(items.len()),
            other => Err(other.mismatch("List")),
        }
    }

    /// Element `index` of any list-like value as a standalone value.
    pub fn list_element(&self, index: usize) -> RuntimeResult<Value> {
        let element = match self {
            Value::TensorList(items) => items.get(index).cloned().map(Value::Tensor),
            Value::IntList(items) => items.get(index).copied().map(Value::Int),
            Value::List(items) => items.get(index).cloned(),
            other => return Err(other.mismatch("List")),
        };
        element.ok_or_else(|| {
            RuntimeError::OutOfRange(format!("list index {} out of range", index))
        })
    }
}

impl From<Tensor> for Value {
    fn from(value: Tensor) -> Self {
        Value::Tensor(value)
    }
}

impl From<Vec<Tensor>> for Value {
    fn from(value: Vec<Tensor>) -> Self {
        Value::TensorList(value)
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<DType> for Value {
    fn from(value: DType) -> Self {
        Value::ScalarType(value)
    }
}

impl From<MemoryFormat> for Value {
    fn from(value: MemoryFormat) -> Self {
        Value::MemoryFormat(value)
    }
}

impl From<Vec<i64>> for Value {
    fn from(value: Vec<i64>) -> Self {
        Value::IntList(value)
    }
}

impl From<TupleValue> for Value {
    fn from(value: TupleValue) -> Self {
        Value::Tuple(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessor_reports_both_tags_on_mismatch() {
        let err = Value::Int(3).to_tensor().unwrap_err();
        match err {
            RuntimeError::TypeMismatch { expected, actual } => {
                assert_eq!(expected, "Tensor");
                assert_eq!(actual, "Int");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn scalar_accepts_numeric_values() {
        assert_eq!(Value::Int(2).to_scalar().unwrap(), Scalar::Int(2));
        assert_eq!(Value::Double(0.5).to_scalar().unwrap().to_f64(), 0.5);
        assert!(Value::None.to_scalar().is_err());
        assert!(Value::Double(1.0).to_int().is_err());
    }
}
