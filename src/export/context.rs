use std::collections::HashMap;

use half::f16;
use ndarray::ArrayD;

use crate::ir::{DataType, Parameter, ValueId};

/// Element types that can back a materialized constant tensor.
pub trait TensorElement: Copy {
    const DTYPE: DataType;

    fn extend_le_bytes(&self, out: &mut Vec<u8>);
}

impl TensorElement for f32 {
    const DTYPE: DataType = DataType::Float;

    fn extend_le_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl TensorElement for f64 {
    const DTYPE: DataType = DataType::Double;

    fn extend_le_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl TensorElement for i32 {
    const DTYPE: DataType = DataType::Int32;

    fn extend_le_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl TensorElement for i64 {
    const DTYPE: DataType = DataType::Int64;

    fn extend_le_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl TensorElement for f16 {
    const DTYPE: DataType = DataType::Float16;

    fn extend_le_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

/// Shared state of one export session: the source-value name registry and
/// the initializer list. Both are append-only; a single monotonic counter
/// feeds every generated name, so names never collide within a session.
#[derive(Debug, Default)]
pub struct ConversionContext {
    names: HashMap<ValueId, String>,
    parameters: Vec<Parameter>,
    counter: u64,
}

impl ConversionContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) -> u64 {
        let n = self.counter;
        self.counter += 1;
        n
    }

    /// Stable target-graph name for a source value. The first call for a
    /// value assigns a fresh name; later calls return the same one.
    pub fn name_for(&mut self, value: ValueId) -> String {
        if let Some(name) = self.names.get(&value) {
            return name.clone();
        }
        let name = format!("v{}", self.bump());
        self.names.insert(value, name.clone());
        name
    }

    /// Fresh name for an intermediate value inside a converter-built chain.
    pub fn temp_name(&mut self) -> String {
        format!("tmp{}", self.bump())
    }

    /// Registers a constant tensor as a target-graph initializer and returns
    /// its freshly generated name for use as a node input.
    pub fn materialize_constant<T: TensorElement>(&mut self, tensor: ArrayD<T>) -> String {
        let name = format!("param{}", self.bump());
        let dims: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let mut data = Vec::with_capacity(tensor.len() * std::mem::size_of::<T>());
        for v in tensor.iter() {
            v.extend_le_bytes(&mut data);
        }
        self.parameters.push(Parameter {
            name: name.clone(),
            dtype: T::DTYPE,
            dims,
            data,
        });
        name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn into_parameters(self) -> Vec<Parameter> {
        self.parameters
    }
}
