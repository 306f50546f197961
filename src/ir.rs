use std::collections::{BTreeMap, HashMap};

use strum_macros::IntoStaticStr;

use crate::error::{Error, Result};
use crate::export::indexing::IndexSpec;

/// Opaque identity of a value in the traced source graph. Keys the name
/// registry inside [`crate::export::context::ConversionContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub u64);

/// Element types of the interchange format, numbered per TensorProto.
///
/// Opset 1 encodes a tensor type as its symbolic UPPERCASE name, opset 6 and
/// later as the integer code; `symbol` and `code` cover both encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DataType {
    Undefined,
    Float,
    Uint8,
    Int8,
    Uint16,
    Int16,
    Int32,
    Int64,
    String,
    Bool,
    Float16,
    Double,
    Uint32,
    Uint64,
    Complex64,
    Complex128,
    BFloat16,
}

impl DataType {
    pub fn code(&self) -> i64 {
        match self {
            DataType::Undefined => 0,
            DataType::Float => 1,
            DataType::Uint8 => 2,
            DataType::Int8 => 3,
            DataType::Uint16 => 4,
            DataType::Int16 => 5,
            DataType::Int32 => 6,
            DataType::Int64 => 7,
            DataType::String => 8,
            DataType::Bool => 9,
            DataType::Float16 => 10,
            DataType::Double => 11,
            DataType::Uint32 => 12,
            DataType::Uint64 => 13,
            DataType::Complex64 => 14,
            DataType::Complex128 => 15,
            DataType::BFloat16 => 16,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => DataType::Float,
            2 => DataType::Uint8,
            3 => DataType::Int8,
            4 => DataType::Uint16,
            5 => DataType::Int16,
            6 => DataType::Int32,
            7 => DataType::Int64,
            8 => DataType::String,
            9 => DataType::Bool,
            10 => DataType::Float16,
            11 => DataType::Double,
            12 => DataType::Uint32,
            13 => DataType::Uint64,
            14 => DataType::Complex64,
            15 => DataType::Complex128,
            16 => DataType::BFloat16,
            _ => DataType::Undefined,
        }
    }

    /// Symbolic name used by the opset-1 attribute encoding, e.g. "FLOAT16".
    pub fn symbol(&self) -> &'static str {
        self.into()
    }
}

/// Attribute value of a target-graph node.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Int(i64),
    Float(f32),
    Str(String),
    Ints(Vec<i64>),
    Floats(Vec<f32>),
}

/// One operation record of the target interchange graph.
///
/// Created once per converter call and never mutated afterward. Attributes
/// are kept in a `BTreeMap` so iteration order is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct IrNode {
    pub op_type: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub attributes: BTreeMap<String, Attribute>,
}

impl IrNode {
    pub fn new(
        op_type: &str,
        inputs: Vec<String>,
        outputs: Vec<String>,
        attributes: Vec<(&str, Attribute)>,
    ) -> Self {
        Self {
            op_type: op_type.to_string(),
            inputs,
            outputs,
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

/// A named constant tensor injected into the target graph as an initializer.
/// `data` holds the elements as little-endian bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub dtype: DataType,
    pub dims: Vec<i64>,
    pub data: Vec<u8>,
}

/// Attribute value carried by a source-graph node. A superset of
/// [`Attribute`]: source operators also record element types, padding-width
/// pairs, indexing expressions, and references to other source values.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceAttr {
    Int(i64),
    Float(f32),
    Str(String),
    Ints(Vec<i64>),
    Floats(Vec<f32>),
    Dtype(DataType),
    PadWidths(Vec<[i64; 2]>),
    IndexSpecs(Vec<IndexSpec>),
    Value(ValueId),
}

/// A node of the traced source graph, immutable during conversion. Shapes
/// and dtypes of its inputs are supplied by the source graph.
#[derive(Debug, Clone)]
pub struct SourceNode {
    pub op_type: String,
    pub inputs: Vec<ValueId>,
    pub attributes: HashMap<String, SourceAttr>,
    pub input_shapes: Vec<Vec<i64>>,
    pub input_dtypes: Vec<DataType>,
}

impl SourceNode {
    pub fn new(op_type: &str) -> Self {
        Self {
            op_type: op_type.to_string(),
            inputs: Vec::new(),
            attributes: HashMap::new(),
            input_shapes: Vec::new(),
            input_dtypes: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: SourceAttr) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn with_input_shape(mut self, shape: &[i64]) -> Self {
        self.input_shapes.push(shape.to_vec());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&SourceAttr> {
        self.attributes.get(name)
    }

    fn require(&self, name: &str) -> Result<&SourceAttr> {
        self.attributes
            .get(name)
            .ok_or_else(|| Error::MissingAttribute(format!("{}.{}", self.op_type, name)))
    }

    fn type_mismatch(&self, name: &str, expected: &str) -> Error {
        Error::AttributeUnsupported(format!(
            "attribute {} of {} is not {}",
            name, self.op_type, expected
        ))
    }

    pub fn attr_int(&self, name: &str) -> Result<i64> {
        match self.require(name)? {
            SourceAttr::Int(v) => Ok(*v),
            _ => Err(self.type_mismatch(name, "an int")),
        }
    }

    pub fn opt_int(&self, name: &str) -> Result<Option<i64>> {
        match self.attributes.get(name) {
            None => Ok(None),
            Some(SourceAttr::Int(v)) => Ok(Some(*v)),
            Some(_) => Err(self.type_mismatch(name, "an int")),
        }
    }

    pub fn attr_ints(&self, name: &str) -> Result<Vec<i64>> {
        match self.require(name)? {
            SourceAttr::Ints(v) => Ok(v.clone()),
            _ => Err(self.type_mismatch(name, "an int list")),
        }
    }

    pub fn opt_ints(&self, name: &str) -> Result<Option<Vec<i64>>> {
        match self.attributes.get(name) {
            None => Ok(None),
            Some(SourceAttr::Ints(v)) => Ok(Some(v.clone())),
            Some(_) => Err(self.type_mismatch(name, "an int list")),
        }
    }

    pub fn attr_floats(&self, name: &str) -> Result<Vec<f32>> {
        match self.require(name)? {
            SourceAttr::Floats(v) => Ok(v.clone()),
            _ => Err(self.type_mismatch(name, "a float list")),
        }
    }

    pub fn attr_str(&self, name: &str) -> Result<String> {
        match self.require(name)? {
            SourceAttr::Str(v) => Ok(v.clone()),
            _ => Err(self.type_mismatch(name, "a string")),
        }
    }

    pub fn attr_dtype(&self, name: &str) -> Result<DataType> {
        match self.require(name)? {
            SourceAttr::Dtype(v) => Ok(*v),
            _ => Err(self.type_mismatch(name, "a dtype")),
        }
    }

    pub fn attr_pad_widths(&self, name: &str) -> Result<Vec<[i64; 2]>> {
        match self.require(name)? {
            SourceAttr::PadWidths(v) => Ok(v.clone()),
            _ => Err(self.type_mismatch(name, "padding widths")),
        }
    }

    pub fn attr_index_specs(&self, name: &str) -> Result<&[IndexSpec]> {
        match self.require(name)? {
            SourceAttr::IndexSpecs(v) => Ok(v),
            _ => Err(self.type_mismatch(name, "an index expression")),
        }
    }

    pub fn attr_value(&self, name: &str) -> Result<ValueId> {
        match self.require(name)? {
            SourceAttr::Value(v) => Ok(*v),
            _ => Err(self.type_mismatch(name, "a value reference")),
        }
    }

    pub fn input_shape(&self, index: usize) -> Result<&[i64]> {
        self.input_shapes
            .get(index)
            .map(|s| s.as_slice())
            .ok_or_else(|| {
                Error::InvalidGraph(format!(
                    "no shape recorded for input {} of {}",
                    index, self.op_type
                ))
            })
    }

    pub fn input_rank(&self, index: usize) -> Result<usize> {
        Ok(self.input_shape(index)?.len())
    }
}
