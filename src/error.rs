use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Operator {0} is not registered")]
    OperatorUnsupported(String),

    #[error("Operator {op_type} does not support opset version {version}")]
    OpsetUnsupported { op_type: String, version: i64 },

    #[error("Unsupported attribute: {0}")]
    AttributeUnsupported(String),

    #[error("Missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("Unsupported indexing: {0}")]
    IndexingUnsupported(String),

    #[error("Slicing with step {0} is not supported by the Slice operator")]
    StepSlicingUnsupported(i64),

    #[error("Invalid graph construction: {0}")]
    InvalidGraph(String),
}
