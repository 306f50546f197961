pub mod error;
pub mod export;
pub mod ir;
pub mod ops;

// Re-export commonly used types
pub use error::{Error, Result};
pub use export::builder::GraphBuilder;
pub use export::context::{ConversionContext, TensorElement};
pub use export::indexing::{resolve_index, IndexSpec, SlicePlan};
pub use ir::{Attribute, DataType, IrNode, Parameter, SourceAttr, SourceNode, ValueId};
pub use ops::registry::{ConverterFn, OpsetRegistry};
