pub mod builder;
pub mod context;
pub mod indexing;

pub use builder::GraphBuilder;
pub use context::{ConversionContext, TensorElement};
pub use indexing::{resolve_index, IndexSpec, SlicePlan};
