pub mod array;
pub mod registry;

pub use registry::{ConverterFn, OpsetRegistry};
