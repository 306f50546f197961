use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::export::context::ConversionContext;
use crate::ir::{IrNode, SourceNode};

/// Converter routine for one source operator family: pure function of the
/// source node, the dispatch version, and the resolved input/output names.
/// New initializers go through the context; the returned nodes are appended
/// to the target graph by the caller.
pub type ConverterFn = fn(
    node: &SourceNode,
    dispatch_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>>;

/// One registered version band for an operator. `bases` are the ascending
/// opset versions at which the target encoding changes; a requested version
/// resolves to the highest base not above it. `max_version` closes the band.
#[derive(Debug, Clone)]
struct Registration {
    bases: Vec<i64>,
    max_version: Option<i64>,
    converter: ConverterFn,
}

/// Maps (operator name, requested opset version) to a converter.
///
/// Lookup is deterministic and side-effect-free: an unknown name fails with
/// `OperatorUnsupported`, a known name whose bands all exclude the requested
/// version fails with `OpsetUnsupported`. An operator may carry several
/// registrations with disjoint bands, each bound to its own converter.
#[derive(Debug, Default)]
pub struct OpsetRegistry {
    converters: HashMap<String, Vec<Registration>>,
}

impl OpsetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an open-ended version band starting at `bases[0]`.
    pub fn register(&mut self, name: &str, bases: &[i64], converter: ConverterFn) {
        self.register_range(name, bases, None, converter);
    }

    /// Registers a band closed at `max_version` (inclusive) when given.
    pub fn register_range(
        &mut self,
        name: &str,
        bases: &[i64],
        max_version: Option<i64>,
        converter: ConverterFn,
    ) {
        debug_assert!(bases.windows(2).all(|w| w[0] < w[1]));
        self.converters
            .entry(name.to_string())
            .or_default()
            .push(Registration {
                bases: bases.to_vec(),
                max_version,
                converter,
            });
    }

    /// Resolves a converter and its dispatch version for the requested opset
    /// version: the highest registered base not above the request, across all
    /// bands that admit the request.
    pub fn lookup(&self, name: &str, version: i64) -> Result<(ConverterFn, i64)> {
        let registrations = self
            .converters
            .get(name)
            .ok_or_else(|| Error::OperatorUnsupported(name.to_string()))?;

        let mut best: Option<(ConverterFn, i64)> = None;
        for reg in registrations {
            if reg.max_version.is_some_and(|max| version > max) {
                continue;
            }
            if let Some(&base) = reg.bases.iter().filter(|&&b| b <= version).max() {
                if best.map_or(true, |(_, b)| base > b) {
                    best = Some((reg.converter, base));
                }
            }
        }
        best.ok_or_else(|| Error::OpsetUnsupported {
            op_type: name.to_string(),
            version,
        })
    }

    /// All base versions declared for an operator, ascending and deduplicated.
    pub fn declared_bases(&self, name: &str) -> Option<Vec<i64>> {
        let registrations = self.converters.get(name)?;
        let mut bases: Vec<i64> = registrations
            .iter()
            .flat_map(|r| r.bases.iter().copied())
            .collect();
        bases.sort_unstable();
        bases.dedup();
        Some(bases)
    }

    pub fn operator_names(&self) -> impl Iterator<Item = &str> {
        self.converters.keys().map(|k| k.as_str())
    }

    /// Walker-facing entry point: dispatch and run the converter for one
    /// source node.
    pub fn convert(
        &self,
        node: &SourceNode,
        version: i64,
        inputs: Vec<String>,
        outputs: &[String],
        ctx: &mut ConversionContext,
    ) -> Result<Vec<IrNode>> {
        let (converter, dispatch_version) = self.lookup(&node.op_type, version)?;
        converter(node, dispatch_version, inputs, outputs, ctx)
    }

    /// Registry pre-populated with the array/shape operator family.
    pub fn with_standard_converters() -> Self {
        use crate::ops::array;

        let mut registry = Self::new();
        registry.register("Cast", &[1, 6], array::convert_cast);
        registry.register("Concat", &[1, 4], array::convert_concat);
        registry.register("Copy", &[1], array::convert_copy);
        registry.register("Depth2Space", &[1], array::convert_depth2space);
        registry.register("Dstack", &[1], array::convert_dstack);
        registry.register("ExpandDims", &[1], array::convert_expand_dims);
        registry.register("GetItem", &[1], array::convert_get_item);
        registry.register("Hstack", &[1], array::convert_hstack);
        registry.register("Pad", &[1, 2], array::convert_pad);
        registry.register("Repeat", &[7, 9], array::convert_repeat);
        registry.register("Reshape", &[1, 5], array::convert_reshape);
        registry.register("ResizeImages", &[7, 9], array::convert_resize_images);
        registry.register("Separate", &[1], array::convert_separate);
        registry.register("Space2Depth", &[1], array::convert_space2depth);
        registry.register("SplitAxis", &[1, 2], array::convert_split_axis);
        registry.register("Squeeze", &[1], array::convert_squeeze);
        registry.register("Stack", &[1], array::convert_stack);
        registry.register("Swapaxes", &[1], array::convert_swapaxes);
        registry.register("Tile", &[1, 6], array::convert_tile);
        registry.register("Transpose", &[1], array::convert_transpose);
        registry.register("Vstack", &[1], array::convert_vstack);
        registry.register("Where", &[9], array::convert_where);
        registry
    }
}
