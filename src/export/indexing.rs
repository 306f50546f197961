use crate::error::{Error, Result};

/// One positional slot of a multi-dimensional indexing expression.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexSpec {
    /// `start..stop` with an optional step. Only unit steps can be lowered.
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    /// A plain integer index; selects one element and collapses the axis.
    Index(i64),
    /// A zero-rank array used as an index; behaves like `Index`.
    ScalarArray(i64),
    /// Inserts a size-1 axis without consuming a source dimension.
    NewAxis,
    /// Stands for a run of implicit full-range axes.
    Ellipsis,
}

impl IndexSpec {
    pub fn full() -> Self {
        IndexSpec::Slice {
            start: None,
            stop: None,
            step: None,
        }
    }

    pub fn range(start: Option<i64>, stop: Option<i64>) -> Self {
        IndexSpec::Slice {
            start,
            stop,
            step: None,
        }
    }
}

/// Axis lists for lowering an indexing expression into a
/// Slice → Squeeze → Unsqueeze chain. `axes`, `starts` and `ends` have equal
/// length; `squeeze` is relative to the post-slice array and `unsqueeze` to
/// the post-squeeze array, so the chain order is fixed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlicePlan {
    pub axes: Vec<i64>,
    pub starts: Vec<i64>,
    pub ends: Vec<i64>,
    pub squeeze: Vec<i64>,
    pub unsqueeze: Vec<i64>,
}

impl SlicePlan {
    pub fn has_slice(&self) -> bool {
        !self.axes.is_empty()
    }

    pub fn is_noop(&self) -> bool {
        self.axes.is_empty() && self.squeeze.is_empty() && self.unsqueeze.is_empty()
    }
}

/// Translates an index-specifier sequence into slice/squeeze/unsqueeze axis
/// lists in a single left-to-right pass.
///
/// `axis` tracks the true dimension of the un-indexed source array for the
/// current slot: the slot position, minus new-axis markers seen so far, plus
/// the number of dimensions an earlier ellipsis stood for. Full-range slices
/// consume their axis but emit no slice entry.
pub fn resolve_index(specs: &[IndexSpec], source_shape: &[i64]) -> Result<SlicePlan> {
    let mut plan = SlicePlan::default();
    let mut skip: i64 = 0;
    let mut seen_ellipsis = false;

    for (i, spec) in specs.iter().enumerate() {
        let axis = i as i64 - plan.unsqueeze.len() as i64 + skip;
        match spec {
            IndexSpec::Slice { start, stop, step } => {
                if let Some(step) = step {
                    if *step != 1 {
                        return Err(Error::StepSlicingUnsupported(*step));
                    }
                }
                if start.is_none() && stop.is_none() {
                    continue;
                }
                let dim = source_dim(source_shape, axis)?;
                plan.axes.push(axis);
                plan.starts.push(start.unwrap_or(0));
                plan.ends.push(stop.unwrap_or(dim));
            }
            IndexSpec::Index(idx) | IndexSpec::ScalarArray(idx) => {
                source_dim(source_shape, axis)?;
                plan.axes.push(axis);
                plan.starts.push(*idx);
                plan.ends.push(idx + 1);
                plan.squeeze.push(axis);
            }
            IndexSpec::NewAxis => {
                plan.unsqueeze
                    .push(i as i64 - plan.squeeze.len() as i64 + skip);
            }
            IndexSpec::Ellipsis => {
                if seen_ellipsis {
                    return Err(Error::IndexingUnsupported(
                        "more than one ellipsis in an index expression".to_string(),
                    ));
                }
                seen_ellipsis = true;
                // Number of implicit full-range dimensions the ellipsis
                // stands for: whatever the remaining non-new-axis slots
                // do not account for.
                let rest = specs[i + 1..]
                    .iter()
                    .filter(|s| !matches!(s, IndexSpec::NewAxis))
                    .count() as i64;
                skip = source_shape.len() as i64 - axis - rest - 1;
                if skip < 0 {
                    return Err(Error::IndexingUnsupported(format!(
                        "too many indices for source of rank {}",
                        source_shape.len()
                    )));
                }
            }
        }
    }

    Ok(plan)
}

fn source_dim(shape: &[i64], axis: i64) -> Result<i64> {
    usize::try_from(axis)
        .ok()
        .and_then(|a| shape.get(a).copied())
        .ok_or_else(|| {
            Error::IndexingUnsupported(format!(
                "too many indices for source of rank {}",
                shape.len()
            ))
        })
}
