//! Converters for the array/shape operator family. Each routine is a pure
//! function of the source node, its dispatch version and the resolved names;
//! multi-node lowerings go through [`GraphBuilder`], constants through
//! [`ConversionContext::materialize_constant`].

use ndarray::Array1;

use crate::error::{Error, Result};
use crate::export::builder::GraphBuilder;
use crate::export::context::ConversionContext;
use crate::export::indexing::resolve_index;
use crate::ir::{Attribute, IrNode, SourceAttr, SourceNode};

fn opset_unsupported(node: &SourceNode, version: i64) -> Error {
    Error::OpsetUnsupported {
        op_type: node.op_type.clone(),
        version,
    }
}

/// Resolves a possibly negative axis against the rank of the first input.
fn normalize_axis(node: &SourceNode, axis: i64) -> Result<usize> {
    let rank = node.input_rank(0)? as i64;
    let resolved = if axis < 0 { axis + rank } else { axis };
    if resolved < 0 || resolved >= rank {
        return Err(Error::InvalidGraph(format!(
            "axis {} out of range for rank-{} input of {}",
            axis, rank, node.op_type
        )));
    }
    Ok(resolved as usize)
}

pub fn convert_cast(
    node: &SourceNode,
    opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    _ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let dtype = node.attr_dtype("dtype")?;
    let to = match opset_version {
        1 => Attribute::Str(dtype.symbol().to_string()),
        6 => Attribute::Int(dtype.code()),
        v => return Err(opset_unsupported(node, v)),
    };
    Ok(vec![IrNode::new(
        "Cast",
        inputs,
        outputs.to_vec(),
        vec![("to", to)],
    )])
}

pub fn convert_concat(
    node: &SourceNode,
    opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    _ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let axis = node.attr_int("axis")?;
    match opset_version {
        // The axis encoding is unchanged between the two bases.
        1 | 4 => Ok(vec![IrNode::new(
            "Concat",
            inputs,
            outputs.to_vec(),
            vec![("axis", Attribute::Int(axis))],
        )]),
        v => Err(opset_unsupported(node, v)),
    }
}

pub fn convert_copy(
    _node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    _ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    Ok(vec![IrNode::new("Identity", inputs, outputs.to_vec(), vec![])])
}

pub fn convert_depth2space(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    _ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let block_size = node.attr_int("block_size")?;
    Ok(vec![IrNode::new(
        "DepthToSpace",
        inputs,
        outputs.to_vec(),
        vec![("blocksize", Attribute::Int(block_size))],
    )])
}

pub fn convert_space2depth(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    _ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let block_size = node.attr_int("block_size")?;
    Ok(vec![IrNode::new(
        "SpaceToDepth",
        inputs,
        outputs.to_vec(),
        vec![("blocksize", Attribute::Int(block_size))],
    )])
}

/// Lowers a multi-dimensional indexing expression into a
/// Slice → Squeeze → Unsqueeze chain. Expressions that select everything
/// collapse to a single Identity.
pub fn convert_get_item(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let specs = node.attr_index_specs("slices")?;
    let plan = resolve_index(specs, node.input_shape(0)?)?;

    let mut gb = GraphBuilder::new();
    let mut current = inputs;
    if plan.has_slice() {
        current = vec![gb.op(
            ctx,
            "Slice",
            current,
            vec![
                ("axes", Attribute::Ints(plan.axes.clone())),
                ("starts", Attribute::Ints(plan.starts.clone())),
                ("ends", Attribute::Ints(plan.ends.clone())),
            ],
        )];
    }
    if !plan.squeeze.is_empty() {
        current = vec![gb.op(
            ctx,
            "Squeeze",
            current,
            vec![("axes", Attribute::Ints(plan.squeeze.clone()))],
        )];
    }
    if !plan.unsqueeze.is_empty() {
        current = vec![gb.op(
            ctx,
            "Unsqueeze",
            current,
            vec![("axes", Attribute::Ints(plan.unsqueeze.clone()))],
        )];
    }
    if plan.is_noop() {
        gb.op_output_named("Identity", current, outputs, vec![]);
        return gb.finish(None);
    }
    gb.finish(Some(outputs))
}

pub fn convert_pad(
    node: &SourceNode,
    opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    _ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let mode = node.attr_str("mode")?;
    if !matches!(mode.as_str(), "constant" | "reflect" | "edge") {
        return Err(Error::AttributeUnsupported(format!(
            "{} mode is not supported by the Pad operator",
            mode
        )));
    }

    let mut widths = node.attr_pad_widths("pad_width")?;
    if widths.len() == 1 {
        // A single (before, after) pair applies to every axis.
        widths = vec![widths[0]; node.input_rank(0)?];
    }
    let mut pad: Vec<i64> = widths.iter().map(|w| w[0]).collect();
    pad.extend(widths.iter().map(|w| w[1]));

    let value = match node.attr("constant_values") {
        None => 0.0,
        Some(SourceAttr::Float(v)) => *v,
        Some(SourceAttr::Int(v)) => *v as f32,
        Some(SourceAttr::Floats(vs)) => {
            if vs.len() > 1 {
                return Err(Error::AttributeUnsupported(
                    "the Pad operator accepts only a single constant fill value".to_string(),
                ));
            }
            vs.first().copied().unwrap_or(0.0)
        }
        Some(_) => {
            return Err(Error::AttributeUnsupported(
                "constant_values of Pad must be numeric".to_string(),
            ))
        }
    };

    let pads_key = match opset_version {
        1 => "paddings",
        2 => "pads",
        v => return Err(opset_unsupported(node, v)),
    };
    Ok(vec![IrNode::new(
        "Pad",
        inputs,
        outputs.to_vec(),
        vec![
            ("mode", Attribute::Str(mode)),
            (pads_key, Attribute::Ints(pad)),
            ("value", Attribute::Float(value)),
        ],
    )])
}

pub fn convert_reshape(
    node: &SourceNode,
    opset_version: i64,
    mut inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let shape = node.attr_ints("shape")?;
    match opset_version {
        1 => Ok(vec![IrNode::new(
            "Reshape",
            inputs,
            outputs.to_vec(),
            vec![("shape", Attribute::Ints(shape))],
        )]),
        5 => {
            // The target shape moved from an attribute to an int64 input.
            let shape_name = ctx.materialize_constant(Array1::from(shape).into_dyn());
            inputs.push(shape_name);
            Ok(vec![IrNode::new("Reshape", inputs, outputs.to_vec(), vec![])])
        }
        v => Err(opset_unsupported(node, v)),
    }
}

pub fn convert_split_axis(
    node: &SourceNode,
    opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    _ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let axis = node.attr_int("axis")?;
    let split = match node.opt_ints("indices")? {
        Some(indices) => {
            let mut split = Vec::with_capacity(indices.len() + 1);
            let mut prev = 0;
            for i in indices {
                split.push(i - prev);
                prev = i;
            }
            split
        }
        None => {
            let sections = node.attr_int("sections")?;
            if sections <= 0 {
                return Err(Error::AttributeUnsupported(format!(
                    "sections of SplitAxis must be positive, got {}",
                    sections
                )));
            }
            let dim = node.input_shape(0)?[normalize_axis(node, axis)?];
            vec![dim / sections; sections as usize]
        }
    };
    match opset_version {
        1 | 2 => Ok(vec![IrNode::new(
            "Split",
            inputs,
            outputs.to_vec(),
            vec![
                ("axis", Attribute::Int(axis)),
                ("split", Attribute::Ints(split)),
            ],
        )]),
        v => Err(opset_unsupported(node, v)),
    }
}

pub fn convert_squeeze(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    _ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let axes = match node.opt_ints("axes")? {
        Some(axes) => axes,
        // No axes given: drop every size-1 dimension.
        None => node
            .input_shape(0)?
            .iter()
            .enumerate()
            .filter(|(_, &s)| s == 1)
            .map(|(i, _)| i as i64)
            .collect(),
    };
    Ok(vec![IrNode::new(
        "Squeeze",
        inputs,
        outputs.to_vec(),
        vec![("axes", Attribute::Ints(axes))],
    )])
}

pub fn convert_swapaxes(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    _ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let axis1 = normalize_axis(node, node.attr_int("axis1")?)?;
    let axis2 = normalize_axis(node, node.attr_int("axis2")?)?;
    let mut perm: Vec<i64> = (0..node.input_rank(0)? as i64).collect();
    perm.swap(axis1, axis2);
    Ok(vec![IrNode::new(
        "Transpose",
        inputs,
        outputs.to_vec(),
        vec![("perm", Attribute::Ints(perm))],
    )])
}

pub fn convert_tile(
    node: &SourceNode,
    opset_version: i64,
    mut inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let reps = match node.attr("reps") {
        Some(SourceAttr::Int(v)) => vec![*v],
        Some(SourceAttr::Ints(v)) => v.clone(),
        Some(_) => {
            return Err(Error::AttributeUnsupported(
                "reps of Tile must be an int or an int list".to_string(),
            ))
        }
        None => return Err(Error::MissingAttribute("Tile.reps".to_string())),
    };

    let tiles_name = ctx.materialize_constant(Array1::from(reps.clone()).into_dyn());
    inputs.push(tiles_name);

    match opset_version {
        1 => {
            // Opset 1 additionally takes the tiled axes as a float input.
            let axes: Vec<f32> = (0..reps.len()).map(|i| i as f32).collect();
            let axes_name = ctx.materialize_constant(Array1::from(axes).into_dyn());
            inputs.push(axes_name);
            Ok(vec![IrNode::new("Tile", inputs, outputs.to_vec(), vec![])])
        }
        6 => Ok(vec![IrNode::new("Tile", inputs, outputs.to_vec(), vec![])]),
        v => Err(opset_unsupported(node, v)),
    }
}

pub fn convert_transpose(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    _ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let attrs = match node.opt_ints("perm")? {
        Some(perm) => vec![("perm", Attribute::Ints(perm))],
        None => vec![],
    };
    Ok(vec![IrNode::new("Transpose", inputs, outputs.to_vec(), attrs)])
}

pub fn convert_expand_dims(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    _ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let mut axis = node.attr_int("axis")?;
    if axis < 0 {
        axis += node.input_rank(0)? as i64 + 1;
    }
    Ok(vec![IrNode::new(
        "Unsqueeze",
        inputs,
        outputs.to_vec(),
        vec![("axes", Attribute::Ints(vec![axis]))],
    )])
}

pub fn convert_where(
    node: &SourceNode,
    opset_version: i64,
    mut inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let condition = node.attr_value("condition")?;
    inputs.insert(0, ctx.name_for(condition));
    match opset_version {
        9 => Ok(vec![IrNode::new("Where", inputs, outputs.to_vec(), vec![])]),
        v => Err(opset_unsupported(node, v)),
    }
}

pub fn convert_repeat(
    node: &SourceNode,
    opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let repeats = node.attr_ints("repeats")?;
    let count = match repeats.as_slice() {
        [] => {
            return Err(Error::AttributeUnsupported(
                "repeats of Repeat must hold exactly one count, got none".to_string(),
            ))
        }
        [count] => *count,
        _ => {
            return Err(Error::AttributeUnsupported(
                "elementwise repeat counts cannot be expressed with Upsample".to_string(),
            ))
        }
    };

    let mut gb = GraphBuilder::new();
    let mut current = inputs.clone();
    let scales = match node.opt_int("axis")? {
        Some(mut axis) => {
            let rank = node.input_rank(0)?;
            if axis < 0 {
                axis += rank as i64;
            }
            let mut scales = vec![1.0f32; rank];
            scales[axis as usize] = count as f32;
            scales
        }
        None => {
            // Without an axis the source flattens first; mirror that with a
            // Reshape to rank 1 before upsampling.
            let shape_name = ctx.materialize_constant(Array1::from(vec![-1i64]).into_dyn());
            let mut reshape_inputs = inputs;
            reshape_inputs.push(shape_name);
            current = vec![gb.op(ctx, "Reshape", reshape_inputs, vec![])];
            vec![count as f32]
        }
    };

    match opset_version {
        7 => {
            gb.op_output_named(
                "Upsample",
                current,
                outputs,
                vec![("scales", Attribute::Floats(scales))],
            );
            gb.finish(None)
        }
        9 => {
            let scales_name = ctx.materialize_constant(Array1::from(scales).into_dyn());
            current.push(scales_name);
            gb.op_output_named("Upsample", current, outputs, vec![]);
            gb.finish(None)
        }
        v => Err(opset_unsupported(node, v)),
    }
}

pub fn convert_resize_images(
    node: &SourceNode,
    opset_version: i64,
    mut inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    log::warn!(
        "resize_images is mapped to Upsample with linear interpolation; \
         bilinear behavior differs between runtimes"
    );

    let out_h = node.attr_int("out_h")?;
    let out_w = node.attr_int("out_w")?;
    let shape = node.input_shape(0)?;
    if shape.len() < 4 {
        return Err(Error::InvalidGraph(format!(
            "resize_images expects a rank-4 input, got rank {}",
            shape.len()
        )));
    }
    let (h, w) = (shape[2], shape[3]);

    let scale_h = out_h as f32 / h as f32;
    let scale_w = out_w as f32 / w as f32;
    if scale_h < 1.0e-8 && scale_w < 1.0e-8 {
        return Err(Error::AttributeUnsupported(format!(
            "scaling factor is too small or zero: h = {}, w = {}",
            scale_h, scale_w
        )));
    }
    let scales = vec![1.0f32, 1.0, scale_h, scale_w];

    match opset_version {
        7 => Ok(vec![IrNode::new(
            "Upsample",
            inputs,
            outputs.to_vec(),
            vec![
                ("mode", Attribute::Str("linear".to_string())),
                ("scales", Attribute::Floats(scales)),
            ],
        )]),
        9 => {
            let scales_name = ctx.materialize_constant(Array1::from(scales).into_dyn());
            inputs.push(scales_name);
            Ok(vec![IrNode::new(
                "Upsample",
                inputs,
                outputs.to_vec(),
                vec![("mode", Attribute::Str("linear".to_string()))],
            )])
        }
        v => Err(opset_unsupported(node, v)),
    }
}

/// Stacking along a new axis has no single target equivalent: unsqueeze each
/// input at the stack axis, then concatenate the results in input order.
pub fn convert_stack(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let mut axis = node.attr_int("axis")?;
    if axis < 0 {
        axis += node.input_rank(0)? as i64 + 1;
    }

    let mut gb = GraphBuilder::new();
    let unsqueezed: Vec<String> = inputs
        .into_iter()
        .map(|name| {
            gb.op(
                ctx,
                "Unsqueeze",
                vec![name],
                vec![("axes", Attribute::Ints(vec![axis]))],
            )
        })
        .collect();
    gb.op_output_named(
        "Concat",
        unsqueezed,
        outputs,
        vec![("axis", Attribute::Int(axis))],
    );
    gb.finish(None)
}

fn unsqueeze_all(
    gb: &mut GraphBuilder,
    ctx: &mut ConversionContext,
    inputs: Vec<String>,
    axes: &[i64],
) -> Vec<String> {
    inputs
        .into_iter()
        .map(|name| {
            gb.op(
                ctx,
                "Unsqueeze",
                vec![name],
                vec![("axes", Attribute::Ints(axes.to_vec()))],
            )
        })
        .collect()
}

pub fn convert_hstack(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let rank = node.input_rank(0)?;
    let mut gb = GraphBuilder::new();
    let (inputs, axis) = match rank {
        0 => (unsqueeze_all(&mut gb, ctx, inputs, &[0]), 0),
        1 => (inputs, 0),
        _ => (inputs, 1),
    };
    gb.op_output_named("Concat", inputs, outputs, vec![("axis", Attribute::Int(axis))]);
    gb.finish(None)
}

pub fn convert_vstack(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let rank = node.input_rank(0)?;
    let mut gb = GraphBuilder::new();
    let inputs = match rank {
        0 => unsqueeze_all(&mut gb, ctx, inputs, &[0, 1]),
        1 => unsqueeze_all(&mut gb, ctx, inputs, &[0]),
        _ => inputs,
    };
    gb.op_output_named("Concat", inputs, outputs, vec![("axis", Attribute::Int(0))]);
    gb.finish(None)
}

pub fn convert_dstack(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let rank = node.input_rank(0)?;
    let mut gb = GraphBuilder::new();
    let inputs = match rank {
        0 => unsqueeze_all(&mut gb, ctx, inputs, &[0, 1, 2]),
        1 => unsqueeze_all(&mut gb, ctx, inputs, &[0, 2]),
        2 => unsqueeze_all(&mut gb, ctx, inputs, &[2]),
        _ => inputs,
    };
    gb.op_output_named("Concat", inputs, outputs, vec![("axis", Attribute::Int(2))]);
    gb.finish(None)
}

/// Splitting into N named outputs: one Split with N outputs, then one
/// Squeeze per output along the split axis.
pub fn convert_separate(
    node: &SourceNode,
    _opset_version: i64,
    inputs: Vec<String>,
    outputs: &[String],
    ctx: &mut ConversionContext,
) -> Result<Vec<IrNode>> {
    let axis = node.attr_int("axis")?;
    let mut gb = GraphBuilder::new();
    let split_outs = gb.op_multi(
        ctx,
        "Split",
        inputs,
        outputs.len(),
        vec![("axis", Attribute::Int(axis))],
    );
    for (split_out, final_name) in split_outs.into_iter().zip(outputs) {
        gb.op_output_named(
            "Squeeze",
            vec![split_out],
            std::slice::from_ref(final_name),
            vec![("axes", Attribute::Ints(vec![axis]))],
        );
    }
    gb.finish(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::indexing::IndexSpec;
    use crate::ir::{DataType, ValueId};

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cast_encodes_dtype_per_version() {
        let node = SourceNode::new("Cast").with_attr("dtype", SourceAttr::Dtype(DataType::Int64));
        let mut ctx = ConversionContext::new();
        let out = names(&["y"]);

        let v1 = convert_cast(&node, 1, names(&["x"]), &out, &mut ctx).unwrap();
        assert_eq!(
            v1[0].attributes["to"],
            Attribute::Str("INT64".to_string())
        );

        let v6 = convert_cast(&node, 6, names(&["x"]), &out, &mut ctx).unwrap();
        assert_eq!(v6[0].attributes["to"], Attribute::Int(7));
    }

    #[test]
    fn pad_attribute_key_is_renamed_between_versions() {
        let node = SourceNode::new("Pad")
            .with_attr("mode", SourceAttr::Str("constant".to_string()))
            .with_attr("pad_width", SourceAttr::PadWidths(vec![[1, 1], [2, 2]]))
            .with_attr("constant_values", SourceAttr::Float(5.0))
            .with_input_shape(&[3, 4]);
        let mut ctx = ConversionContext::new();
        let out = names(&["y"]);

        let v1 = convert_pad(&node, 1, names(&["x"]), &out, &mut ctx).unwrap();
        assert_eq!(v1[0].attributes["paddings"], Attribute::Ints(vec![1, 2, 1, 2]));
        assert_eq!(v1[0].attributes["value"], Attribute::Float(5.0));
        assert!(!v1[0].attributes.contains_key("pads"));

        let v2 = convert_pad(&node, 2, names(&["x"]), &out, &mut ctx).unwrap();
        assert_eq!(v2[0].attributes["pads"], Attribute::Ints(vec![1, 2, 1, 2]));
        assert_eq!(v2[0].attributes["value"], Attribute::Float(5.0));
        assert!(!v2[0].attributes.contains_key("paddings"));
    }

    #[test]
    fn pad_rejects_multiple_fill_values() {
        let node = SourceNode::new("Pad")
            .with_attr("mode", SourceAttr::Str("constant".to_string()))
            .with_attr("pad_width", SourceAttr::PadWidths(vec![[1, 1]]))
            .with_attr("constant_values", SourceAttr::Floats(vec![1.0, 2.0]))
            .with_input_shape(&[3, 4]);
        let mut ctx = ConversionContext::new();
        let err = convert_pad(&node, 2, names(&["x"]), &names(&["y"]), &mut ctx);
        assert!(matches!(err, Err(Error::AttributeUnsupported(_))));
    }

    #[test]
    fn pad_broadcasts_a_single_width_pair() {
        let node = SourceNode::new("Pad")
            .with_attr("mode", SourceAttr::Str("edge".to_string()))
            .with_attr("pad_width", SourceAttr::PadWidths(vec![[1, 2]]))
            .with_input_shape(&[3, 4, 5]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_pad(&node, 2, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(
            nodes[0].attributes["pads"],
            Attribute::Ints(vec![1, 1, 1, 2, 2, 2])
        );
        assert_eq!(nodes[0].attributes["value"], Attribute::Float(0.0));
    }

    #[test]
    fn reshape_materializes_shape_input_at_v5() {
        let node = SourceNode::new("Reshape").with_attr("shape", SourceAttr::Ints(vec![2, -1]));
        let mut ctx = ConversionContext::new();
        let nodes = convert_reshape(&node, 5, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes[0].inputs.len(), 2);
        assert!(nodes[0].attributes.is_empty());
        let param = &ctx.parameters()[0];
        assert_eq!(param.name, nodes[0].inputs[1]);
        assert_eq!(param.dtype, DataType::Int64);
        assert_eq!(param.dims, vec![2]);
    }

    #[test]
    fn tile_v1_takes_an_extra_axis_input() {
        let node = SourceNode::new("Tile").with_attr("reps", SourceAttr::Ints(vec![2, 3]));
        let mut ctx = ConversionContext::new();
        let nodes = convert_tile(&node, 1, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes[0].inputs.len(), 3);
        assert_eq!(ctx.parameters().len(), 2);
        assert_eq!(ctx.parameters()[0].dtype, DataType::Int64);
        assert_eq!(ctx.parameters()[1].dtype, DataType::Float);

        let mut ctx = ConversionContext::new();
        let nodes = convert_tile(&node, 6, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes[0].inputs.len(), 2);
        assert_eq!(ctx.parameters().len(), 1);
    }

    #[test]
    fn stack_unsqueezes_each_input_then_concatenates() {
        let node = SourceNode::new("Stack")
            .with_attr("axis", SourceAttr::Int(0))
            .with_input_shape(&[4]);
        let mut ctx = ConversionContext::new();
        let inputs = names(&["a", "b", "c"]);
        let nodes = convert_stack(&node, 1, inputs, &names(&["y"]), &mut ctx).unwrap();

        assert_eq!(nodes.len(), 4);
        for (i, expected_input) in ["a", "b", "c"].iter().enumerate() {
            assert_eq!(nodes[i].op_type, "Unsqueeze");
            assert_eq!(nodes[i].inputs, vec![expected_input.to_string()]);
            assert_eq!(nodes[i].attributes["axes"], Attribute::Ints(vec![0]));
        }
        let concat = &nodes[3];
        assert_eq!(concat.op_type, "Concat");
        let unsqueeze_outs: Vec<String> =
            nodes[..3].iter().map(|n| n.outputs[0].clone()).collect();
        assert_eq!(concat.inputs, unsqueeze_outs);
        assert_eq!(concat.outputs, vec!["y".to_string()]);
    }

    #[test]
    fn hstack_concats_rank1_along_axis_0() {
        let node = SourceNode::new("Hstack").with_input_shape(&[5]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_hstack(&node, 1, names(&["a", "b"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].attributes["axis"], Attribute::Int(0));
    }

    #[test]
    fn vstack_unsqueezes_rank1_inputs() {
        let node = SourceNode::new("Vstack").with_input_shape(&[5]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_vstack(&node, 1, names(&["a", "b"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].op_type, "Unsqueeze");
        assert_eq!(nodes[0].attributes["axes"], Attribute::Ints(vec![0]));
        assert_eq!(nodes[2].op_type, "Concat");
        assert_eq!(nodes[2].attributes["axis"], Attribute::Int(0));
    }

    #[test]
    fn dstack_unsqueezes_rank2_inputs_at_axis_2() {
        let node = SourceNode::new("Dstack").with_input_shape(&[3, 4]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_dstack(&node, 1, names(&["a", "b"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].attributes["axes"], Attribute::Ints(vec![2]));
        assert_eq!(nodes[2].attributes["axis"], Attribute::Int(2));
    }

    #[test]
    fn separate_splits_then_squeezes_each_output() {
        let node = SourceNode::new("Separate").with_attr("axis", SourceAttr::Int(1));
        let mut ctx = ConversionContext::new();
        let outputs = names(&["o0", "o1", "o2"]);
        let nodes = convert_separate(&node, 1, names(&["x"]), &outputs, &mut ctx).unwrap();

        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0].op_type, "Split");
        assert_eq!(nodes[0].outputs.len(), 3);
        for i in 0..3 {
            let squeeze = &nodes[i + 1];
            assert_eq!(squeeze.op_type, "Squeeze");
            assert_eq!(squeeze.inputs, vec![nodes[0].outputs[i].clone()]);
            assert_eq!(squeeze.outputs, vec![outputs[i].clone()]);
            assert_eq!(squeeze.attributes["axes"], Attribute::Ints(vec![1]));
        }
    }

    #[test]
    fn split_axis_derives_lengths_from_indices() {
        let node = SourceNode::new("SplitAxis")
            .with_attr("axis", SourceAttr::Int(0))
            .with_attr("indices", SourceAttr::Ints(vec![2, 5]))
            .with_input_shape(&[9]);
        let mut ctx = ConversionContext::new();
        let nodes =
            convert_split_axis(&node, 2, names(&["x"]), &names(&["a", "b", "c"]), &mut ctx)
                .unwrap();
        assert_eq!(nodes[0].attributes["split"], Attribute::Ints(vec![2, 3]));
    }

    #[test]
    fn split_axis_divides_evenly_by_sections() {
        let node = SourceNode::new("SplitAxis")
            .with_attr("axis", SourceAttr::Int(0))
            .with_attr("sections", SourceAttr::Int(3))
            .with_input_shape(&[9]);
        let mut ctx = ConversionContext::new();
        let nodes =
            convert_split_axis(&node, 1, names(&["x"]), &names(&["a", "b", "c"]), &mut ctx)
                .unwrap();
        assert_eq!(nodes[0].attributes["split"], Attribute::Ints(vec![3, 3, 3]));
    }

    #[test]
    fn split_axis_accepts_a_negative_axis() {
        let node = SourceNode::new("SplitAxis")
            .with_attr("axis", SourceAttr::Int(-1))
            .with_attr("sections", SourceAttr::Int(3))
            .with_input_shape(&[2, 9]);
        let mut ctx = ConversionContext::new();
        let nodes =
            convert_split_axis(&node, 2, names(&["x"]), &names(&["a", "b", "c"]), &mut ctx)
                .unwrap();
        assert_eq!(nodes[0].attributes["split"], Attribute::Ints(vec![3, 3, 3]));
        assert_eq!(nodes[0].attributes["axis"], Attribute::Int(-1));
    }

    #[test]
    fn split_axis_rejects_non_positive_sections() {
        let node = SourceNode::new("SplitAxis")
            .with_attr("axis", SourceAttr::Int(0))
            .with_attr("sections", SourceAttr::Int(0))
            .with_input_shape(&[9]);
        let mut ctx = ConversionContext::new();
        let err = convert_split_axis(&node, 2, names(&["x"]), &names(&["a"]), &mut ctx);
        assert!(matches!(err, Err(Error::AttributeUnsupported(_))));
    }

    #[test]
    fn squeeze_defaults_to_all_unit_axes() {
        let node = SourceNode::new("Squeeze").with_input_shape(&[1, 3, 1, 4]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_squeeze(&node, 1, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes[0].attributes["axes"], Attribute::Ints(vec![0, 2]));
    }

    #[test]
    fn swapaxes_builds_a_swapped_permutation() {
        let node = SourceNode::new("Swapaxes")
            .with_attr("axis1", SourceAttr::Int(0))
            .with_attr("axis2", SourceAttr::Int(2))
            .with_input_shape(&[2, 3, 4]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_swapaxes(&node, 1, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes[0].op_type, "Transpose");
        assert_eq!(nodes[0].attributes["perm"], Attribute::Ints(vec![2, 1, 0]));
    }

    #[test]
    fn swapaxes_accepts_negative_axes() {
        let node = SourceNode::new("Swapaxes")
            .with_attr("axis1", SourceAttr::Int(1))
            .with_attr("axis2", SourceAttr::Int(-1))
            .with_input_shape(&[2, 3, 4]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_swapaxes(&node, 1, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes[0].attributes["perm"], Attribute::Ints(vec![0, 2, 1]));
    }

    #[test]
    fn swapaxes_rejects_an_out_of_range_axis() {
        let node = SourceNode::new("Swapaxes")
            .with_attr("axis1", SourceAttr::Int(0))
            .with_attr("axis2", SourceAttr::Int(3))
            .with_input_shape(&[2, 3, 4]);
        let mut ctx = ConversionContext::new();
        let err = convert_swapaxes(&node, 1, names(&["x"]), &names(&["y"]), &mut ctx);
        assert!(matches!(err, Err(Error::InvalidGraph(_))));
    }

    #[test]
    fn expand_dims_normalizes_negative_axes() {
        let node = SourceNode::new("ExpandDims")
            .with_attr("axis", SourceAttr::Int(-1))
            .with_input_shape(&[2, 3]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_expand_dims(&node, 1, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes[0].attributes["axes"], Attribute::Ints(vec![2]));
    }

    #[test]
    fn where_prepends_the_mask_input() {
        let node = SourceNode::new("Where").with_attr("condition", SourceAttr::Value(ValueId(42)));
        let mut ctx = ConversionContext::new();
        let mask_name = ctx.name_for(ValueId(42));
        let nodes = convert_where(&node, 9, names(&["a", "b"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes[0].inputs[0], mask_name);
        assert_eq!(&nodes[0].inputs[1..], &names(&["a", "b"])[..]);
    }

    #[test]
    fn repeat_rejects_elementwise_counts() {
        let node = SourceNode::new("Repeat")
            .with_attr("repeats", SourceAttr::Ints(vec![2, 3]))
            .with_input_shape(&[2]);
        let mut ctx = ConversionContext::new();
        let err = convert_repeat(&node, 7, names(&["x"]), &names(&["y"]), &mut ctx);
        assert!(matches!(err, Err(Error::AttributeUnsupported(_))));
    }

    #[test]
    fn repeat_rejects_an_empty_count_list() {
        let node = SourceNode::new("Repeat")
            .with_attr("repeats", SourceAttr::Ints(vec![]))
            .with_input_shape(&[2]);
        let mut ctx = ConversionContext::new();
        let err = convert_repeat(&node, 7, names(&["x"]), &names(&["y"]), &mut ctx);
        assert!(matches!(err, Err(Error::AttributeUnsupported(_))));
    }

    #[test]
    fn repeat_scales_only_the_requested_axis() {
        let node = SourceNode::new("Repeat")
            .with_attr("repeats", SourceAttr::Ints(vec![3]))
            .with_attr("axis", SourceAttr::Int(1))
            .with_input_shape(&[2, 4]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_repeat(&node, 7, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(
            nodes[0].attributes["scales"],
            Attribute::Floats(vec![1.0, 3.0])
        );
    }

    #[test]
    fn repeat_without_axis_flattens_first() {
        let node = SourceNode::new("Repeat")
            .with_attr("repeats", SourceAttr::Ints(vec![2]))
            .with_input_shape(&[2, 4]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_repeat(&node, 9, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].op_type, "Reshape");
        assert_eq!(nodes[1].op_type, "Upsample");
        // Reshape target and scales both materialized as initializers.
        assert_eq!(ctx.parameters().len(), 2);
    }

    #[test]
    fn resize_images_scales_spatial_dims() {
        let node = SourceNode::new("ResizeImages")
            .with_attr("out_h", SourceAttr::Int(4))
            .with_attr("out_w", SourceAttr::Int(8))
            .with_input_shape(&[1, 3, 2, 2]);
        let mut ctx = ConversionContext::new();
        let nodes =
            convert_resize_images(&node, 7, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(
            nodes[0].attributes["scales"],
            Attribute::Floats(vec![1.0, 1.0, 2.0, 4.0])
        );
        assert_eq!(
            nodes[0].attributes["mode"],
            Attribute::Str("linear".to_string())
        );
    }

    #[test]
    fn get_item_chains_slice_squeeze_unsqueeze() {
        let node = SourceNode::new("GetItem")
            .with_attr(
                "slices",
                SourceAttr::IndexSpecs(vec![
                    IndexSpec::Index(2),
                    IndexSpec::full(),
                    IndexSpec::NewAxis,
                    IndexSpec::Ellipsis,
                ]),
            )
            .with_input_shape(&[4, 5, 6, 7]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_get_item(&node, 1, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].op_type, "Slice");
        assert_eq!(nodes[0].attributes["axes"], Attribute::Ints(vec![0]));
        assert_eq!(nodes[0].attributes["starts"], Attribute::Ints(vec![2]));
        assert_eq!(nodes[0].attributes["ends"], Attribute::Ints(vec![3]));
        assert_eq!(nodes[1].op_type, "Squeeze");
        assert_eq!(nodes[1].attributes["axes"], Attribute::Ints(vec![0]));
        assert_eq!(nodes[2].op_type, "Unsqueeze");
        assert_eq!(nodes[2].attributes["axes"], Attribute::Ints(vec![1]));
        assert_eq!(nodes[2].outputs, vec!["y".to_string()]);
    }

    #[test]
    fn get_item_with_full_selection_is_identity() {
        let node = SourceNode::new("GetItem")
            .with_attr(
                "slices",
                SourceAttr::IndexSpecs(vec![IndexSpec::full(), IndexSpec::Ellipsis]),
            )
            .with_input_shape(&[4, 5]);
        let mut ctx = ConversionContext::new();
        let nodes = convert_get_item(&node, 1, names(&["x"]), &names(&["y"]), &mut ctx).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].op_type, "Identity");
        assert_eq!(nodes[0].inputs, vec!["x".to_string()]);
        assert_eq!(nodes[0].outputs, vec!["y".to_string()]);
    }
}
