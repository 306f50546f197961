use crate::error::{Error, Result};
use crate::export::context::ConversionContext;
use crate::ir::{Attribute, IrNode};

/// Chains target-graph nodes inside a single converter call.
///
/// `op` binds each node to fresh intermediate names drawn from the context
/// counter; the returned name can feed later `op` calls, so the queue forms a
/// DAG in creation order with no forward references. The terminal node is
/// bound to the caller's output names either via `op_output_named` or when
/// the queue is finalized with `finish`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<IrNode>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a single-output node and returns its generated output name.
    pub fn op(
        &mut self,
        ctx: &mut ConversionContext,
        op_type: &str,
        inputs: Vec<String>,
        attributes: Vec<(&str, Attribute)>,
    ) -> String {
        self.op_multi(ctx, op_type, inputs, 1, attributes)
            .remove(0)
    }

    /// Enqueues a node with `num_outputs` generated output names.
    pub fn op_multi(
        &mut self,
        ctx: &mut ConversionContext,
        op_type: &str,
        inputs: Vec<String>,
        num_outputs: usize,
        attributes: Vec<(&str, Attribute)>,
    ) -> Vec<String> {
        let outputs: Vec<String> = (0..num_outputs).map(|_| ctx.temp_name()).collect();
        self.nodes
            .push(IrNode::new(op_type, inputs, outputs.clone(), attributes));
        outputs
    }

    /// Enqueues a node bound directly to caller-supplied final names.
    pub fn op_output_named(
        &mut self,
        op_type: &str,
        inputs: Vec<String>,
        outputs: &[String],
        attributes: Vec<(&str, Attribute)>,
    ) {
        self.nodes
            .push(IrNode::new(op_type, inputs, outputs.to_vec(), attributes));
    }

    /// Finalizes the queue, emitting nodes in creation order. When
    /// `output_names` is given, the last node's outputs are rebound to them.
    pub fn finish(mut self, output_names: Option<&[String]>) -> Result<Vec<IrNode>> {
        if let Some(names) = output_names {
            let last = self.nodes.last_mut().ok_or_else(|| {
                Error::InvalidGraph("cannot bind output names to an empty node queue".to_string())
            })?;
            if last.outputs.len() != names.len() {
                return Err(Error::InvalidGraph(format!(
                    "terminal node {} has {} outputs but {} names were supplied",
                    last.op_type,
                    last.outputs.len(),
                    names.len()
                )));
            }
            last.outputs = names.to_vec();
        }
        Ok(self.nodes)
    }
}
