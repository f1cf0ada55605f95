//! Import of the model compiler's node-graph JSON.
//!
//! The compiler emits one node per placeholder (`"op": "null"`) or fused
//! kernel call (`"op": "tvm_op"`). Node outputs are numbered as entries via
//! `node_row_ptr`, and per-entry dtype, shape and storage id live in the
//! top-level `attrs` table.
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::tensor::DataType;

use super::{BufferDecl, GraphDescription};

const NOP: &str = "__nop";

#[derive(Debug, Deserialize)]
struct CompilerGraph {
    nodes: Vec<CompilerNode>,
    #[serde(default)]
    arg_nodes: Vec<usize>,
    heads: Vec<Vec<usize>>,
    #[serde(default)]
    node_row_ptr: Option<Vec<usize>>,
    attrs: CompilerAttrs,
}

#[derive(Debug, Deserialize)]
struct CompilerNode {
    op: String,
    name: String,
    #[serde(default)]
    inputs: Vec<Vec<usize>>,
    #[serde(default)]
    attrs: Option<NodeAttrs>,
}

#[derive(Debug, Deserialize)]
struct NodeAttrs {
    #[serde(default)]
    func_name: Option<String>,
    #[serde(default)]
    num_outputs: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompilerAttrs {
    dltype: (String, Vec<String>),
    shape: (String, Vec<Vec<i64>>),
    #[serde(default)]
    storage_id: Option<(String, Vec<usize>)>,
}

impl CompilerNode {
    fn num_outputs(&self) -> Result<usize> {
        match self.attrs.as_ref().and_then(|attrs| attrs.num_outputs.as_deref()) {
            None => Ok(1),
            Some(text) => text.trim().parse().map_err(|_| {
                Error::invalid_graph(format!(
                    "node {} has malformed num_outputs {:?}",
                    self.name, text
                ))
            }),
        }
    }
}

impl GraphDescription {
    /// Convert compiler graph JSON into a description. Placeholders in
    /// `arg_nodes` become inputs named after the node, heads become outputs
    /// named `output0`, `output1`, ... and `__nop` calls are dropped. A
    /// `__nop` must share storage with its input, since nothing runs to
    /// copy the data across.
    pub fn from_compiler_json(text: &str) -> Result<Self> {
        let graph: CompilerGraph = serde_json::from_str(text)?;
        let row_ptr = match graph.node_row_ptr.clone() {
            Some(row_ptr) => row_ptr,
            None => row_ptr_from_nodes(&graph.nodes)?,
        };
        if row_ptr.len() != graph.nodes.len() + 1 {
            return Err(Error::invalid_graph(format!(
                "node_row_ptr has {} entries for {} nodes",
                row_ptr.len(),
                graph.nodes.len()
            )));
        }
        let num_entries = row_ptr[graph.nodes.len()];
        check_attr_len("dltype", &graph.attrs.dltype, num_entries)?;
        check_attr_len("shape", &graph.attrs.shape, num_entries)?;
        if let Some(storage) = &graph.attrs.storage_id {
            check_attr_len("storage_id", storage, num_entries)?;
        }

        let entry_id = |entry: &[usize]| -> Result<usize> {
            let (nid, index) = match entry {
                [nid, index, ..] => (*nid, *index),
                _ => {
                    return Err(Error::invalid_graph(format!(
                        "malformed node entry {:?}",
                        entry
                    )))
                }
            };
            let end = nid.checked_add(1).and_then(|next| row_ptr.get(next));
            let eid = row_ptr.get(nid).and_then(|start| start.checked_add(index));
            match (eid, end) {
                (Some(eid), Some(end)) if eid < *end => Ok(eid),
                _ => Err(Error::invalid_graph(format!(
                    "entry {:?} does not name a node output",
                    entry
                ))),
            }
        };

        let mut desc = GraphDescription::new();
        for eid in 0..num_entries {
            desc.buffers.push(BufferDecl {
                id: eid,
                dtype: DataType::from_ident(&graph.attrs.dltype.1[eid])?,
                shape: graph.attrs.shape.1[eid].clone(),
                storage_id: graph.attrs.storage_id.as_ref().map(|s| s.1[eid]),
                data: None,
            });
        }

        for nid in &graph.arg_nodes {
            let node = graph.nodes.get(*nid).ok_or_else(|| {
                Error::invalid_graph(format!("arg node {} does not exist", nid))
            })?;
            desc.add_input(node.name.clone(), entry_id(&[*nid, 0][..])?);
        }

        for (nid, node) in graph.nodes.iter().enumerate() {
            match node.op.as_str() {
                "null" => continue,
                "tvm_op" => {}
                other => {
                    return Err(Error::invalid_graph(format!(
                        "node {} has unsupported op kind {}",
                        node.name, other
                    )))
                }
            }
            let func_name = node
                .attrs
                .as_ref()
                .and_then(|attrs| attrs.func_name.clone())
                .ok_or_else(|| {
                    Error::invalid_graph(format!("node {} has no func_name", node.name))
                })?;
            if func_name == NOP {
                check_nop_aliases(&graph.attrs, node, &entry_id, nid)?;
                continue;
            }
            if node.num_outputs()? != 1 {
                return Err(Error::invalid_graph(format!(
                    "node {} ({}) produces {} outputs; only single-output calls are supported",
                    node.name,
                    func_name,
                    node.num_outputs()?
                )));
            }
            let inputs = node
                .inputs
                .iter()
                .map(|entry| entry_id(entry.as_slice()))
                .collect::<Result<Vec<_>>>()?;
            desc.add_op(func_name, &inputs, entry_id(&[nid, 0][..])?);
        }

        for (idx, head) in graph.heads.iter().enumerate() {
            desc.add_output(format!("output{}", idx), entry_id(head.as_slice())?);
        }
        Ok(desc)
    }
}

fn check_nop_aliases(
    attrs: &CompilerAttrs,
    node: &CompilerNode,
    entry_id: &dyn Fn(&[usize]) -> Result<usize>,
    nid: usize,
) -> Result<()> {
    let Some((_, storage)) = &attrs.storage_id else {
        return Err(Error::invalid_graph(format!(
            "{} node {} needs attrs.storage_id to alias its input",
            NOP, node.name
        )));
    };
    let [input] = node.inputs.as_slice() else {
        return Err(Error::invalid_graph(format!(
            "{} node {} takes {} inputs, expected 1",
            NOP,
            node.name,
            node.inputs.len()
        )));
    };
    let source = storage[entry_id(input.as_slice())?];
    let target = storage[entry_id(&[nid, 0][..])?];
    if source != target {
        return Err(Error::invalid_graph(format!(
            "{} node {} writes storage {} but reads storage {}",
            NOP, node.name, target, source
        )));
    }
    Ok(())
}

fn row_ptr_from_nodes(nodes: &[CompilerNode]) -> Result<Vec<usize>> {
    let mut row_ptr = Vec::with_capacity(nodes.len() + 1);
    let mut total = 0;
    row_ptr.push(total);
    for node in nodes {
        total += node.num_outputs()?;
        row_ptr.push(total);
    }
    Ok(row_ptr)
}

fn check_attr_len<T>(name: &str, attr: &(String, Vec<T>), entries: usize) -> Result<()> {
    if attr.1.len() != entries {
        return Err(Error::invalid_graph(format!(
            "attrs.{} ({}) has {} values for {} entries",
            name,
            attr.0,
            attr.1.len(),
            entries
        )));
    }
    Ok(())
}
