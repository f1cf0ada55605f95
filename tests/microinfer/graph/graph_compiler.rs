use anyhow::Result;
use microinfer::{
    DataType, Error, ExecutorConfig, GraphDescription, GraphExecutor, Runtime, TensorShape,
};

use crate::common;

/// Compiler output for `Reshape_1:int8[4] -> reshape -> double -> halve_concat`.
/// The reshape is a storage-sharing `__nop`.
const COMPILED: &str = r#"{
  "nodes": [
    {"op": "null", "name": "Reshape_1", "inputs": []},
    {"op": "tvm_op", "name": "tvmgen_default_reshape_nop",
     "attrs": {"num_outputs": "1", "num_inputs": "1", "flatten_data": "0", "func_name": "__nop"},
     "inputs": [[0, 0, 0]]},
    {"op": "tvm_op", "name": "tvmgen_default_fused_double",
     "attrs": {"num_outputs": "1", "num_inputs": "1", "flatten_data": "0", "func_name": "double"},
     "inputs": [[1, 0, 0]]},
    {"op": "tvm_op", "name": "tvmgen_default_fused_halve",
     "attrs": {"num_outputs": "1", "num_inputs": "1", "flatten_data": "0", "func_name": "halve_concat"},
     "inputs": [[2, 0, 0]]}
  ],
  "arg_nodes": [0],
  "heads": [[3, 0, 0]],
  "attrs": {
    "dltype": ["list_str", ["int8", "int8", "int8", "int8"]],
    "shape": ["list_shape", [[4], [1, 4], [1, 4], [1, 2]]],
    "storage_id": ["list_int", [0, 0, 1, 2]]
  },
  "node_row_ptr": [0, 1, 2, 3, 4]
}"#;

#[test]
fn compiler_graph_imports_bindings() -> Result<()> {
    let desc = GraphDescription::from_compiler_json(COMPILED)?;
    assert_eq!(desc.inputs.len(), 1);
    assert_eq!(desc.inputs[0].name, "Reshape_1");
    assert_eq!(desc.outputs[0].name, "output0");
    let ops: Vec<&str> = desc.ops.iter().map(|op| op.name.as_str()).collect();
    assert_eq!(ops, vec!["double", "halve_concat"]);
    Ok(())
}

#[test]
fn compiler_graph_runs_through_system_lib() -> Result<()> {
    common::init_tracing();
    let runtime = Runtime::initialize(common::kernel_module()?)?;
    let desc = GraphDescription::from_compiler_json(COMPILED)?;
    let mut exec = GraphExecutor::create(desc, runtime.system_module(), ExecutorConfig::default())?;

    assert_eq!(exec.input_shape(0), Some(TensorShape::new(DataType::I8, vec![4i64])));
    assert_eq!(exec.output_shape(0), Some(TensorShape::new(DataType::I8, vec![1i64, 2])));
    exec.set_input("Reshape_1", common::view(&[1, 2, 3, 4], &[4]))?;
    exec.run()?;
    assert_eq!(exec.output(0)?.as_slice::<i8>(), Some(&[2i8, 4][..]));
    Ok(())
}

#[test]
fn compiler_nop_without_storage_ids_is_rejected() -> Result<()> {
    let text = COMPILED.replace(
        r#""storage_id": ["list_int", [0, 0, 1, 2]]"#,
        r#""storage_hint": []"#,
    );
    let err = GraphDescription::from_compiler_json(&text).unwrap_err();
    assert!(matches!(err, Error::InvalidGraph(_)));
    Ok(())
}
