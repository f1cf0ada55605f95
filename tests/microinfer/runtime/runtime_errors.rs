use anyhow::Result;
use microinfer::{
    DataType, Error, ExecutorConfig, ExecutorState, GraphExecutor, Status, TensorDescriptor,
    TensorDescriptorMut,
};

use crate::common;

#[test]
fn unresolved_operator_leaves_executor_uninitialized() -> Result<()> {
    let mut graph = common::pipeline_graph();
    graph.ops[1].name = "nonexistent_op".to_string();

    let mut exec = GraphExecutor::new(ExecutorConfig::default());
    let err = exec.load(graph, &common::kernel_module()?).unwrap_err();
    assert!(matches!(err, Error::UnresolvedOperator(ref name) if name == "nonexistent_op"));
    assert_eq!(exec.state(), ExecutorState::Uninitialized);
    assert_eq!(exec.num_ops(), 0);
    assert_eq!(exec.arena_size(), 0);

    let err = exec.run().unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidState {
            state: ExecutorState::Uninitialized,
            ..
        }
    ));
    assert!(matches!(
        exec.set_input("in", common::view(&[1, 2, 3, 4], &[1, 4])),
        Err(Error::InvalidState { .. })
    ));
    assert!(matches!(exec.output(0), Err(Error::InvalidState { .. })));
    Ok(())
}

#[test]
fn failed_reload_drops_previous_graph() -> Result<()> {
    let module = common::kernel_module()?;
    let mut exec = GraphExecutor::create(common::pipeline_graph(), &module, ExecutorConfig::default())?;
    let mut broken = common::pipeline_graph();
    broken.ops[0].name = "nonexistent_op".to_string();
    assert!(exec.load(broken, &module).is_err());
    assert_eq!(exec.state(), ExecutorState::Uninitialized);
    assert_eq!(exec.num_inputs(), 0);
    Ok(())
}

#[test]
fn mismatched_input_is_rejected_without_writing() -> Result<()> {
    let mut exec = GraphExecutor::create(
        common::pipeline_graph(),
        &common::kernel_module()?,
        ExecutorConfig::default(),
    )?;
    exec.set_input("in", common::view(&[1, 2, 3, 4], &[1, 4]))?;

    let err = exec.set_input("in", common::view(&[9, 9, 9, 9], &[4])).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { ref name, .. } if name == "in"));

    let floats = [9.0f32; 4];
    let shape = [1i64, 4];
    let err = exec
        .set_input("in", TensorDescriptor::from_slice(&floats, DataType::F32, &shape))
        .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));

    let err = exec.set_input("missing", common::view(&[1, 2, 3, 4], &[1, 4])).unwrap_err();
    assert!(matches!(err, Error::UnknownInput(_)));

    exec.run()?;
    assert_eq!(exec.output(0)?.as_slice::<i8>(), Some(&[2i8, 4][..]));
    Ok(())
}

#[test]
fn output_lookup_errors() -> Result<()> {
    let exec = GraphExecutor::create(
        common::pipeline_graph(),
        &common::kernel_module()?,
        ExecutorConfig::default(),
    )?;
    let mut wrong = [0i8; 4];
    let shape = [1i64, 4];
    let mut out = TensorDescriptorMut::from_slice(&mut wrong, DataType::I8, &shape);
    assert!(matches!(
        exec.get_output(0, &mut out),
        Err(Error::ShapeMismatch { .. })
    ));
    assert!(matches!(
        exec.get_output_by_name("nope", &mut out),
        Err(Error::UnknownOutput(_))
    ));
    assert!(matches!(exec.output(3), Err(Error::UnknownOutput(_))));
    Ok(())
}

#[test]
fn failing_kernel_aborts_run_without_rollback() -> Result<()> {
    let mut graph = common::pipeline_graph();
    graph.ops[1].name = "fail".to_string();
    graph.add_output("mid", 1);

    let mut exec = GraphExecutor::create(graph, &common::kernel_module()?, ExecutorConfig::default())?;
    exec.set_input("in", common::view(&[1, 2, 3, 4], &[1, 4]))?;
    let err = exec.run().unwrap_err();
    match err {
        Error::KernelExecution { operator, status } => {
            assert_eq!(operator, "fail");
            assert_eq!(status, Status::Code(7));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(exec.state(), ExecutorState::Ready);
    let mid = exec.output_index("mid").expect("mid output is bound");
    assert_eq!(exec.output(mid)?.as_slice::<i8>(), Some(&[2i8, 4, 6, 8][..]));
    Ok(())
}

#[test]
fn arena_limit_fails_load() -> Result<()> {
    let config = ExecutorConfig::default().with_arena_limit(32);
    let mut exec = GraphExecutor::new(config);
    let err = exec
        .load(common::pipeline_graph(), &common::kernel_module()?)
        .unwrap_err();
    assert!(matches!(err, Error::Allocation { requested: 48, .. }));
    assert_eq!(exec.state(), ExecutorState::Uninitialized);
    assert!(matches!(exec.run(), Err(Error::InvalidState { .. })));
    Ok(())
}
