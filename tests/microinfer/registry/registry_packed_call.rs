use anyhow::Result;
use microinfer::{
    call_packed, DataType, PackedArgs, PackedValue, Status, TensorDescriptor, TensorDescriptorMut,
    TypeCode,
};

use crate::common;

#[test]
fn packed_call_writes_output_in_place() -> Result<()> {
    let module = common::kernel_module()?;
    let double = module.lookup("double")?;
    let input = [1i8, -2, 3, 60];
    let mut out = [0i8; 4];
    let shape = [4i64];
    {
        let mut args = PackedArgs::new();
        args.push(TensorDescriptor::from_slice(&input, DataType::I8, &shape));
        args.push(TensorDescriptorMut::from_slice(&mut out, DataType::I8, &shape));
        assert!(double.call(&mut args)?.is_null());
    }
    assert_eq!(out, [2, -4, 6, 120]);
    Ok(())
}

#[test]
fn packed_call_reports_type_mismatch() -> Result<()> {
    let module = common::kernel_module()?;
    let double = module.lookup("double")?;
    let input = [1i8; 4];
    let shape = [4i64];

    let mut args = PackedArgs::new();
    args.push(TensorDescriptor::from_slice(&input, DataType::I8, &shape));
    args.push(3i64);
    assert_eq!(args.type_code(1), Some(TypeCode::Int));
    assert_eq!(
        double.call(&mut args).unwrap_err(),
        Status::TypeMismatch {
            index: 1,
            expected: TypeCode::TensorHandle,
            actual: TypeCode::Int,
        }
    );
    Ok(())
}

#[test]
fn packed_call_rejects_read_only_output() -> Result<()> {
    let module = common::kernel_module()?;
    let double = module.lookup("double")?;
    let input = [1i8; 4];
    let shape = [4i64];

    let mut args = PackedArgs::new();
    args.push(TensorDescriptor::from_slice(&input, DataType::I8, &shape));
    args.push(TensorDescriptor::from_slice(&input, DataType::I8, &shape));
    assert_eq!(
        double.call(&mut args).unwrap_err(),
        Status::ReadOnly { index: 1 }
    );
    Ok(())
}

#[test]
fn packed_call_checks_argument_count() -> Result<()> {
    let module = common::kernel_module()?;
    let halve = module.lookup("halve_concat")?;
    let mut args = PackedArgs::new();
    assert!(matches!(
        halve.call(&mut args),
        Err(Status::ArgCount { expected: 2, actual: 0 })
    ));
    Ok(())
}

#[test]
fn call_packed_builds_arguments_in_order() -> Result<()> {
    let module = common::kernel_module()?;
    let double = module.lookup("double")?;
    let input = [4i8, 5];
    let mut out = [0i8; 2];
    let shape = [2i64];
    let ret = call_packed(
        &*double,
        [
            PackedValue::Tensor(TensorDescriptor::from_slice(&input, DataType::I8, &shape)),
            PackedValue::TensorMut(TensorDescriptorMut::from_slice(&mut out, DataType::I8, &shape)),
        ],
    )?;
    assert!(ret.is_null());
    assert_eq!(out, [8, 10]);
    Ok(())
}
