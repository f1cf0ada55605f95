use std::sync::Arc;

use anyhow::Result;
use microinfer::registry::{MODULE_HAS_FUNCTION, SYSTEM_LIB};
use microinfer::{Error, FuncHandle, FunctionRegistry, KernelFn, PackedArgs, Runtime};

use crate::common;

#[test]
fn register_all_rejects_duplicate_names() -> Result<()> {
    let entries: Vec<(&str, FuncHandle)> = vec![
        ("fail", Arc::new(common::fail as KernelFn) as FuncHandle),
        ("halve_concat", Arc::new(common::halve_concat as KernelFn) as FuncHandle),
        ("fail", Arc::new(common::fail as KernelFn) as FuncHandle),
    ];
    let err = FunctionRegistry::register_all(entries).unwrap_err();
    assert!(matches!(err, Error::DuplicateName(ref name) if name == "fail"));
    Ok(())
}

#[test]
fn module_lookup_is_exact() -> Result<()> {
    let module = common::kernel_module()?;
    assert!(module.contains("double"));
    assert!(module.lookup("halve_concat").is_ok());
    assert!(matches!(module.lookup("Double"), Err(Error::NotFound(_))));
    assert!(module.get_function("nonexistent_op").is_none());
    assert_eq!(module.name(), Some("syslib"));
    Ok(())
}

#[test]
fn system_lib_global_exposes_module() -> Result<()> {
    common::init_tracing();
    let runtime = Runtime::initialize(common::kernel_module()?)?;

    let system_lib = runtime.get_global(SYSTEM_LIB)?;
    let mut no_args = PackedArgs::new();
    let ret = system_lib.call(&mut no_args)?;
    let module = ret.as_module().expect("SystemLib returns a module");
    assert!(module.contains("double"));

    let has_function = runtime.get_global(MODULE_HAS_FUNCTION)?;
    for (name, expected) in [("double", 1), ("nonexistent_op", 0)] {
        let mut args = PackedArgs::new();
        args.push(module);
        args.push(name);
        assert_eq!(has_function.call(&mut args)?.as_int(), Some(expected));
    }
    assert!(matches!(
        runtime.get_global("runtime.Unknown"),
        Err(Error::NotFound(_))
    ));
    Ok(())
}
