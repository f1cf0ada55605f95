use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::packed::{KernelFn, PackedArgs, PackedFunc, PackedValue, Status};

use super::{FuncHandle, FunctionRegistry, Module};

pub const SYSTEM_LIB: &str = "runtime.SystemLib";
pub const MODULE_HAS_FUNCTION: &str = "runtime.ModuleHasFunction";

/// `runtime.SystemLib() -> Module`
struct SystemLib {
    module: Arc<Module>,
}

impl PackedFunc for SystemLib {
    fn call(&self, args: &mut PackedArgs<'_>) -> std::result::Result<PackedValue<'_>, Status> {
        args.expect_len(0)?;
        Ok(PackedValue::Module(&self.module))
    }
}

/// `runtime.ModuleHasFunction(Module, Str) -> Int`
fn module_has_function(args: &mut PackedArgs<'_>) -> std::result::Result<PackedValue<'static>, Status> {
    args.expect_len(2)?;
    let module = args.module(0)?;
    let name = args.str(1)?;
    Ok(PackedValue::Int(i64::from(module.contains(name))))
}

/// Composition root of the runtime: the system module plus the global
/// functions reachable through the packed-call convention.
#[derive(Debug)]
pub struct Runtime {
    system: Arc<Module>,
    globals: FunctionRegistry,
}

impl Runtime {
    pub fn initialize(system_module: Module) -> Result<Self> {
        let system = Arc::new(system_module);
        let mut globals = FunctionRegistry::new();
        globals.register(
            SYSTEM_LIB,
            SystemLib {
                module: Arc::clone(&system),
            },
        )?;
        globals.register(MODULE_HAS_FUNCTION, module_has_function as KernelFn)?;
        debug!(
            functions = system.len(),
            globals = globals.len(),
            "runtime initialized"
        );
        Ok(Self { system, globals })
    }

    pub fn system_module(&self) -> &Module {
        &self.system
    }

    pub fn shared_system_module(&self) -> Arc<Module> {
        Arc::clone(&self.system)
    }

    pub fn get_global(&self, name: &str) -> Result<FuncHandle> {
        self.globals.lookup(name)
    }

    pub fn register_global<F>(&mut self, name: impl Into<String>, func: F) -> Result<()>
    where
        F: PackedFunc + 'static,
    {
        self.globals.register(name, func)
    }

    pub fn globals(&self) -> &FunctionRegistry {
        &self.globals
    }
}
