#![allow(dead_code)]

use anyhow::Result;
use microinfer::{
    slice_kernel, DataType, FunctionRegistry, GraphDescription, KernelFn, Module, PackedArgs,
    PackedValue, Status, TensorDescriptor,
};
use tracing_subscriber::filter::LevelFilter;

type Unary = fn(&[i8], &mut [i8]) -> std::result::Result<(), Status>;
type Binary = fn(&[i8], &[i8], &mut [i8]) -> std::result::Result<(), Status>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn double(input: &[i8], out: &mut [i8]) -> std::result::Result<(), Status> {
    for (o, x) in out.iter_mut().zip(input) {
        *o = x.wrapping_mul(2);
    }
    Ok(())
}

pub fn add(a: &[i8], b: &[i8], out: &mut [i8]) -> std::result::Result<(), Status> {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x.wrapping_add(*y);
    }
    Ok(())
}

/// Copies the leading elements of the input that fit in the output.
pub fn halve_concat(args: &mut PackedArgs<'_>) -> std::result::Result<PackedValue<'static>, Status> {
    args.expect_len(2)?;
    let (inputs, mut out) = args.split_output()?;
    let src = inputs.tensor(0)?;
    let len = out.byte_size();
    let head = src.data().get(..len).ok_or(Status::Layout { index: 0 })?;
    out.data_mut().copy_from_slice(head);
    Ok(PackedValue::Null)
}

pub fn fail(_args: &mut PackedArgs<'_>) -> std::result::Result<PackedValue<'static>, Status> {
    Err(Status::Code(7))
}

static LINKED_WEIGHTS: [i8; 4] = [10, 20, 30, 40];
static LINKED_SHAPE: [i64; 2] = [1, 4];
pub const LINKED_STORAGE_ID: usize = 7;

pub fn lookup_linked_param(
    args: &mut PackedArgs<'_>,
) -> std::result::Result<PackedValue<'static>, Status> {
    args.expect_len(1)?;
    if args.int(0)? == LINKED_STORAGE_ID as i64 {
        return Ok(PackedValue::Tensor(TensorDescriptor::from_slice(
            &LINKED_WEIGHTS,
            DataType::I8,
            &LINKED_SHAPE,
        )));
    }
    Ok(PackedValue::Null)
}

pub fn kernel_registry() -> Result<FunctionRegistry> {
    let table: &[(&str, KernelFn)] = &[("halve_concat", halve_concat), ("fail", fail)];
    let mut registry = FunctionRegistry::from_table(table)?;
    registry.register("double", slice_kernel(double as Unary))?;
    registry.register("add", slice_kernel(add as Binary))?;
    Ok(registry)
}

pub fn kernel_module() -> Result<Module> {
    Ok(Module::named("syslib", kernel_registry()?))
}

pub fn linked_module() -> Result<Module> {
    let mut module = kernel_module()?;
    let table: &[(&str, KernelFn)] = &[("_lookup_linked_param", lookup_linked_param)];
    module.import(FunctionRegistry::from_table(table)?)?;
    Ok(module)
}

/// `in:[1,4] -> double -> mid:[1,4] -> halve_concat -> out:[1,2]`, all int8.
pub fn pipeline_graph() -> GraphDescription {
    let mut g = GraphDescription::new();
    let input = g.add_buffer(DataType::I8, &[1, 4]);
    let mid = g.add_buffer(DataType::I8, &[1, 4]);
    let out = g.add_buffer(DataType::I8, &[1, 2]);
    g.add_input("in", input);
    g.add_output("out", out);
    g.add_op("double", &[input], mid);
    g.add_op("halve_concat", &[mid], out);
    g
}

pub fn view<'a>(data: &'a [i8], shape: &'static [i64]) -> TensorDescriptor<'a> {
    TensorDescriptor::from_slice(data, DataType::I8, shape)
}
