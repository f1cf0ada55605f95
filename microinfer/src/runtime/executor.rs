use std::fmt;
use std::time::Instant;

use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::graph::{describe_op, Binding, GraphDescription};
use crate::packed::{PackedArgs, PackedValue, Status, TypeCode};
use crate::registry::{FuncHandle, Module, LINKED_PARAM_LOOKUP};
use crate::tensor::{strided_offset, TensorDescriptor, TensorDescriptorMut, TensorShape};

use super::arena::{Arena, StoragePlan};
use super::config::ExecutorConfig;
use super::trace::{format_trace_timing, TraceEvent, TraceTiming};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Uninitialized,
    /// Every operator resolved; storage not yet allocated.
    Loaded,
    Ready,
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorState::Uninitialized => write!(f, "uninitialized"),
            ExecutorState::Loaded => write!(f, "loaded"),
            ExecutorState::Ready => write!(f, "ready"),
        }
    }
}

struct ResolvedOp {
    name: String,
    func: FuncHandle,
    inputs: Vec<usize>,
    output: usize,
}

impl fmt::Debug for ResolvedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedOp")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .finish()
    }
}

/// Runs a static graph over a single preallocated arena.
///
/// `load` does all the work that can fail structurally: operator
/// resolution, storage planning and the one allocation. `run` only calls
/// the resolved kernels in declaration order.
#[derive(Debug)]
pub struct GraphExecutor {
    config: ExecutorConfig,
    state: ExecutorState,
    graph: GraphDescription,
    plan: StoragePlan,
    arena: Arena,
    ops: Vec<ResolvedOp>,
    trace: Vec<TraceEvent>,
}

impl GraphExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            state: ExecutorState::Uninitialized,
            graph: GraphDescription::default(),
            plan: StoragePlan::default(),
            arena: Arena::default(),
            ops: Vec::new(),
            trace: Vec::new(),
        }
    }

    pub fn create(
        description: GraphDescription,
        module: &Module,
        config: ExecutorConfig,
    ) -> Result<Self> {
        let mut executor = Self::new(config);
        executor.load(description, module)?;
        Ok(executor)
    }

    /// Load `description`, replacing whatever was loaded before. On error
    /// the executor is left uninitialized.
    pub fn load(&mut self, description: GraphDescription, module: &Module) -> Result<()> {
        self.reset();
        match self.try_load(description, module) {
            Ok(()) => {
                debug!(
                    ops = self.ops.len(),
                    inputs = self.graph.inputs.len(),
                    outputs = self.graph.outputs.len(),
                    arena_bytes = self.arena.len(),
                    "graph executor ready"
                );
                Ok(())
            }
            Err(err) => {
                error!(%err, "graph load failed");
                self.reset();
                Err(err)
            }
        }
    }

    fn try_load(&mut self, description: GraphDescription, module: &Module) -> Result<()> {
        description.validate()?;

        let mut ops = Vec::with_capacity(description.ops.len());
        for op in &description.ops {
            let func = module
                .get_function(&op.name)
                .ok_or_else(|| Error::UnresolvedOperator(op.name.clone()))?;
            ops.push(ResolvedOp {
                name: op.name.clone(),
                func,
                inputs: op.inputs.clone(),
                output: op.output,
            });
        }
        self.ops = ops;
        self.state = ExecutorState::Loaded;

        let plan = StoragePlan::plan(&description)?;
        let mut arena = Arena::allocate(plan.total_bytes(), self.config.arena_limit)?;
        debug!(
            slots = plan.slots().len(),
            bytes = plan.total_bytes(),
            "arena allocated"
        );

        for buffer in &description.buffers {
            if let Some(data) = &buffer.data {
                arena.bytes_mut()[plan.range(buffer.id)].copy_from_slice(data);
            }
        }
        if let Some(lookup) = module.get_function(LINKED_PARAM_LOOKUP) {
            load_linked_params(&lookup, &plan, &mut arena)?;
        }

        if self.config.trace {
            self.trace.reserve_exact(self.ops.len());
        }
        self.graph = description;
        self.plan = plan;
        self.arena = arena;
        self.state = ExecutorState::Ready;
        Ok(())
    }

    fn reset(&mut self) {
        self.state = ExecutorState::Uninitialized;
        self.graph = GraphDescription::default();
        self.plan = StoragePlan::default();
        self.arena = Arena::default();
        self.ops.clear();
        self.trace.clear();
    }

    fn ensure_ready(&self, operation: &'static str) -> Result<()> {
        if self.state != ExecutorState::Ready {
            return Err(Error::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Copy `tensor` into the input slot bound to `name`. Dtype and shape
    /// must match exactly; on mismatch nothing is written.
    pub fn set_input(&mut self, name: &str, tensor: TensorDescriptor<'_>) -> Result<()> {
        self.ensure_ready("set input")?;
        let index = self
            .input_index(name)
            .ok_or_else(|| Error::UnknownInput(name.to_string()))?;
        self.set_input_by_index(index, tensor)
    }

    pub fn set_input_by_index(&mut self, index: usize, tensor: TensorDescriptor<'_>) -> Result<()> {
        self.ensure_ready("set input")?;
        let binding = self
            .graph
            .inputs
            .get(index)
            .ok_or_else(|| Error::UnknownInput(format!("#{}", index)))?;
        let buffer = &self.graph.buffers[binding.buffer];
        if !buffer.tensor_shape().matches(tensor.dtype(), tensor.shape()) {
            return Err(Error::ShapeMismatch {
                name: binding.name.clone(),
                expected: buffer.tensor_shape(),
                actual: tensor.tensor_shape(),
            });
        }

        let elem = buffer.dtype.bytes();
        let dst = &mut self.arena.bytes_mut()[self.plan.range(binding.buffer)];
        match tensor.strides().filter(|_| !tensor.is_compact()) {
            None => {
                let src = tensor
                    .data()
                    .get(..dst.len())
                    .ok_or(Status::Layout { index: 0 })?;
                dst.copy_from_slice(src);
            }
            Some(strides) => {
                let numel = tensor.numel();
                let src = tensor.data();
                let element = |i: usize| {
                    let start = strided_offset(i, tensor.shape(), strides)?.checked_mul(elem)?;
                    let end = start.checked_add(elem)?;
                    (end <= src.len()).then_some(start..end)
                };
                if !(0..numel).all(|i| element(i).is_some()) {
                    return Err(Status::Layout { index: 0 }.into());
                }
                for (i, chunk) in dst.chunks_exact_mut(elem).enumerate().take(numel) {
                    let range = element(i).ok_or(Status::Layout { index: 0 })?;
                    chunk.copy_from_slice(&src[range]);
                }
            }
        }
        Ok(())
    }

    /// Execute every operator once, in declaration order. A failing kernel
    /// aborts the run; outputs written by earlier operators are kept.
    pub fn run(&mut self) -> Result<()> {
        self.ensure_ready("run")?;
        let device = self.config.device;
        let tracing = self.config.trace;
        if tracing {
            self.trace.clear();
        }

        for (op_index, op) in self.ops.iter().enumerate() {
            let started = (tracing && self.config.timer).then(Instant::now);
            let out_decl = &self.graph.buffers[op.output];
            let (rest, out) = self.arena.split_output(self.plan.range(op.output));

            let mut args = PackedArgs::new();
            for input in &op.inputs {
                let decl = &self.graph.buffers[*input];
                args.push(TensorDescriptor::make_view(
                    rest.get(self.plan.range(*input)),
                    device,
                    decl.dtype,
                    &decl.shape,
                ));
            }
            args.push(TensorDescriptorMut::make_view(
                out,
                device,
                out_decl.dtype,
                &out_decl.shape,
            ));

            if let Err(status) = op.func.call(&mut args) {
                error!(op_index, operator = %op.name, %status, "kernel failed");
                return Err(Error::KernelExecution {
                    operator: op.name.clone(),
                    status,
                });
            }

            if tracing {
                let timing = started
                    .map(|start| format_trace_timing(start.elapsed()))
                    .unwrap_or_default();
                let event = trace_event(&self.graph, op_index, op, timing);
                trace!(
                    op_index,
                    op = %describe_op(&self.graph.ops[op_index]),
                    micros = %event.micros,
                    "op executed"
                );
                self.trace.push(event);
            }
        }
        Ok(())
    }

    /// Copy output `index` into `out`.
    pub fn get_output(&self, index: usize, out: &mut TensorDescriptorMut<'_>) -> Result<()> {
        let (binding, view) = self.output_binding(index)?;
        if !view.tensor_shape().matches(out.dtype(), out.shape()) {
            return Err(Error::ShapeMismatch {
                name: binding.name.clone(),
                expected: view.tensor_shape(),
                actual: out.tensor_shape(),
            });
        }
        let dst = out.data_mut();
        if dst.len() != view.data().len() {
            return Err(Status::Layout { index: 0 }.into());
        }
        dst.copy_from_slice(view.data());
        Ok(())
    }

    pub fn get_output_by_name(&self, name: &str, out: &mut TensorDescriptorMut<'_>) -> Result<()> {
        self.ensure_ready("get output")?;
        let index = self
            .output_index(name)
            .ok_or_else(|| Error::UnknownOutput(name.to_string()))?;
        self.get_output(index, out)
    }

    /// Borrow output `index` in place. The view stays valid until the next
    /// mutating call on the executor.
    pub fn output(&self, index: usize) -> Result<TensorDescriptor<'_>> {
        self.output_binding(index).map(|(_, view)| view)
    }

    fn output_binding(&self, index: usize) -> Result<(&Binding, TensorDescriptor<'_>)> {
        self.ensure_ready("get output")?;
        let binding = self
            .graph
            .outputs
            .get(index)
            .ok_or_else(|| Error::UnknownOutput(format!("#{}", index)))?;
        Ok((binding, self.buffer_view(binding.buffer)))
    }

    fn buffer_view(&self, buffer: usize) -> TensorDescriptor<'_> {
        let decl = &self.graph.buffers[buffer];
        TensorDescriptor::make_view(
            &self.arena.bytes()[self.plan.range(buffer)],
            self.config.device,
            decl.dtype,
            &decl.shape,
        )
    }

    pub fn num_inputs(&self) -> usize {
        self.graph.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.graph.outputs.len()
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.graph.inputs.iter().position(|b| b.name == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.graph.outputs.iter().position(|b| b.name == name)
    }

    pub fn input_name(&self, index: usize) -> Option<&str> {
        self.graph.inputs.get(index).map(|b| b.name.as_str())
    }

    pub fn output_name(&self, index: usize) -> Option<&str> {
        self.graph.outputs.get(index).map(|b| b.name.as_str())
    }

    pub fn input_shape(&self, index: usize) -> Option<TensorShape> {
        let binding = self.graph.inputs.get(index)?;
        Some(self.graph.buffers[binding.buffer].tensor_shape())
    }

    pub fn output_shape(&self, index: usize) -> Option<TensorShape> {
        let binding = self.graph.outputs.get(index)?;
        Some(self.graph.buffers[binding.buffer].tensor_shape())
    }

    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Bytes reserved for all graph buffers.
    pub fn arena_size(&self) -> usize {
        self.arena.len()
    }

    /// Events of the most recent run. Empty unless tracing is enabled.
    pub fn trace_events(&self) -> &[TraceEvent] {
        &self.trace
    }
}

fn load_linked_params(lookup: &FuncHandle, plan: &StoragePlan, arena: &mut Arena) -> Result<()> {
    let mut linked = 0usize;
    for slot in 0..plan.slots().len() {
        let Some(storage_id) = plan.storage_id(slot) else {
            continue;
        };
        let mut args = PackedArgs::new();
        args.push(storage_id as i64);
        let value = lookup.call(&mut args)?;
        let tensor = match &value {
            PackedValue::Null => continue,
            other => other.as_tensor().ok_or(Status::TypeMismatch {
                index: 0,
                expected: TypeCode::TensorHandle,
                actual: other.type_code(),
            })?,
        };
        let range = plan.slot_range(slot);
        let data = tensor.data();
        if data.len() > range.len() {
            return Err(Error::invalid_graph(format!(
                "linked parameter for storage {} holds {} bytes, slot holds {}",
                storage_id,
                data.len(),
                range.len()
            )));
        }
        arena.bytes_mut()[range.start..range.start + data.len()].copy_from_slice(data);
        linked += 1;
    }
    if linked > 0 {
        debug!(linked, "linked parameters loaded");
    }
    Ok(())
}

fn trace_event(
    graph: &GraphDescription,
    op_index: usize,
    op: &ResolvedOp,
    timing: TraceTiming,
) -> TraceEvent {
    let describe = |buffer: usize| format!("%{}:{}", buffer, graph.buffers[buffer].tensor_shape());
    TraceEvent {
        op_index,
        op_name: op.name.clone(),
        inputs: op.inputs.iter().map(|id| describe(*id)).collect(),
        output: describe(op.output),
        micros: timing.micros,
        micros_parts: timing.micros_parts,
    }
}
