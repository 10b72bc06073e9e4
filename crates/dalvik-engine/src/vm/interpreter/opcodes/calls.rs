//! Invoke instructions
//!
//! The handler only decodes operands; the dispatch loop performs the call
//! (see `Interpreter::dispatch_invoke`) and advances `pc` when it returns.

use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::Frame;
use crate::vm::interpreter::invoke::{ArgRegisters, InvokeRequest};
use crate::vm::interpreter::opcodes::opcode;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::{InvokeKind, Runtime};
use crate::vm::{VmError, VmResult};

impl Interpreter {
    /// `invoke-kind {vC, vD, vE, vF, vG}, meth@BBBB` and
    /// `invoke-kind/range {vCCCC .. vNNNN}, meth@BBBB`
    pub(in crate::vm::interpreter) fn exec_invoke_ops(
        &mut self,
        _rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
    ) -> VmResult<Flow> {
        let (kind, is_range) = InvokeKind::from_opcode(opcode(inst)?)
            .ok_or(VmError::UnexpectedState("not an invoke opcode"))?;
        let method_idx = frame.unit(1)? as u32;
        let args = if is_range {
            ArgRegisters::range(inst, frame.unit(2)?)
        } else {
            ArgRegisters::packed(inst, frame.unit(2)?)
        };
        Ok(Flow::Invoke(InvokeRequest {
            kind,
            method_idx,
            args,
        }))
    }
}
