//! `throw` and `move-exception`

use crate::bytecode::Opcode;
use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::{inst_aa, Frame};
use crate::vm::interpreter::opcodes::opcode;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::Runtime;
use crate::vm::{VmError, VmResult};

impl Interpreter {
    pub(in crate::vm::interpreter) fn exec_exception_ops(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
    ) -> VmResult<Flow> {
        let w = frame.window;

        match opcode(inst)? {
            // pc stays on the throw so the unwinder sees the faulting site
            Opcode::Throw => match self.regs.get_object(w, inst_aa(inst))?.non_null() {
                Some(exception) => frame.throw(exception),
                None => frame.raise_npe(rt),
            },
            Opcode::MoveException => {
                let exception = frame.caught.take().ok_or(VmError::MissingException)?;
                self.regs.set_object(w, inst_aa(inst), exception)?;
                Ok(frame.advance(1))
            }
            _ => Err(VmError::UnexpectedState("not an exception opcode")),
        }
    }
}
