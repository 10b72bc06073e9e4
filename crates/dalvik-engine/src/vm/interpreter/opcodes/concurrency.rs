//! Monitor instructions
//!
//! Locking itself belongs to the host. `monitor-exit` moves `pc` past the
//! instruction before it can raise, so an exception thrown by the unlock
//! is attributed to the following instruction when the unwinder searches
//! the try table.

use crate::bytecode::Opcode;
use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::{inst_aa, Frame};
use crate::vm::interpreter::opcodes::opcode;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::Runtime;
use crate::vm::{VmError, VmResult};

impl Interpreter {
    pub(in crate::vm::interpreter) fn exec_monitor_ops(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
    ) -> VmResult<Flow> {
        let obj = self.regs.get_object(frame.window, inst_aa(inst))?;

        match opcode(inst)? {
            Opcode::MonitorEnter => {
                if obj.is_null() {
                    return frame.raise_npe(rt);
                }
                match rt.monitor_enter(obj) {
                    Ok(()) => Ok(frame.advance(1)),
                    Err(exception) => frame.throw(exception),
                }
            }
            Opcode::MonitorExit => {
                frame.advance(1);
                if obj.is_null() {
                    return frame.raise_npe(rt);
                }
                match rt.monitor_exit(obj) {
                    Ok(()) => Ok(Flow::Continue),
                    Err(exception) => frame.throw(exception),
                }
            }
            _ => Err(VmError::UnexpectedState("not a monitor opcode")),
        }
    }
}
