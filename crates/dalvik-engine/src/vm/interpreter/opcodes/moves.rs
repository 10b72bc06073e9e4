//! Register-to-register moves and `move-result`

use crate::bytecode::Opcode;
use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::{inst_a, inst_aa, inst_b, Frame};
use crate::vm::interpreter::opcodes::opcode;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::Runtime;
use crate::vm::{VmError, VmResult};

impl Interpreter {
    pub(in crate::vm::interpreter) fn exec_move_ops(
        &mut self,
        _rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
    ) -> VmResult<Flow> {
        let w = frame.window;
        let regs = &mut self.regs;

        match opcode(inst)? {
            Opcode::Nop => Ok(frame.advance(1)),

            // vA <- vB
            Opcode::Move | Opcode::MoveObject => {
                regs.copy(w, inst_b(inst), w, inst_a(inst), false)?;
                Ok(frame.advance(1))
            }
            Opcode::MoveWide => {
                regs.copy(w, inst_b(inst), w, inst_a(inst), true)?;
                Ok(frame.advance(1))
            }

            // vAA <- vBBBB
            Opcode::MoveFrom16 | Opcode::MoveObjectFrom16 => {
                regs.copy(w, frame.unit(1)? as u32, w, inst_aa(inst), false)?;
                Ok(frame.advance(2))
            }
            Opcode::MoveWideFrom16 => {
                regs.copy(w, frame.unit(1)? as u32, w, inst_aa(inst), true)?;
                Ok(frame.advance(2))
            }

            // vAAAA <- vBBBB
            Opcode::Move16 | Opcode::MoveObject16 => {
                regs.copy(w, frame.unit(2)? as u32, w, frame.unit(1)? as u32, false)?;
                Ok(frame.advance(3))
            }
            Opcode::MoveWide16 => {
                regs.copy(w, frame.unit(2)? as u32, w, frame.unit(1)? as u32, true)?;
                Ok(frame.advance(3))
            }

            Opcode::MoveResult => {
                regs.set(w, inst_aa(inst), frame.ret_val.narrow_bits())?;
                Ok(frame.advance(1))
            }
            Opcode::MoveResultWide => {
                regs.set_wide(w, inst_aa(inst), frame.ret_val.wide_bits())?;
                Ok(frame.advance(1))
            }
            Opcode::MoveResultObject => {
                regs.set_object(w, inst_aa(inst), frame.ret_val.as_object())?;
                Ok(frame.advance(1))
            }

            _ => Err(VmError::UnexpectedState("not a move opcode")),
        }
    }
}
