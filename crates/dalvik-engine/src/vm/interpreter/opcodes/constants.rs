//! Constant loads

use crate::bytecode::Opcode;
use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::{inst_a, inst_aa, Frame};
use crate::vm::interpreter::opcodes::opcode;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::Runtime;
use crate::vm::{VmError, VmResult};

impl Interpreter {
    pub(in crate::vm::interpreter) fn exec_const_ops(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
    ) -> VmResult<Flow> {
        let w = frame.window;
        let regs = &mut self.regs;

        match opcode(inst)? {
            Opcode::Const4 => {
                // B is a signed nibble
                let lit = (inst as i16) >> 12;
                regs.set_int(w, inst_a(inst), lit as i32)?;
                Ok(frame.advance(1))
            }
            Opcode::Const16 => {
                regs.set_int(w, inst_aa(inst), frame.unit(1)? as i16 as i32)?;
                Ok(frame.advance(2))
            }
            Opcode::Const => {
                regs.set_int(w, inst_aa(inst), frame.unit_u32(1)? as i32)?;
                Ok(frame.advance(3))
            }
            Opcode::ConstHigh16 => {
                regs.set(w, inst_aa(inst), (frame.unit(1)? as u32) << 16)?;
                Ok(frame.advance(2))
            }
            Opcode::ConstWide16 => {
                regs.set_long(w, inst_aa(inst), frame.unit(1)? as i16 as i64)?;
                Ok(frame.advance(2))
            }
            Opcode::ConstWide32 => {
                regs.set_long(w, inst_aa(inst), frame.unit_u32(1)? as i32 as i64)?;
                Ok(frame.advance(3))
            }
            Opcode::ConstWide => {
                regs.set_wide(w, inst_aa(inst), frame.unit_u64(1)?)?;
                Ok(frame.advance(5))
            }
            Opcode::ConstWideHigh16 => {
                regs.set_wide(w, inst_aa(inst), (frame.unit(1)? as u64) << 48)?;
                Ok(frame.advance(2))
            }

            op @ (Opcode::ConstString | Opcode::ConstStringJumbo) => {
                let (idx, width) = if op == Opcode::ConstString {
                    (frame.unit(1)? as u32, 2)
                } else {
                    (frame.unit_u32(1)?, 3)
                };
                match rt.resolve_string(frame.method, idx) {
                    Ok(string) => {
                        self.regs.set_object(w, inst_aa(inst), string)?;
                        Ok(frame.advance(width))
                    }
                    Err(exception) => frame.throw(exception),
                }
            }
            Opcode::ConstClass => match rt.resolve_class(frame.method, frame.unit(1)? as u32) {
                Ok(class) => {
                    self.regs.set_object(w, inst_aa(inst), class.as_object())?;
                    Ok(frame.advance(2))
                }
                Err(exception) => frame.throw(exception),
            },

            _ => Err(VmError::UnexpectedState("not a constant opcode")),
        }
    }
}
