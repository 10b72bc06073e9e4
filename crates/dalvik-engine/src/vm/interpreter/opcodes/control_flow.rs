//! Branches, switches and returns

use crate::bytecode::{Opcode, PackedSwitch, SparseSwitch};
use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::{inst_a, inst_aa, inst_b, Frame};
use crate::vm::interpreter::opcodes::opcode;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::Runtime;
use crate::vm::value::Value;
use crate::vm::{VmError, VmResult};

impl Interpreter {
    /// Execute a control flow opcode.
    ///
    /// Taken branches move `pc` by a signed offset relative to the branch
    /// instruction; a target outside the stream is an internal fault.
    pub(in crate::vm::interpreter) fn exec_control_flow_ops(
        &mut self,
        _rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
    ) -> VmResult<Flow> {
        let w = frame.window;
        let regs = &self.regs;
        let op = opcode(inst)?;

        match op {
            Opcode::Goto => frame.goto_off(inst_aa(inst) as u8 as i8 as i32),
            Opcode::Goto16 => frame.goto_off(frame.unit(1)? as i16 as i32),
            Opcode::Goto32 => frame.goto_off(frame.unit_u32(1)? as i32),

            Opcode::PackedSwitch => {
                let test = regs.get_int(w, inst_aa(inst))?;
                let table = PackedSwitch::parse(frame.payload(frame.unit_u32(1)? as i32)?)?;
                match table.lookup(test) {
                    Some(offset) => frame.goto_off(offset),
                    None => Ok(frame.advance(3)),
                }
            }
            Opcode::SparseSwitch => {
                let test = regs.get_int(w, inst_aa(inst))?;
                let table = SparseSwitch::parse(frame.payload(frame.unit_u32(1)? as i32)?)?;
                match table.lookup(test) {
                    Some(offset) => frame.goto_off(offset),
                    None => Ok(frame.advance(3)),
                }
            }

            // if-test vA, vB, +CCCC
            Opcode::IfEq
            | Opcode::IfNe
            | Opcode::IfLt
            | Opcode::IfGe
            | Opcode::IfGt
            | Opcode::IfLe => {
                let x = regs.get_int(w, inst_a(inst))?;
                let y = regs.get_int(w, inst_b(inst))?;
                if branch_taken(op, x, y) {
                    frame.goto_off(frame.unit(1)? as i16 as i32)
                } else {
                    Ok(frame.advance(2))
                }
            }
            // if-testz vAA, +BBBB
            Opcode::IfEqz
            | Opcode::IfNez
            | Opcode::IfLtz
            | Opcode::IfGez
            | Opcode::IfGtz
            | Opcode::IfLez => {
                let x = regs.get_int(w, inst_aa(inst))?;
                if branch_taken(op, x, 0) {
                    frame.goto_off(frame.unit(1)? as i16 as i32)
                } else {
                    Ok(frame.advance(2))
                }
            }

            Opcode::ReturnVoid => Ok(Flow::Return(Value::Void)),
            Opcode::Return => Ok(Flow::Return(Value::Int(regs.get_int(w, inst_aa(inst))?))),
            Opcode::ReturnWide => Ok(Flow::Return(Value::Long(regs.get_long(w, inst_aa(inst))?))),
            Opcode::ReturnObject => {
                Ok(Flow::Return(Value::Object(regs.get_object(w, inst_aa(inst))?)))
            }

            _ => Err(VmError::UnexpectedState("not a control flow opcode")),
        }
    }
}

/// Signed 32-bit comparison of an `if-*` instruction
fn branch_taken(op: Opcode, x: i32, y: i32) -> bool {
    match op {
        Opcode::IfEq | Opcode::IfEqz => x == y,
        Opcode::IfNe | Opcode::IfNez => x != y,
        Opcode::IfLt | Opcode::IfLtz => x < y,
        Opcode::IfGe | Opcode::IfGez => x >= y,
        Opcode::IfGt | Opcode::IfGtz => x > y,
        _ => x <= y,
    }
}
