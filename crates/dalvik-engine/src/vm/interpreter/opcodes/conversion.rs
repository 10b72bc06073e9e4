//! Primitive conversions (0x81-0x8f)
//!
//! Floating-point to integer conversions saturate at the target type's
//! bounds and map NaN to zero, which is exactly Rust's `as` semantics.

use crate::bytecode::Opcode;
use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::{inst_a, inst_b, Frame};
use crate::vm::interpreter::opcodes::opcode;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::Runtime;
use crate::vm::{VmError, VmResult};

impl Interpreter {
    pub(in crate::vm::interpreter) fn exec_conversion_ops(
        &mut self,
        _rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
    ) -> VmResult<Flow> {
        let w = frame.window;
        let (dst, src) = (inst_a(inst), inst_b(inst));
        let regs = &mut self.regs;

        match opcode(inst)? {
            Opcode::IntToLong => regs.set_long(w, dst, regs.get_int(w, src)? as i64)?,
            Opcode::IntToFloat => regs.set_float(w, dst, regs.get_int(w, src)? as f32)?,
            Opcode::IntToDouble => regs.set_double(w, dst, regs.get_int(w, src)? as f64)?,
            Opcode::LongToInt => regs.set_int(w, dst, regs.get_long(w, src)? as i32)?,
            Opcode::LongToFloat => regs.set_float(w, dst, regs.get_long(w, src)? as f32)?,
            Opcode::LongToDouble => regs.set_double(w, dst, regs.get_long(w, src)? as f64)?,
            Opcode::FloatToInt => regs.set_int(w, dst, regs.get_float(w, src)? as i32)?,
            Opcode::FloatToLong => regs.set_long(w, dst, regs.get_float(w, src)? as i64)?,
            Opcode::FloatToDouble => regs.set_double(w, dst, regs.get_float(w, src)? as f64)?,
            Opcode::DoubleToInt => regs.set_int(w, dst, regs.get_double(w, src)? as i32)?,
            Opcode::DoubleToLong => regs.set_long(w, dst, regs.get_double(w, src)? as i64)?,
            Opcode::DoubleToFloat => regs.set_float(w, dst, regs.get_double(w, src)? as f32)?,
            Opcode::IntToByte => regs.set_int(w, dst, regs.get_int(w, src)? as i8 as i32)?,
            Opcode::IntToChar => regs.set_int(w, dst, regs.get_int(w, src)? as u16 as i32)?,
            Opcode::IntToShort => regs.set_int(w, dst, regs.get_int(w, src)? as i16 as i32)?,
            _ => return Err(VmError::UnexpectedState("not a conversion opcode")),
        }
        Ok(frame.advance(1))
    }
}
