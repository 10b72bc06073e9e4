//! Three-way comparisons (0x2d-0x31)

use std::cmp::Ordering;

use crate::bytecode::Opcode;
use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::{inst_aa, Frame};
use crate::vm::interpreter::opcodes::opcode;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::Runtime;
use crate::vm::{VmError, VmResult};

/// Map an ordering to `-1/0/1`; `nan_bias` is the result for unordered
/// operands (`-1` for the `l` forms, `1` for the `g` forms)
#[inline]
pub(in crate::vm::interpreter) fn compare<T: PartialOrd>(x: T, y: T, nan_bias: i32) -> i32 {
    match x.partial_cmp(&y) {
        Some(Ordering::Less) => -1,
        Some(Ordering::Equal) => 0,
        Some(Ordering::Greater) => 1,
        None => nan_bias,
    }
}

impl Interpreter {
    pub(in crate::vm::interpreter) fn exec_comparison_ops(
        &mut self,
        _rt: &mut dyn Runtime,
        frame: &mut Frame,
        inst: u16,
    ) -> VmResult<Flow> {
        let w = frame.window;
        let unit = frame.unit(1)?;
        let (b, c) = ((unit & 0xff) as u32, (unit >> 8) as u32);
        let regs = &mut self.regs;

        let result = match opcode(inst)? {
            Opcode::CmplFloat => compare(regs.get_float(w, b)?, regs.get_float(w, c)?, -1),
            Opcode::CmpgFloat => compare(regs.get_float(w, b)?, regs.get_float(w, c)?, 1),
            Opcode::CmplDouble => compare(regs.get_double(w, b)?, regs.get_double(w, c)?, -1),
            Opcode::CmpgDouble => compare(regs.get_double(w, b)?, regs.get_double(w, c)?, 1),
            Opcode::CmpLong => compare(regs.get_long(w, b)?, regs.get_long(w, c)?, 0),
            _ => return Err(VmError::UnexpectedState("not a comparison opcode")),
        };
        regs.set_int(w, inst_aa(inst), result)?;
        Ok(frame.advance(2))
    }
}
