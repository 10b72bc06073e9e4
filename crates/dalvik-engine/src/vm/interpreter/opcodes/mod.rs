//! Opcode handler modules for the interpreter
//!
//! Each module implements a category of handlers as methods on
//! `Interpreter`. A handler decodes its operands from the cursor, performs
//! the instruction and either advances `pc` past it, branches, or records a
//! pending exception and leaves `pc` at the faulting instruction.

pub mod arithmetic;
pub mod arrays;
pub mod calls;
pub mod comparison;
pub mod concurrency;
pub mod constants;
pub mod control_flow;
pub mod conversion;
pub mod exceptions;
pub mod moves;
pub mod objects;

use crate::bytecode::Opcode;
use crate::vm::{VmError, VmResult};

/// Decode the opcode of an instruction's first code unit
#[inline]
pub(in crate::vm::interpreter) fn opcode(inst: u16) -> VmResult<Opcode> {
    Opcode::from_u8(inst as u8).ok_or(VmError::InvalidOpcode(inst as u8))
}
