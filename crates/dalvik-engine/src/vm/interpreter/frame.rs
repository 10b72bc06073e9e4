//! Activation state and the instruction cursor
//!
//! A [`Frame`] is one in-flight method activation: its code, register
//! window, program counter, exception slots and the result of the last
//! invoke. Handlers read operands through the cursor helpers and are the
//! only ones that move `pc`.

use std::sync::Arc;

use crate::bytecode::CodeItem;
use crate::vm::exception::ExceptionKind;
use crate::vm::interpreter::execution::Flow;
use crate::vm::register_file::Window;
use crate::vm::runtime::Runtime;
use crate::vm::value::{MethodRef, ObjRef, Value};
use crate::vm::{VmError, VmResult};

// ============================================================================
// Operand fields of the first code unit
// ============================================================================

/// `A` nibble (bits 8..12)
#[inline]
pub(in crate::vm::interpreter) fn inst_a(inst: u16) -> u32 {
    ((inst >> 8) & 0xf) as u32
}

/// `B` nibble (bits 12..16)
#[inline]
pub(in crate::vm::interpreter) fn inst_b(inst: u16) -> u32 {
    (inst >> 12) as u32
}

/// `AA` byte (bits 8..16)
#[inline]
pub(in crate::vm::interpreter) fn inst_aa(inst: u16) -> u32 {
    (inst >> 8) as u32
}

/// One method activation
#[derive(Debug)]
pub struct Frame {
    /// Method being executed (referrer for index resolution)
    pub method: MethodRef,
    /// Method body
    pub code: Arc<CodeItem>,
    /// Register window
    pub window: Window,
    /// Program counter in code units
    pub pc: u32,
    /// Exception raised and not yet unwound
    pub pending: Option<ObjRef>,
    /// Exception delivered to a catch block, awaiting `move-exception`
    pub caught: Option<ObjRef>,
    /// Result of the last invoke or `filled-new-array`
    pub ret_val: Value,
}

impl Frame {
    /// Create an activation positioned at `pc = 0`
    pub fn new(method: MethodRef, code: Arc<CodeItem>, window: Window) -> Self {
        Self {
            method,
            code,
            window,
            pc: 0,
            pending: None,
            caught: None,
            ret_val: Value::Void,
        }
    }

    /// Instruction stream length in code units
    #[inline]
    pub fn code_len(&self) -> u32 {
        self.code.insns.len() as u32
    }

    /// Code unit at `pc + n`
    #[inline]
    pub fn unit(&self, n: u32) -> VmResult<u16> {
        let at = self.pc as usize + n as usize;
        self.code.insns.get(at).copied().ok_or(VmError::PcOutOfRange {
            pc: at as u32,
            len: self.code_len(),
        })
    }

    /// Two code units at `pc + n`, little-endian
    #[inline]
    pub fn unit_u32(&self, n: u32) -> VmResult<u32> {
        Ok(self.unit(n)? as u32 | (self.unit(n + 1)? as u32) << 16)
    }

    /// Four code units at `pc + n`, little-endian
    #[inline]
    pub fn unit_u64(&self, n: u32) -> VmResult<u64> {
        Ok(self.unit_u32(n)? as u64 | (self.unit_u32(n + 2)? as u64) << 32)
    }

    /// Move past the current instruction
    #[inline]
    pub fn advance(&mut self, width: u32) -> Flow {
        self.pc += width;
        Flow::Continue
    }

    /// Absolute code-unit index `pc + offset`, validated against the stream
    pub fn target(&self, offset: i32) -> VmResult<u32> {
        let target = self.pc as i64 + offset as i64;
        if target < 0 || target >= self.code_len() as i64 {
            return Err(VmError::BranchOutOfRange {
                from: self.pc,
                offset,
                len: self.code_len(),
            });
        }
        Ok(target as u32)
    }

    /// Relative jump
    #[inline]
    pub fn goto_off(&mut self, offset: i32) -> VmResult<Flow> {
        self.pc = self.target(offset)?;
        Ok(Flow::Continue)
    }

    /// Code units from `pc + offset` to the end of the stream (payload tables)
    pub fn payload(&self, offset: i32) -> VmResult<&[u16]> {
        let at = self.target(offset)? as usize;
        Ok(&self.code.insns[at..])
    }

    // ===== Exceptions =====

    /// Record `exception` as pending
    #[inline]
    pub fn throw(&mut self, exception: ObjRef) -> VmResult<Flow> {
        self.pending = Some(exception);
        Ok(Flow::Throw)
    }

    /// Raise an interpreter exception through the host
    pub fn raise(
        &mut self,
        rt: &mut dyn Runtime,
        kind: ExceptionKind,
        message: Option<&str>,
    ) -> VmResult<Flow> {
        let exception = rt.throw_new(kind.class_name(), message);
        self.throw(exception)
    }

    /// Raise `NullPointerException`
    #[inline]
    pub fn raise_npe(&mut self, rt: &mut dyn Runtime) -> VmResult<Flow> {
        self.raise(rt, ExceptionKind::NullPointer, None)
    }
}
