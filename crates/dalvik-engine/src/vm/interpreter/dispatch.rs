//! Opcode dispatch table
//!
//! All 256 opcode bytes map to a handler. Bytes with no instruction map
//! to a trap that reports [`VmError::InvalidOpcode`]; volatile field
//! variants share the plain field handler.

use once_cell::sync::Lazy;

use crate::vm::interpreter::execution::Flow;
use crate::vm::interpreter::frame::Frame;
use crate::vm::interpreter::Interpreter;
use crate::vm::runtime::Runtime;
use crate::vm::{VmError, VmResult};

/// Signature shared by all opcode handlers; the last argument is the
/// instruction's first code unit
pub(in crate::vm::interpreter) type Handler =
    fn(&mut Interpreter, &mut dyn Runtime, &mut Frame, u16) -> VmResult<Flow>;

/// Handler family of an opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `nop`, `move*`, `move-result*`
    Move,
    /// `const*`
    Constant,
    /// `monitor-enter`, `monitor-exit`
    Monitor,
    /// Type checks, `new-instance`, field access
    Object,
    /// Array allocation, filling and element access
    Array,
    /// `throw`, `move-exception`
    Exception,
    /// Branches, switches and returns
    ControlFlow,
    /// `cmp*`
    Comparison,
    /// `invoke-*`
    Invoke,
    /// Unary, binary and literal arithmetic
    Arithmetic,
    /// Primitive conversions
    Conversion,
    /// Unused opcode byte
    Trap,
}

impl Category {
    /// Family of an opcode byte
    pub fn of(byte: u8) -> Category {
        match byte {
            0x00..=0x0c => Category::Move,
            0x0d => Category::Exception,
            0x0e..=0x11 => Category::ControlFlow,
            0x12..=0x1c => Category::Constant,
            0x1d..=0x1e => Category::Monitor,
            0x1f..=0x20 => Category::Object,
            0x21 => Category::Array,
            0x22 => Category::Object,
            0x23..=0x26 => Category::Array,
            0x27 => Category::Exception,
            0x28..=0x2c => Category::ControlFlow,
            0x2d..=0x31 => Category::Comparison,
            0x32..=0x3d => Category::ControlFlow,
            0x3e..=0x43 => Category::Trap,
            0x44..=0x51 => Category::Array,
            0x52..=0x6d => Category::Object,
            0x6e..=0x72 => Category::Invoke,
            0x73 => Category::Trap,
            0x74..=0x78 => Category::Invoke,
            0x79..=0x7a => Category::Trap,
            0x7b..=0x80 => Category::Arithmetic,
            0x81..=0x8f => Category::Conversion,
            0x90..=0xe2 => Category::Arithmetic,
            0xe3..=0xeb => Category::Object,
            0xec..=0xfb => Category::Trap,
            0xfc..=0xfe => Category::Object,
            0xff => Category::Trap,
        }
    }

    fn handler(self) -> Handler {
        match self {
            Category::Move => Interpreter::exec_move_ops,
            Category::Constant => Interpreter::exec_const_ops,
            Category::Monitor => Interpreter::exec_monitor_ops,
            Category::Object => Interpreter::exec_object_ops,
            Category::Array => Interpreter::exec_array_ops,
            Category::Exception => Interpreter::exec_exception_ops,
            Category::ControlFlow => Interpreter::exec_control_flow_ops,
            Category::Comparison => Interpreter::exec_comparison_ops,
            Category::Invoke => Interpreter::exec_invoke_ops,
            Category::Arithmetic => Interpreter::exec_arithmetic_ops,
            Category::Conversion => Interpreter::exec_conversion_ops,
            Category::Trap => exec_trap,
        }
    }
}

/// Handler for unused opcode bytes
fn exec_trap(
    _interp: &mut Interpreter,
    _rt: &mut dyn Runtime,
    _frame: &mut Frame,
    inst: u16,
) -> VmResult<Flow> {
    Err(VmError::InvalidOpcode(inst as u8))
}

/// 256-entry table from opcode byte to handler
pub struct OpcodeTable {
    handlers: [Handler; 256],
}

impl OpcodeTable {
    /// Build the table
    pub(in crate::vm::interpreter) fn build() -> Self {
        let mut handlers: [Handler; 256] = [exec_trap as Handler; 256];
        for (byte, slot) in handlers.iter_mut().enumerate() {
            *slot = Category::of(byte as u8).handler();
        }
        Self { handlers }
    }

    /// Handler for an opcode byte
    #[inline(always)]
    pub(in crate::vm::interpreter) fn get(&self, byte: u8) -> Handler {
        self.handlers[byte as usize]
    }

    /// Whether `byte` names an instruction
    pub fn is_mapped(&self, byte: u8) -> bool {
        Category::of(byte) != Category::Trap
    }
}

impl std::fmt::Debug for OpcodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mapped = (0..=255u8).filter(|&b| self.is_mapped(b)).count();
        f.debug_struct("OpcodeTable").field("mapped", &mapped).finish()
    }
}

/// Process-wide dispatch table, built on first use
pub static OPCODE_TABLE: Lazy<OpcodeTable> = Lazy::new(OpcodeTable::build);
