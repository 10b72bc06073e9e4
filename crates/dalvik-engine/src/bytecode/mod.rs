//! Dalvik bytecode: opcodes, payload tables, method bodies, assembler and
//! disassembler

pub mod code_item;
pub mod disasm;
pub mod opcode;
pub mod payload;
pub mod writer;

pub use code_item::{CatchClause, CatchHandler, CodeItem, TryItem, TryTable, TryTableBuilder};
pub use disasm::{disassemble, format_instruction};
pub use opcode::{Format, Opcode};
pub use payload::{ArrayData, PackedSwitch, SparseSwitch};
pub use writer::CodeWriter;
