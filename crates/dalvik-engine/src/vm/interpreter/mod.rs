//! Bytecode interpreter
//!
//! One dispatch loop per activation: fetch the first code unit, index the
//! opcode table with its low byte, run the handler, then act on the
//! returned [`Flow`] (continue, unwind, return or perform an invoke).

mod core;
mod dispatch;
mod execution;
mod frame;
mod invoke;
mod opcodes;
mod unwind;

pub use self::core::Interpreter;
pub use dispatch::{Category, OpcodeTable, OPCODE_TABLE};
pub use execution::{Flow, Outcome};
pub use frame::Frame;
pub use invoke::{decode_args, ArgList, ArgRegisters, Backend, InvokeRequest};
pub use unwind::{find_catch, unwind};
