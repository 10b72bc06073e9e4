//! Dalvik bytecode interpreter
//!
//! This crate re-executes methods of an already-loaded DEX program:
//! - Bytecode model (opcodes, formats, payload tables, code items)
//! - Assembler and disassembler for code-unit streams
//! - Register-machine interpreter with a dense opcode table
//! - Exception unwinding over DEX try tables
//! - Invoke marshalling into host calls or nested activations
//!
//! Everything that is not register-level state or control flow (classes,
//! fields, strings, allocation, locks, native methods) is delegated to the
//! host through the [`vm::Runtime`] traits.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![cfg_attr(test, allow(clippy::identity_op))]
#![allow(clippy::unusual_byte_groupings)]

pub mod bytecode;
pub mod vm;

// ============================================================================
// Re-exports
// ============================================================================

// Bytecode
pub use bytecode::{CodeItem, CodeWriter, Format, Opcode, TryTableBuilder};

// VM
pub use vm::{
    CallResult, ClassRef, ExceptionKind, HostCall, HostError, HostObjects, Interpreter,
    InterpreterOptions, InvokeKind, MethodRef, ObjRef, Outcome, RegValue, RegisterFile, Resolver,
    Runtime, SandboxRuntime, Shorty, TypeCode, Value, VmError, VmResult,
};
