//! Dalvik VM execution
//!
//! This module provides the execution side of the engine:
//! - Register file with typed narrow/wide/reference accessors
//! - Interpreter (opcode table, handlers, unwinder, invoke marshalling)
//! - Host collaborator traits and an in-memory sandbox runtime
//!
//! Two kinds of failure exist. VM-catchable exceptions (null dereference,
//! bounds, class cast, ...) are host objects that travel through the
//! activation's pending-exception slot and the unwinder. Internal faults
//! (corrupt instruction stream, violated preconditions) are [`VmError`] and
//! abort the whole activation chain.

pub mod exception;
pub mod interpreter;
pub mod options;
pub mod register_file;
pub mod runtime;
pub mod sandbox;
pub mod value;

pub use exception::ExceptionKind;
pub use interpreter::{Interpreter, Outcome};
pub use options::InterpreterOptions;
pub use register_file::{RegisterFile, RegisterFileStats};
pub use runtime::{
    CallResult, HostCall, HostError, HostObjects, HostResult, InvokeKind, Resolver, Runtime,
};
pub use sandbox::SandboxRuntime;
pub use value::{ClassRef, MethodRef, ObjRef, RegValue, Shorty, TypeCode, Value};

/// Internal interpreter faults
///
/// None of these are catchable by bytecode; they indicate a corrupt or
/// unverified instruction stream, or a broken host contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    /// Opcode byte with no instruction assigned
    #[error("Invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Program counter outside the instruction stream
    #[error("pc {pc} outside instruction stream of {len} units")]
    PcOutOfRange {
        /// Offending pc
        pc: u32,
        /// Instruction stream length in code units
        len: u32,
    },

    /// Branch target outside the instruction stream
    #[error("branch from {from} by {offset} leaves instruction stream of {len} units")]
    BranchOutOfRange {
        /// pc of the branch instruction
        from: u32,
        /// Signed offset in code units
        offset: i32,
        /// Instruction stream length in code units
        len: u32,
    },

    /// Register index outside the activation's register window
    #[error("register v{reg} out of bounds (frame has {size})")]
    RegisterOutOfBounds {
        /// Register index
        reg: u32,
        /// Number of registers in the frame
        size: u32,
    },

    /// Payload table with the wrong signature
    #[error("bad payload signature: expected 0x{expected:04x}, found 0x{found:04x}")]
    BadPayload {
        /// Expected signature
        expected: u16,
        /// Signature found in the stream
        found: u16,
    },

    /// Payload table runs past the end of the instruction stream
    #[error("truncated payload table")]
    TruncatedPayload,

    /// fill-array-data table with an element width other than 1, 2, 4 or 8
    #[error("bad array-data element width: {0}")]
    BadElementWidth(u16),

    /// move-exception with no caught exception
    #[error("move-exception without a caught exception")]
    MissingException,

    /// Argument slots disagree with the callee's declared parameter slots
    #[error("argument count mismatch: expected {expected} slots, got {actual}")]
    ArgumentCountMismatch {
        /// Slots the callee or instruction declares
        expected: u32,
        /// Slots actually supplied
        actual: u32,
    },

    /// Malformed shorty descriptor
    #[error("invalid shorty descriptor: {0:?}")]
    InvalidShorty(String),

    /// Malformed type descriptor
    #[error("invalid type descriptor: {0:?}")]
    InvalidDescriptor(String),

    /// Too many nested activations
    #[error("stack overflow at depth {depth}")]
    StackOverflow {
        /// Depth at which the limit was hit
        depth: usize,
    },

    /// Register file exhausted
    #[error("register file overflow")]
    RegisterFileOverflow,

    /// Interpreter state machine reached an impossible state
    #[error("unexpected interpreter state: {0}")]
    UnexpectedState(&'static str),

    /// Method body could not be decoded
    #[error("malformed code item: {0}")]
    MalformedCodeItem(String),
}

/// VM execution result
pub type VmResult<T> = Result<T, VmError>;
