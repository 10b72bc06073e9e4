//! Invoke marshalling
//!
//! Every invoke instruction runs the same three steps:
//!
//! 1. The handler decodes the operand words into an [`InvokeRequest`] and
//!    hands it to the dispatch loop without advancing `pc`.
//! 2. [`decode_args`] turns the argument registers into a neutral
//!    [`ArgList`], driven by the callee's shorty (wide parameters take two
//!    slots, the receiver takes the first).
//! 3. A [`Backend`] consumes the list: either the host's native calling
//!    convention, or a nested activation of this interpreter that receives
//!    the arguments in its trailing registers.

use std::sync::Arc;

use tracing::debug;

use crate::bytecode::CodeItem;
use crate::vm::interpreter::core::Interpreter;
use crate::vm::interpreter::execution::{Flow, Outcome};
use crate::vm::interpreter::frame::Frame;
use crate::vm::register_file::{RegisterFile, Window};
use crate::vm::runtime::{HostCall, HostError, InvokeKind, Runtime};
use crate::vm::value::{MethodRef, ObjRef, Shorty, Value};
use crate::vm::{VmError, VmResult};

/// Argument registers of an invoke instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRegisters {
    /// 35c: up to five 4-bit register numbers, in slot order
    Packed {
        /// Number of argument slots
        count: u8,
        /// Register numbers (`C D E F G`)
        regs: [u8; 5],
    },
    /// 3rc: `count` consecutive registers starting at `start`
    Range {
        /// Number of argument slots
        count: u16,
        /// First register
        start: u16,
    },
}

impl ArgRegisters {
    /// Decode the 35c operands: `A|G|op BBBB F|E|D|C`
    pub fn packed(inst: u16, reg_word: u16) -> Self {
        let nibble = |shift: u16| ((reg_word >> shift) & 0xf) as u8;
        ArgRegisters::Packed {
            count: (inst >> 12) as u8,
            regs: [
                nibble(0),
                nibble(4),
                nibble(8),
                nibble(12),
                ((inst >> 8) & 0xf) as u8,
            ],
        }
    }

    /// Decode the 3rc operands: `AA|op BBBB CCCC`
    pub fn range(inst: u16, start: u16) -> Self {
        ArgRegisters::Range {
            count: inst >> 8,
            start,
        }
    }

    /// Number of argument slots
    pub fn count(&self) -> u32 {
        match *self {
            ArgRegisters::Packed { count, .. } => count as u32,
            ArgRegisters::Range { count, .. } => count as u32,
        }
    }

    /// Register holding argument slot `slot`
    pub fn reg(&self, slot: u32) -> VmResult<u32> {
        if slot >= self.count() {
            return Err(VmError::ArgumentCountMismatch {
                expected: slot + 1,
                actual: self.count(),
            });
        }
        match *self {
            ArgRegisters::Packed { regs, .. } => regs
                .get(slot as usize)
                .map(|&r| r as u32)
                .ok_or(VmError::ArgumentCountMismatch {
                    expected: regs.len() as u32,
                    actual: self.count(),
                }),
            ArgRegisters::Range { start, .. } => Ok(start as u32 + slot),
        }
    }
}

/// A decoded invoke, waiting for the dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeRequest {
    /// Invoke kind
    pub kind: InvokeKind,
    /// Method index in the referrer's program image
    pub method_idx: u32,
    /// Argument registers
    pub args: ArgRegisters,
}

/// Call arguments in back-end neutral form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgList {
    /// Receiver for instance methods
    pub receiver: Option<ObjRef>,
    /// Parameters in declaration order, typed by the shorty
    pub values: Vec<Value>,
}

impl ArgList {
    /// Register slots the list occupies in a callee's parameter window
    pub fn slots(&self) -> u32 {
        self.receiver.map_or(0, |_| 1)
            + self
                .values
                .iter()
                .map(|v| v.type_code().slots() as u32)
                .sum::<u32>()
    }

    /// Copy into the trailing `ins_size` registers of a callee window
    pub fn store(&self, regs: &mut RegisterFile, window: Window, code: &CodeItem) -> VmResult<()> {
        let actual = self.slots();
        if actual != code.ins_size as u32 {
            return Err(VmError::ArgumentCountMismatch {
                expected: code.ins_size as u32,
                actual,
            });
        }
        let mut reg = code.ins_start() as u32;
        if let Some(receiver) = self.receiver {
            regs.set_object(window, reg, receiver)?;
            reg += 1;
        }
        for value in &self.values {
            regs.write(window, reg, *value)?;
            reg += value.type_code().slots() as u32;
        }
        Ok(())
    }
}

/// Where a decoded call goes
#[derive(Debug, Clone)]
pub enum Backend {
    /// Host native calling convention
    HostCall,
    /// Nested activation of this interpreter
    NestedInterpret(Arc<CodeItem>),
}

/// Decode the argument registers of an invoke into an [`ArgList`]
///
/// The instruction's slot count must equal the shorty's (receiver
/// included); a wide parameter consumes two slots and is read from the
/// register pair starting at its first slot.
pub fn decode_args(
    regs: &RegisterFile,
    window: Window,
    args: &ArgRegisters,
    shorty: &Shorty,
    is_static: bool,
) -> VmResult<ArgList> {
    let expected = shorty.arg_slots(is_static) as u32;
    if expected != args.count() {
        return Err(VmError::ArgumentCountMismatch {
            expected,
            actual: args.count(),
        });
    }

    let mut slot = 0;
    let receiver = if is_static {
        None
    } else {
        slot = 1;
        Some(regs.get_object(window, args.reg(0)?)?)
    };

    let mut values = Vec::with_capacity(shorty.params().len());
    for &ty in shorty.params() {
        values.push(regs.read(window, args.reg(slot)?, ty)?);
        slot += ty.slots() as u32;
    }
    Ok(ArgList { receiver, values })
}

impl Interpreter {
    /// Perform a decoded invoke on behalf of `frame`
    ///
    /// On success `frame.ret_val` holds the result and `pc` moves past the
    /// invoke. On an exception `pc` stays at the invoke for the unwinder.
    pub(in crate::vm::interpreter) fn dispatch_invoke(
        &mut self,
        rt: &mut dyn Runtime,
        frame: &mut Frame,
        request: InvokeRequest,
    ) -> VmResult<Flow> {
        let kind = request.kind;
        frame.ret_val = Value::Void;

        let method = match rt.resolve_method(frame.method, request.method_idx, kind.is_static()) {
            Ok(method) => method,
            Err(exception) => return frame.throw(exception),
        };

        let receiver = if kind.is_static() {
            None
        } else {
            let obj = self.regs.get_object(frame.window, request.args.reg(0)?)?;
            if obj.is_null() {
                return frame.raise_npe(rt);
            }
            Some(obj)
        };

        let shorty = rt
            .shorty(method)
            .ok_or_else(|| VmError::InvalidShorty(format!("<no shorty for method {}>", method.0)))?;
        let args = decode_args(&self.regs, frame.window, &request.args, &shorty, kind.is_static())?;

        let target = match receiver {
            Some(obj) if kind.is_dispatched() => match rt.resolve_virtual(method, kind, obj) {
                Ok(target) => target,
                Err(exception) => return frame.throw(exception),
            },
            _ => method,
        };

        let outcome = match self.select_backend(rt, target) {
            Backend::NestedInterpret(code) => {
                debug!(method = target.0, kind = ?kind, "invoke: nested activation");
                self.interpret(rt, target, code, &shorty, &args)?
            }
            Backend::HostCall => {
                debug!(method = target.0, kind = ?kind, "invoke: host call");
                let call = HostCall {
                    kind,
                    method: target,
                    shorty: &shorty,
                    receiver: args.receiver,
                    args: &args.values,
                    options: &self.options,
                    depth: self.depth,
                };
                match rt.call_method(&call) {
                    Ok(value) => Outcome::Returned(value.coerce(shorty.return_type())),
                    Err(HostError::Thrown(exception)) => Outcome::Threw(exception),
                    Err(HostError::Fatal(err)) => return Err(err),
                }
            }
        };

        match outcome {
            Outcome::Returned(value) => {
                frame.ret_val = value;
                Ok(frame.advance(3))
            }
            Outcome::Threw(exception) => frame.throw(exception),
        }
    }

    fn select_backend(&self, rt: &dyn Runtime, method: MethodRef) -> Backend {
        if self.options.prefer_host_calls {
            return Backend::HostCall;
        }
        match rt.method_body(method) {
            Some(code) => Backend::NestedInterpret(code),
            None => Backend::HostCall,
        }
    }
}
